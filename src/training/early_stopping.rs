//! Patience-based early stopping.

/// Outcome of one validation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// New best loss; the model should be checkpointed.
    Improved,
    /// No improvement, patience not yet exhausted.
    Stalled,
    /// Patience exhausted.
    Stop,
}

/// Tracks the best validation loss and epochs since it was reached.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    best: f32,
    patience: usize,
    min_delta: f32,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self {
            best: f32::INFINITY,
            patience,
            min_delta,
            wait: 0,
        }
    }

    /// Record a validation loss. Only a decrease of more than `min_delta`
    /// counts as an improvement.
    pub fn observe(&mut self, val_loss: f32) -> Verdict {
        if val_loss < self.best - self.min_delta {
            self.best = val_loss;
            self.wait = 0;
            return Verdict::Improved;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            Verdict::Stop
        } else {
            Verdict::Stalled
        }
    }

    pub fn best(&self) -> f32 {
        self.best
    }
}
