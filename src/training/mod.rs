//! VAE training: data split, Adam epochs, validation, checkpointing and
//! early stopping.

mod config;
mod early_stopping;
mod metrics;
mod trainer;

pub use config::TrainConfig;
pub use early_stopping::{EarlyStopping, Verdict};
pub use metrics::{EpochMetrics, MetricsLog};
pub use trainer::{StopReason, TrainReport, Trainer};
