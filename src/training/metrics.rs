//! Per-epoch metrics log.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, Result};

/// One row of the metrics log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f32,
    pub val_loss: f32,
}

/// CSV file with header `epoch,train_loss,val_loss`, flushed after every row.
pub struct MetricsLog {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl MetricsLog {
    /// Create (or truncate) the log and write its header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(|source| DesignError::MetricsLog {
                path: path.display().to_string(),
                source,
            })?;
        writer
            .write_record(["epoch", "train_loss", "val_loss"])
            .map_err(|source| DesignError::MetricsLog {
                path: path.display().to_string(),
                source,
            })?;

        let mut log = Self { writer, path };
        log.flush()?;
        Ok(log)
    }

    pub fn append(&mut self, row: &EpochMetrics) -> Result<()> {
        self.writer.serialize(row).map_err(|source| DesignError::MetricsLog {
            path: self.path.display().to_string(),
            source,
        })?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| DesignError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
