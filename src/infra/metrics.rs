// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per finished epoch, next to log.txt.
//
// Metrics recorded per epoch:
//   - epoch:     the epoch number (0, 1, 2, ...)
//   - mean_loss: mean of the per-batch losses of that epoch
//                (NaN when the epoch had no batches)
//   - steps:     number of optimisation steps in the epoch
//
// Output file: <run dir>/metrics.csv
//
// Example CSV output:
//   epoch,mean_loss,steps
//   0,0.412300,485
//   1,0.298100,485
//   ...
//
// Runs started on the same day share a run directory, so rows are
// appended and the header is only written for a new file.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::{events::TrainingEvent, traits::EventSink};

const CSV_HEADER: &str = "epoch,mean_loss,steps";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,

    /// Mean training loss of the epoch
    pub mean_loss: f64,

    pub steps: usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, mean_loss: f64, steps: usize) -> Self {
        Self { epoch, mean_loss, steps }
    }

    fn csv_row(&self) -> String {
        format!("{},{:.6},{}", self.epoch, self.mean_loss, self.steps)
    }
}

/// Appends epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a logger writing to `<dir>/metrics.csv`.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(self.csv_path())
            .with_context(|| format!("Cannot open '{}'", self.csv_path().display()))?;
        writeln!(f, "{}", m.csv_row())?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl EventSink for MetricsLogger {
    fn record(&self, event: &TrainingEvent) -> Result<()> {
        match event {
            TrainingEvent::EpochCompleted { epoch, mean_loss, steps } => {
                self.log(&EpochMetrics::new(*epoch, *mean_loss, *steps))
            }
            _ => Ok(()),
        }
    }
}
