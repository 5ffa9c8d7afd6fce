// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per completed epoch so a training run
// leaves a plottable record next to its artifacts.
//
// Output file: <out_dir>/metrics.csv
//
//   epoch,train_loss,train_acc,val_acc
//   1,1.824500,41.200000,38.500000
//   2,1.290100,63.800000,61.700000
//   ...

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Result;

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,
    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,
    /// Training accuracy in percent
    pub train_acc: f64,
    /// Validation accuracy in percent
    pub val_acc: f64,
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger, writing the CSV header if the
    /// file does not exist yet (appending keeps a log across runs).
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("metrics.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,train_acc,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch, m.train_loss, m.train_acc, m.val_acc,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let dir = tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger
            .log(&EpochMetrics { epoch: 1, train_loss: 1.5, train_acc: 40.0, val_acc: 38.0 })
            .unwrap();

        // A second logger over the same directory must not rewrite
        // the header.
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger
            .log(&EpochMetrics { epoch: 2, train_loss: 1.1, train_acc: 55.0, val_acc: 52.0 })
            .unwrap();

        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "epoch,train_loss,train_acc,val_acc");
        assert!(lines[1].starts_with("1,"));
        assert!(lines[2].starts_with("2,"));
    }
}
