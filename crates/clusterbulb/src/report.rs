//! Health report export.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use crate::state::HealthReport;

/// Writes each pass's [`HealthReport`] to the debug log and, optionally, a
/// JSONL file.
#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    output_file: Option<PathBuf>,
}

impl ReportWriter {
    #[must_use]
    pub fn new(output_file: Option<PathBuf>) -> Self {
        Self { output_file }
    }

    pub fn write(&self, report: &HealthReport) -> Result<()> {
        let json = serde_json::to_string(report).context("Failed to serialize health report")?;
        debug!(report = %json, "Health report");

        if let Some(ref path) = self.output_file {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open report file: {}", path.display()))?;
            writeln!(file, "{json}")?;
        }

        Ok(())
    }
}
