// Error types for the processing pipeline.
//
// Fatal errors abort the run before any output file is produced. Everything
// row-level degrades to null and is tallied in `RunDiagnostics` instead.
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required column missing from input: {logical} (tried: {candidates})")]
    MissingColumn {
        logical: &'static str,
        candidates: String,
    },

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad settings file {path}: {message}")]
    Settings { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Per-run tally of recoverable data-quality findings.
///
/// None of these abort the run; they surface in the summary JSON and the
/// console report so bad source data stays visible.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunDiagnostics {
    /// A metric constituent timestamp was absent.
    pub missing_field: usize,
    /// A cell held a value that is not a valid timestamp or duration.
    pub unparseable_value: usize,
    /// A computed duration came out negative (out-of-order stamps).
    pub negative_duration: usize,
    /// An aggregation group had no contributing rows for a metric.
    pub empty_group: usize,
}

impl RunDiagnostics {
    pub fn total(&self) -> usize {
        self.missing_field + self.unparseable_value + self.negative_duration + self.empty_group
    }

    /// Log a warning when the run found anything worth flagging.
    pub fn log(&self) {
        if self.total() == 0 {
            return;
        }
        warn!(
            missing_field = self.missing_field,
            unparseable_value = self.unparseable_value,
            negative_duration = self.negative_duration,
            empty_group = self.empty_group,
            "data-quality findings during run"
        );
    }
}
