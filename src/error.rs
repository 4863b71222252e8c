//! Error types for the SEO scoring engine.
//!
//! The taxonomy mirrors how errors surface to callers:
//! - `InvalidUrl` is rejected before a run starts
//! - `FetchFailure` terminates a run with an `error` event
//! - `EvaluationFault` is recovered per-metric and never terminal
//! - `ConfigFault` is a programming error caught at pipeline construction

use thiserror::Error;

use crate::domain::MetricKey;

/// Domain-specific errors for analysis operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// URL could not be normalized or parsed; the run never starts.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The fetch collaborator could not retrieve the target within its
    /// timeout. Terminal for the run - no partial report is produced.
    #[error("Fetch failed: {0}")]
    FetchFailure(String),

    /// A single metric evaluator failed internally. Recovered locally by
    /// substituting the fallback result; never surfaced as terminal.
    #[error("Evaluator fault for {metric}: {message}")]
    EvaluationFault {
        metric: MetricKey,
        message: String,
    },

    /// Weight profile missing a metric or not summing to 100.
    #[error("Configuration fault: {0}")]
    ConfigFault(String),

    /// The consumer closed the progress channel mid-run.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Generic error with context.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a fetch failure from any displayable cause.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchFailure(msg.into())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;
