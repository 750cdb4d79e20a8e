// ⛔ Pipeline Errors
// Structural failures that halt a script. Everything softer (a bad cell, one
// broken player page) degrades to an absent value or a skipped item instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Local input file could not be read
    #[error("failed to read input {path}: {reason}")]
    Input { path: String, reason: String },

    /// Network error or non-success status
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// No strategy located a table for the phrase
    #[error("could not find target table for phrase: {phrase}")]
    TableNotFound { phrase: String },

    #[error("could not find header row in table")]
    HeaderNotFound,

    #[error("no data rows found in table")]
    NoDataRows,
}

impl IngestError {
    /// Process exit code reported by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            IngestError::Input { .. } | IngestError::Fetch { .. } => 2,
            IngestError::TableNotFound { .. } => 3,
            IngestError::HeaderNotFound => 4,
            IngestError::NoDataRows => 5,
        }
    }
}
