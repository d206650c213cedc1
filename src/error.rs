//! Error types for trial log evaluation

use thiserror::Error;

/// Errors that can occur while evaluating trial logs
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Failed to parse trial row: {0}")]
    ParseError(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Filename does not follow the naming convention: {0}")]
    InvalidFilename(String),

    #[error("Complete trial {trial_id} has no {stage} reaction time")]
    MissingReactionTime { trial_id: i64, stage: &'static str },

    #[error("{file}, line {line}: {source}")]
    Row {
        file: String,
        line: u64,
        #[source]
        source: Box<EvalError>,
    },

    #[error("Cannot read {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EvalError {
    /// Attach a file name and 1-based line number to a row-level error
    pub fn at_row(self, file: &str, line: u64) -> Self {
        EvalError::Row {
            file: file.to_string(),
            line,
            source: Box::new(self),
        }
    }
}
