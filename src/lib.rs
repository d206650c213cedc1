//! Two-stage task evaluation - summarize per-participant trial logs
//!
//! Each participant file exported by the two-stage decision task app holds one
//! CSV row per trial. This crate reduces every file to one summary row through
//! a deterministic pipeline: row parsing → per-file aggregation → table
//! encoding.
//!
//! ## Modules
//!
//! - **parser**: one exported row into a typed [`TrialRecord`]
//! - **aggregator**: one file's trials into a [`SummaryRecord`]
//! - **statistics**: extended per-file figures (stay probabilities, best reaction times)
//! - **pipeline**: directory listing and per-file orchestration

pub mod aggregator;
pub mod config;
pub mod error;
pub mod filename;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod statistics;
pub mod types;

pub use aggregator::summarize;
pub use config::{EvaluationConfig, TableFormat};
pub use error::EvalError;
pub use filename::FilenameTags;
pub use parser::parse_line;
pub use pipeline::{evaluate_directory, evaluate_file, evaluate_str, Evaluator};
pub use report::{OutputFormat, TableEncoder};
pub use statistics::TrialStatistics;
pub use types::{SummaryRecord, TrialRecord};

/// Crate version, reported by the CLI
pub const EVAL_VERSION: &str = env!("CARGO_PKG_VERSION");
