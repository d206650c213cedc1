//! Evaluation configuration
//!
//! Passed explicitly into the pipeline entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one evaluation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Directory holding the participant files
    pub data_dir: PathBuf,

    /// Layout of the delimited output table
    #[serde(default)]
    pub table: TableFormat,
}

impl EvaluationConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            table: TableFormat::default(),
        }
    }

    pub fn with_table_format(mut self, table: TableFormat) -> Self {
        self.table = table;
        self
    }
}

/// Delimiter and line terminator of the summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFormat {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default = "default_line_terminator")]
    pub line_terminator: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            line_terminator: default_line_terminator(),
        }
    }
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_line_terminator() -> String {
    "\n".to_string()
}
