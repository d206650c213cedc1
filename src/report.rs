//! Summary table encoding
//!
//! Renders summary records as a delimited text table (the default report) or
//! as JSON for downstream tooling.

use crate::config::TableFormat;
use crate::error::EvalError;
use crate::types::SummaryRecord;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Column headings of the summary table, in record order
pub const HEADER_COLUMNS: [&str; 11] = [
    "variation",
    "participant id",
    "complete trial count",
    "start time",
    "duration",
    "avg first reaction time",
    "avg second reaction time",
    "avg reaction time",
    "sum of rewards",
    "number of correct choices",
    "filename",
];

const TIMESTAMP_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Delimited text table with a header row
    #[default]
    Table,
    /// JSON array of summary records
    Json,
    /// Pretty-printed JSON array
    JsonPretty,
    /// One JSON summary record per line
    Ndjson,
}

/// Encoder for the delimited summary table
pub struct TableEncoder {
    format: TableFormat,
}

impl Default for TableEncoder {
    fn default() -> Self {
        Self::new(TableFormat::default())
    }
}

impl TableEncoder {
    pub fn new(format: TableFormat) -> Self {
        Self { format }
    }

    /// Header line, including the line terminator.
    ///
    /// The configured terminator applies to the header as well as the data rows.
    pub fn header(&self) -> String {
        self.join(HEADER_COLUMNS.iter().map(|c| c.to_string()))
    }

    /// One data line, including the line terminator
    pub fn row(&self, summary: &SummaryRecord) -> String {
        self.join(
            [
                summary.variation.clone(),
                summary.participant_id.clone(),
                summary.complete_trial_count.to_string(),
                summary.start_time.map(format_timestamp).unwrap_or_default(),
                summary
                    .duration
                    .as_ref()
                    .map(format_duration)
                    .unwrap_or_default(),
                summary.avg_first_reaction_time.to_string(),
                summary.avg_second_reaction_time.to_string(),
                summary.avg_reaction_time.to_string(),
                summary.sum_of_rewards.to_string(),
                summary.number_of_correct_choices.to_string(),
                summary.filename.clone(),
            ]
            .into_iter(),
        )
    }

    /// Full table: header followed by one line per summary
    pub fn encode_table(&self, summaries: &[SummaryRecord]) -> String {
        let mut out = self.header();
        for summary in summaries {
            out.push_str(&self.row(summary));
        }
        out
    }

    fn join(&self, fields: impl Iterator<Item = String>) -> String {
        let mut line = fields.collect::<Vec<_>>().join(&self.format.delimiter);
        line.push_str(&self.format.line_terminator);
        line
    }
}

/// Encode summaries in the requested output format
pub fn encode(
    summaries: &[SummaryRecord],
    output_format: OutputFormat,
    table_format: &TableFormat,
) -> Result<String, EvalError> {
    match output_format {
        OutputFormat::Table => Ok(TableEncoder::new(table_format.clone()).encode_table(summaries)),
        OutputFormat::Json => Ok(serde_json::to_string(summaries)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(summaries)?),
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for summary in summaries {
                out.push_str(&serde_json::to_string(summary)?);
                out.push('\n');
            }
            Ok(out)
        }
    }
}

/// Encode summaries and write them to `writer`
pub fn write_report<W: Write>(
    writer: &mut W,
    summaries: &[SummaryRecord],
    output_format: OutputFormat,
    table_format: &TableFormat,
) -> Result<(), EvalError> {
    let data = encode(summaries, output_format, table_format)?;
    writer.write_all(data.as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_DISPLAY).to_string()
}

/// Render a span as `H:MM:SS`, prefixed with a day count when at least one
/// day long and suffixed with microseconds when not whole seconds.
pub fn format_duration(d: &Duration) -> String {
    let total_us = d
        .num_microseconds()
        .unwrap_or_else(|| d.num_milliseconds().saturating_mul(1000));
    let days = total_us.div_euclid(MICROS_PER_DAY);
    let rest = total_us.rem_euclid(MICROS_PER_DAY);
    let secs = rest / 1_000_000;
    let micros = rest % 1_000_000;

    let mut out = String::new();
    if days != 0 {
        let unit = if days.abs() == 1 { "day" } else { "days" };
        out.push_str(&format!("{} {}, ", days, unit));
    }
    out.push_str(&format!(
        "{}:{:02}:{:02}",
        secs / 3600,
        secs % 3600 / 60,
        secs % 60
    ));
    if micros != 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
