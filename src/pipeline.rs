//! Pipeline orchestration
//!
//! This module provides the public API for evaluating trial logs. It lists
//! participant files, parses each file's rows and folds them into one summary
//! row per file.
//!
//! Files are processed one after another and share no state. The first
//! failure aborts the run; there is no partial result.

use crate::aggregator::{summarize, SummaryAccumulator};
use crate::config::EvaluationConfig;
use crate::error::EvalError;
use crate::filename::FilenameTags;
use crate::parser::parse_line;
use crate::report::{write_report, OutputFormat};
use crate::statistics::TrialStatistics;
use crate::types::{SummaryRecord, TrialRecord};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// List the regular files directly inside `dir`, sorted by file name
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, EvalError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        } else {
            debug!("Skipping non-file entry: {}", entry.path().display());
        }
    }
    Ok(files)
}

/// Parse every data row of a trial log, skipping the header
pub fn read_trials<R: Read>(filename: &str, reader: R) -> Result<Vec<TrialRecord>, EvalError> {
    let mut trials = Vec::new();
    for_each_trial(filename, reader, |trial| {
        trials.push(trial);
        Ok(())
    })?;
    Ok(trials)
}

/// Summarize one trial log read from `reader`
pub fn evaluate_reader<R: Read>(filename: &str, reader: R) -> Result<SummaryRecord, EvalError> {
    let tags = FilenameTags::from_filename(filename)?;
    let mut accumulator = SummaryAccumulator::default();
    for_each_trial(filename, reader, |trial| accumulator.add(&trial))?;

    debug!(
        "{}: {} complete trials",
        filename,
        accumulator.complete_trial_count()
    );
    Ok(accumulator.finish(tags, filename))
}

/// Summarize in-memory file content
pub fn evaluate_str(filename: &str, content: &str) -> Result<SummaryRecord, EvalError> {
    evaluate_reader(filename, content.as_bytes())
}

/// Summarize one file on disk
pub fn evaluate_file(path: &Path) -> Result<SummaryRecord, EvalError> {
    let filename = file_name_of(path);
    let file = open(path)?;
    evaluate_reader(&filename, file)
}

/// Summarize every file in the configured directory, in listing order
pub fn evaluate_directory(config: &EvaluationConfig) -> Result<Vec<SummaryRecord>, EvalError> {
    let files = list_files(&config.data_dir)?;
    info!(
        "Evaluating {} files in {}",
        files.len(),
        config.data_dir.display()
    );

    files.iter().map(|path| evaluate_file(path)).collect()
}

/// Summary and extended statistics for a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub summary: SummaryRecord,
    pub statistics: TrialStatistics,
}

/// Build the full report for one file on disk
pub fn inspect_file(path: &Path) -> Result<FileReport, EvalError> {
    let filename = file_name_of(path);
    let trials = read_trials(&filename, open(path)?)?;
    let summary = summarize(&filename, &trials)?;
    let statistics = TrialStatistics::from_trials(&trials);
    Ok(FileReport {
        summary,
        statistics,
    })
}

/// Outcome of checking one file
#[derive(Debug, Clone, Serialize)]
pub struct FileCheck {
    pub filename: String,
    pub complete_trial_count: Option<u32>,
    pub error: Option<String>,
}

impl FileCheck {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Check every file in the configured directory without stopping at the
/// first failure
pub fn validate_directory(config: &EvaluationConfig) -> Result<Vec<FileCheck>, EvalError> {
    let files = list_files(&config.data_dir)?;
    Ok(files
        .iter()
        .map(|path| {
            let filename = file_name_of(path);
            match evaluate_file(path) {
                Ok(summary) => FileCheck {
                    filename,
                    complete_trial_count: Some(summary.complete_trial_count),
                    error: None,
                },
                Err(e) => FileCheck {
                    filename,
                    complete_trial_count: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect())
}

/// Evaluation runner bound to one configuration.
///
/// Use this when the same directory settings drive several runs.
pub struct Evaluator {
    config: EvaluationConfig,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Summarize every file in the configured directory
    pub fn run(&self) -> Result<Vec<SummaryRecord>, EvalError> {
        evaluate_directory(&self.config)
    }

    /// Summarize every file and write the report.
    ///
    /// Nothing is written unless every file was summarized.
    pub fn run_to_writer<W: Write>(
        &self,
        writer: &mut W,
        output_format: OutputFormat,
    ) -> Result<usize, EvalError> {
        let summaries = self.run()?;
        write_report(writer, &summaries, output_format, &self.config.table)?;
        Ok(summaries.len())
    }
}

fn for_each_trial<R, F>(filename: &str, reader: R, mut f: F) -> Result<(), EvalError>
where
    R: Read,
    F: FnMut(TrialRecord) -> Result<(), EvalError>,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    let mut line_number: u64 = 0;

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| EvalError::from(e).at_row(filename, line_number + 1))?;
        if read == 0 {
            break;
        }
        line_number += 1;

        // Header
        if line_number == 1 {
            continue;
        }

        let trial = parse_line(&line).map_err(|e| e.at_row(filename, line_number))?;
        f(trial).map_err(|e| e.at_row(filename, line_number))?;
    }
    Ok(())
}

fn open(path: &Path) -> Result<File, EvalError> {
    File::open(path).map_err(|source| EvalError::FileAccess {
        path: path.display().to_string(),
        source,
    })
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::fs;

    const HEADER: &str = "TrialNumber,Completed,Timestamp Before Black Screen,Black Screen Duration,\
Timestamp First Choice Shown,Timestamp First Decision,First Choice Reaction Time,First Choice,\
Common Transition,Second Stage,Timestamp Second Choice Shown,Timestamp Second Decision,\
Second Decision Reaction Time,Second Choice,Reward Probability,Reward,Timestamp End\n";

    const WIN_ROW: &str = "1,yes,01/15/2024 14:00:00,00:00:01.5000000,01/15/2024 14:00:01,\
01/15/2024 14:00:02,00:00:00.8000000,left,yes,b,01/15/2024 14:00:03,01/15/2024 14:00:04,\
00:00:01.2000000,right,60.0%,yes,01/15/2024 14:00:05\n";

    const LOSS_ROW: &str = "2,yes,01/15/2024 14:00:06,00:00:01.5000000,01/15/2024 14:00:07,\
01/15/2024 14:00:08,00:00:00.6000000,left,no,c,01/15/2024 14:00:09,01/15/2024 14:00:10,\
00:00:01.0000000,left,30.0%,no,01/15/2024 14:00:11\n";

    const ABORTED_ROW: &str =
        "3,no,01/15/2024 14:00:12,00:00:01.5000000,01/15/2024 14:00:13,,,,,,,,,,,,01/15/2024 14:00:40\n";

    const FILENAME: &str = "exp-2024-01-01-v2-A-B-001.csv";

    fn sample_file() -> String {
        format!("{HEADER}{WIN_ROW}{LOSS_ROW}{ABORTED_ROW}")
    }

    #[test]
    fn test_two_trial_scenario() {
        let summary = evaluate_str(FILENAME, &sample_file()).unwrap();

        assert_eq!(summary.variation, "A");
        assert_eq!(summary.participant_id, "B");
        assert_eq!(summary.complete_trial_count, 2);
        assert_eq!(summary.sum_of_rewards, 1);
        assert_eq!(summary.number_of_correct_choices, 1);
        // 14:00:11 - 14:00:00
        assert_eq!(summary.duration, Some(Duration::seconds(11)));
        assert!((summary.avg_first_reaction_time - 0.7).abs() < 1e-9);
        assert!((summary.avg_second_reaction_time - 1.1).abs() < 1e-9);
        assert!((summary.avg_reaction_time - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_header_only_file() {
        let summary = evaluate_str(FILENAME, HEADER).unwrap();
        assert_eq!(summary.complete_trial_count, 0);
        assert_eq!(summary.avg_reaction_time, 0.0);
        assert_eq!(summary.start_time, None);
    }

    #[test]
    fn test_bad_row_names_file_and_line() {
        let content = format!("{HEADER}{WIN_ROW}1,yes,garbage\n");
        let err = evaluate_str(FILENAME, &content).unwrap_err();

        match err {
            EvalError::Row { file, line, source } => {
                assert_eq!(file, FILENAME);
                assert_eq!(line, 3);
                assert!(matches!(*source, EvalError::ParseError(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_line_fails_with_its_line_number() {
        let content = format!("{HEADER}{WIN_ROW}\n{LOSS_ROW}");
        let err = evaluate_str(FILENAME, &content).unwrap_err();

        match err {
            EvalError::Row { file, line, source } => {
                assert_eq!(file, FILENAME);
                assert_eq!(line, 3);
                assert!(source.to_string().contains("expected 17 fields, found 1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_trailing_blank_line_fails() {
        let content = format!("{HEADER}{WIN_ROW}\n");
        assert!(matches!(
            evaluate_str(FILENAME, &content),
            Err(EvalError::Row { line: 3, .. })
        ));
    }

    #[test]
    fn test_quote_in_label_is_plain_text() {
        let row = WIN_ROW.replacen(",left,", ",\"left,", 1);
        let content = format!("{HEADER}{row}");

        let trials = read_trials(FILENAME, content.as_bytes()).unwrap();
        assert_eq!(trials.len(), 1);
        assert_eq!(trials[0].name_first, "\"left");
        assert_eq!(trials[0], parse_line(&row).unwrap());
        assert_eq!(evaluate_str(FILENAME, &content).unwrap().complete_trial_count, 1);
    }

    #[test]
    fn test_crlf_file() {
        let content = sample_file().replace('\n', "\r\n");
        let summary = evaluate_str(FILENAME, &content).unwrap();
        assert_eq!(summary.complete_trial_count, 2);
        assert_eq!(summary.duration, Some(Duration::seconds(11)));
    }

    #[test]
    fn test_read_trials_keeps_file_order() {
        let trials = read_trials(FILENAME, sample_file().as_bytes()).unwrap();
        let ids: Vec<i64> = trials.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_directory_yields_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let evaluator = Evaluator::new(EvaluationConfig::new(dir.path()));

        let mut out = Vec::new();
        let count = evaluator
            .run_to_writer(&mut out, OutputFormat::Table)
            .unwrap();

        assert_eq!(count, 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("variation;participant id;"));
    }

    #[test]
    fn test_directory_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FILENAME), sample_file()).unwrap();
        fs::write(
            dir.path().join("2024_01_16_09_30_Simple_p7_data.csv"),
            format!("{HEADER}{ABORTED_ROW}"),
        )
        .unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();

        let evaluator = Evaluator::new(EvaluationConfig::new(dir.path()));
        let summaries = evaluator.run().unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].variation, "Simple");
        assert_eq!(summaries[0].participant_id, "p7");
        assert_eq!(summaries[0].complete_trial_count, 0);
        assert_eq!(summaries[1].filename, FILENAME);

        let mut out = Vec::new();
        evaluator.run_to_writer(&mut out, OutputFormat::Table).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_one_bad_file_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FILENAME), sample_file()).unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let evaluator = Evaluator::new(EvaluationConfig::new(dir.path()));
        let mut out = Vec::new();
        let result = evaluator.run_to_writer(&mut out, OutputFormat::Table);

        assert!(matches!(result, Err(EvalError::InvalidFilename(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_validate_reports_every_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FILENAME), sample_file()).unwrap();
        fs::write(
            dir.path().join("exp-2024-01-01-v2-A-C-002.csv"),
            format!("{HEADER}7,yes,not a date,,,,,,,,,,,,,,\n"),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let checks = validate_directory(&EvaluationConfig::new(dir.path())).unwrap();

        assert_eq!(checks.len(), 3);
        assert!(checks[0].is_ok());
        assert_eq!(checks[0].complete_trial_count, Some(2));
        assert!(!checks[1].is_ok());
        assert!(checks[1].error.as_ref().unwrap().contains("line 2"));
        assert!(!checks[2].is_ok());
    }

    #[test]
    fn test_inspect_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILENAME);
        fs::write(&path, sample_file()).unwrap();

        let report = inspect_file(&path).unwrap();

        assert_eq!(report.summary.complete_trial_count, 2);
        assert_eq!(report.statistics.incomplete_trial_count, 1);
        assert_eq!(report.statistics.best_first_reaction_time, Some(0.6));
        assert_eq!(report.statistics.stay_after_common_win, Some(1.0));
    }

    #[test]
    fn test_missing_directory() {
        let config = EvaluationConfig::new("/nonexistent/twostage-eval-test");
        assert!(matches!(
            evaluate_directory(&config),
            Err(EvalError::Walk(_))
        ));
    }
}
