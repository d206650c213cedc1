//! Trial row parser
//!
//! Converts one exported CSV row into a typed [`TrialRecord`]. The exporter
//! never quotes fields, so a row is split on bare commas.

use crate::error::EvalError;
use crate::types::TrialRecord;
use chrono::NaiveDateTime;

/// Number of columns in an exported trial row
pub const FIELD_COUNT: usize = 17;

/// Token the exporter writes for a true boolean
pub const AFFIRMATIVE: &str = "yes";

/// Timestamp layout written by the exporter (invariant culture)
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Column names of the exported header row, in order
pub const COLUMN_NAMES: [&str; FIELD_COUNT] = [
    "TrialNumber",
    "Completed",
    "Timestamp Before Black Screen",
    "Black Screen Duration",
    "Timestamp First Choice Shown",
    "Timestamp First Decision",
    "First Choice Reaction Time",
    "First Choice",
    "Common Transition",
    "Second Stage",
    "Timestamp Second Choice Shown",
    "Timestamp Second Decision",
    "Second Decision Reaction Time",
    "Second Choice",
    "Reward Probability",
    "Reward",
    "Timestamp End",
];

/// Parse one raw line, including its trailing line terminator.
///
/// The header line must not be passed here.
pub fn parse_line(line: &str) -> Result<TrialRecord, EvalError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split(',').collect();
    parse_fields(&fields)
}

/// Parse the 17 columns of a trial row. Extra trailing columns are ignored.
pub fn parse_fields(fields: &[&str]) -> Result<TrialRecord, EvalError> {
    if fields.len() < FIELD_COUNT {
        return Err(EvalError::ParseError(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            fields.len()
        )));
    }

    Ok(TrialRecord {
        id: parse_id(fields[0])?,
        is_complete: parse_flag(fields[1]),
        time_before: parse_timestamp(fields[2])?,
        duration_inter_trial: parse_duration(fields[3])?,
        time_first_choice_shown: parse_timestamp(fields[4])?,
        time_first_decision: parse_timestamp(fields[5])?,
        duration_first: parse_duration(fields[6])?,
        name_first: fields[7].to_string(),
        is_common_transition: parse_flag(fields[8]),
        name_second_stage: fields[9].to_string(),
        time_second_choice_shown: parse_timestamp(fields[10])?,
        time_second_decision: parse_timestamp(fields[11])?,
        duration_second: parse_duration(fields[12])?,
        name_second: fields[13].to_string(),
        reward_probability: parse_probability(fields[14])?,
        is_win: parse_flag(fields[15]),
        time_end: parse_timestamp(fields[16])?,
    })
}

fn parse_id(text: &str) -> Result<i64, EvalError> {
    text.parse::<i64>()
        .map_err(|e| EvalError::ParseError(format!("invalid trial number '{}': {}", text, e)))
}

/// Exact match against the affirmative token; anything else is false
pub fn parse_flag(text: &str) -> bool {
    text == AFFIRMATIVE
}

/// Parse a `MM/DD/YYYY HH:MM:SS` timestamp. Empty text is absent.
pub fn parse_timestamp(text: &str) -> Result<Option<NaiveDateTime>, EvalError> {
    if text.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|e| EvalError::DateParseError(format!("'{}': {}", text, e)))
}

/// Parse an exported `H:MM:SS[.fff]` span into seconds. Empty text is absent.
///
/// Only the third colon segment is read; hours and minutes are dropped, so
/// `0:01:23.5` yields 23.5.
pub fn parse_duration(text: &str) -> Result<Option<f64>, EvalError> {
    if text.is_empty() {
        return Ok(None);
    }
    let seconds = text
        .split(':')
        .nth(2)
        .ok_or_else(|| EvalError::ParseError(format!("invalid duration '{}'", text)))?;
    seconds
        .parse::<f64>()
        .map(Some)
        .map_err(|e| EvalError::ParseError(format!("invalid duration '{}': {}", text, e)))
}

/// Parse a percentage such as `75.0%` into a probability. Empty text is absent.
pub fn parse_probability(text: &str) -> Result<Option<f64>, EvalError> {
    if text.is_empty() {
        return Ok(None);
    }
    let number = text.strip_suffix('%').ok_or_else(|| {
        EvalError::ParseError(format!("reward probability '{}' has no percent sign", text))
    })?;
    number
        .parse::<f64>()
        .map(|p| Some(p / 100.0))
        .map_err(|e| EvalError::ParseError(format!("invalid reward probability '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const COMPLETE_ROW: &str = "3,yes,01/15/2024 14:00:00,00:00:01.5000000,01/15/2024 14:00:02,\
01/15/2024 14:00:03,00:00:00.8120000,left,yes,stage-b,01/15/2024 14:00:04,01/15/2024 14:00:05,\
00:00:01.2500000,right,75.0%,yes,01/15/2024 14:00:06\n";

    const ABORTED_ROW: &str = "4,no,01/15/2024 14:00:07,00:00:01.5000000,01/15/2024 14:00:09,,,,,,,,,,,,01/15/2024 14:00:30\n";

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_complete_row() {
        let trial = parse_line(COMPLETE_ROW).unwrap();

        assert_eq!(trial.id, 3);
        assert!(trial.is_complete);
        assert_eq!(trial.time_before, Some(ts(14, 0, 0)));
        assert_eq!(trial.duration_inter_trial, Some(1.5));
        assert_eq!(trial.duration_first, Some(0.812));
        assert_eq!(trial.name_first, "left");
        assert!(trial.is_common_transition);
        assert_eq!(trial.name_second_stage, "stage-b");
        assert_eq!(trial.duration_second, Some(1.25));
        assert_eq!(trial.name_second, "right");
        assert_eq!(trial.reward_probability, Some(0.75));
        assert!(trial.is_win);
        assert_eq!(trial.time_end, Some(ts(14, 0, 6)));
    }

    #[test]
    fn test_empty_fields_are_absent() {
        let trial = parse_line(ABORTED_ROW).unwrap();

        assert!(!trial.is_complete);
        assert_eq!(trial.time_first_decision, None);
        assert_eq!(trial.duration_first, None);
        assert_eq!(trial.duration_second, None);
        assert_eq!(trial.reward_probability, None);
        assert_eq!(trial.time_second_choice_shown, None);
        assert_eq!(trial.name_first, "");
        assert!(!trial.is_win);
        assert_eq!(trial.time_end, Some(ts(14, 0, 30)));
    }

    #[test]
    fn test_flag_requires_exact_token() {
        assert!(parse_flag("yes"));
        for text in ["no", "Yes", "YES", "yes ", "true", "1", ""] {
            assert!(!parse_flag(text), "{:?} should be false", text);
        }
    }

    #[test]
    fn test_duration_reads_third_segment_only() {
        assert_eq!(parse_duration("0:01:23.5").unwrap(), Some(23.5));
        assert_eq!(parse_duration("7:59:23.5").unwrap(), Some(23.5));
        assert_eq!(parse_duration("").unwrap(), None);
        assert!(parse_duration("23.5").is_err());
        assert!(parse_duration("0:00:abc").is_err());
    }

    #[test]
    fn test_probability() {
        assert_eq!(parse_probability("75%").unwrap(), Some(0.75));
        assert_eq!(parse_probability("").unwrap(), None);
        assert!(parse_probability("75").is_err());
        assert!(parse_probability("x%").is_err());
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(
            parse_timestamp("01/15/2024 14:00:06").unwrap(),
            Some(ts(14, 0, 6))
        );
        assert_eq!(parse_timestamp("").unwrap(), None);
        assert!(matches!(
            parse_timestamp("2024-01-15 14:00:06"),
            Err(EvalError::DateParseError(_))
        ));
    }

    #[test]
    fn test_crlf_terminator() {
        let line = COMPLETE_ROW.replace('\n', "\r\n");
        let trial = parse_line(&line).unwrap();
        assert_eq!(trial.time_end, Some(ts(14, 0, 6)));
    }

    #[test]
    fn test_short_row_fails() {
        let err = parse_line("1,yes,01/15/2024 14:00:00\n").unwrap_err();
        assert!(matches!(err, EvalError::ParseError(_)));
        assert!(err.to_string().contains("expected 17 fields, found 3"));
    }

    #[test]
    fn test_blank_line_fails() {
        let err = parse_line("\n").unwrap_err();
        assert!(err.to_string().contains("expected 17 fields, found 1"));
    }

    #[test]
    fn test_non_numeric_id_fails() {
        let line = COMPLETE_ROW.replacen('3', "x", 1);
        assert!(matches!(parse_line(&line), Err(EvalError::ParseError(_))));
    }
}
