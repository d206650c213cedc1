//! Participant file naming convention
//!
//! Exported files are named `YYYY-MM-DD-HH-mm-<variation>-<participant>-...`,
//! with every segment separated by the same character. Only the position of
//! the two tags matters here.

use crate::error::EvalError;
use serde::Serialize;

/// Segment index of the experiment variation tag
pub const VARIATION_SEGMENT: usize = 5;

/// Segment index of the participant identifier
pub const PARTICIPANT_SEGMENT: usize = 6;

/// Tags extracted from a participant file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilenameTags {
    pub variation: String,
    pub participant_id: String,
}

impl FilenameTags {
    /// Split on `-` if the name contains one, else on `_`.
    ///
    /// Mixed separators are not detected; a name using both is split on `-`
    /// only.
    pub fn from_filename(filename: &str) -> Result<Self, EvalError> {
        let separator = separator_for(filename);
        let segments: Vec<&str> = filename.split(separator).collect();

        match (
            segments.get(VARIATION_SEGMENT),
            segments.get(PARTICIPANT_SEGMENT),
        ) {
            (Some(variation), Some(participant_id)) => Ok(Self {
                variation: variation.to_string(),
                participant_id: participant_id.to_string(),
            }),
            _ => Err(EvalError::InvalidFilename(format!(
                "'{}' has {} '{}'-separated segments, need at least {}",
                filename,
                segments.len(),
                separator,
                PARTICIPANT_SEGMENT + 1
            ))),
        }
    }
}

fn separator_for(filename: &str) -> char {
    if filename.contains('-') {
        '-'
    } else {
        '_'
    }
}
