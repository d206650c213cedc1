//! Per-file summary aggregation
//!
//! Folds one file's trial records, in file order, into a [`SummaryRecord`].
//! Incomplete trials contribute nothing.

use crate::error::EvalError;
use crate::filename::FilenameTags;
use crate::types::{SummaryRecord, TrialRecord};
use chrono::NaiveDateTime;

/// Reward probability a choice must exceed to count as correct
pub const CORRECT_CHOICE_THRESHOLD: f64 = 0.5;

/// Summarize one file's trials.
///
/// Fails on a filename that does not follow the naming convention, or on a
/// complete trial without reaction times.
pub fn summarize<'a, I>(filename: &str, trials: I) -> Result<SummaryRecord, EvalError>
where
    I: IntoIterator<Item = &'a TrialRecord>,
{
    let tags = FilenameTags::from_filename(filename)?;
    let mut accumulator = SummaryAccumulator::default();
    for trial in trials {
        accumulator.add(trial)?;
    }
    Ok(accumulator.finish(tags, filename))
}

/// Running state of the summary fold
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    complete: u32,
    start_time: Option<NaiveDateTime>,
    end_time: Option<NaiveDateTime>,
    sum_first: f64,
    sum_second: f64,
    wins: u32,
    correct_choices: u32,
}

impl SummaryAccumulator {
    /// Fold in the next trial in file order
    pub fn add(&mut self, trial: &TrialRecord) -> Result<(), EvalError> {
        if !trial.is_complete {
            return Ok(());
        }

        let first = trial.duration_first.ok_or(EvalError::MissingReactionTime {
            trial_id: trial.id,
            stage: "first",
        })?;
        let second = trial.duration_second.ok_or(EvalError::MissingReactionTime {
            trial_id: trial.id,
            stage: "second",
        })?;

        // The first complete trial opens the session; every later one moves its end.
        // A missing start on that first trial stays missing.
        if self.complete == 0 {
            self.start_time = trial.time_before;
        } else {
            self.end_time = trial.time_end;
        }

        self.complete += 1;
        self.sum_first += first;
        self.sum_second += second;
        if trial.is_win {
            self.wins += 1;
        }
        if trial
            .reward_probability
            .is_some_and(|p| p > CORRECT_CHOICE_THRESHOLD)
        {
            self.correct_choices += 1;
        }

        Ok(())
    }

    /// Number of complete trials folded so far
    pub fn complete_trial_count(&self) -> u32 {
        self.complete
    }

    pub fn finish(self, tags: FilenameTags, filename: &str) -> SummaryRecord {
        let (avg_first, avg_second, avg_both) = if self.complete == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let n = self.complete as f64;
            let avg_first = self.sum_first / n;
            let avg_second = self.sum_second / n;
            (avg_first, avg_second, (avg_first + avg_second) / 2.0)
        };

        let duration = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };

        SummaryRecord {
            variation: tags.variation,
            participant_id: tags.participant_id,
            complete_trial_count: self.complete,
            start_time: self.start_time,
            duration,
            avg_first_reaction_time: avg_first,
            avg_second_reaction_time: avg_second,
            avg_reaction_time: avg_both,
            sum_of_rewards: self.wins,
            number_of_correct_choices: self.correct_choices,
            filename: filename.to_string(),
        }
    }
}
