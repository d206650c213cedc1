//! Extended per-file trial statistics
//!
//! These are the figures the experiment app showed participants on its
//! results screen. They complement the summary row and are computed over
//! complete trials only, except for the incomplete-trial count.

use crate::types::{duration_to_secs, TrialRecord};
use serde::Serialize;

/// Extended statistics over one file's trials
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialStatistics {
    pub complete_trial_count: u32,
    pub incomplete_trial_count: u32,
    /// Mean inter-trial black screen duration (seconds)
    pub avg_inter_trial_duration: Option<f64>,
    /// Mean time from first choice shown to trial end (seconds)
    pub avg_trial_duration: Option<f64>,
    pub best_first_reaction_time: Option<f64>,
    pub best_second_reaction_time: Option<f64>,
    pub avg_reward_probability: Option<f64>,
    /// Fraction of complete trials with a common transition
    pub common_transition_share: Option<f64>,
    /// Fraction of wins after a common transition followed by the same first choice
    pub stay_after_common_win: Option<f64>,
    /// Fraction of wins after a rare transition followed by the same first choice
    pub stay_after_rare_win: Option<f64>,
}

impl TrialStatistics {
    /// Compute statistics from trials in file order
    pub fn from_trials<'a, I>(trials: I) -> Self
    where
        I: IntoIterator<Item = &'a TrialRecord>,
    {
        let mut complete: Vec<&TrialRecord> = Vec::new();
        let mut incomplete_trial_count = 0;
        for trial in trials {
            if trial.is_complete {
                complete.push(trial);
            } else {
                incomplete_trial_count += 1;
            }
        }

        let avg_trial_duration = mean(complete.iter().filter_map(|t| {
            match (t.time_first_choice_shown, t.time_end) {
                (Some(shown), Some(end)) => Some(duration_to_secs(&(end - shown))),
                _ => None,
            }
        }));

        let common_transition_share = if complete.is_empty() {
            None
        } else {
            let common = complete.iter().filter(|t| t.is_common_transition).count();
            Some(common as f64 / complete.len() as f64)
        };

        Self {
            complete_trial_count: complete.len() as u32,
            incomplete_trial_count,
            avg_inter_trial_duration: mean(complete.iter().filter_map(|t| t.duration_inter_trial)),
            avg_trial_duration,
            best_first_reaction_time: minimum(complete.iter().filter_map(|t| t.duration_first)),
            best_second_reaction_time: minimum(complete.iter().filter_map(|t| t.duration_second)),
            avg_reward_probability: mean(complete.iter().filter_map(|t| t.reward_probability)),
            common_transition_share,
            stay_after_common_win: stay_probability(&complete, true),
            stay_after_rare_win: stay_probability(&complete, false),
        }
    }
}

/// Share of consecutive complete-trial pairs, where the earlier trial was won
/// through the given transition kind, that repeat the earlier first choice
fn stay_probability(complete: &[&TrialRecord], common: bool) -> Option<f64> {
    let mut pairs = 0u32;
    let mut stays = 0u32;

    for window in complete.windows(2) {
        let (prev, next) = (window[0], window[1]);
        if prev.is_win && prev.is_common_transition == common {
            pairs += 1;
            if prev.name_first == next.name_first {
                stays += 1;
            }
        }
    }

    if pairs == 0 {
        None
    } else {
        Some(stays as f64 / pairs as f64)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn minimum(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |best: Option<f64>, v| match best {
        Some(b) if b <= v => Some(b),
        _ => Some(v),
    })
}
