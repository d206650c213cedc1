//! Core types for the evaluation pipeline
//!
//! This module defines the records that flow through each stage: the typed
//! trial parsed from one CSV row, and the per-file summary row.

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};

/// One decision trial as logged by the experiment app
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    /// Trial sequence number
    pub id: i64,
    /// Whether the participant finished both stages
    pub is_complete: bool,
    /// Timestamp before the inter-trial black screen
    pub time_before: Option<NaiveDateTime>,
    /// Inter-trial black screen duration (seconds)
    pub duration_inter_trial: Option<f64>,
    /// Timestamp the first-stage choice was shown
    pub time_first_choice_shown: Option<NaiveDateTime>,
    /// Timestamp of the first-stage decision
    pub time_first_decision: Option<NaiveDateTime>,
    /// First-stage reaction time (seconds)
    pub duration_first: Option<f64>,
    /// First-stage choice label
    pub name_first: String,
    /// Whether the first choice led to its common second stage
    pub is_common_transition: bool,
    /// Second-stage state label
    pub name_second_stage: String,
    /// Timestamp the second-stage choice was shown
    pub time_second_choice_shown: Option<NaiveDateTime>,
    /// Timestamp of the second-stage decision
    pub time_second_decision: Option<NaiveDateTime>,
    /// Second-stage reaction time (seconds)
    pub duration_second: Option<f64>,
    /// Second-stage choice label
    pub name_second: String,
    /// Reward probability of the chosen outcome (0-1)
    pub reward_probability: Option<f64>,
    /// Whether the trial was rewarded
    pub is_win: bool,
    /// Timestamp at trial end
    pub time_end: Option<NaiveDateTime>,
}

/// One row of the output table, summarizing a single participant file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    /// Experiment variation tag from the filename
    pub variation: String,
    /// Participant identifier from the filename
    pub participant_id: String,
    pub complete_trial_count: u32,
    /// Pre-trial timestamp of the first complete trial
    pub start_time: Option<NaiveDateTime>,
    /// Last complete trial's end minus `start_time`
    #[serde(serialize_with = "serialize_duration_secs")]
    pub duration: Option<Duration>,
    pub avg_first_reaction_time: f64,
    pub avg_second_reaction_time: f64,
    /// Mean of the two per-stage averages.
    ///
    /// This is a mean-of-means, not the mean over all individual reaction
    /// times; the two differ when the stages contribute unequal sums.
    pub avg_reaction_time: f64,
    /// Number of winning complete trials
    pub sum_of_rewards: u32,
    /// Number of complete trials with reward probability above one half
    pub number_of_correct_choices: u32,
    pub filename: String,
}

/// Serialize an optional duration as fractional seconds
pub(crate) fn serialize_duration_secs<S>(
    value: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(d) => serializer.serialize_some(&duration_to_secs(d)),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn duration_to_secs(d: &Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}
