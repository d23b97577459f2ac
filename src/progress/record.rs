//! Per-script practice progress records.
//!
//! A record tracks which plan days were completed and how many times the
//! day's script was repeated. Day keys are sparse: an absent day means
//! "untouched", which is distinct from "incomplete".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound for the per-day repetition counter.
pub const MAX_REPETITIONS: u8 = 10;

/// Progress for a single plan day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayProgress {
    pub completed: bool,
    /// Repetition count in `[0, MAX_REPETITIONS]`. `None` means the user
    /// never entered a count, which is distinct from an explicit 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetitions: Option<u8>,
}

/// The persisted progress record for one script identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub days: BTreeMap<u32, DayProgress>,
    pub reminder: bool,
}

/// How a day update touches the repetition counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepetitionsUpdate {
    /// Leave the stored value as it is.
    #[default]
    Unchanged,
    /// Store a count, clamped to `[0, MAX_REPETITIONS]`.
    Set(u8),
    /// Remove the stored count entirely.
    Clear,
}

/// A partial update merged into one day's progress. Fields left at their
/// defaults are not touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayUpdate {
    pub completed: Option<bool>,
    pub repetitions: RepetitionsUpdate,
}

impl DayUpdate {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn repetitions(count: u8) -> Self {
        Self {
            repetitions: RepetitionsUpdate::Set(count),
            ..Self::default()
        }
    }

    pub fn clear_repetitions() -> Self {
        Self {
            repetitions: RepetitionsUpdate::Clear,
            ..Self::default()
        }
    }
}

impl DayProgress {
    /// Merge `update` into this day (shallow field overwrite).
    pub fn apply(&mut self, update: DayUpdate) {
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        match update.repetitions {
            RepetitionsUpdate::Unchanged => {}
            RepetitionsUpdate::Set(count) => {
                self.repetitions = Some(count.min(MAX_REPETITIONS));
            }
            RepetitionsUpdate::Clear => {
                self.repetitions = None;
            }
        }
    }
}

impl ProgressRecord {
    /// Merge `update` into the progress for `day`, creating the day entry if
    /// it was untouched.
    pub fn apply_day(&mut self, day: u32, update: DayUpdate) {
        self.days.entry(day).or_default().apply(update);
    }

    pub fn completed_days(&self) -> usize {
        self.days.values().filter(|d| d.completed).count()
    }
}

/// Aggregate completion as an integer percentage in `[0, 100]`.
///
/// 0 when `total_days` is 0, regardless of record contents.
pub fn completion_percent(record: &ProgressRecord, total_days: u32) -> u8 {
    if total_days == 0 {
        return 0;
    }
    let completed = record.completed_days() as f64;
    ((completed / total_days as f64) * 100.0).round() as u8
}
