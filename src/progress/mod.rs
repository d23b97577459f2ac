//! Per-script, per-day practice progress.
//!
//! Records are merged on update, cached in memory, and persisted through the
//! local key-value store on a best-effort basis.

mod record;
mod store;

pub use record::{
    completion_percent, DayProgress, DayUpdate, ProgressRecord, RepetitionsUpdate, MAX_REPETITIONS,
};
pub use store::{PersistStatus, ProgressStore, StoreUpdate, PROGRESS_KEY_PREFIX};
