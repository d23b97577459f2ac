//! Core engine for the self-talk habit practice flow.
//!
//! A user picks a practice template, the flow loads its day-by-day script,
//! tracks per-day completion and repetition counts, and offers an audio
//! recorder for rehearsing the day's script aloud.
//!
//! Two components carry the real state: the [`progress::ProgressStore`],
//! which owns merge-on-update persisted progress records, and the
//! [`recorder::RecorderController`], a per-locale state machine over a
//! capture device that yields downloadable artifacts. Plan data, locale
//! copy, and the [`session::PracticeSession`] context wire them together;
//! rendering stays with the embedding application.

pub mod locale;
pub mod plan;
pub mod progress;
pub mod recorder;
pub mod session;
pub mod storage;

pub use locale::Locale;
pub use plan::{PlanCatalog, PlanDocument, PlanSource};
pub use progress::{
    completion_percent, DayProgress, DayUpdate, PersistStatus, ProgressRecord, ProgressStore,
    RepetitionsUpdate, StoreUpdate,
};
pub use recorder::{CaptureGateway, RecorderController, RecorderStatus};
pub use session::{PlanView, PracticeSession, STEP_COUNT};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
