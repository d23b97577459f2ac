//! Self-talk rehearsal recording.
//!
//! One controller per locale negotiates a capture device, manages the
//! asynchronous capture session, and produces a playable, downloadable
//! artifact. All device-layer failures are caught here and folded into
//! status signals; nothing escapes to the embedding layer.

mod artifact;
mod controller;
mod format;
mod gateway;
mod state_machine;

pub use artifact::{Artifact, ArtifactError};
pub use controller::{RecorderController, RecorderStatus};
pub use format::{
    negotiate, FormatChoice, NegotiatedFormat, DEFAULT_MIME, FALLBACK_EXTENSION, FORMAT_PRIORITY,
};
pub use gateway::{
    event_channel, CaptureGateway, CpalGateway, EventReceiver, EventSender, StubCall, StubGateway,
};
pub use state_machine::{AccessFailureKind, FailureKind, Phase, RecorderEvent};
