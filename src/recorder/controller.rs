//! Recording controller: one per locale, drives the session state machine
//! against a capture gateway.
//!
//! Entry points never fail; every gateway-layer problem folds into the
//! `Error` phase and a status signal the presenter can localize. Each entry
//! point returns the resulting status so callers can assert on outcomes.

use crate::locale::Locale;

use super::artifact::Artifact;
use super::format::{negotiate, NegotiatedFormat};
use super::gateway::{CaptureGateway, EventReceiver};
use super::state_machine::{reduce, Effect, FailureKind, Phase, RecorderEvent, RecorderSession};

/// Status signal derived from the session. The presenter maps this to
/// locale copy via [`Locale::recorder_status_text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    Unsupported,
    Inactive,
    Idle,
    RequestingPermission,
    Recording,
    Processing,
    Ready,
    PermissionDenied,
    DeviceError,
}

pub struct RecorderController {
    locale: Locale,
    gateway: Box<dyn CaptureGateway>,
    events: EventReceiver,
    session: RecorderSession,
}

impl RecorderController {
    /// Build a controller over `gateway`. The capability probe runs here;
    /// when it fails the controller is permanently `Unsupported`.
    pub fn new(locale: Locale, gateway: Box<dyn CaptureGateway>, events: EventReceiver) -> Self {
        let supported = gateway.is_supported();
        if !supported {
            log::warn!("Recorder[{}]: capture not supported on this platform", locale);
        }
        Self {
            locale,
            gateway,
            events,
            session: RecorderSession::new(supported),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// Request a new capture session. No-op unless the controller is idle,
    /// holds a finished artifact, or is recovering from an error.
    pub fn start(&mut self) -> RecorderStatus {
        self.dispatch(RecorderEvent::StartPressed);
        self.pump()
    }

    /// Stop the running capture and flush. Always resolves to `Ready` or
    /// `Error`, never hangs.
    pub fn stop(&mut self) -> RecorderStatus {
        self.dispatch(RecorderEvent::StopPressed);
        self.pump()
    }

    /// Toggle availability from the presenter. Deactivating mid-capture
    /// cancels the session and discards everything buffered.
    pub fn set_active(&mut self, active: bool) -> RecorderStatus {
        self.dispatch(RecorderEvent::SetActive { active });
        self.pump()
    }

    /// Apply all gateway events delivered since the last call.
    pub fn pump(&mut self) -> RecorderStatus {
        while let Ok(event) = self.events.try_recv() {
            if let RecorderEvent::CaptureFailed { ref message, .. } = event {
                log::error!("Recorder[{}]: device failure: {}", self.locale, message);
            }
            self.dispatch(event);
        }
        self.status()
    }

    pub fn status(&self) -> RecorderStatus {
        match self.session.phase {
            Phase::Unsupported => RecorderStatus::Unsupported,
            Phase::Inactive => RecorderStatus::Inactive,
            Phase::Idle => RecorderStatus::Idle,
            Phase::RequestingPermission => RecorderStatus::RequestingPermission,
            Phase::Recording => RecorderStatus::Recording,
            Phase::Processing => RecorderStatus::Processing,
            Phase::Ready => RecorderStatus::Ready,
            Phase::Error => match self.session.failure {
                Some(FailureKind::PermissionDenied) => RecorderStatus::PermissionDenied,
                _ => RecorderStatus::DeviceError,
            },
        }
    }

    /// Localized text for the current status.
    pub fn status_text(&self) -> &'static str {
        self.locale.recorder_status_text(self.status())
    }

    /// The assembled artifact, when the session is `Ready`.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.session.artifact.as_ref()
    }

    /// Mutable access for spooling the artifact to disk.
    pub fn artifact_mut(&mut self) -> Option<&mut Artifact> {
        self.session.artifact.as_mut()
    }

    fn dispatch(&mut self, event: RecorderEvent) {
        let (next, effects) = reduce(&self.session, event);
        if next != self.session.phase {
            log::info!(
                "Recorder[{}]: {:?} -> {:?}",
                self.locale,
                self.session.phase,
                next
            );
        }
        self.session.phase = next;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestAccess { take } => {
                self.session.take = Some(take);
                self.session.format = NegotiatedFormat::default();
                self.session.failure = None;
                self.gateway.request_access(take);
            }
            Effect::NegotiateFormat => {
                self.session.format = negotiate(self.gateway.as_ref());
                log::info!(
                    "Recorder[{}]: session format {} (.{})",
                    self.locale,
                    self.session.format.mime_or_default(),
                    self.session.format.extension
                );
            }
            Effect::BeginCapture => {
                if let Some(take) = self.session.take {
                    self.gateway.begin_capture(take);
                }
            }
            Effect::EndCapture => {
                if let Some(take) = self.session.take {
                    self.gateway.end_capture(take);
                }
            }
            Effect::ReleaseDevice => {
                if let Some(take) = self.session.take {
                    self.gateway.release(take);
                }
            }
            Effect::BufferChunk { bytes } => {
                // Zero-length deliveries do not count as captured data.
                if !bytes.is_empty() {
                    self.session.chunks.push(bytes);
                }
            }
            Effect::DiscardChunks => {
                self.session.chunks.clear();
            }
            Effect::DiscardArtifact => {
                if let Some(artifact) = self.session.artifact.take() {
                    artifact.release();
                }
            }
            Effect::AssembleArtifact => {
                let chunks = std::mem::take(&mut self.session.chunks);
                if let Some(previous) = self.session.artifact.take() {
                    previous.release();
                }
                let artifact = Artifact::assemble(chunks, &self.session.format, self.locale);
                log::info!(
                    "Recorder[{}]: artifact ready ({} bytes, {})",
                    self.locale,
                    artifact.bytes().len(),
                    artifact.filename()
                );
                self.session.artifact = Some(artifact);
            }
            Effect::NoteFailure { kind } => {
                self.session.failure = Some(kind);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::gateway::{event_channel, StubCall, StubGateway};
    use crate::recorder::state_machine::AccessFailureKind;
    use uuid::Uuid;

    fn controller_with(stub: StubGateway, events: EventReceiver) -> RecorderController {
        RecorderController::new(Locale::En, Box::new(stub), events)
    }

    #[test]
    fn construction_probe_failure_is_terminal() {
        let (tx, rx) = event_channel();
        let mut controller = controller_with(StubGateway::new(tx).unsupported(), rx);
        assert_eq!(controller.status(), RecorderStatus::Unsupported);
        assert_eq!(controller.start(), RecorderStatus::Unsupported);
        assert_eq!(controller.set_active(true), RecorderStatus::Unsupported);
    }

    #[test]
    fn full_take_produces_a_ready_artifact() {
        let (tx, rx) = event_channel();
        let stub = StubGateway::new(tx)
            .with_formats(["audio/ogg"])
            .with_flush_chunks([vec![1, 2], vec![3]]);
        let calls = stub.call_log();
        let held = stub.held_take();
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        assert_eq!(controller.start(), RecorderStatus::Recording);
        assert_eq!(controller.stop(), RecorderStatus::Ready);

        let artifact = controller.artifact().expect("artifact assembled");
        assert_eq!(artifact.bytes(), &[1, 2, 3]);
        assert_eq!(artifact.mime(), "audio/ogg");
        assert!(artifact.filename().ends_with(".ogg"));

        // The hardware handle was released after the flush.
        assert_eq!(*held.lock().unwrap(), None);
        let calls = calls.lock().unwrap();
        assert!(matches!(calls.last(), Some(StubCall::Release(_))));
    }

    #[test]
    fn second_start_does_not_acquire_a_second_device() {
        let (tx, rx) = event_channel();
        let stub = StubGateway::new(tx);
        let calls = stub.call_log();
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        controller.start();
        assert_eq!(controller.status(), RecorderStatus::Recording);
        assert_eq!(controller.start(), RecorderStatus::Recording);

        let requests = calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, StubCall::RequestAccess(_)))
            .count();
        assert_eq!(requests, 1);
    }

    #[test]
    fn denied_access_surfaces_the_permission_status_and_allows_retry() {
        let (tx, rx) = event_channel();
        let stub = StubGateway::new(tx).deny(AccessFailureKind::PermissionDenied);
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        assert_eq!(controller.start(), RecorderStatus::PermissionDenied);
        assert_eq!(
            controller.status_text(),
            Locale::En.recorder_status_text(RecorderStatus::PermissionDenied)
        );

        // Retry goes straight back through the permission request.
        assert_eq!(controller.start(), RecorderStatus::PermissionDenied);
        assert_eq!(controller.phase(), Phase::Error);
    }

    #[test]
    fn stop_without_data_is_a_device_error() {
        let (tx, rx) = event_channel();
        let mut controller = controller_with(StubGateway::new(tx), rx);

        controller.set_active(true);
        controller.start();
        assert_eq!(controller.stop(), RecorderStatus::DeviceError);
        assert!(controller.artifact().is_none());
    }

    #[test]
    fn deactivation_mid_capture_discards_everything_and_releases_the_device() {
        let (tx, rx) = event_channel();
        let stub = StubGateway::new(tx).with_flush_chunks([vec![1]]);
        let held = stub.held_take();
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        controller.start();
        assert_eq!(controller.status(), RecorderStatus::Recording);

        assert_eq!(controller.set_active(false), RecorderStatus::Inactive);
        assert!(controller.artifact().is_none());
        assert_eq!(*held.lock().unwrap(), None);

        // Reactivation starts over from Idle.
        assert_eq!(controller.set_active(true), RecorderStatus::Idle);
    }

    #[test]
    fn restart_from_ready_discards_the_previous_artifact() {
        let (tx, rx) = event_channel();
        let stub = StubGateway::new(tx).with_flush_chunks([vec![5]]);
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        controller.start();
        controller.stop();
        assert_eq!(controller.status(), RecorderStatus::Ready);

        // The flush queue is empty now, so the second take captures nothing,
        // but the first artifact must already be gone when recording starts.
        assert_eq!(controller.start(), RecorderStatus::Recording);
        assert!(controller.artifact().is_none());
    }

    #[test]
    fn device_error_mid_capture_lands_in_error_and_releases() {
        let (tx, rx) = event_channel();
        // Keep a sender: failures are injected through the same channel the
        // gateway reports on.
        let injector = tx.clone();
        let stub = StubGateway::new(tx);
        let held = stub.held_take();
        let mut controller = controller_with(stub, rx);

        controller.set_active(true);
        controller.start();
        let take = current_take(&controller);

        injector
            .send(RecorderEvent::CaptureFailed {
                take,
                message: "stream died".into(),
            })
            .unwrap();
        assert_eq!(controller.pump(), RecorderStatus::DeviceError);
        assert_eq!(*held.lock().unwrap(), None);
        assert!(controller.artifact().is_none());
    }

    fn current_take(controller: &RecorderController) -> Uuid {
        controller.session.take.expect("active take")
    }
}
