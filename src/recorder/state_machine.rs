//! Recording controller state machine.
//!
//! All transitions go through the `reduce()` function, which takes the
//! current session and an event and returns the next phase plus a list of
//! effects for the controller to execute. The function is pure, so every
//! transition is testable without a capture device.

use uuid::Uuid;

use super::artifact::Artifact;
use super::format::NegotiatedFormat;

/// Phases of a per-locale recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Capture is impossible on this platform. Terminal for the instance.
    Unsupported,
    /// No active plan; capture controls are disabled.
    Inactive,
    /// Plan active, nothing recorded yet.
    Idle,
    /// Device access requested, waiting for the grant or denial.
    RequestingPermission,
    /// Capture running; chunks accumulate.
    Recording,
    /// Stop issued, waiting for the final data flush.
    Processing,
    /// Artifact assembled and available for playback/download.
    Ready,
    /// A failure was captured. Recoverable by retrying start.
    Error,
}

/// Why the session failed. Drives the status signal shown for `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    PermissionDenied,
    DeviceError,
    /// The capture stopped without delivering any data.
    NoData,
}

/// How a device-access request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFailureKind {
    PermissionDenied,
    DeviceUnavailable,
    Other,
}

impl From<AccessFailureKind> for FailureKind {
    fn from(kind: AccessFailureKind) -> Self {
        match kind {
            AccessFailureKind::PermissionDenied => FailureKind::PermissionDenied,
            AccessFailureKind::DeviceUnavailable | AccessFailureKind::Other => {
                FailureKind::DeviceError
            }
        }
    }
}

/// Events that can trigger state transitions: user actions, presenter
/// activation toggles, and push notifications from the capture gateway.
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// User pressed start.
    StartPressed,
    /// User pressed stop.
    StopPressed,
    /// Presenter toggled plan availability.
    SetActive { active: bool },

    // Gateway events. Each carries the take id it belongs to; events from a
    // superseded take are dropped.
    AccessGranted { take: Uuid },
    AccessDenied { take: Uuid, kind: AccessFailureKind },
    ChunkCaptured { take: Uuid, bytes: Vec<u8> },
    CaptureStopped { take: Uuid },
    CaptureFailed { take: Uuid, message: String },
}

/// Effects to be executed by the controller after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the gateway for device access under a fresh take id.
    RequestAccess { take: Uuid },
    /// Pick the session encoding from the gateway's capabilities.
    NegotiateFormat,
    /// Start pulling data from the granted device session.
    BeginCapture,
    /// Ask the device session to flush and stop.
    EndCapture,
    /// Drop the hardware handle.
    ReleaseDevice,
    /// Append a captured chunk to the session buffer.
    BufferChunk { bytes: Vec<u8> },
    /// Drop all buffered chunks.
    DiscardChunks,
    /// Release any previously produced artifact.
    DiscardArtifact,
    /// Assemble buffered chunks into a new artifact.
    AssembleArtifact,
    /// Record the failure cause for status reporting.
    NoteFailure { kind: FailureKind },
}

/// The per-locale recording session the controller owns.
#[derive(Debug)]
pub struct RecorderSession {
    pub(crate) phase: Phase,
    /// Current take id; gateway events for any other id are stale.
    pub(crate) take: Option<Uuid>,
    pub(crate) chunks: Vec<Vec<u8>>,
    pub(crate) format: NegotiatedFormat,
    pub(crate) artifact: Option<Artifact>,
    pub(crate) failure: Option<FailureKind>,
}

impl RecorderSession {
    pub(crate) fn new(supported: bool) -> Self {
        Self {
            phase: if supported {
                Phase::Inactive
            } else {
                Phase::Unsupported
            },
            take: None,
            chunks: Vec::new(),
            format: NegotiatedFormat::default(),
            artifact: None,
            failure: None,
        }
    }
}

/// Reducer function: (session, event) -> (next_phase, effects).
///
/// Key rules:
/// - Never mutate the session here; the controller applies effects.
/// - Drop gateway events whose take id does not match the session.
/// - The hardware handle is released on every path that leaves
///   `RequestingPermission`/`Recording`/`Processing`.
pub fn reduce(session: &RecorderSession, event: RecorderEvent) -> (Phase, Vec<Effect>) {
    use Effect::*;
    use RecorderEvent::*;

    let is_current = |take: Uuid| session.take == Some(take);

    match (session.phase, event) {
        // -----------------
        // Unsupported: terminal for the instance
        // -----------------
        (Phase::Unsupported, _) => (Phase::Unsupported, vec![]),

        // -----------------
        // Activation toggles from the presenter
        // -----------------
        (Phase::Inactive, SetActive { active: true }) => (Phase::Idle, vec![]),
        (Phase::Recording, SetActive { active: false }) => (
            Phase::Inactive,
            vec![EndCapture, ReleaseDevice, DiscardChunks, DiscardArtifact],
        ),
        (Phase::RequestingPermission | Phase::Processing, SetActive { active: false }) => (
            Phase::Inactive,
            // Release covers a grant that lands between the toggle and the
            // denial/stop notification.
            vec![ReleaseDevice, DiscardChunks, DiscardArtifact],
        ),
        (Phase::Idle | Phase::Ready | Phase::Error, SetActive { active: false }) => {
            (Phase::Inactive, vec![DiscardChunks, DiscardArtifact])
        }
        (phase, SetActive { .. }) => (phase, vec![]),

        // -----------------
        // Start requests
        // -----------------
        (Phase::Idle | Phase::Ready | Phase::Error, StartPressed) => {
            let take = Uuid::new_v4();
            (
                Phase::RequestingPermission,
                vec![DiscardArtifact, DiscardChunks, RequestAccess { take }],
            )
        }
        // The session is exclusive: a start while one is already underway is
        // a no-op, and no second device resource is acquired.
        (
            Phase::RequestingPermission | Phase::Recording | Phase::Processing | Phase::Inactive,
            StartPressed,
        ) => (session.phase, vec![]),

        // -----------------
        // Stop requests
        // -----------------
        (Phase::Recording, StopPressed) => (Phase::Processing, vec![EndCapture]),
        (phase, StopPressed) => (phase, vec![]),

        // -----------------
        // Access outcome
        // -----------------
        (Phase::RequestingPermission, AccessGranted { take }) if is_current(take) => {
            (Phase::Recording, vec![NegotiateFormat, BeginCapture])
        }
        (Phase::RequestingPermission, AccessDenied { take, kind }) if is_current(take) => (
            Phase::Error,
            vec![ReleaseDevice, NoteFailure { kind: kind.into() }],
        ),
        // A grant that raced a deactivation: hand the device straight back.
        (Phase::Inactive, AccessGranted { take }) if is_current(take) => {
            (Phase::Inactive, vec![ReleaseDevice])
        }

        // -----------------
        // Data delivery
        // -----------------
        (Phase::Recording, ChunkCaptured { take, bytes }) if is_current(take) => {
            (Phase::Recording, vec![BufferChunk { bytes }])
        }
        // Final flush after a stop was issued.
        (Phase::Processing, ChunkCaptured { take, bytes }) if is_current(take) => {
            (Phase::Processing, vec![BufferChunk { bytes }])
        }

        // -----------------
        // Capture termination
        // -----------------
        // Device-initiated stop: enter Processing and ask the gateway to
        // flush; it answers with another stop notification.
        (Phase::Recording, CaptureStopped { take }) if is_current(take) => {
            (Phase::Processing, vec![EndCapture])
        }
        (Phase::Processing, CaptureStopped { take }) if is_current(take) => {
            if session.chunks.is_empty() {
                (
                    Phase::Error,
                    vec![
                        ReleaseDevice,
                        DiscardChunks,
                        NoteFailure {
                            kind: FailureKind::NoData,
                        },
                    ],
                )
            } else {
                (Phase::Ready, vec![ReleaseDevice, AssembleArtifact])
            }
        }

        // -----------------
        // Device errors
        // -----------------
        (
            Phase::RequestingPermission | Phase::Recording | Phase::Processing,
            CaptureFailed { take, .. },
        ) if is_current(take) => (
            Phase::Error,
            vec![
                ReleaseDevice,
                DiscardChunks,
                NoteFailure {
                    kind: FailureKind::DeviceError,
                },
            ],
        ),

        // -----------------
        // Stale or unhandled events: no transition
        // -----------------
        _ => (session.phase, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(phase: Phase) -> RecorderSession {
        let mut session = RecorderSession::new(true);
        session.phase = phase;
        if !matches!(phase, Phase::Inactive | Phase::Idle) {
            session.take = Some(Uuid::new_v4());
        }
        session
    }

    fn current_take(session: &RecorderSession) -> Uuid {
        session.take.expect("session has a take")
    }

    #[test]
    fn idle_start_requests_access() {
        let (next, effects) = reduce(&session_in(Phase::Idle), RecorderEvent::StartPressed);
        assert_eq!(next, Phase::RequestingPermission);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::RequestAccess { .. })));
        // Any prior output is cleared before the new attempt.
        assert!(effects.contains(&Effect::DiscardArtifact));
        assert!(effects.contains(&Effect::DiscardChunks));
    }

    #[test]
    fn second_start_while_recording_is_a_no_op() {
        let (next, effects) = reduce(&session_in(Phase::Recording), RecorderEvent::StartPressed);
        assert_eq!(next, Phase::Recording);
        assert!(effects.is_empty());
    }

    #[test]
    fn concurrent_start_while_requesting_is_a_no_op() {
        let session = session_in(Phase::RequestingPermission);
        let (next, effects) = reduce(&session, RecorderEvent::StartPressed);
        assert_eq!(next, Phase::RequestingPermission);
        assert!(effects.is_empty());
    }

    #[test]
    fn grant_starts_capture_after_format_negotiation() {
        let session = session_in(Phase::RequestingPermission);
        let take = current_take(&session);
        let (next, effects) = reduce(&session, RecorderEvent::AccessGranted { take });
        assert_eq!(next, Phase::Recording);
        assert_eq!(effects, vec![Effect::NegotiateFormat, Effect::BeginCapture]);
    }

    #[test]
    fn denial_lands_in_error_with_the_permission_cause() {
        let session = session_in(Phase::RequestingPermission);
        let take = current_take(&session);
        let (next, effects) = reduce(
            &session,
            RecorderEvent::AccessDenied {
                take,
                kind: AccessFailureKind::PermissionDenied,
            },
        );
        assert_eq!(next, Phase::Error);
        assert!(effects.contains(&Effect::ReleaseDevice));
        assert!(effects.contains(&Effect::NoteFailure {
            kind: FailureKind::PermissionDenied
        }));
    }

    #[test]
    fn stale_grant_is_ignored() {
        let session = session_in(Phase::RequestingPermission);
        let (next, effects) = reduce(
            &session,
            RecorderEvent::AccessGranted {
                take: Uuid::new_v4(),
            },
        );
        assert_eq!(next, Phase::RequestingPermission);
        assert!(effects.is_empty());
    }

    #[test]
    fn stop_with_zero_chunks_is_an_error_not_ready() {
        let session = session_in(Phase::Processing);
        let take = current_take(&session);
        let (next, effects) = reduce(&session, RecorderEvent::CaptureStopped { take });
        assert_eq!(next, Phase::Error);
        assert!(effects.contains(&Effect::NoteFailure {
            kind: FailureKind::NoData
        }));
        assert!(effects.contains(&Effect::ReleaseDevice));
        assert!(!effects.contains(&Effect::AssembleArtifact));
    }

    #[test]
    fn stop_with_buffered_chunks_releases_the_device_before_assembly() {
        let mut session = session_in(Phase::Processing);
        session.chunks.push(vec![1, 2, 3]);
        let take = current_take(&session);
        let (next, effects) = reduce(&session, RecorderEvent::CaptureStopped { take });
        assert_eq!(next, Phase::Ready);
        assert_eq!(effects, vec![Effect::ReleaseDevice, Effect::AssembleArtifact]);
    }

    #[test]
    fn device_initiated_stop_flushes_through_processing() {
        let session = session_in(Phase::Recording);
        let take = current_take(&session);
        let (next, effects) = reduce(&session, RecorderEvent::CaptureStopped { take });
        assert_eq!(next, Phase::Processing);
        assert_eq!(effects, vec![Effect::EndCapture]);
    }

    #[test]
    fn deactivating_while_recording_releases_and_discards_everything() {
        let session = session_in(Phase::Recording);
        let (next, effects) = reduce(&session, RecorderEvent::SetActive { active: false });
        assert_eq!(next, Phase::Inactive);
        assert!(effects.contains(&Effect::EndCapture));
        assert!(effects.contains(&Effect::ReleaseDevice));
        assert!(effects.contains(&Effect::DiscardChunks));
        assert!(effects.contains(&Effect::DiscardArtifact));
    }

    #[test]
    fn reactivation_starts_from_idle() {
        let (next, effects) = reduce(
            &session_in(Phase::Inactive),
            RecorderEvent::SetActive { active: true },
        );
        assert_eq!(next, Phase::Idle);
        assert!(effects.is_empty());
    }

    #[test]
    fn grant_racing_a_deactivation_hands_the_device_back() {
        let mut session = session_in(Phase::Inactive);
        let take = Uuid::new_v4();
        session.take = Some(take);
        let (next, effects) = reduce(&session, RecorderEvent::AccessGranted { take });
        assert_eq!(next, Phase::Inactive);
        assert_eq!(effects, vec![Effect::ReleaseDevice]);
    }

    #[test]
    fn device_error_during_capture_releases_and_notes_the_cause() {
        let session = session_in(Phase::Recording);
        let take = current_take(&session);
        let (next, effects) = reduce(
            &session,
            RecorderEvent::CaptureFailed {
                take,
                message: "stream died".into(),
            },
        );
        assert_eq!(next, Phase::Error);
        assert!(effects.contains(&Effect::ReleaseDevice));
        assert!(effects.contains(&Effect::NoteFailure {
            kind: FailureKind::DeviceError
        }));
    }

    #[test]
    fn retry_from_error_requests_access_again() {
        let (next, effects) = reduce(&session_in(Phase::Error), RecorderEvent::StartPressed);
        assert_eq!(next, Phase::RequestingPermission);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::RequestAccess { .. })));
    }

    #[test]
    fn unsupported_ignores_every_event() {
        let session = RecorderSession::new(false);
        for event in [
            RecorderEvent::StartPressed,
            RecorderEvent::StopPressed,
            RecorderEvent::SetActive { active: true },
        ] {
            let (next, effects) = reduce(&session, event);
            assert_eq!(next, Phase::Unsupported);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn chunks_are_buffered_only_for_the_current_take() {
        let session = session_in(Phase::Recording);
        let take = current_take(&session);

        let (_, effects) = reduce(
            &session,
            RecorderEvent::ChunkCaptured {
                take,
                bytes: vec![7],
            },
        );
        assert_eq!(effects, vec![Effect::BufferChunk { bytes: vec![7] }]);

        let (_, stale) = reduce(
            &session,
            RecorderEvent::ChunkCaptured {
                take: Uuid::new_v4(),
                bytes: vec![9],
            },
        );
        assert!(stale.is_empty());
    }
}
