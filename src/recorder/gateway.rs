//! Capture device gateway.
//!
//! Abstracts "request microphone access", "start/stop capture", and the
//! push-based delivery of data chunks and terminal notifications. Outcomes
//! are never returned from the trait methods; they arrive as events on the
//! channel the gateway was constructed with, so the controller observes
//! grants, data, and failures in a single ordered stream.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use hound::{WavSpec, WavWriter};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::state_machine::{AccessFailureKind, RecorderEvent};

pub type EventSender = mpsc::UnboundedSender<RecorderEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<RecorderEvent>;

/// Channel carrying gateway events to a controller.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Capability surface of a platform capture device.
///
/// `end_capture` always answers with a `CaptureStopped` event, even if the
/// underlying session already ended, so a stop request can never hang the
/// state machine. `release` is idempotent.
pub trait CaptureGateway {
    /// Whether capture is possible at all. Checked once at construction.
    fn is_supported(&self) -> bool;

    /// Whether the device can produce this encoding.
    fn is_format_supported(&self, mime: &str) -> bool;

    /// The encoding the device produces when none of the candidates matched.
    fn default_encoding(&self) -> Option<String>;

    /// Ask for device access under `take`. Answers with `AccessGranted` or
    /// `AccessDenied`.
    fn request_access(&mut self, take: Uuid);

    /// Start pulling data from a granted session.
    fn begin_capture(&mut self, take: Uuid);

    /// Flush and stop the session. Data still buffered arrives as
    /// `ChunkCaptured` events before the final `CaptureStopped`.
    fn end_capture(&mut self, take: Uuid);

    /// Drop the hardware handle for `take`, if still held.
    fn release(&mut self, take: Uuid);
}

// ---------------------------------------------------------------------------
// Microphone gateway backed by cpal
// ---------------------------------------------------------------------------

/// Capture gateway over the default system input device.
///
/// Samples accumulate on the audio thread; `end_capture` finalizes the take
/// into a single WAV-encoded buffer delivered as one chunk. The gateway
/// supports none of the compressed candidate encodings, so negotiation falls
/// back to its default.
pub struct CpalGateway {
    events: EventSender,
    active: Option<ActiveTake>,
}

struct ActiveTake {
    take: Uuid,
    device: cpal::Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<cpal::Stream>,
    samples: Arc<Mutex<Vec<i16>>>,
    stopped: bool,
}

impl CpalGateway {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            active: None,
        }
    }

    fn build_stream(
        &self,
        take: Uuid,
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        samples: Arc<Mutex<Vec<i16>>>,
    ) -> Result<cpal::Stream, String> {
        match sample_format {
            SampleFormat::I16 => self.build_stream_typed::<i16>(take, device, config, samples),
            SampleFormat::U16 => self.build_stream_typed::<u16>(take, device, config, samples),
            SampleFormat::F32 => self.build_stream_typed::<f32>(take, device, config, samples),
            other => Err(format!("Unsupported sample format: {:?}", other)),
        }
    }

    fn build_stream_typed<T>(
        &self,
        take: Uuid,
        device: &cpal::Device,
        config: &StreamConfig,
        samples: Arc<Mutex<Vec<i16>>>,
    ) -> Result<cpal::Stream, String>
    where
        T: cpal::Sample<Float = f32> + cpal::SizedSample + Send + 'static,
    {
        let error_events = self.events.clone();
        let err_fn = move |err: cpal::StreamError| {
            log::error!("Audio stream error: {}", err);
            let _ = error_events.send(RecorderEvent::CaptureFailed {
                take,
                message: err.to_string(),
            });
        };

        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let mut buffer = samples.lock().unwrap();
                    buffer.extend(data.iter().map(|&sample| sample_to_i16(sample)));
                },
                err_fn,
                None,
            )
            .map_err(|e| e.to_string())
    }
}

impl CaptureGateway for CpalGateway {
    fn is_supported(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn is_format_supported(&self, mime: &str) -> bool {
        matches!(mime, "audio/wav" | "audio/x-wav")
    }

    fn default_encoding(&self) -> Option<String> {
        Some("audio/wav".to_string())
    }

    fn request_access(&mut self, take: Uuid) {
        if self.active.is_some() {
            log::warn!("Capture: access requested while a take is still held");
            self.active = None;
        }

        let host = cpal::default_host();
        let Some(device) = host.default_input_device() else {
            let _ = self.events.send(RecorderEvent::AccessDenied {
                take,
                kind: AccessFailureKind::DeviceUnavailable,
            });
            return;
        };

        let supported = match device.default_input_config() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Capture: no usable input config: {}", e);
                let _ = self.events.send(RecorderEvent::AccessDenied {
                    take,
                    kind: AccessFailureKind::Other,
                });
                return;
            }
        };

        log::info!(
            "Capture: using input device {:?} ({} Hz, {} channels, {:?})",
            device.name(),
            supported.sample_rate().0,
            supported.channels(),
            supported.sample_format()
        );

        self.active = Some(ActiveTake {
            take,
            sample_format: supported.sample_format(),
            config: supported.into(),
            device,
            stream: None,
            samples: Arc::new(Mutex::new(Vec::new())),
            stopped: false,
        });
        let _ = self.events.send(RecorderEvent::AccessGranted { take });
    }

    fn begin_capture(&mut self, take: Uuid) {
        let Some(active) = self.active.as_ref() else {
            let _ = self.events.send(RecorderEvent::CaptureFailed {
                take,
                message: "No granted device session".to_string(),
            });
            return;
        };
        if active.take != take {
            return;
        }

        let stream = self.build_stream(
            take,
            &active.device,
            &active.config,
            active.sample_format,
            Arc::clone(&active.samples),
        );

        // Re-borrow mutably once the stream exists; `active` above was shared.
        let Some(active) = self.active.as_mut() else {
            return;
        };
        match stream.and_then(|s| s.play().map_err(|e| e.to_string()).map(|_| s)) {
            Ok(stream) => {
                active.stream = Some(stream);
                log::info!("Capture: recording started");
            }
            Err(e) => {
                log::error!("Capture: failed to start stream: {}", e);
                let _ = self.events.send(RecorderEvent::CaptureFailed { take, message: e });
            }
        }
    }

    fn end_capture(&mut self, take: Uuid) {
        let Some(active) = self.active.as_mut() else {
            let _ = self.events.send(RecorderEvent::CaptureStopped { take });
            return;
        };
        if active.take != take {
            return;
        }

        // Dropping the stream stops the audio-thread callbacks.
        active.stream = None;

        if !active.stopped {
            active.stopped = true;
            let samples = std::mem::take(&mut *active.samples.lock().unwrap());
            if !samples.is_empty() {
                match encode_wav(&samples, active.config.channels, active.config.sample_rate.0) {
                    Ok(bytes) => {
                        log::info!(
                            "Capture: take finalized ({} samples, {} bytes)",
                            samples.len(),
                            bytes.len()
                        );
                        let _ = self
                            .events
                            .send(RecorderEvent::ChunkCaptured { take, bytes });
                    }
                    Err(e) => {
                        log::error!("Capture: failed to encode take: {}", e);
                        let _ = self.events.send(RecorderEvent::CaptureFailed {
                            take,
                            message: e.to_string(),
                        });
                        return;
                    }
                }
            }
        }

        let _ = self.events.send(RecorderEvent::CaptureStopped { take });
    }

    fn release(&mut self, take: Uuid) {
        if self.active.as_ref().is_some_and(|a| a.take == take) {
            self.active = None;
            log::debug!("Capture: device released for take {}", take);
        }
    }
}

/// Encode captured samples as an in-memory WAV file.
fn encode_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

/// Convert any sample type to i16 for WAV writing.
fn sample_to_i16<T>(sample: T) -> i16
where
    T: cpal::Sample<Float = f32>,
{
    let clamped = sample.to_float_sample().clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

// ---------------------------------------------------------------------------
// Scripted gateway for tests and headless embeddings
// ---------------------------------------------------------------------------

/// Calls a `StubGateway` has observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCall {
    RequestAccess(Uuid),
    BeginCapture(Uuid),
    EndCapture(Uuid),
    Release(Uuid),
}

/// Gateway double with scripted outcomes. Grants by default; `deny` flips
/// the access outcome, `with_flush_chunks` queues the data delivered on the
/// first stop.
pub struct StubGateway {
    events: EventSender,
    supported: bool,
    formats: Vec<String>,
    default_encoding: Option<String>,
    denial: Option<AccessFailureKind>,
    flush_chunks: Vec<Vec<u8>>,
    calls: Arc<Mutex<Vec<StubCall>>>,
    held: Arc<Mutex<Option<Uuid>>>,
}

impl StubGateway {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            supported: true,
            formats: Vec::new(),
            default_encoding: None,
            denial: None,
            flush_chunks: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            held: Arc::new(Mutex::new(None)),
        }
    }

    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_encoding(mut self, mime: impl Into<String>) -> Self {
        self.default_encoding = Some(mime.into());
        self
    }

    pub fn deny(mut self, kind: AccessFailureKind) -> Self {
        self.denial = Some(kind);
        self
    }

    pub fn with_flush_chunks<I>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.flush_chunks = chunks.into_iter().collect();
        self
    }

    /// Shared view of the observed calls; survives the controller taking
    /// ownership of the gateway.
    pub fn call_log(&self) -> Arc<Mutex<Vec<StubCall>>> {
        Arc::clone(&self.calls)
    }

    /// Shared view of the currently held take, if any.
    pub fn held_take(&self) -> Arc<Mutex<Option<Uuid>>> {
        Arc::clone(&self.held)
    }

    fn record(&self, call: StubCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CaptureGateway for StubGateway {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn is_format_supported(&self, mime: &str) -> bool {
        self.formats.iter().any(|f| f == mime)
    }

    fn default_encoding(&self) -> Option<String> {
        self.default_encoding.clone()
    }

    fn request_access(&mut self, take: Uuid) {
        self.record(StubCall::RequestAccess(take));
        match self.denial {
            Some(kind) => {
                let _ = self.events.send(RecorderEvent::AccessDenied { take, kind });
            }
            None => {
                *self.held.lock().unwrap() = Some(take);
                let _ = self.events.send(RecorderEvent::AccessGranted { take });
            }
        }
    }

    fn begin_capture(&mut self, take: Uuid) {
        self.record(StubCall::BeginCapture(take));
    }

    fn end_capture(&mut self, take: Uuid) {
        self.record(StubCall::EndCapture(take));
        for bytes in std::mem::take(&mut self.flush_chunks) {
            let _ = self.events.send(RecorderEvent::ChunkCaptured { take, bytes });
        }
        let _ = self.events.send(RecorderEvent::CaptureStopped { take });
    }

    fn release(&mut self, take: Uuid) {
        self.record(StubCall::Release(take));
        let mut held = self.held.lock().unwrap();
        if *held == Some(take) {
            *held = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_produces_a_riff_header() {
        let bytes = encode_wav(&[0, 1, -1, i16::MAX], 1, 16_000).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }

    #[test]
    fn sample_conversion_clamps_to_i16_range() {
        assert_eq!(sample_to_i16(0.0f32), 0);
        assert_eq!(sample_to_i16(1.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-1.0f32), -i16::MAX);
        assert_eq!(sample_to_i16(2.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-2.0f32), -i16::MAX);
    }

    #[test]
    fn stub_grants_then_releases_the_take() {
        let (tx, mut rx) = event_channel();
        let mut stub = StubGateway::new(tx);
        let take = Uuid::new_v4();

        stub.request_access(take);
        assert!(matches!(
            rx.try_recv(),
            Ok(RecorderEvent::AccessGranted { take: t }) if t == take
        ));
        assert_eq!(*stub.held_take().lock().unwrap(), Some(take));

        stub.release(take);
        assert_eq!(*stub.held_take().lock().unwrap(), None);
    }

    #[test]
    fn stub_flush_chunks_arrive_before_the_stop_notification() {
        let (tx, mut rx) = event_channel();
        let mut stub = StubGateway::new(tx).with_flush_chunks([vec![1], vec![2]]);
        let take = Uuid::new_v4();

        stub.end_capture(take);
        assert!(matches!(rx.try_recv(), Ok(RecorderEvent::ChunkCaptured { .. })));
        assert!(matches!(rx.try_recv(), Ok(RecorderEvent::ChunkCaptured { .. })));
        assert!(matches!(rx.try_recv(), Ok(RecorderEvent::CaptureStopped { .. })));
    }
}
