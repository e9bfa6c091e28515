use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::audio_stats::{AudioLevels, EngineDiagnostics};
use crate::models::batch::{BatchOrigin, PcmBatch};
use crate::models::config::CaptureConfig;
use crate::models::error::{CaptureError, ErrorStage};
use crate::models::recording_result::RecordingResult;
use crate::models::state::{CaptureMode, CaptureState};
use crate::processing::batch_store::BatchStore;
use crate::processing::gain::GainStage;
use crate::processing::wav_format::{self, WavEncoder};
use crate::storage::{metadata, wav_writer};
use crate::traits::capture_source::{BatchSink, CaptureSource, FaultCallback, SampleCallback};
use crate::traits::engine_delegate::{EngineDelegate, FallbackNotice};

/// Internal mutable session state, shared with the capture callbacks.
struct SessionShared {
    state: CaptureState,
    levels: AudioLevels,
    diagnostics: EngineDiagnostics,
    sample_rate: Option<u32>,
    started_wall: Option<DateTime<Utc>>,
    stopped_wall: Option<DateTime<Utc>>,
    started_instant: Option<Instant>,
    pending_fault: Option<CaptureError>,
}

impl SessionShared {
    fn new() -> Self {
        Self {
            state: CaptureState::Uninitialized,
            levels: AudioLevels::default(),
            diagnostics: EngineDiagnostics::default(),
            sample_rate: None,
            started_wall: None,
            stopped_wall: None,
            started_instant: None,
            pending_fault: None,
        }
    }
}

/// Microphone capture engine.
///
/// Generic over the realtime-callback and polling backends via the
/// `CaptureSource` trait. Owns the session state machine, gain staging,
/// level metering, batch retention, and WAV assembly on stop.
///
/// Data flow:
/// ```text
/// [CaptureSource] → gain → levels → [BatchStore] → delegate.on_batch
///                                        │
///                     stop: concat / streaming encoder → WAV container
/// ```
///
/// The mode is selected once at `initialize`: realtime when the caller
/// prefers it and the source is present and available, polling otherwise.
/// A realtime failure at or after start degrades to polling without
/// failing the recording.
pub struct CaptureEngine<R: CaptureSource, P: CaptureSource> {
    realtime: Option<R>,
    polling: P,
    config: Option<CaptureConfig>,
    mode: Option<CaptureMode>,
    gain: GainStage,
    shared: Arc<Mutex<SessionShared>>,
    store: Arc<Mutex<BatchStore>>,
    poll_encoder: Arc<Mutex<Option<WavEncoder>>>,
    delegate: Option<Arc<dyn EngineDelegate>>,
}

impl<R: CaptureSource, P: CaptureSource> CaptureEngine<R, P> {
    pub fn new(realtime: Option<R>, polling: P) -> Self {
        Self {
            realtime,
            polling,
            config: None,
            mode: None,
            gain: GainStage::default(),
            shared: Arc::new(Mutex::new(SessionShared::new())),
            store: Arc::new(Mutex::new(BatchStore::new())),
            poll_encoder: Arc::new(Mutex::new(None)),
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn EngineDelegate>) {
        self.delegate = Some(delegate);
    }

    /// Validate config and select the capture mode.
    ///
    /// Idempotent: a second call while `Initialized` is a no-op.
    pub fn initialize(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        {
            let state = &self.shared.lock().state;
            match state {
                CaptureState::Initialized => return Ok(()),
                CaptureState::Recording { .. } => {
                    return Err(CaptureError::InvalidState("initialize while recording".into()))
                }
                CaptureState::Uninitialized | CaptureState::Stopped => {}
            }
        }

        if let Err(reason) = config.validate() {
            let error = CaptureError::ConfigurationFailed(reason);
            self.emit_error(ErrorStage::Initialize, &error);
            return Err(error);
        }

        self.gain.set(config.mic_gain);

        let realtime_ready = self.realtime.as_ref().map(|r| r.is_available()).unwrap_or(false);
        let mode = if config.prefer_realtime && realtime_ready {
            CaptureMode::RealtimeCallback
        } else {
            if config.prefer_realtime {
                let cause =
                    CaptureError::BackendUnavailable("realtime capture source did not load".into());
                self.note_fallback(
                    CaptureMode::RealtimeCallback,
                    CaptureMode::Polling,
                    cause,
                    ErrorStage::Initialize,
                );
            }
            CaptureMode::Polling
        };

        self.mode = Some(mode);
        self.config = Some(config);
        self.shared.lock().state = CaptureState::Initialized;
        if let Some(delegate) = &self.delegate {
            delegate.on_initialized(mode);
        }
        log::debug!("capture engine initialized in {:?} mode", mode);
        Ok(())
    }

    /// Acquire the microphone and enter `Recording`.
    ///
    /// Retries once without the device constraint when the requested
    /// device is unavailable. A realtime source that fails to start for
    /// any reason other than denied permission degrades to polling.
    pub fn start_recording(&mut self) -> Result<(), CaptureError> {
        {
            let state = &self.shared.lock().state;
            if !state.can_start() {
                return Err(CaptureError::InvalidState(format!(
                    "start_recording from {:?}",
                    state
                )));
            }
        }
        let mode = self
            .mode
            .ok_or_else(|| CaptureError::InvalidState("engine not initialized".into()))?;
        let device_id = self.config.as_ref().and_then(|c| c.device_id.clone());

        // Fresh counters for the new take.
        self.store.lock().reset();
        *self.poll_encoder.lock() = None;
        {
            let mut shared = self.shared.lock();
            shared.levels = AudioLevels::default();
            shared.diagnostics = EngineDiagnostics::default();
            shared.sample_rate = None;
            shared.pending_fault = None;
        }

        let rate = match mode {
            CaptureMode::RealtimeCallback => {
                let origin = self
                    .realtime
                    .as_ref()
                    .map(|r| r.origin())
                    .unwrap_or(BatchOrigin::RealtimeCallback);
                let sink = self.build_sink(origin, false);
                let realtime = self.realtime.as_mut().ok_or_else(|| {
                    CaptureError::BackendUnavailable("realtime source missing".into())
                })?;
                match start_with_retry(realtime, device_id.as_deref(), sink, self.delegate.as_ref()) {
                    Ok(rate) => rate,
                    Err(CaptureError::PermissionDenied) => {
                        self.emit_error(ErrorStage::Start, &CaptureError::PermissionDenied);
                        return Err(CaptureError::PermissionDenied);
                    }
                    Err(cause) => {
                        // The realtime path failed to come up; degrade
                        // without failing the start.
                        self.note_fallback(
                            CaptureMode::RealtimeCallback,
                            CaptureMode::Polling,
                            cause,
                            ErrorStage::Start,
                        );
                        self.mode = Some(CaptureMode::Polling);
                        *self.poll_encoder.lock() = Some(WavEncoder::new());
                        let sink = self.build_sink(self.polling.origin(), true);
                        start_with_retry(
                            &mut self.polling,
                            device_id.as_deref(),
                            sink,
                            self.delegate.as_ref(),
                        )
                        .map_err(|e| {
                            self.emit_error(ErrorStage::Start, &e);
                            e
                        })?
                    }
                }
            }
            CaptureMode::Polling => {
                *self.poll_encoder.lock() = Some(WavEncoder::new());
                let sink = self.build_sink(self.polling.origin(), true);
                start_with_retry(&mut self.polling, device_id.as_deref(), sink, self.delegate.as_ref())
                    .map_err(|e| {
                        self.emit_error(ErrorStage::Start, &e);
                        e
                    })?
            }
        };

        {
            let mut shared = self.shared.lock();
            if shared.sample_rate.is_none() {
                shared.sample_rate = Some(rate);
            }
            shared.started_wall = Some(Utc::now());
            shared.stopped_wall = None;
            shared.started_instant = Some(Instant::now());
            shared.state = CaptureState::Recording { duration_secs: 0.0 };
        }
        if let Some(delegate) = &self.delegate {
            delegate.on_recording_start();
        }
        Ok(())
    }

    /// Stop the capture source and assemble the WAV container.
    ///
    /// Realtime mode concatenates the retained float batches; polling mode
    /// finalizes the streaming encoder that was fed during capture.
    pub fn stop_recording(&mut self) -> Result<RecordingResult, CaptureError> {
        {
            let state = &self.shared.lock().state;
            if !state.is_recording() {
                return Err(CaptureError::InvalidState(format!(
                    "stop_recording from {:?}",
                    state
                )));
            }
        }
        let mode = self
            .mode
            .ok_or_else(|| CaptureError::InvalidState("engine not initialized".into()))?;

        // Synchronous with delivery: once this returns no batch can land.
        self.stop_sources();

        let duration_secs = {
            let mut shared = self.shared.lock();
            shared.stopped_wall = Some(Utc::now());
            shared.state = CaptureState::Stopped;
            shared
                .started_instant
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0)
        };

        let sample_count = self.store.lock().total_samples();
        if sample_count == 0 {
            let error = CaptureError::EmptyRecording;
            self.emit_error(ErrorStage::Stop, &error);
            return Err(error);
        }

        let sample_rate = self
            .shared
            .lock()
            .sample_rate
            .or_else(|| self.config.as_ref().map(|c| c.sample_rate_hint))
            .unwrap_or(48000);

        let wav_bytes = match mode {
            CaptureMode::RealtimeCallback => {
                let take = self.store.lock().concat();
                wav_format::encode_wav_mono16(&take, sample_rate)
            }
            CaptureMode::Polling => match self.poll_encoder.lock().take() {
                Some(encoder) => encoder.finalize(sample_rate),
                None => {
                    let take = self.store.lock().concat();
                    wav_format::encode_wav_mono16(&take, sample_rate)
                }
            },
        };
        let checksum = wav_writer::sha256_hex(&wav_bytes);
        self.shared.lock().diagnostics.encoded_bytes = wav_bytes.len() as u64;

        let mut result = RecordingResult {
            id: uuid::Uuid::new_v4().to_string(),
            wav_bytes,
            file_path: None,
            duration_secs,
            sample_count,
            sample_rate,
            mode,
            checksum,
        };

        if let Some(dir) = self.config.as_ref().and_then(|c| c.output_directory.clone()) {
            let path = dir.join(format!("recording_{}.wav", result.id));
            match wav_writer::write_container(&path, &result.wav_bytes)
                .and_then(|_| metadata::write_metadata(&result.metadata(), &path))
            {
                Ok(()) => result.file_path = Some(path),
                // The in-memory container is still returned.
                Err(error) => self.emit_error(ErrorStage::Storage, &error),
            }
        }

        if let Some(delegate) = &self.delegate {
            delegate.on_recording_stop(&result);
        }
        Ok(result)
    }

    /// Clamp into [1, 6] and apply to the live gain stage. Returns the
    /// applied value.
    pub fn set_mic_gain(&mut self, gain: f32) -> f32 {
        let applied = self.gain.set(gain);
        if let Some(config) = self.config.as_mut() {
            config.mic_gain = applied;
        }
        if let Some(delegate) = &self.delegate {
            delegate.on_gain_changed(applied);
        }
        applied
    }

    /// Copy of the captured samples in `[start, start + count)`, clipped
    /// to available data; empty past the end.
    pub fn get_pcm_window(&self, start_sample: u64, count: usize) -> Vec<f32> {
        self.store.lock().window(start_sample, count)
    }

    /// Cooperative mid-recording degradation.
    ///
    /// When the realtime path has reported a fault since the last call,
    /// swaps to the polling source without losing already-captured audio.
    /// Returns whether a swap happened. Call from the owner thread's
    /// schedule; a fault on the polling path has nothing to degrade to and
    /// propagates.
    pub fn recover_if_faulted(&mut self) -> Result<bool, CaptureError> {
        let Some(cause) = self.shared.lock().pending_fault.take() else {
            return Ok(false);
        };
        if !self.shared.lock().state.is_recording() {
            return Ok(false);
        }
        let mode = self
            .mode
            .ok_or_else(|| CaptureError::InvalidState("engine not initialized".into()))?;
        if mode == CaptureMode::Polling {
            return Err(cause);
        }

        if let Some(realtime) = self.realtime.as_mut() {
            if let Err(error) = realtime.stop() {
                log::warn!("faulted realtime source stop failed: {}", error);
            }
        }
        self.note_fallback(
            CaptureMode::RealtimeCallback,
            CaptureMode::Polling,
            cause,
            ErrorStage::Capture,
        );
        self.mode = Some(CaptureMode::Polling);

        // Prime the polling container with everything captured so far, so
        // the degradation loses no audio.
        let mut encoder = WavEncoder::new();
        encoder.push_samples(&self.store.lock().concat());
        *self.poll_encoder.lock() = Some(encoder);

        let device_id = self.config.as_ref().and_then(|c| c.device_id.clone());
        let sink = self.build_sink(self.polling.origin(), true);
        start_with_retry(&mut self.polling, device_id.as_deref(), sink, self.delegate.as_ref())
            .map_err(|e| {
                self.emit_error(ErrorStage::Capture, &e);
                e
            })?;
        Ok(true)
    }

    /// Stop any active recording, release sources, clear buffers, reset to
    /// `Uninitialized`.
    pub fn dispose(&mut self) {
        if self.shared.lock().state.is_recording() {
            self.stop_sources();
        }
        self.store.lock().reset();
        *self.poll_encoder.lock() = None;
        *self.shared.lock() = SessionShared::new();
        self.config = None;
        self.mode = None;
        log::debug!("capture engine disposed");
    }

    // --- Accessors ---

    pub fn state(&self) -> CaptureState {
        let shared = self.shared.lock();
        match &shared.state {
            CaptureState::Recording { .. } => CaptureState::Recording {
                duration_secs: shared
                    .started_instant
                    .map(|t| t.elapsed().as_secs_f64())
                    .unwrap_or(0.0),
            },
            other => other.clone(),
        }
    }

    pub fn mode(&self) -> Option<CaptureMode> {
        self.mode
    }

    pub fn levels(&self) -> AudioLevels {
        self.shared.lock().levels
    }

    pub fn diagnostics(&self) -> EngineDiagnostics {
        self.shared.lock().diagnostics.clone()
    }

    pub fn total_samples(&self) -> u64 {
        self.store.lock().total_samples()
    }

    /// The rate the host actually delivers, known after start.
    pub fn sample_rate(&self) -> Option<u32> {
        self.shared.lock().sample_rate
    }

    pub fn mic_gain(&self) -> f32 {
        self.gain.get()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().started_wall
    }

    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().stopped_wall
    }

    // --- Internal helpers ---

    /// Build the delivery path for one capture source: gain staging →
    /// level metering → (polling: streaming encoder) → batch store →
    /// delegate.
    fn build_sink(&self, origin: BatchOrigin, stream_to_encoder: bool) -> BatchSink {
        let gain = self.gain.clone();
        let shared = Arc::clone(&self.shared);
        let store = Arc::clone(&self.store);
        let poll_encoder = Arc::clone(&self.poll_encoder);
        let delegate = self.delegate.clone();

        let on_samples: SampleCallback = Arc::new(move |samples: &[f32], sample_rate: u32| {
            if samples.is_empty() {
                return;
            }
            let mut owned = samples.to_vec();
            gain.apply(&mut owned);
            let levels = AudioLevels::measure(&owned);

            let first_sample = store.lock().total_samples();
            let batch = PcmBatch {
                samples: owned,
                origin,
                first_sample,
                sample_rate,
            };

            if stream_to_encoder {
                if let Some(encoder) = poll_encoder.lock().as_mut() {
                    encoder.push_samples(&batch.samples);
                }
            }

            {
                let mut shared = shared.lock();
                shared.levels = levels;
                shared.diagnostics.batch_count += 1;
                shared.diagnostics.samples_total += batch.samples.len() as u64;
                if shared.sample_rate.is_none() {
                    shared.sample_rate = Some(sample_rate);
                }
            }

            if let Some(delegate) = &delegate {
                delegate.on_batch(&batch);
                delegate.on_levels_updated(&levels);
            }
            store.lock().push(batch);
        });

        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();
        let on_fault: FaultCallback = Arc::new(move |error: CaptureError| {
            log::error!("capture fault: {}", error);
            if let Some(delegate) = &delegate {
                delegate.on_error(ErrorStage::Capture, &error);
            }
            shared.lock().pending_fault = Some(error);
        });

        BatchSink::new(on_samples, on_fault)
    }

    fn stop_sources(&mut self) {
        if let Some(realtime) = self.realtime.as_mut() {
            if let Err(error) = realtime.stop() {
                log::warn!("realtime source stop failed: {}", error);
            }
        }
        if let Err(error) = self.polling.stop() {
            log::warn!("polling source stop failed: {}", error);
        }
    }

    fn emit_error(&self, stage: ErrorStage, error: &CaptureError) {
        log::error!("capture error at {:?}: {}", stage, error);
        if let Some(delegate) = &self.delegate {
            delegate.on_error(stage, error);
        }
    }

    fn note_fallback(&self, from: CaptureMode, to: CaptureMode, cause: CaptureError, stage: ErrorStage) {
        self.shared.lock().diagnostics.fallback_count += 1;
        if let Some(delegate) = &self.delegate {
            delegate.on_error(stage, &cause);
            delegate.on_fallback(&FallbackNotice { from, to, cause });
        } else {
            log::warn!("capture fallback {:?} -> {:?}: {}", from, to, cause);
        }
    }
}

/// Start a source, retrying once without the device constraint when the
/// requested device is unavailable.
fn start_with_retry<S: CaptureSource>(
    source: &mut S,
    device_id: Option<&str>,
    sink: BatchSink,
    delegate: Option<&Arc<dyn EngineDelegate>>,
) -> Result<u32, CaptureError> {
    match source.start(device_id, sink.clone()) {
        Err(CaptureError::DeviceNotAvailable) if device_id.is_some() => {
            log::warn!("requested device unavailable, retrying with default input");
            if let Some(delegate) = delegate {
                delegate.on_error(ErrorStage::Start, &CaptureError::DeviceNotAvailable);
            }
            source.start(None, sink)
        }
        other => other,
    }
}
