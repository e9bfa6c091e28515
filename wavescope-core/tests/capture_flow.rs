//! End-to-end capture flow: engine + envelope wired through the delegate,
//! driven by scripted capture sources.

use std::sync::Mutex;
use std::sync::Arc;

use wavescope_core::{
    BatchOrigin, BatchSink, CaptureConfig, CaptureEngine, CaptureError, CaptureMode, CaptureSource,
    EngineDelegate, EnvelopeDecimator, ErrorStage, PcmBatch, RecordingResult,
};

struct ScriptedSource {
    origin: BatchOrigin,
    batches: Vec<Vec<f32>>,
    rate: u32,
    fail: bool,
}

impl ScriptedSource {
    fn new(origin: BatchOrigin, batches: Vec<Vec<f32>>) -> Self {
        Self {
            origin,
            batches,
            rate: 48000,
            fail: false,
        }
    }
}

impl CaptureSource for ScriptedSource {
    fn origin(&self) -> BatchOrigin {
        self.origin
    }

    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, _device_id: Option<&str>, sink: BatchSink) -> Result<u32, CaptureError> {
        if self.fail {
            return Err(CaptureError::BackendUnavailable("realtime module failed to load".into()));
        }
        for batch in &self.batches {
            (sink.on_samples)(batch, self.rate);
        }
        Ok(self.rate)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Feeds every accepted batch straight into an envelope decimator, the way
/// an application wires capture to its waveform view.
struct EnvelopeDelegate {
    env: Mutex<EnvelopeDecimator>,
    origins: Mutex<Vec<BatchOrigin>>,
    stopped: Mutex<Option<RecordingResult>>,
}

impl EnvelopeDelegate {
    fn new(sample_rate: u32, width: usize) -> Self {
        Self {
            env: Mutex::new(EnvelopeDecimator::new(sample_rate, width)),
            origins: Mutex::new(Vec::new()),
            stopped: Mutex::new(None),
        }
    }
}

impl EngineDelegate for EnvelopeDelegate {
    fn on_initialized(&self, _mode: CaptureMode) {}

    fn on_recording_start(&self) {}

    fn on_batch(&self, batch: &PcmBatch) {
        self.origins.lock().unwrap().push(batch.origin);
        self.env.lock().unwrap().append(&batch.samples);
    }

    fn on_recording_stop(&self, result: &RecordingResult) {
        *self.stopped.lock().unwrap() = Some(result.clone());
    }

    fn on_gain_changed(&self, _gain: f32) {}

    fn on_error(&self, _stage: ErrorStage, _error: &CaptureError) {}
}

#[test]
fn end_to_end_recording_builds_wav_and_envelope() {
    // 5120 samples at 48 kHz: silence, a +0.5 ramp, silence.
    let mut ramp = vec![0.0f32; 2048];
    for (i, sample) in ramp.iter_mut().enumerate() {
        *sample = 0.5 * i as f32 / 2048.0;
    }
    let batches = vec![vec![0.0; 2048], ramp, vec![0.0; 1024]];

    let realtime = ScriptedSource::new(BatchOrigin::RealtimeCallback, batches);
    let polling = ScriptedSource::new(BatchOrigin::Polling, vec![]);
    let mut engine = CaptureEngine::new(Some(realtime), polling);

    let delegate = Arc::new(EnvelopeDelegate::new(48000, 800));
    engine.set_delegate(Arc::clone(&delegate) as Arc<dyn EngineDelegate>);

    engine.initialize(CaptureConfig {
        sample_rate_hint: 48000,
        ..Default::default()
    })
    .unwrap();
    engine.start_recording().unwrap();
    let result = engine.stop_recording().unwrap();

    // Container size and header, field by field.
    assert_eq!(result.sample_count, 5120);
    assert_eq!(result.sample_rate, 48000);
    let wav = &result.wav_bytes;
    assert_eq!(wav.len(), 44 + 10240);

    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 10240);
    assert_eq!(&wav[8..12], b"WAVE");
    assert_eq!(&wav[12..16], b"fmt ");
    assert_eq!(u32::from_le_bytes([wav[16], wav[17], wav[18], wav[19]]), 16);
    assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 1); // PCM
    assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1); // mono
    assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 48000);
    assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 96000);
    assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 2);
    assert_eq!(u16::from_le_bytes([wav[34], wav[35]]), 16);
    assert_eq!(&wav[36..40], b"data");
    assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 10240);

    // Mid-ramp sample decodes back within one quantization step.
    let offset = 44 + 3072 * 2;
    let value = i16::from_le_bytes([wav[offset], wav[offset + 1]]);
    let decoded = value as f32 / 32767.0;
    assert!((decoded - 0.25).abs() <= 1.0 / 32768.0);

    // Envelope: 5120 samples / factor 10 = 512 blocks, peaking in the
    // ramp's range and silent elsewhere.
    let env = delegate.env.lock().unwrap();
    assert_eq!(env.block_count(), 512);

    let maxs = env.maxs();
    let (peak_block, peak) = maxs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap();
    assert!((204..411).contains(&peak_block), "peak at block {}", peak_block);
    assert!(*peak > 1e-4);
    for block in 0..200 {
        assert!(maxs[block].abs() < 1e-6, "silence block {} not flat", block);
    }
    for block in 415..512 {
        assert!(maxs[block].abs() < 1e-6, "silence block {} not flat", block);
    }
    for (min, max) in env.mins().iter().zip(maxs) {
        assert!(min <= max);
    }

    assert!(delegate
        .origins
        .lock()
        .unwrap()
        .iter()
        .all(|o| *o == BatchOrigin::RealtimeCallback));
    assert!(delegate.stopped.lock().unwrap().is_some());
}

#[test]
fn realtime_load_failure_still_records_via_polling() {
    let mut realtime = ScriptedSource::new(BatchOrigin::RealtimeCallback, vec![]);
    realtime.fail = true;
    let polling = ScriptedSource::new(BatchOrigin::Polling, vec![vec![0.25; 4800]]);
    let mut engine = CaptureEngine::new(Some(realtime), polling);

    let delegate = Arc::new(EnvelopeDelegate::new(48000, 400));
    engine.set_delegate(Arc::clone(&delegate) as Arc<dyn EngineDelegate>);

    engine.initialize(CaptureConfig::default()).unwrap();
    engine.start_recording().unwrap();
    assert_eq!(engine.mode(), Some(CaptureMode::Polling));

    let result = engine.stop_recording().unwrap();
    assert_eq!(result.mode, CaptureMode::Polling);
    assert_eq!(result.sample_count, 4800);

    // Every delivered batch carries the polling tag, and the envelope saw
    // the same stream.
    let origins = delegate.origins.lock().unwrap();
    assert!(!origins.is_empty());
    assert!(origins.iter().all(|o| *o == BatchOrigin::Polling));
    assert_eq!(delegate.env.lock().unwrap().block_count(), 480);
}
