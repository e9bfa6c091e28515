use crate::models::audio_stats::AudioLevels;
use crate::models::batch::PcmBatch;
use crate::models::error::{CaptureError, ErrorStage};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureMode;

/// Emitted when the engine degrades from one capture mode to another.
#[derive(Debug, Clone)]
pub struct FallbackNotice {
    pub from: CaptureMode,
    pub to: CaptureMode,
    pub cause: CaptureError,
}

/// Event delegate for capture engine notifications.
///
/// `on_batch` and `on_levels_updated` are called from the capture thread,
/// not the owner thread; implementations should marshal to their UI thread
/// if needed. The rest fire on the thread that invoked the engine
/// operation.
pub trait EngineDelegate: Send + Sync {
    /// Called once initialization completes, with the selected mode.
    fn on_initialized(&self, mode: CaptureMode);

    /// Called when recording starts.
    fn on_recording_start(&self);

    /// Called for every batch the engine accepts (data-available).
    fn on_batch(&self, batch: &PcmBatch);

    /// Called when recording stops and the container is assembled.
    fn on_recording_stop(&self, result: &RecordingResult);

    /// Called when the live gain stage changes.
    fn on_gain_changed(&self, gain: f32);

    /// Called for every error the engine observes, recovered or not.
    fn on_error(&self, stage: ErrorStage, error: &CaptureError);

    /// Called when the engine degrades between capture modes.
    fn on_fallback(&self, notice: &FallbackNotice) {
        log::warn!(
            "capture fallback {:?} -> {:?}: {}",
            notice.from,
            notice.to,
            notice.cause
        );
    }

    /// Called per batch with updated input levels.
    fn on_levels_updated(&self, _levels: &AudioLevels) {}
}
