use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::models::config::{MAX_MIC_GAIN, MIN_MIC_GAIN};

/// Live gain stage shared between the owner thread and the capture
/// callback.
///
/// The gain value is stored as f32 bits in an atomic, so `set` takes effect
/// on the very next callback without locking on the audio thread.
#[derive(Debug, Clone)]
pub struct GainStage {
    bits: Arc<AtomicU32>,
}

impl GainStage {
    pub fn new(gain: f32) -> Self {
        let stage = Self {
            bits: Arc::new(AtomicU32::new(0)),
        };
        stage.set(gain);
        stage
    }

    /// Clamp into [1.0, 6.0] and apply. Returns the applied value.
    pub fn set(&self, gain: f32) -> f32 {
        let clamped = gain.clamp(MIN_MIC_GAIN, MAX_MIC_GAIN);
        self.bits.store(clamped.to_bits(), Ordering::Relaxed);
        clamped
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Scale a batch in place, clamping back into [-1, 1].
    pub fn apply(&self, samples: &mut [f32]) {
        let gain = self.get();
        if (gain - 1.0).abs() < f32::EPSILON {
            return;
        }
        for sample in samples {
            *sample = (*sample * gain).clamp(-1.0, 1.0);
        }
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new(1.0)
    }
}
