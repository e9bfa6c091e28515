/// Real-time input level metering (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub rms: f32,
    pub peak: f32,
}

impl AudioLevels {
    /// Measure a batch of normalized samples.
    pub fn measure(samples: &[f32]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        let rms = (sum_sq / samples.len() as f32).sqrt();
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        Self { rms, peak }
    }
}

/// Diagnostics for debugging capture sessions.
#[derive(Debug, Clone, Default)]
pub struct EngineDiagnostics {
    pub batch_count: u64,
    pub samples_total: u64,
    pub fallback_count: u64,
    pub encoded_bytes: u64,
}
