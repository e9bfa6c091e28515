use std::path::PathBuf;

/// Lowest and highest accepted microphone gain.
pub const MIN_MIC_GAIN: f32 = 1.0;
pub const MAX_MIC_GAIN: f32 = 6.0;

/// Configuration for a capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Requested sample rate in Hz. A hint only: the host decides the
    /// actual rate, which the engine reports back after start.
    pub sample_rate_hint: u32,

    /// Enable acoustic echo cancellation where the backend supports it.
    pub echo_cancellation: bool,

    /// Enable noise suppression where the backend supports it.
    pub noise_suppression: bool,

    /// Enable automatic gain control where the backend supports it.
    pub auto_gain_control: bool,

    /// Microphone gain applied in the capture path, clamped to [1.0, 6.0].
    pub mic_gain: f32,

    /// Specific input device ID, or None for the system default.
    pub device_id: Option<String>,

    /// Prefer the realtime-callback source over polling when available.
    pub prefer_realtime: bool,

    /// When set, the finished WAV and a JSON metadata sidecar are written
    /// here on stop. None keeps the recording in memory only.
    pub output_directory: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hint == 0 {
            return Err("sample rate hint must be positive".into());
        }
        if !(MIN_MIC_GAIN..=MAX_MIC_GAIN).contains(&self.mic_gain) {
            return Err(format!("mic gain out of range: {}", self.mic_gain));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hint: 48000,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: false,
            mic_gain: 1.0,
            device_id: None,
            prefer_realtime: true,
            output_directory: None,
        }
    }
}
