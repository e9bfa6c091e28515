use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::state::CaptureMode;

/// Result returned when a recording stops successfully.
///
/// `wav_bytes` is the complete RIFF/WAVE container. `file_path` is set only
/// when the session was configured with an output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub id: String,
    pub wav_bytes: Vec<u8>,
    pub file_path: Option<PathBuf>,
    pub duration_secs: f64,
    pub sample_count: u64,
    pub sample_rate: u32,
    pub mode: CaptureMode,
    pub checksum: String,
}

impl RecordingResult {
    pub fn metadata(&self) -> RecordingMetadata {
        RecordingMetadata {
            id: self.id.clone(),
            duration_secs: self.duration_secs,
            sample_count: self.sample_count,
            sample_rate: self.sample_rate,
            mode: self.mode,
            checksum: self.checksum.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Metadata stored alongside a recording.
///
/// Serializable for JSON export to external persistence adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub sample_count: u64,
    pub sample_rate: u32,
    pub mode: CaptureMode,
    pub checksum: String,
    pub created_at: String,
}
