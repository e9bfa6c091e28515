use std::fs;
use std::path::Path;

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording_path}.metadata.json` alongside the recording.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), CaptureError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(&metadata_path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let metadata_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&metadata_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::models::state::CaptureMode;

    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wavescope_test_{}", name))
    }

    #[test]
    fn sidecar_round_trip() {
        let recording_path = temp_file_path("sidecar.wav");
        let metadata = RecordingMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs: 3.5,
            sample_count: 168000,
            sample_rate: 48000,
            mode: CaptureMode::RealtimeCallback,
            checksum: "deadbeef".into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        write_metadata(&metadata, &recording_path).unwrap();
        let back = read_metadata(&recording_path).unwrap();
        assert_eq!(back, metadata);

        fs::remove_file(recording_path.with_extension("metadata.json")).ok();
    }
}
