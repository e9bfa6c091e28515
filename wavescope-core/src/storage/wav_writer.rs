use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::wav_format;

/// Streaming mono 16-bit WAV file writer.
///
/// Opens with a placeholder header, accepts PCM chunks as they arrive, and
/// patches the RIFF sizes on close.
///
/// ```text
/// [44-byte WAV header]
/// [raw 16-bit PCM data...]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    file: Option<File>,
    total_bytes_written: u64,
    is_open: bool,
}

impl WavFileWriter {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            file: None,
            total_bytes_written: 0,
            is_open: false,
        }
    }

    /// Open the file and write the initial 44-byte header.
    pub fn open(&mut self, sample_rate: u32) -> Result<(), CaptureError> {
        if self.is_open {
            return Ok(());
        }

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&self.file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {}", e)))?;
        self.file = Some(file);

        // Data size is a placeholder until close patches it.
        let header = wav_format::generate_wav_header(sample_rate, 0);
        self.write_raw(&header)?;
        self.is_open = true;
        Ok(())
    }

    /// Append a chunk of already-encoded PCM bytes.
    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if !self.is_open {
            return Err(CaptureError::StorageError("file is not open for writing".into()));
        }
        self.write_raw(data)
    }

    /// Append float samples, converting to PCM on the way through.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<(), CaptureError> {
        let pcm = wav_format::convert_to_int16_pcm(samples);
        self.write(&pcm)
    }

    /// Finalize: patch the RIFF sizes, flush, compute the SHA-256 checksum
    /// of the completed file.
    pub fn close(&mut self) -> Result<String, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::StorageError("file is not open".into()));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let data_size = self.total_bytes_written - wav_format::WAV_HEADER_SIZE as u64;

        // RIFF chunk size at offset 4
        file.seek(SeekFrom::Start(4))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        let chunk_size = (self.total_bytes_written - 8) as u32;
        file.write_all(&chunk_size.to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        // data size at offset 40
        file.seek(SeekFrom::Start(40))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        file.write_all(&(data_size as u32).to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        file.flush().map_err(|e| CaptureError::StorageError(e.to_string()))?;
        self.file = None;
        self.is_open = false;

        sha256_file(&self.file_path)
    }

    /// Total bytes written so far (including the header).
    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {}", e)))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

/// Write an already-assembled container to disk and return its checksum.
pub fn write_container(path: &Path, wav_bytes: &[u8]) -> Result<String, CaptureError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
    }
    fs::write(path, wav_bytes)
        .map_err(|e| CaptureError::StorageError(format!("failed to write file: {}", e)))?;
    Ok(sha256_hex(wav_bytes))
}

/// SHA-256 hex digest of a byte buffer.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 hex digest of a file on disk.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    Ok(sha256_hex(&data))
}
