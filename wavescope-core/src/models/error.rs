use thiserror::Error;

/// Errors that can occur during capture operations.
///
/// The first five variants form the recovery taxonomy:
/// - `PermissionDenied` — fatal to `start_recording`, never auto-retried.
/// - `DeviceNotAvailable` — recovered locally by one retry without the
///   device constraint.
/// - `BackendUnavailable` — recovered locally by switching to polling mode.
/// - `EmptyRecording` — stop with zero captured samples; no container.
/// - `InvalidState` — always returned synchronously, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("requested device not available")]
    DeviceNotAvailable,

    #[error("realtime capture backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("no samples captured")]
    EmptyRecording,

    #[error("invalid state transition: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("audio stream error: {0}")]
    StreamError(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Which engine operation an error was observed in.
///
/// Carried on every `on_error` notification so external logging can tell a
/// recovered capture fault from a failed stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Initialize,
    Start,
    Capture,
    Stop,
    Storage,
}
