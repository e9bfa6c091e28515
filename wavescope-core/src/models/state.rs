/// Capture session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → initialized → recording → stopped
///                      ↑                       │
///                      └──── start_recording ──┘
/// ```
/// `dispose` resets any state back to `Uninitialized`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Uninitialized,
    Initialized,
    Recording { duration_secs: f64 },
    Stopped,
}

impl CaptureState {
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Whether `start_recording` is legal from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Stopped)
    }

    /// Returns the running duration if currently recording.
    pub fn duration(&self) -> Option<f64> {
        match self {
            Self::Recording { duration_secs } => Some(*duration_secs),
            _ => None,
        }
    }
}

/// Which acquisition strategy the engine selected at `initialize`.
///
/// Chosen once; downstream consumers never branch on it again, since
/// batches from either mode are shape-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    RealtimeCallback,
    Polling,
}
