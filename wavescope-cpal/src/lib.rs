//! # wavescope-cpal
//!
//! cpal host-audio backend for wavescope.
//!
//! Provides:
//! - `RealtimeSource` — audio-thread callback capture with fixed-size
//!   batch hand-off over a one-way channel
//! - `PollingSource` — monitoring-tap ring buffer drained every 100 ms
//! - `list_input_devices` — input device names for external pickers
//!
//! ## Usage
//! ```ignore
//! use wavescope_core::CaptureConfig;
//!
//! let mut engine = wavescope_cpal::default_engine();
//! engine.initialize(CaptureConfig::default())?;
//! engine.start_recording()?;
//! // ...
//! let result = engine.stop_recording()?;
//! ```

pub mod devices;
pub mod polling;
pub mod realtime;
mod stream;

pub use devices::list_input_devices;
pub use polling::PollingSource;
pub use realtime::RealtimeSource;

use wavescope_core::CaptureEngine;

/// Capture engine wired to both cpal-backed sources.
pub type CpalEngine = CaptureEngine<RealtimeSource, PollingSource>;

/// Engine preferring the realtime callback, with polling as the fallback.
pub fn default_engine() -> CpalEngine {
    CaptureEngine::new(Some(RealtimeSource::new()), PollingSource::new())
}
