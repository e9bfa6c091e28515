//! # wavescope-core
//!
//! Platform-agnostic microphone capture and waveform-envelope core.
//!
//! Captures live mono audio through a pluggable source, encodes it to a
//! byte-exact 16-bit WAV container, and maintains a streaming min/max
//! envelope that supports O(1) zoom/pan/seek over arbitrarily long
//! recordings. Host-audio backends (cpal) implement the `CaptureSource`
//! trait and plug into the generic `CaptureEngine`.
//!
//! ## Architecture
//!
//! ```text
//! wavescope-core (this crate)
//! ├── traits/       ← CaptureSource, BatchSink, EngineDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfig, PcmBatch, results
//! ├── processing/   ← WAV format, gain stage, ring buffer, batch store
//! ├── session/      ← CaptureEngine (generic orchestrator)
//! ├── envelope/     ← EnvelopeDecimator, OverviewStrip, PlaybackCursor
//! ├── render/       ← RenderMirror worker + command protocol
//! └── storage/      ← WAV file writer, metadata sidecar
//! ```
//!
//! Concurrency model: the capture source's audio thread only runs the
//! delivery sink (gain → levels → store → delegate); the owner thread is
//! the sole writer of the envelope and view window; the optional render
//! mirror paints from its own copy and never writes back.

pub mod envelope;
pub mod models;
pub mod processing;
pub mod render;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use envelope::decimator::{decimation_factor, EnvelopeDecimator, ViewWindow};
pub use envelope::overview::{OverviewStrip, SeekEvent};
pub use envelope::playback::PlaybackCursor;
pub use models::audio_stats::{AudioLevels, EngineDiagnostics};
pub use models::batch::{BatchOrigin, PcmBatch};
pub use models::config::CaptureConfig;
pub use models::error::{CaptureError, ErrorStage};
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::{CaptureMode, CaptureState};
pub use processing::ring_buffer::RingBuffer;
pub use render::mirror::RenderMirror;
pub use render::protocol::{DetailUpdate, Frame, RenderCommand};
pub use session::engine::CaptureEngine;
pub use traits::capture_source::{BatchSink, CaptureSource, FaultCallback, SampleCallback};
pub use traits::engine_delegate::{EngineDelegate, FallbackNotice};
