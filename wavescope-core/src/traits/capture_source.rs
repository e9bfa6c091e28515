use std::sync::Arc;

use crate::models::batch::BatchOrigin;
use crate::models::error::CaptureError;

/// Callback invoked when a capture source has a run of samples ready.
///
/// Parameters: mono f32 samples in [-1, 1] and the actual sample rate of
/// the delivered audio. Fires on a source-owned thread; keep processing
/// minimal and never block.
pub type SampleCallback = Arc<dyn Fn(&[f32], u32) + Send + Sync + 'static>;

/// Callback invoked when a source faults after a successful start.
pub type FaultCallback = Arc<dyn Fn(CaptureError) + Send + Sync + 'static>;

/// Where a capture source delivers its output.
///
/// One-way: the source never reads engine state back through it. After
/// `CaptureSource::stop` returns, neither callback fires again.
#[derive(Clone)]
pub struct BatchSink {
    pub on_samples: SampleCallback,
    pub on_fault: FaultCallback,
}

impl BatchSink {
    pub fn new(on_samples: SampleCallback, on_fault: FaultCallback) -> Self {
        Self { on_samples, on_fault }
    }
}

/// Interface for host-audio capture strategies.
///
/// Implemented by the realtime-callback source and the polling source; the
/// engine picks one at `initialize` and never branches on the mode again;
/// both deliver shape-identical batches through the same sink.
pub trait CaptureSource: Send {
    /// Which mode this source implements (tags every batch it produces).
    fn origin(&self) -> BatchOrigin;

    /// Whether this source can currently run on the host.
    fn is_available(&self) -> bool;

    /// Start capturing, constrained to `device_id` when given, delivering
    /// samples via `sink`. Returns the negotiated sample rate.
    fn start(&mut self, device_id: Option<&str>, sink: BatchSink) -> Result<u32, CaptureError>;

    /// Stop capturing and release resources.
    ///
    /// Must be synchronous with respect to delivery: once this returns, no
    /// further samples reach the sink.
    fn stop(&mut self) -> Result<(), CaptureError>;
}
