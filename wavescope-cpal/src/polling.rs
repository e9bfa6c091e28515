//! Polling capture source, the fallback when the realtime path is
//! unavailable.
//!
//! The cpal callback only writes into a monitoring-tap ring buffer; a
//! drain loop wakes every 100 ms and hands whatever accumulated to the
//! sink as one batch. Downstream consumers see batches shaped closely
//! enough to the realtime ones to stay mode-agnostic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use wavescope_core::{BatchOrigin, BatchSink, CaptureError, CaptureSource, RingBuffer};

use crate::devices::{any_input_device, find_input_device};
use crate::stream::{build_mono_input_stream, negotiated_sample_rate, ChunkFn, StreamErrorFn};

/// Fixed interval between tap reads.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tap capacity in seconds of audio.
const TAP_SECONDS: usize = 5;

/// Capture source that samples a monitoring tap on a timer.
pub struct PollingSource {
    stream_running: Arc<AtomicBool>,
    drain_running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
    drain_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl PollingSource {
    pub fn new() -> Self {
        Self {
            stream_running: Arc::new(AtomicBool::new(false)),
            drain_running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
            drain_handle: Mutex::new(None),
        }
    }
}

impl Default for PollingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for PollingSource {
    fn origin(&self) -> BatchOrigin {
        BatchOrigin::Polling
    }

    fn is_available(&self) -> bool {
        any_input_device()
    }

    fn start(&mut self, device_id: Option<&str>, sink: BatchSink) -> Result<u32, CaptureError> {
        if self.stream_running.load(Ordering::SeqCst) {
            return Err(CaptureError::InvalidState("polling capture already running".into()));
        }

        let device = find_input_device(device_id)?;
        let sample_rate = negotiated_sample_rate(&device)?;
        let tap = Arc::new(Mutex::new(RingBuffer::new(sample_rate as usize * TAP_SECONDS)));

        self.stream_running.store(true, Ordering::SeqCst);
        self.drain_running.store(true, Ordering::SeqCst);

        // Capture thread owns the stream; its callback only feeds the tap.
        let stream_running = Arc::clone(&self.stream_running);
        let tap_writer = Arc::clone(&tap);
        let fault_sink = sink.clone();
        let capture = thread::Builder::new()
            .name("polling-capture".into())
            .spawn(move || {
                let tap = Arc::clone(&tap_writer);
                let on_chunk: ChunkFn = Box::new(move |mono: Vec<f32>| {
                    tap.lock().write(&mono);
                });

                let fault = fault_sink.clone();
                let on_error: StreamErrorFn = Box::new(move |error| {
                    (fault.on_fault)(error);
                });

                let opened = match build_mono_input_stream(&device, on_chunk, on_error) {
                    Ok(opened) => opened,
                    Err(error) => {
                        log::error!("polling stream setup failed: {}", error);
                        (fault_sink.on_fault)(error);
                        stream_running.store(false, Ordering::SeqCst);
                        return;
                    }
                };

                if let Err(error) = cpal::traits::StreamTrait::play(&opened.stream) {
                    let error = CaptureError::StreamError(error.to_string());
                    log::error!("polling stream start failed: {}", error);
                    (fault_sink.on_fault)(error);
                    stream_running.store(false, Ordering::SeqCst);
                    return;
                }

                while stream_running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(20));
                }
                drop(opened.stream);
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn capture thread: {}", e)))?;

        // Drain loop: one tap read per interval, one batch per read.
        let drain_running = Arc::clone(&self.drain_running);
        let drain = thread::Builder::new()
            .name("polling-drain".into())
            .spawn(move || {
                while drain_running.load(Ordering::SeqCst) {
                    thread::sleep(POLL_INTERVAL);
                    let samples = tap.lock().read_all();
                    if !samples.is_empty() {
                        (sink.on_samples)(&samples, sample_rate);
                    }
                }
                // Final flush so the tail between ticks isn't lost. Runs
                // after the stream is gone (stop joins capture first).
                let samples = tap.lock().read_all();
                if !samples.is_empty() {
                    (sink.on_samples)(&samples, sample_rate);
                }
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn drain thread: {}", e)))?;

        *self.capture_handle.lock() = Some(capture);
        *self.drain_handle.lock() = Some(drain);
        Ok(sample_rate)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        // Stop the stream first so no tap write races the final flush,
        // then release the drain loop. Joining both makes cancellation
        // synchronous: no batch reaches the sink after this returns.
        self.stream_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        self.drain_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.drain_handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}
