//! Realtime-callback capture source.
//!
//! The cpal input callback runs on the host's dedicated audio thread. It
//! holds no recording-state logic: each quantum's mono samples go into a
//! small staging buffer, and every time the staging buffer fills a batch
//! it is handed off through a one-way channel. A forwarder thread owned by
//! the source delivers batches to the sink, so the audio thread never runs
//! downstream code and never blocks; back-pressure is handled entirely by
//! batch-size tuning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use wavescope_core::{BatchOrigin, BatchSink, CaptureError, CaptureSource};

use crate::devices::{any_input_device, find_input_device};
use crate::stream::{build_mono_input_stream, negotiated_sample_rate, ChunkFn, StreamErrorFn};

/// Samples per hand-off batch, a few callback quanta worth.
pub const REALTIME_BATCH_SAMPLES: usize = 2048;

/// Capture source built on the cpal input stream callback.
pub struct RealtimeSource {
    running: Arc<AtomicBool>,
    capture_handle: Mutex<Option<thread::JoinHandle<()>>>,
    forward_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl RealtimeSource {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: Mutex::new(None),
            forward_handle: Mutex::new(None),
        }
    }
}

impl Default for RealtimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for RealtimeSource {
    fn origin(&self) -> BatchOrigin {
        BatchOrigin::RealtimeCallback
    }

    fn is_available(&self) -> bool {
        any_input_device()
    }

    fn start(&mut self, device_id: Option<&str>, sink: BatchSink) -> Result<u32, CaptureError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::InvalidState("realtime capture already running".into()));
        }

        // Resolve the device on the caller thread so a missing constrained
        // device fails start() synchronously. The stream itself can only
        // live on the capture thread.
        let device = find_input_device(device_id)?;
        let sample_rate = negotiated_sample_rate(&device)?;

        let (batch_tx, batch_rx) = mpsc::channel::<Vec<f32>>();

        let forward_sink = sink.clone();
        let forward = thread::Builder::new()
            .name("realtime-batch-forward".into())
            .spawn(move || {
                while let Ok(batch) = batch_rx.recv() {
                    (forward_sink.on_samples)(&batch, sample_rate);
                }
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn forwarder: {}", e)))?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let staging: Arc<Mutex<Vec<f32>>> =
            Arc::new(Mutex::new(Vec::with_capacity(REALTIME_BATCH_SAMPLES)));

        let capture = thread::Builder::new()
            .name("realtime-capture".into())
            .spawn(move || {
                let staging_cb = Arc::clone(&staging);
                let chunk_tx = batch_tx.clone();
                let on_chunk: ChunkFn = Box::new(move |mono: Vec<f32>| {
                    let mut staging = staging_cb.lock();
                    staging.extend_from_slice(&mono);
                    while staging.len() >= REALTIME_BATCH_SAMPLES {
                        let rest = staging.split_off(REALTIME_BATCH_SAMPLES);
                        let full = std::mem::replace(&mut *staging, rest);
                        let _ = chunk_tx.send(full);
                    }
                });

                let fault = sink.clone();
                let on_error: StreamErrorFn = Box::new(move |error| {
                    (fault.on_fault)(error);
                });

                let opened = match build_mono_input_stream(&device, on_chunk, on_error) {
                    Ok(opened) => opened,
                    Err(error) => {
                        log::error!("realtime stream setup failed: {}", error);
                        (sink.on_fault)(error);
                        running.store(false, Ordering::SeqCst);
                        return;
                    }
                };

                if let Err(error) = cpal::traits::StreamTrait::play(&opened.stream) {
                    let error = CaptureError::StreamError(error.to_string());
                    log::error!("realtime stream start failed: {}", error);
                    (sink.on_fault)(error);
                    running.store(false, Ordering::SeqCst);
                    return;
                }

                while running.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(20));
                }
                drop(opened.stream);

                // Flush the final partial batch; the forwarder drains it
                // before its channel closes.
                let remainder = std::mem::take(&mut *staging.lock());
                if !remainder.is_empty() {
                    let _ = batch_tx.send(remainder);
                }
            })
            .map_err(|e| CaptureError::StreamError(format!("failed to spawn capture thread: {}", e)))?;

        *self.capture_handle.lock() = Some(capture);
        *self.forward_handle.lock() = Some(forward);
        Ok(sample_rate)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.running.store(false, Ordering::SeqCst);
        // Capture joins first (closes the channel), then the forwarder
        // finishes whatever is in flight. After this returns nothing else
        // reaches the sink.
        if let Some(handle) = self.capture_handle.lock().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.forward_handle.lock().take() {
            let _ = handle.join();
        }
        Ok(())
    }
}
