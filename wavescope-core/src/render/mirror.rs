//! Off-thread render mirror.
//!
//! A worker that maintains a private copy of the envelope and performs the
//! per-pixel painting, so envelope bookkeeping and encoding never contend
//! with paint work on the owner thread. The mirror only ever receives
//! commands; it never writes back into authoritative state, so the two
//! copies can diverge only by not-yet-applied commands.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::envelope::decimator::visible_span;
use super::protocol::{DetailUpdate, Frame, RenderCommand};

/// Handle to a spawned render mirror.
///
/// Dropping the handle (or calling `shutdown`) closes the command channel
/// and joins the worker.
pub struct RenderMirror {
    tx: Option<Sender<RenderCommand>>,
    frame: Arc<Mutex<Option<Frame>>>,
    updates: Receiver<DetailUpdate>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderMirror {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<RenderCommand>();
        let (update_tx, updates) = mpsc::channel::<DetailUpdate>();
        let frame = Arc::new(Mutex::new(None));
        let frame_slot = Arc::clone(&frame);

        let handle = thread::Builder::new()
            .name("render-mirror".into())
            .spawn(move || {
                let mut state = MirrorState::default();
                while let Ok(command) = rx.recv() {
                    state.apply(command, &frame_slot, &update_tx);
                }
            })
            .expect("failed to spawn render mirror thread");

        Self {
            tx: Some(tx),
            frame,
            updates,
            handle: Some(handle),
        }
    }

    /// Fire-and-forget command send. A command sent after shutdown is
    /// dropped.
    pub fn send(&self, command: RenderCommand) {
        if let Some(tx) = &self.tx {
            if tx.send(command).is_err() {
                log::debug!("render mirror gone; command dropped");
            }
        }
    }

    /// Latest painted frame, if any draw has completed.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.frame.lock().clone()
    }

    /// Non-blocking poll of the diagnostics channel.
    pub fn try_recv_update(&self) -> Option<DetailUpdate> {
        match self.updates.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocking wait for the next diagnostics report.
    pub fn recv_update_timeout(&self, timeout: std::time::Duration) -> Option<DetailUpdate> {
        self.updates.recv_timeout(timeout).ok()
    }

    /// Close the command channel and join the worker.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RenderMirror {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// The mirror's private, render-local copy of the envelope.
#[derive(Default)]
struct MirrorState {
    width: usize,
    height: usize,
    mins: Vec<f32>,
    maxs: Vec<f32>,
    draws: u64,
}

impl MirrorState {
    fn apply(
        &mut self,
        command: RenderCommand,
        frame_slot: &Mutex<Option<Frame>>,
        updates: &Sender<DetailUpdate>,
    ) {
        match command {
            RenderCommand::Init { width, height, .. } => {
                self.width = width.max(1);
                self.height = height.max(2);
                self.mins.clear();
                self.maxs.clear();
            }
            RenderCommand::Append { mins, maxs } => {
                self.mins.extend_from_slice(&mins);
                self.maxs.extend_from_slice(&maxs);
            }
            RenderCommand::Draw {
                zoom,
                view_start,
                playback_block,
                playing,
            } => {
                if self.width == 0 {
                    log::debug!("draw before init ignored");
                    return;
                }
                let frame = self.paint(zoom, view_start, playback_block.filter(|_| playing));
                *frame_slot.lock() = Some(frame);
                self.draws += 1;
                let _ = updates.send(DetailUpdate {
                    draws: self.draws,
                    mirrored_blocks: self.mins.len(),
                });
            }
            RenderCommand::Reset => {
                self.mins.clear();
                self.maxs.clear();
                *frame_slot.lock() = None;
            }
            RenderCommand::Resize { width, height } => {
                self.width = width.max(1);
                self.height = height.max(2);
            }
            RenderCommand::SetSampleRate { .. } => {
                // Factor changes invalidate the mirrored pairs; the owner
                // follows up with Reset + re-append when it matters.
            }
        }
    }

    /// Rasterize the commanded window into one stroke per pixel column.
    fn paint(&self, zoom: f32, view_start: usize, cursor: Option<f64>) -> Frame {
        let count = self.mins.len();
        let visible = visible_span(count, zoom, self.width);
        let start = view_start.min(count.saturating_sub(visible));

        let center = self.height as f32 / 2.0;
        let scale = self.height as f32 / 2.0;
        let max_y = (self.height - 1) as u16;

        let columns = (0..self.width)
            .map(|col| {
                if visible == 0 {
                    let mid = center as u16;
                    return (mid.min(max_y), mid.min(max_y));
                }
                let from = start + col * visible / self.width;
                let to = (start + ((col + 1) * visible / self.width).max(col * visible / self.width + 1))
                    .min(start + visible);
                let mut lo = f32::INFINITY;
                let mut hi = f32::NEG_INFINITY;
                for i in from..to {
                    if self.mins[i] < lo {
                        lo = self.mins[i];
                    }
                    if self.maxs[i] > hi {
                        hi = self.maxs[i];
                    }
                }
                if lo > hi {
                    lo = 0.0;
                    hi = 0.0;
                }
                // Positive amplitude paints upward from the centerline.
                let top = (center - hi * scale).clamp(0.0, max_y as f32) as u16;
                let bottom = (center - lo * scale).clamp(0.0, max_y as f32) as u16;
                (top, bottom.max(top))
            })
            .collect();

        let cursor_col = cursor.and_then(|block| {
            if visible == 0 {
                return None;
            }
            let offset = block - start as f64;
            if offset < 0.0 || offset >= visible as f64 {
                return None;
            }
            Some((offset / visible as f64 * self.width as f64) as usize)
        });

        Frame {
            width: self.width,
            height: self.height,
            columns,
            cursor_col,
        }
    }
}
