//! Streaming min/max decimation and the zoom/pan view window.
//!
//! Consumes PCM batches incrementally, reducing each block of
//! `decimation_factor` raw samples to one (min, max) pair after removing
//! the block's DC offset, and appending the pair to two growing parallel
//! vectors. Supports O(1) zoom/pan/seek over arbitrarily long recordings:
//! nothing ever re-walks the raw signal.

/// Envelope resolution target in pairs per second of audio.
pub const TARGET_ENVELOPE_RATE: u32 = 5000;

/// Multiplier applied per zoom step.
pub const ZOOM_STEP: f32 = 1.5;

/// A visible block never shrinks below ~1/10th of the canvas width in
/// pixel terms, which caps how far the view can zoom in.
const MIN_BLOCK_PIXELS: usize = 10;

/// The current zoom/pan window over the block axis.
///
/// Invariants (re-established after every mutation): `start ≥ 0`,
/// `start + visible ≤ block_count`, `zoom ≥ 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub start: usize,
    pub zoom: f32,
    pub auto_scroll: bool,
    pub pan_remainder: f64,
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            start: 0,
            zoom: 1.0,
            auto_scroll: true,
            pan_remainder: 0.0,
        }
    }
}

type ViewChangedFn = Box<dyn FnMut(&ViewWindow) + Send>;

/// Streaming decimator: envelope storage plus the view window over it.
pub struct EnvelopeDecimator {
    sample_rate: u32,
    factor: usize,
    mins: Vec<f32>,
    maxs: Vec<f32>,
    staging: Vec<f32>,
    width: usize,
    window: ViewWindow,
    on_view_changed: Option<ViewChangedFn>,
}

/// `round(sample_rate / 5000)`, at least 1.
pub fn decimation_factor(sample_rate: u32) -> usize {
    ((sample_rate as f64 / TARGET_ENVELOPE_RATE as f64).round() as usize).max(1)
}

/// Smallest permitted window span for a canvas `width` pixels wide.
pub fn min_visible_span(width: usize, count: usize) -> usize {
    (width / MIN_BLOCK_PIXELS).max(1).min(count.max(1))
}

/// Window span derived from a zoom factor, honoring the span floor.
///
/// Shared with the render mirror so both sides derive identical windows
/// from the same (zoom, start) command.
pub fn visible_span(count: usize, zoom: f32, width: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let derived = (count as f64 / zoom as f64).round() as usize;
    derived.max(min_visible_span(width, count)).min(count)
}

impl EnvelopeDecimator {
    pub fn new(sample_rate: u32, width: usize) -> Self {
        Self {
            sample_rate,
            factor: decimation_factor(sample_rate),
            mins: Vec::new(),
            maxs: Vec::new(),
            staging: Vec::new(),
            width: width.max(1),
            window: ViewWindow::default(),
            on_view_changed: None,
        }
    }

    /// Subscribe to view-window changes (the overview strip redraws off
    /// this). The envelope stays authoritative; observers only read.
    pub fn set_on_view_changed(&mut self, callback: ViewChangedFn) {
        self.on_view_changed = Some(callback);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn decimation_factor(&self) -> usize {
        self.factor
    }

    pub fn block_count(&self) -> usize {
        self.mins.len()
    }

    pub fn zoom(&self) -> f32 {
        self.window.zoom
    }

    pub fn window(&self) -> &ViewWindow {
        &self.window
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn mins(&self) -> &[f32] {
        &self.mins
    }

    pub fn maxs(&self) -> &[f32] {
        &self.maxs
    }

    /// Adopt the rate the host actually delivers. Recomputes the block
    /// size; any envelope built at the old rate is discarded.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        let factor = decimation_factor(sample_rate);
        if factor != self.factor && self.block_count() > 0 {
            log::debug!("sample rate changed {} -> {}, envelope reset", self.sample_rate, sample_rate);
            self.reset();
        }
        self.sample_rate = sample_rate;
        self.factor = factor;
    }

    /// Ingest a run of raw samples.
    ///
    /// A partial trailing block stays staged until later appends complete
    /// it, so `block_count` converges to `floor(total_samples / factor)`.
    pub fn append(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        self.staging.extend_from_slice(samples);

        let complete = self.staging.len() / self.factor;
        for i in 0..complete {
            let block = &self.staging[i * self.factor..(i + 1) * self.factor];

            // Two passes: mean first, then extrema of the centered samples.
            // Removing the DC offset keeps quiet and loud passages
            // symmetric about the centerline.
            let mean = block.iter().sum::<f32>() / block.len() as f32;
            let mut min = f32::INFINITY;
            let mut max = f32::NEG_INFINITY;
            for &sample in block {
                let centered = sample - mean;
                if centered < min {
                    min = centered;
                }
                if centered > max {
                    max = centered;
                }
            }
            if min > max {
                min = 0.0;
                max = 0.0;
            }
            self.mins.push(min);
            self.maxs.push(max);
        }
        self.staging.drain(..complete * self.factor);

        if self.window.auto_scroll {
            let visible = self.visible();
            self.window.start = self.block_count().saturating_sub(visible);
        } else {
            self.reclamp();
        }
        self.notify_view();
    }

    /// Smallest permitted window span in blocks.
    pub fn min_visible(&self) -> usize {
        min_visible_span(self.width, self.block_count())
    }

    /// Current window span in blocks, derived from zoom.
    pub fn visible(&self) -> usize {
        visible_span(self.block_count(), self.window.zoom, self.width)
    }

    /// `(start, visible)` with all window invariants holding.
    pub fn visible_range(&self) -> (usize, usize) {
        (self.window.start, self.visible())
    }

    /// Immutable min/max slices for the visible window.
    pub fn visible_slices(&self) -> (&[f32], &[f32]) {
        let (start, visible) = self.visible_range();
        (&self.mins[start..start + visible], &self.maxs[start..start + visible])
    }

    /// Set zoom, preserving the anchor's relative position inside the
    /// window (or the window center when no anchor is given).
    ///
    /// `anchor` is a fractional block coordinate, so an anchor at the
    /// exact window edge expresses an edge-fixed resize.
    pub fn set_zoom(&mut self, target: f32, anchor: Option<f64>) {
        let count = self.block_count();
        if count == 0 {
            self.window.zoom = 1.0;
            self.window.start = 0;
            self.notify_view();
            return;
        }

        let old_start = self.window.start as f64;
        let old_visible = self.visible() as f64;

        let floor = (self.width / MIN_BLOCK_PIXELS).max(1);
        let max_zoom = (count as f32 / floor as f32).max(1.0);
        self.window.zoom = target.clamp(1.0, max_zoom);

        let new_visible = self.visible() as f64;
        let new_start = match anchor {
            Some(anchor) => {
                let ratio = if old_visible > 0.0 {
                    (anchor - old_start) / old_visible
                } else {
                    0.0
                };
                anchor - ratio * new_visible
            }
            None => {
                let center = old_start + old_visible / 2.0;
                center - new_visible / 2.0
            }
        };
        self.window.start = Self::clamp_start(new_start, new_visible as usize, count);
        self.notify_view();
    }

    /// Zoom in (`n < 0`) or out (`n > 0`) by `|n|` steps of the fixed
    /// ratio, anchored at `anchor_ratio` of the current window.
    pub fn zoom_by_steps(&mut self, n: i32, anchor_ratio: f32) {
        if self.block_count() == 0 {
            return;
        }
        let (start, visible) = self.visible_range();
        let anchor = start as f64 + anchor_ratio.clamp(0.0, 1.0) as f64 * visible as f64;
        let target = self.window.zoom * ZOOM_STEP.powi(n);
        self.set_zoom(target, Some(anchor));
    }

    /// Pan by a (possibly fractional) block delta. Disables auto-scroll.
    ///
    /// The fractional part is retained across calls so repeated sub-block
    /// drags do not lose precision.
    pub fn pan_by_blocks(&mut self, delta: f64) {
        self.window.auto_scroll = false;
        let total = delta + self.window.pan_remainder;
        let whole = total.trunc();
        self.window.pan_remainder = total - whole;

        let count = self.block_count();
        let visible = self.visible();
        let max_start = count.saturating_sub(visible) as i64;
        let new_start = (self.window.start as i64 + whole as i64).clamp(0, max_start);
        self.window.start = new_start as usize;
        self.notify_view();
    }

    /// Pan by a pixel delta on the main canvas, converting through the
    /// current blocks-per-pixel scale.
    pub fn pan_by_pixels(&mut self, pixel_delta: f32) {
        let visible = self.visible();
        if visible == 0 {
            return;
        }
        let blocks_per_pixel = visible as f64 / self.width as f64;
        self.pan_by_blocks(pixel_delta as f64 * blocks_per_pixel);
    }

    /// Recenter the window on a block (seek). Disables auto-scroll.
    pub fn center_on(&mut self, block: f64) {
        self.window.auto_scroll = false;
        let visible = self.visible();
        let new_start = block - visible as f64 / 2.0;
        self.window.start = Self::clamp_start(new_start, visible, self.block_count());
        self.notify_view();
    }

    /// Re-enable append-driven auto-scroll.
    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.window.auto_scroll = enabled;
        if enabled {
            let visible = self.visible();
            self.window.start = self.block_count().saturating_sub(visible);
            self.notify_view();
        }
    }

    /// Playback tracking: scroll so the cursor block stays on screen,
    /// without touching zoom.
    pub fn follow_cursor(&mut self, cursor_block: f64) {
        let (start, visible) = self.visible_range();
        if visible == 0 {
            return;
        }
        let in_window = cursor_block >= start as f64 && cursor_block < (start + visible) as f64;
        if in_window {
            return;
        }
        let new_start = cursor_block - visible as f64 / 2.0;
        self.window.start = Self::clamp_start(new_start, visible, self.block_count());
        self.notify_view();
    }

    /// Canvas width changed; the minimum window span changes with it.
    pub fn resize(&mut self, width: usize) {
        self.width = width.max(1);
        self.reclamp();
        self.notify_view();
    }

    /// Wipe the envelope, staging buffer, and view window.
    pub fn reset(&mut self) {
        log::debug!("envelope reset ({} blocks dropped)", self.block_count());
        self.mins.clear();
        self.maxs.clear();
        self.staging.clear();
        self.window = ViewWindow::default();
        self.notify_view();
    }

    fn reclamp(&mut self) {
        let count = self.block_count();
        let visible = self.visible();
        self.window.start = self.window.start.min(count.saturating_sub(visible));
    }

    fn clamp_start(start: f64, visible: usize, count: usize) -> usize {
        let max_start = count.saturating_sub(visible);
        (start.round().max(0.0) as usize).min(max_start)
    }

    fn notify_view(&mut self) {
        let window = self.window;
        if let Some(callback) = self.on_view_changed.as_mut() {
            callback(&window);
        }
    }
}
