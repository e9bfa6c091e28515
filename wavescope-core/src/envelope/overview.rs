//! Overview (minimap) strip: a full-span rendering of the envelope with
//! the current view window drawn as a draggable, edge-resizable rectangle.
//!
//! The strip owns no view state beyond the transient drag mode: every
//! gesture resolves into the decimator's own zoom/pan/seek operations, so
//! the envelope stays the single authority.

use super::decimator::EnvelopeDecimator;

/// Pointer must land within this many pixels of a window edge to start an
/// edge resize instead of a pan.
pub const EDGE_GRAB_PX: f32 = 4.0;

/// Emitted when the user clicks a position for an external player to
/// seek to.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekEvent {
    pub sample_index: u64,
    pub time_offset_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Idle,
    Pan { last_x: f32 },
    ResizeLeft,
    ResizeRight,
}

/// Minimap correlator over the whole envelope.
pub struct OverviewStrip {
    width: usize,
    drag: DragMode,
}

impl OverviewStrip {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            drag: DragMode::Idle,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn resize(&mut self, width: usize) {
        self.width = width.max(1);
    }

    /// One (min, max) stroke per horizontal pixel, reduced over the entire
    /// envelope rather than the visible window.
    pub fn strokes(&self, env: &EnvelopeDecimator) -> Vec<(f32, f32)> {
        let count = env.block_count();
        if count == 0 {
            return vec![(0.0, 0.0); self.width];
        }
        let mins = env.mins();
        let maxs = env.maxs();

        (0..self.width)
            .map(|col| {
                let from = col * count / self.width;
                let to = (((col + 1) * count) / self.width).max(from + 1).min(count);
                let mut min = f32::INFINITY;
                let mut max = f32::NEG_INFINITY;
                for i in from..to {
                    if mins[i] < min {
                        min = mins[i];
                    }
                    if maxs[i] > max {
                        max = maxs[i];
                    }
                }
                (min, max)
            })
            .collect()
    }

    /// Pixel extent `(x0, x1)` of the current view window, None while the
    /// envelope is empty.
    pub fn window_rect(&self, env: &EnvelopeDecimator) -> Option<(f32, f32)> {
        let count = env.block_count();
        if count == 0 {
            return None;
        }
        let (start, visible) = env.visible_range();
        let scale = self.width as f32 / count as f32;
        Some((start as f32 * scale, (start + visible) as f32 * scale))
    }

    /// Pointer pressed at strip-local `x`.
    ///
    /// On an edge begins a resize; inside the rectangle begins a pan;
    /// outside recenters the window on the clicked block and reports a
    /// seek position.
    pub fn pointer_down(&mut self, x: f32, env: &mut EnvelopeDecimator) -> Option<SeekEvent> {
        let Some((x0, x1)) = self.window_rect(env) else {
            return None;
        };

        if (x - x0).abs() <= EDGE_GRAB_PX {
            self.drag = DragMode::ResizeLeft;
            return None;
        }
        if (x - x1).abs() <= EDGE_GRAB_PX {
            self.drag = DragMode::ResizeRight;
            return None;
        }
        if x > x0 && x < x1 {
            self.drag = DragMode::Pan { last_x: x };
            return None;
        }

        let block = self.block_at(x, env.block_count());
        env.center_on(block);
        let sample_index = block.max(0.0) as u64 * env.decimation_factor() as u64;
        Some(SeekEvent {
            sample_index,
            time_offset_secs: sample_index as f64 / env.sample_rate() as f64,
        })
    }

    /// Pointer moved to `x` while pressed.
    pub fn pointer_move(&mut self, x: f32, env: &mut EnvelopeDecimator) {
        let count = env.block_count();
        if count == 0 {
            return;
        }
        match self.drag {
            DragMode::Idle => {}
            DragMode::Pan { last_x } => {
                let delta_blocks = (x - last_x) as f64 * count as f64 / self.width as f64;
                env.pan_by_blocks(delta_blocks);
                self.drag = DragMode::Pan { last_x: x };
            }
            DragMode::ResizeRight => {
                // Right edge follows the pointer; left edge stays put, so
                // the anchor sits at the window start.
                let (start, _) = env.visible_range();
                let right = self.block_at(x, count).clamp(start as f64 + 1.0, count as f64);
                let new_visible = right - start as f64;
                env.set_zoom((count as f64 / new_visible) as f32, Some(start as f64));
            }
            DragMode::ResizeLeft => {
                // Left edge follows the pointer; anchoring at the old right
                // edge keeps it fixed.
                let (start, visible) = env.visible_range();
                let right = (start + visible) as f64;
                let left = self.block_at(x, count).clamp(0.0, right - 1.0);
                let new_visible = right - left;
                env.set_zoom((count as f64 / new_visible) as f32, Some(right));
            }
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) {
        self.drag = DragMode::Idle;
    }

    fn block_at(&self, x: f32, count: usize) -> f64 {
        (x.clamp(0.0, self.width as f32) / self.width as f32) as f64 * count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::decimator::EnvelopeDecimator;

    // factor 1, 1000 blocks, canvas and strip both 100 px wide
    fn fixtures() -> (EnvelopeDecimator, OverviewStrip) {
        let mut env = EnvelopeDecimator::new(5_000, 100);
        let samples: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.05).sin()).collect();
        env.append(&samples);
        (env, OverviewStrip::new(100))
    }

    #[test]
    fn strokes_cover_every_column() {
        let (env, strip) = fixtures();
        let strokes = strip.strokes(&env);
        assert_eq!(strokes.len(), 100);
        for (min, max) in strokes {
            assert!(min <= max);
        }
    }

    #[test]
    fn strokes_on_empty_envelope_are_flat() {
        let env = EnvelopeDecimator::new(5_000, 100);
        let strip = OverviewStrip::new(64);
        assert_eq!(strip.strokes(&env), vec![(0.0, 0.0); 64]);
    }

    #[test]
    fn window_rect_maps_blocks_to_pixels() {
        let (mut env, strip) = fixtures();
        env.set_zoom(10.0, None); // visible 100
        env.center_on(500.0); // start 450

        let (x0, x1) = strip.window_rect(&env).unwrap();
        assert!((x0 - 45.0).abs() < 0.5);
        assert!((x1 - 55.0).abs() < 0.5);
    }

    #[test]
    fn click_outside_recenters_and_seeks() {
        let (mut env, mut strip) = fixtures();
        env.set_zoom(10.0, None);
        env.center_on(100.0);

        let seek = strip.pointer_down(80.0, &mut env).expect("seek event");
        assert_eq!(seek.sample_index, 800);
        assert!((seek.time_offset_secs - 0.16).abs() < 1e-6); // 800 / 5000

        let (start, visible) = env.visible_range();
        assert!((start..start + visible).contains(&800));
    }

    #[test]
    fn click_inside_starts_pan_not_seek() {
        let (mut env, mut strip) = fixtures();
        env.set_zoom(10.0, None);
        env.center_on(500.0); // rect 45..55 px

        assert!(strip.pointer_down(50.0, &mut env).is_none());
        let before = env.visible_range().0;

        strip.pointer_move(52.0, &mut env); // 2 px = 20 blocks
        assert_eq!(env.visible_range().0, before + 20);
        strip.pointer_up();
    }

    #[test]
    fn right_edge_resize_keeps_left_edge_fixed() {
        let (mut env, mut strip) = fixtures();
        env.set_zoom(10.0, None);
        env.center_on(500.0); // start 450, rect 45..55

        assert!(strip.pointer_down(55.0, &mut env).is_none());
        strip.pointer_move(75.0, &mut env); // right edge to block 750

        let (start, visible) = env.visible_range();
        assert_eq!(start, 450);
        assert!((visible as i64 - 300).abs() <= 2);
    }

    #[test]
    fn left_edge_resize_keeps_right_edge_fixed() {
        let (mut env, mut strip) = fixtures();
        env.set_zoom(10.0, None);
        env.center_on(500.0); // start 450, right edge 550, rect 45..55

        assert!(strip.pointer_down(45.0, &mut env).is_none());
        strip.pointer_move(25.0, &mut env); // left edge to block 250

        let (start, visible) = env.visible_range();
        assert!((start + visible) as i64 - 550 <= 2);
        assert!((start as i64 - 250).abs() <= 2);
    }

    #[test]
    fn gestures_never_break_window_invariants() {
        let (mut env, mut strip) = fixtures();
        env.set_zoom(10.0, None);

        strip.pointer_down(99.0, &mut env);
        strip.pointer_up();
        strip.pointer_down(0.0, &mut env);
        strip.pointer_move(150.0, &mut env);
        strip.pointer_up();

        let (start, visible) = env.visible_range();
        assert!(start + visible <= env.block_count());
        assert!(env.zoom() >= 1.0);
    }
}
