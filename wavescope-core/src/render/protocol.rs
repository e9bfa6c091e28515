//! One-way command protocol between the owner thread and the render
//! mirror.
//!
//! Commands are fire-and-forget; the mirror never answers on this channel.
//! Diagnostics flow back separately as `DetailUpdate`s.

/// Commands the owner thread sends to the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Establish the paint surface and decimation parameters.
    Init {
        width: usize,
        height: usize,
        sample_rate: u32,
        decimation_factor: usize,
    },
    /// Mirror newly appended envelope pairs.
    Append { mins: Vec<f32>, maxs: Vec<f32> },
    /// Paint one frame of the given view window.
    Draw {
        zoom: f32,
        view_start: usize,
        playback_block: Option<f64>,
        playing: bool,
    },
    /// Drop the mirrored envelope and the published frame.
    Reset,
    /// Surface size changed.
    Resize { width: usize, height: usize },
    /// The host renegotiated the capture rate.
    SetSampleRate {
        sample_rate: u32,
        decimation_factor: usize,
    },
}

/// Asynchronous diagnostics reported by the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailUpdate {
    pub draws: u64,
    pub mirrored_blocks: usize,
}

/// One painted frame: a vertical stroke per pixel column plus an optional
/// playback cursor column.
///
/// Strokes are `(top, bottom)` y coordinates with `top <= bottom`; a flat
/// column paints the centerline.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub columns: Vec<(u16, u16)>,
    pub cursor_col: Option<usize>,
}
