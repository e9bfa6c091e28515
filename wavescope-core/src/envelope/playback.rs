use std::time::Instant;

/// Block position derived from wall-clock elapsed time.
pub fn block_after(start_block: f64, elapsed_secs: f64, sample_rate: u32, decimation_factor: usize) -> f64 {
    start_block + elapsed_secs * sample_rate as f64 / decimation_factor as f64
}

/// Playback position overlay, in block coordinates.
///
/// Advances by wall-clock time converted through the recording's real
/// sample rate and the decimation factor. Independent of the view window;
/// renderers draw it relative to whatever window is current.
#[derive(Debug, Clone)]
pub struct PlaybackCursor {
    position_blocks: f64,
    playing: bool,
    started: Option<Instant>,
    start_block: f64,
    sample_rate: u32,
    decimation_factor: usize,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self {
            position_blocks: 0.0,
            playing: false,
            started: None,
            start_block: 0.0,
            sample_rate: 0,
            decimation_factor: 1,
        }
    }

    /// Anchor playback at `start_block`, converting elapsed time through
    /// `sample_rate / decimation_factor` on every tick.
    pub fn start_playback(&mut self, start_block: f64, sample_rate: u32, decimation_factor: usize) {
        self.playing = true;
        self.started = Some(Instant::now());
        self.start_block = start_block;
        self.position_blocks = start_block;
        self.sample_rate = sample_rate;
        self.decimation_factor = decimation_factor.max(1);
    }

    /// Recompute the position from the wall clock. Call on each redraw.
    pub fn tick(&mut self) -> f64 {
        if let (true, Some(started)) = (self.playing, self.started) {
            self.position_blocks = block_after(
                self.start_block,
                started.elapsed().as_secs_f64(),
                self.sample_rate,
                self.decimation_factor,
            );
        }
        self.position_blocks
    }

    pub fn stop_playback(&mut self) {
        self.playing = false;
        self.started = None;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position_blocks(&self) -> f64 {
        self.position_blocks
    }
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new()
    }
}
