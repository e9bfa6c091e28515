pub mod decimator;
pub mod overview;
pub mod playback;
