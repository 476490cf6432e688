//! Shared colors and geometry for the waveform and spectrogram frames

use crate::frame_buffer::Rgba;

/// Waveform background
pub const BACKGROUND: Rgba = Rgba::opaque(17, 17, 17);

/// Spectrogram background (outside the bitmap)
pub const SPECTROGRAM_BACKGROUND: Rgba = Rgba::opaque(0, 0, 0);

/// Playhead line (#f3cf2c)
pub const PLAYHEAD: Rgba = Rgba::opaque(243, 207, 44);
pub const PLAYHEAD_WIDTH: usize = 2;

pub const BEAT_MARKER: Rgba = Rgba::new(82, 183, 174, 200);

/// Time tick lines; labels use the full-opacity playhead color
pub const TIME_TICK: Rgba = Rgba::new(243, 207, 44, 150);
/// Tick line spans `height - 15 ..= height - 10`
pub const TIME_TICK_TOP_OFFSET: usize = 15;
pub const TIME_TICK_BOTTOM_OFFSET: usize = 10;

/// Centre line drawn under the failure placeholder
pub const PLACEHOLDER_LINE: Rgba = Rgba::opaque(50, 50, 50);

/// EQ overlay tints (alpha comes from the band gain)
pub const EQ_BASS_TINT: Rgba = Rgba::opaque(255, 100, 100);
pub const EQ_MID_TINT: Rgba = Rgba::opaque(100, 255, 100);
pub const EQ_TREBLE_TINT: Rgba = Rgba::opaque(100, 100, 255);
pub const EQ_BOUNDARY: Rgba = Rgba::new(243, 207, 44, 180);
