//! Spectrogram display
//!
//! Shows a whole track as a log-frequency heat map with a playhead and the
//! three EQ bands tinted by their current gain. The bitmap itself comes from
//! `waveline_core::analysis::spectrogram`; this module schedules the two
//! passes and draws the result into a [`FrameBuffer`](crate::FrameBuffer).

mod display;

pub use display::{SpectrogramDisplay, SpectrogramPass, GENERATING_MESSAGE, NO_AUDIO_MESSAGE};
