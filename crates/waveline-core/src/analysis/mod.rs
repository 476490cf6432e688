//! Signal analysis: band-energy coloring, track timelines and spectrograms
//!
//! Everything here is synchronous and side-effect free. The widgets crate
//! decides which thread runs it.

pub mod classifier;
pub mod precompute;
pub mod spectral;
pub mod spectrogram;
pub mod timeline;

pub use classifier::{
    BandClassifier, BandEnergies, DEFAULT_SEGMENT_COLOR, INVALID_COLOR, NEUTRAL_COLOR,
};
pub use precompute::{num_windows, precompute_timeline};
pub use spectral::{
    apply_window, hanning_window_fallback, window_for, RealFftAnalyzer, SpectralAnalyzer,
};
pub use spectrogram::{build_full, build_preview, FrequencyScale, SpectrogramBitmap};
pub use timeline::{Timeline, TimelineEntry, TimelineState};
