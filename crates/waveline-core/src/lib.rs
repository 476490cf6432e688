//! Waveline Core - analysis side of the waveform/spectrogram pipeline
//!
//! Everything in here is pure data crunching with no notion of a consumer
//! thread: spectral analysis, band-energy coloring, track timelines,
//! spectrogram bitmaps, the result cache and configuration.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod error;
pub mod types;

pub use error::{Result, VisualizationError};
pub use types::*;
