//! Configuration for the visualization pipeline
//!
//! - Generic YAML config loading/saving
//! - Default config location
//! - `VisualizerConfig` with waveform, band, spectrogram and worker sections
//!
//! # Usage
//!
//! ```ignore
//! use waveline_core::config::{load_config, default_config_path, VisualizerConfig};
//!
//! let config: VisualizerConfig = load_config(&default_config_path("visualizer.yaml"));
//! ```

mod io;
mod paths;
mod visualizer;

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path};
pub use visualizer::{
    BandConfig, SpectrogramConfig, VisualizerConfig, WaveformConfig, WorkerConfig,
};
