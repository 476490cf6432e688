//! Visualizer configuration
//!
//! Stored as `visualizer.yaml`. Every section uses `#[serde(default)]` so a
//! file that only sets one field still loads.

use serde::{Deserialize, Serialize};

use crate::types::Rgb;

/// Top-level visualizer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub waveform: WaveformConfig,
    pub bands: BandConfig,
    pub spectrogram: SpectrogramConfig,
    pub workers: WorkerConfig,
}

/// Scrolling waveform settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// FFT window for track precompute and on-the-fly coloring
    pub fft_size: usize,
    /// Without a timeline, classify only every N columns and hold the color
    pub fft_calc_interval_pixels: usize,
    /// Visible time span in milliseconds
    pub view_window_ms: f64,
    /// Playhead position as a fraction of the width, measured from the left
    pub playhead_ratio: f64,
    /// Minimum spacing between applied viewport updates (~30/sec)
    pub min_update_interval_ms: u64,
    /// Position change, as a fraction of the view window, that forces a full render
    pub invalidate_threshold: f64,
    /// Columns either side of the playhead repainted on a minor tick
    pub playhead_margin_px: usize,
    /// Envelope scale: amplitude 1.0 reaches height / divisor from the center
    pub amplitude_scale_divisor: f64,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            fft_calc_interval_pixels: 5,
            view_window_ms: 10_000.0,
            playhead_ratio: 0.3,
            min_update_interval_ms: 33,
            invalidate_threshold: 0.05,
            playhead_margin_px: 2,
            amplitude_scale_divisor: 2.5,
        }
    }
}

impl WaveformConfig {
    /// Replace out-of-range values with their defaults
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.fft_size < 2 {
            log::warn!("waveform.fft_size {} too small, using {}", self.fft_size, defaults.fft_size);
            self.fft_size = defaults.fft_size;
        }
        if self.fft_calc_interval_pixels == 0 {
            self.fft_calc_interval_pixels = defaults.fft_calc_interval_pixels;
        }
        if !(self.view_window_ms > 0.0) {
            self.view_window_ms = defaults.view_window_ms;
        }
        if !(0.0..=1.0).contains(&self.playhead_ratio) {
            self.playhead_ratio = defaults.playhead_ratio;
        }
        if !(self.invalidate_threshold > 0.0) {
            self.invalidate_threshold = defaults.invalidate_threshold;
        }
        if !(self.amplitude_scale_divisor > 0.0) {
            self.amplitude_scale_divisor = defaults.amplitude_scale_divisor;
        }
        self
    }
}

/// Frequency bands and their colors for band-energy classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Bins below this frequency count towards no band
    pub low_min_hz: f64,
    pub low_mid_cutoff_hz: f64,
    pub mid_high_cutoff_hz: f64,
    pub low_color: Rgb,
    pub mid_color: Rgb,
    pub high_color: Rgb,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            low_min_hz: 20.0,
            low_mid_cutoff_hz: 250.0,
            mid_high_cutoff_hz: 4000.0,
            low_color: Rgb::RED,
            mid_color: Rgb::GREEN,
            high_color: Rgb::BLUE,
        }
    }
}

/// Spectrogram builder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Full-resolution FFT window
    pub window_size: usize,
    /// Full-resolution hop is `window_size / hop_divisor` (4 = 75% overlap)
    pub hop_divisor: usize,
    /// Preview window; the preview hop equals the window
    pub preview_window_size: usize,
    /// Upper bound on preview frames (also bounded by display width)
    pub preview_max_frames: usize,
    /// Tracks longer than this are decimated for the preview
    pub preview_downsample_after_secs: f64,
    /// Tracks longer than this skip frames in the full pass
    pub full_frame_skip_after_secs: f64,
    pub min_freq_display: f64,
    pub max_freq_display: f64,
    pub dynamic_range_db: f64,
    pub gamma: f64,
    /// Bitmap height (log-frequency rows)
    pub rows: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_divisor: 4,
            preview_window_size: 1024,
            preview_max_frames: 100,
            preview_downsample_after_secs: 180.0,
            full_frame_skip_after_secs: 300.0,
            min_freq_display: 20.0,
            max_freq_display: 20_000.0,
            dynamic_range_db: 60.0,
            gamma: 0.7,
            rows: 256,
        }
    }
}

impl SpectrogramConfig {
    /// Full-resolution hop size
    pub fn hop(&self) -> usize {
        (self.window_size / self.hop_divisor.max(1)).max(1)
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub threads: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}
