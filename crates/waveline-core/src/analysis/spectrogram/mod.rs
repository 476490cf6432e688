//! Spectrogram builder
//!
//! Turns STFT magnitude frames into a palette-indexed bitmap:
//!
//! 1. Resample each frame onto `rows` log-spaced frequency rows
//! 2. `log10(magnitude + ε)`
//! 3. Normalize below the 99th percentile over a fixed dynamic range
//! 4. Gamma, then scale to 0..=255 palette indices
//!
//! Row 0 of the bitmap is the highest frequency, so low frequencies end up
//! at the bottom when drawn top-down.

mod frames;
mod palette;
mod scale;

pub use frames::{compute_frames, FramePlan, SpectrogramFrames};
pub use palette::{spectrogram_palette, PALETTE_SIZE};
pub use scale::{
    band_alpha, eq_band_overlay, format_clock, format_frequency, time_label_interval_secs,
    time_labels, AxisLabel, EqBandOverlay, EqGains, FrequencyScale, FREQUENCY_LABEL_POINTS,
};

use std::time::Instant;

use rayon::prelude::*;

use super::spectral::SpectralAnalyzer;
use crate::config::SpectrogramConfig;
use crate::error::{Result, VisualizationError};
use crate::types::{AudioSamples, Rgb};

/// Added to magnitudes before taking the log
const LOG_EPSILON: f64 = 1e-10;

/// Palette-indexed spectrogram image
#[derive(Clone)]
pub struct SpectrogramBitmap {
    width: usize,
    height: usize,
    /// Row-major, row 0 = highest frequency
    indices: Vec<u8>,
    scale: FrequencyScale,
}

impl SpectrogramBitmap {
    /// Width in time frames
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in frequency rows
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn scale(&self) -> &FrequencyScale {
        &self.scale
    }

    pub fn palette(&self) -> &'static [Rgb; PALETTE_SIZE] {
        spectrogram_palette()
    }

    pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.indices[y * self.width + x])
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index_at(x, y).map(|i| spectrogram_palette()[i as usize])
    }
}

impl std::fmt::Debug for SpectrogramBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// Low-resolution preview, cheap enough to run on the consumer thread
pub fn build_preview(
    audio: &AudioSamples,
    analyzer: Option<&dyn SpectralAnalyzer>,
    config: &SpectrogramConfig,
    width: usize,
) -> Result<SpectrogramBitmap> {
    let plan = FramePlan::preview(config, audio, width);
    build_with_plan(audio, analyzer, config, &plan)
}

/// Full-resolution pass, meant for a worker
pub fn build_full(
    audio: &AudioSamples,
    analyzer: Option<&dyn SpectralAnalyzer>,
    config: &SpectrogramConfig,
) -> Result<SpectrogramBitmap> {
    let plan = FramePlan::full(config, audio);
    build_with_plan(audio, analyzer, config, &plan)
}

pub fn build_with_plan(
    audio: &AudioSamples,
    analyzer: Option<&dyn SpectralAnalyzer>,
    config: &SpectrogramConfig,
    plan: &FramePlan,
) -> Result<SpectrogramBitmap> {
    let analyzer = analyzer.ok_or(VisualizationError::AnalyzerUnavailable)?;
    let start = Instant::now();

    let frames = compute_frames(audio, analyzer, plan)?;
    let bitmap = render_bitmap(&frames, config)?;

    log::debug!(
        "Spectrogram {}x{} (window {}, hop {}, skip {}, decimate {}) in {:?}",
        bitmap.width,
        bitmap.height,
        plan.window_size,
        plan.hop,
        plan.frame_skip,
        plan.decimation,
        start.elapsed()
    );
    Ok(bitmap)
}

/// Map magnitude frames onto log-frequency rows and compress to indices
pub fn render_bitmap(frames: &SpectrogramFrames, config: &SpectrogramConfig) -> Result<SpectrogramBitmap> {
    let width = frames.columns.len();
    let height = config.rows.max(1);
    if width == 0 || frames.bins < 2 {
        return Err(VisualizationError::EmptyInput);
    }

    let scale = FrequencyScale::new(config.min_freq_display, config.max_freq_display, frames.sample_rate);
    let fft_n = (frames.bins - 1) * 2;
    let hz_per_bin = frames.sample_rate / fft_n as f64;

    // Fractional bin sampled by each row, centered in the row
    let bin_positions: Vec<f64> = (0..height)
        .map(|y| scale.frequency_at_y(y as f64 + 0.5, height) / hz_per_bin)
        .collect();

    let mut levels = vec![0.0f32; width * height];
    levels
        .par_chunks_mut(width)
        .zip(bin_positions.par_iter())
        .for_each(|(row, &bin)| {
            for (level, column) in row.iter_mut().zip(frames.columns.iter()) {
                *level = (sample_bin(column, bin) as f64 + LOG_EPSILON).log10() as f32;
            }
        });

    Ok(SpectrogramBitmap {
        width,
        height,
        indices: compress_levels(&levels, config.dynamic_range_db, config.gamma),
        scale,
    })
}

/// Linear interpolation between the two bins around `position`
fn sample_bin(column: &[f32], position: f64) -> f32 {
    let last = column.len().saturating_sub(1);
    let lo = (position.floor().max(0.0) as usize).min(last);
    let hi = (lo + 1).min(last);
    let frac = (position - lo as f64).clamp(0.0, 1.0) as f32;
    column[lo] + (column[hi] - column[lo]) * frac
}

/// Nearest-rank percentile; reorders `values`
fn percentile(values: &mut [f32], pct: f64) -> f32 {
    let rank = ((pct / 100.0) * (values.len() - 1) as f64).round() as usize;
    let (_, value, _) = values.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
    *value
}

/// Dynamic-range compression of log magnitudes into palette indices
///
/// The ceiling is the 99th percentile and the window below it is a fixed
/// `dynamic_range_db / 10` decades, whatever the spread of the data. Levels
/// are clamped to the window, gamma-corrected and scaled to 0..=255.
pub fn compress_levels(levels: &[f32], dynamic_range_db: f64, gamma: f64) -> Vec<u8> {
    if levels.is_empty() {
        return Vec::new();
    }

    let span = dynamic_range_db / 10.0;
    if !(span > 0.0) {
        log::warn!("compress_levels: dynamic range {} dB is not positive", dynamic_range_db);
        return vec![0; levels.len()];
    }

    let mut scratch = levels.to_vec();
    let p99 = percentile(&mut scratch, 99.0) as f64;
    let floor = p99 - span;

    levels
        .par_iter()
        .map(|&level| {
            let normalized = ((level as f64 - floor) / span).clamp(0.0, 1.0);
            (normalized.powf(gamma) * 255.0).clamp(0.0, 255.0) as u8
        })
        .collect()
}
