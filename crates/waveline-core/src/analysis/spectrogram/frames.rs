//! STFT frame generation for the spectrogram passes

use std::borrow::Cow;

use rayon::prelude::*;

use crate::analysis::precompute::num_windows;
use crate::analysis::spectral::{apply_window, window_for, SpectralAnalyzer};
use crate::config::SpectrogramConfig;
use crate::error::{Result, VisualizationError};
use crate::types::AudioSamples;

/// How a pass slices the track into frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    pub window_size: usize,
    pub hop: usize,
    /// Keep every Nth sample before framing
    pub decimation: usize,
    /// Analyze every Nth frame
    pub frame_skip: usize,
    /// Drop skipped frames instead of keeping them as silent columns
    pub compact: bool,
}

impl FramePlan {
    /// Quick low-resolution pass for immediate feedback
    ///
    /// Hop equals the window, long tracks are decimated, and at most
    /// `min(width, preview_max_frames)` frames are analyzed.
    pub fn preview(config: &SpectrogramConfig, audio: &AudioSamples, width: usize) -> Self {
        let window_size = config.preview_window_size.max(2);
        let duration_secs = audio.duration_ms() / 1000.0;
        let decimation = skip_factor(duration_secs, config.preview_downsample_after_secs);
        let len = audio.len().div_ceil(decimation);
        let max_frames = width.min(config.preview_max_frames).max(1);

        Self {
            window_size,
            hop: window_size,
            decimation,
            frame_skip: (len / (max_frames * window_size)).max(1),
            compact: true,
        }
    }

    /// Full-resolution pass; very long tracks skip frames
    pub fn full(config: &SpectrogramConfig, audio: &AudioSamples) -> Self {
        let duration_secs = audio.duration_ms() / 1000.0;
        Self {
            window_size: config.window_size.max(2),
            hop: config.hop(),
            decimation: 1,
            frame_skip: skip_factor(duration_secs, config.full_frame_skip_after_secs),
            compact: false,
        }
    }
}

/// `floor(duration / threshold)` once the track is longer than `threshold`
fn skip_factor(duration_secs: f64, threshold_secs: f64) -> usize {
    if threshold_secs > 0.0 && duration_secs > threshold_secs {
        ((duration_secs / threshold_secs) as usize).max(1)
    } else {
        1
    }
}

/// Magnitude columns for one pass
pub struct SpectrogramFrames {
    /// One `bins`-long magnitude vector per time frame
    pub columns: Vec<Vec<f32>>,
    pub bins: usize,
    /// Sample rate after decimation
    pub sample_rate: f64,
}

impl std::fmt::Debug for SpectrogramFrames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramFrames")
            .field("columns", &format!("<{} frames>", self.columns.len()))
            .field("bins", &self.bins)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

/// Run the STFT described by `plan`, frames in parallel
pub fn compute_frames(
    audio: &AudioSamples,
    analyzer: &dyn SpectralAnalyzer,
    plan: &FramePlan,
) -> Result<SpectrogramFrames> {
    if audio.is_empty() || audio.sample_rate() == 0 {
        return Err(VisualizationError::EmptyInput);
    }

    let decimation = plan.decimation.max(1);
    let samples: Cow<[f32]> = if decimation > 1 {
        Cow::Owned(audio.samples().iter().step_by(decimation).copied().collect())
    } else {
        Cow::Borrowed(audio.samples())
    };

    let window_size = plan.window_size;
    let count = num_windows(samples.len(), window_size, plan.hop);
    if count == 0 {
        return Err(VisualizationError::EmptyInput);
    }

    let bins = window_size / 2 + 1;
    let window = window_for(analyzer, window_size);
    let frame_skip = plan.frame_skip.max(1);
    let silent = || (!plan.compact).then(|| vec![0.0f32; bins]);

    let columns: Vec<Vec<f32>> = (0..count)
        .into_par_iter()
        .filter_map(|i| {
            if i % frame_skip != 0 {
                return silent();
            }
            let offset = i * plan.hop;
            let frame = &samples[offset..offset + window_size];
            match analyzer.fft_magnitudes(&apply_window(frame, &window)) {
                Some(mut magnitudes) if !magnitudes.is_empty() => {
                    magnitudes.resize(bins, 0.0);
                    Some(magnitudes)
                }
                _ => silent(),
            }
        })
        .collect();

    if columns.is_empty() {
        return Err(VisualizationError::EmptyInput);
    }

    Ok(SpectrogramFrames {
        columns,
        bins,
        sample_rate: audio.sample_rate() as f64 / decimation as f64,
    })
}
