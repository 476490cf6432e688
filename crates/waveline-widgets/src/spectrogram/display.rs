//! Two-pass spectrogram consumer
//!
//! Loading a track builds a low-resolution preview on the spot and queues
//! the full-resolution pass on a worker. When the full pass lands it
//! replaces the preview, unless another track was loaded in the meantime.

use std::sync::Arc;

use rayon::prelude::*;
use waveline_core::analysis::spectrogram::{
    eq_band_overlay, time_labels, AxisLabel, EqBandOverlay, EqGains, FrequencyScale,
};
use waveline_core::analysis::{build_full, build_preview, SpectralAnalyzer, SpectrogramBitmap};
use waveline_core::config::{BandConfig, SpectrogramConfig, VisualizerConfig};
use waveline_core::{AudioSamples, Result, VisualizationError};

use crate::frame_buffer::{DirtyRect, FrameBuffer, Rgba};
use crate::theme;
use crate::waveform::FrameUpdate;
use crate::worker::{JobPoll, PendingJob, WorkerPool};

/// Shown while the first bitmap is being built
pub const GENERATING_MESSAGE: &str = "Generating spectrogram...";

/// Shown when there is nothing to draw
pub const NO_AUDIO_MESSAGE: &str = "No audio data available...";

/// Dash and gap length of the EQ boundary lines
const BOUNDARY_DASH_PX: usize = 4;

/// Which pass the bitmap on screen came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrogramPass {
    Preview,
    Full,
}

struct FullPassJob {
    generation: u64,
    job: PendingJob<SpectrogramBitmap>,
}

pub struct SpectrogramDisplay {
    config: SpectrogramConfig,
    bands: BandConfig,
    pool: Arc<WorkerPool>,
    analyzer: Option<Arc<dyn SpectralAnalyzer>>,

    audio: Option<AudioSamples>,
    /// Bumped per loaded track; full-pass results from older generations are dropped
    generation: u64,
    full_job: Option<FullPassJob>,
    full_passes_launched: u64,
    bitmap: Option<SpectrogramBitmap>,
    pass: Option<SpectrogramPass>,

    position_ms: f64,
    duration_ms: f64,
    eq_gains: EqGains,
    frame: FrameBuffer,
}

impl SpectrogramDisplay {
    pub fn new(
        config: &VisualizerConfig,
        pool: Arc<WorkerPool>,
        analyzer: Option<Arc<dyn SpectralAnalyzer>>,
    ) -> Self {
        Self {
            config: config.spectrogram.clone(),
            bands: config.bands.clone(),
            pool,
            analyzer,
            audio: None,
            generation: 0,
            full_job: None,
            full_passes_launched: 0,
            bitmap: None,
            pass: None,
            position_ms: 0.0,
            duration_ms: 0.0,
            eq_gains: EqGains::default(),
            frame: FrameBuffer::new(0, 0, theme::SPECTROGRAM_BACKGROUND),
        }
    }

    /// Load a track: preview now, full pass in the background
    pub fn set_samples(&mut self, audio: AudioSamples) -> FrameUpdate {
        if let Some(current) = &self.audio {
            if current.same_content(&audio) {
                return FrameUpdate::None;
            }
        }

        self.generation += 1;
        self.full_job = None;
        self.bitmap = None;
        self.pass = None;

        if audio.is_empty() || audio.sample_rate() == 0 {
            self.audio = None;
            self.duration_ms = 0.0;
            return self.redraw();
        }

        self.duration_ms = audio.duration_ms();
        let Some(analyzer) = self.analyzer.clone() else {
            log::warn!("SpectrogramDisplay: no spectral analyzer bound, nothing to draw");
            self.audio = Some(audio);
            return self.redraw();
        };

        match build_preview(&audio, Some(analyzer.as_ref()), &self.config, self.frame.width().max(1)) {
            Ok(preview) => {
                log::debug!("Spectrogram preview ready: {:?}", preview);
                self.bitmap = Some(preview);
                self.pass = Some(SpectrogramPass::Preview);
            }
            Err(e) => log::warn!("Spectrogram preview failed: {}", e),
        }

        let job_audio = audio.clone();
        let config = self.config.clone();
        let job = self.pool.spawn_job("spectrogram", move || {
            build_full(&job_audio, Some(analyzer.as_ref()), &config)
        });
        self.full_passes_launched += 1;
        self.full_job = Some(FullPassJob {
            generation: self.generation,
            job,
        });

        self.audio = Some(audio);
        self.redraw()
    }

    /// Tick handler: publish the full pass when it lands
    pub fn poll(&mut self) -> FrameUpdate {
        let Some(full) = self.full_job.as_mut() else {
            return FrameUpdate::None;
        };
        let result = match full.job.poll() {
            JobPoll::Pending => return FrameUpdate::None,
            JobPoll::Done(result) => result,
        };
        let generation = full.generation;
        self.full_job = None;

        if generation != self.generation {
            log::debug!("Discarding stale spectrogram (generation {})", generation);
            return FrameUpdate::None;
        }

        match result {
            Ok(bitmap) => {
                log::info!("Spectrogram full pass published: {}x{}", bitmap.width(), bitmap.height());
                self.bitmap = Some(bitmap);
                self.pass = Some(SpectrogramPass::Full);
            }
            Err(e) => {
                // Keep the preview if there is one
                log::error!("Spectrogram full pass failed: {}", e);
            }
        }
        self.redraw()
    }

    /// Move the playhead; returns the strip covering its old and new columns
    pub fn update_position(&mut self, position_ms: f64, duration_ms: f64) -> FrameUpdate {
        if !(duration_ms > 0.0) {
            return FrameUpdate::None;
        }
        let old_x = self.playhead_x();
        self.position_ms = position_ms;
        self.duration_ms = duration_ms;

        if self.bitmap.is_none() {
            return self.redraw();
        }
        let Some(new_x) = self.playhead_x() else {
            return FrameUpdate::None;
        };
        let old_x = old_x.unwrap_or(new_x);
        if old_x == new_x {
            return FrameUpdate::None;
        }

        let (lo, hi) = (old_x.min(new_x), old_x.max(new_x));
        let rect = DirtyRect::columns(
            lo.saturating_sub(1),
            hi + theme::PLAYHEAD_WIDTH + 1,
            self.frame.width(),
            self.frame.height(),
        );
        self.draw_region(rect);
        FrameUpdate::Partial(rect)
    }

    /// New EQ gains change the band tint opacity
    pub fn update_eq_gains(&mut self, gains: EqGains) -> FrameUpdate {
        if gains == self.eq_gains {
            return FrameUpdate::None;
        }
        self.eq_gains = gains;
        self.redraw()
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(VisualizationError::InvalidDimensions { width, height });
        }
        if width == self.frame.width() && height == self.frame.height() {
            return Ok(());
        }
        self.frame = FrameBuffer::new(width, height, theme::SPECTROGRAM_BACKGROUND);
        self.redraw();
        Ok(())
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn bitmap(&self) -> Option<&SpectrogramBitmap> {
        self.bitmap.as_ref()
    }

    pub fn pass(&self) -> Option<SpectrogramPass> {
        self.pass
    }

    pub fn eq_gains(&self) -> EqGains {
        self.eq_gains
    }

    pub fn full_passes_launched(&self) -> u64 {
        self.full_passes_launched
    }

    pub fn is_busy(&self) -> bool {
        self.full_job.is_some()
    }

    /// Message to overlay when there is no bitmap
    pub fn placeholder(&self) -> Option<&'static str> {
        match (&self.bitmap, &self.full_job) {
            (Some(_), _) => None,
            (None, Some(_)) => Some(GENERATING_MESSAGE),
            (None, None) => Some(NO_AUDIO_MESSAGE),
        }
    }

    /// Playhead column, once a duration is known
    pub fn playhead_x(&self) -> Option<usize> {
        let width = self.frame.width();
        if !(self.duration_ms > 0.0) || width == 0 {
            return None;
        }
        let ratio = (self.position_ms / self.duration_ms).clamp(0.0, 1.0);
        Some(((width as f64 * ratio) as usize).min(width - 1))
    }

    /// Frequency scale of the bitmap on screen
    pub fn frequency_scale(&self) -> Option<FrequencyScale> {
        self.bitmap.as_ref().map(|b| *b.scale())
    }

    /// Frequency axis labels, rows in frame coordinates
    pub fn frequency_labels(&self) -> Vec<AxisLabel> {
        self.frequency_scale()
            .map(|scale| scale.frequency_labels(self.frame.height()))
            .unwrap_or_default()
    }

    /// Time axis labels, columns in frame coordinates
    pub fn time_labels(&self) -> Vec<AxisLabel> {
        time_labels(self.duration_ms, self.frame.width())
    }

    pub fn eq_overlay(&self) -> Option<EqBandOverlay> {
        self.frequency_scale()
            .map(|scale| eq_band_overlay(&scale, &self.bands, self.frame.height(), self.eq_gains))
    }

    fn redraw(&mut self) -> FrameUpdate {
        let rect = DirtyRect::full(self.frame.width(), self.frame.height());
        self.draw_region(rect);
        FrameUpdate::Full
    }

    /// Repaint every layer inside `rect`: bitmap, EQ bands, playhead
    fn draw_region(&mut self, rect: DirtyRect) {
        let (width, height) = (self.frame.width(), self.frame.height());
        if rect.is_empty() || width == 0 {
            return;
        }

        let Some(bitmap) = &self.bitmap else {
            self.frame.fill_rect(rect, theme::SPECTROGRAM_BACKGROUND);
            return;
        };
        let overlay = eq_band_overlay(bitmap.scale(), &self.bands, height, self.eq_gains);
        let (x0, x1) = (rect.x.min(width), rect.right().min(width));

        self.frame
            .pixels_mut()
            .par_chunks_mut(width)
            .enumerate()
            .skip(rect.y)
            .take(rect.height)
            .for_each(|(y, row)| {
                let by = y * bitmap.height() / height;
                let tint = band_tint(&overlay, y);
                for (x, px) in row.iter_mut().enumerate().take(x1).skip(x0) {
                    let bx = x * bitmap.width() / width;
                    let base = bitmap
                        .color_at(bx, by)
                        .map_or(theme::SPECTROGRAM_BACKGROUND, Rgba::from);
                    let mut color = tint.over(base);
                    if (y == overlay.bass_y || y == overlay.mid_y) && (x / BOUNDARY_DASH_PX) % 2 == 0 {
                        color = theme::EQ_BOUNDARY.over(color);
                    }
                    *px = color;
                }
            });

        if let Some(x) = self.playhead_x() {
            let bottom = height.saturating_sub(1) as f32;
            for dx in 0..theme::PLAYHEAD_WIDTH {
                if (x0..x1).contains(&(x + dx)) {
                    self.frame.vline(x + dx, 0.0, bottom, theme::PLAYHEAD);
                }
            }
        }
    }
}

/// Band tint for frame row `y`: treble above `mid_y`, bass from `bass_y` down
fn band_tint(overlay: &EqBandOverlay, y: usize) -> Rgba {
    if y >= overlay.bass_y {
        theme::EQ_BASS_TINT.with_alpha(overlay.bass_alpha)
    } else if y >= overlay.mid_y {
        theme::EQ_MID_TINT.with_alpha(overlay.mid_alpha)
    } else {
        theme::EQ_TREBLE_TINT.with_alpha(overlay.treble_alpha)
    }
}

impl std::fmt::Debug for SpectrogramDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrogramDisplay")
            .field("generation", &self.generation)
            .field("audio", &self.audio)
            .field("pass", &self.pass)
            .field("busy", &self.is_busy())
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
