//! Frame buffer manager for one scrolling waveform
//!
//! Owns the rendered frame and decides, per viewport tick, between a full
//! re-render on a worker and a cheap playhead patch over the retained frame:
//!
//! ```text
//!   Invalid ──launch──▶ Rendering ──result──▶ Valid
//!      ▲                                        │
//!      └──── new samples / resize / beats / ────┘
//!            significant move / timeline ready
//! ```
//!
//! Everything here runs on the consumer thread. Workers only ever see
//! `Arc`-backed snapshots and hand back owned segment lists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use waveline_core::analysis::{BandClassifier, SpectralAnalyzer, TimelineState};
use waveline_core::cache::ResultCache;
use waveline_core::config::{VisualizerConfig, WaveformConfig};
use waveline_core::{AudioSamples, Result, VisualizationError};

use crate::frame_buffer::{DirtyRect, FrameBuffer};
use crate::theme;
use crate::worker::{JobPoll, PendingJob, WorkerPool};

use super::draw::{draw_frame, draw_placeholder, draw_playhead, playhead_strip, restore_columns, FrameOverlay};
use super::precomputer::{PrecomputeEvent, TrackPrecomputer};
use super::render::{render_segments, RenderRequest, RenderSegment, TimeTick};
use super::viewport::Viewport;

/// Shown while no track is loaded
pub const LOAD_TRACK_MESSAGE: &str = "Load track first...";

/// Shown after a render failed
pub const ERROR_MESSAGE: &str = "Error loading tracks...";

/// Validity of the owned frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Needs a render; one is launched as soon as none is in flight
    Invalid,
    /// Render job `request_id` is in flight for the current generation
    Rendering { request_id: u64 },
    /// Frame matches the current track, size and beats
    Valid,
}

/// What the host should repaint after a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    None,
    Full,
    Partial(DirtyRect),
}

impl FrameUpdate {
    /// Combine two updates from the same tick
    pub fn merge(self, other: FrameUpdate) -> FrameUpdate {
        match (self, other) {
            (FrameUpdate::Full, _) | (_, FrameUpdate::Full) => FrameUpdate::Full,
            (FrameUpdate::Partial(a), FrameUpdate::Partial(b)) => FrameUpdate::Partial(a.union(&b)),
            (FrameUpdate::Partial(a), FrameUpdate::None) | (FrameUpdate::None, FrameUpdate::Partial(a)) => {
                FrameUpdate::Partial(a)
            }
            (FrameUpdate::None, FrameUpdate::None) => FrameUpdate::None,
        }
    }
}

/// Render job plus the generation and viewport it was launched for
struct RenderJob {
    generation: u64,
    viewport: Viewport,
    job: PendingJob<Vec<RenderSegment>>,
}

/// What the current frame was drawn from, kept for playhead patches
struct RenderedFrame {
    viewport: Viewport,
    segments: Vec<RenderSegment>,
    overlay: FrameOverlay,
}

/// Viewport tick held back by the update gate
#[derive(Debug, Clone)]
struct PendingViewport {
    position_ms: f64,
    duration_ms: f64,
    beats: Option<Vec<f64>>,
}

pub struct WaveformDisplay {
    config: WaveformConfig,
    pool: Arc<WorkerPool>,
    analyzer: Option<Arc<dyn SpectralAnalyzer>>,
    classifier: Arc<BandClassifier>,
    precomputer: TrackPrecomputer,

    /// Loaded track; `None` shows the load placeholder
    audio: Option<AudioSamples>,
    /// Beat positions in ms
    beats: Vec<f64>,
    timeline: TimelineState,
    duration_ms: f64,
    position_ms: f64,

    frame: FrameBuffer,
    state: FrameState,
    /// Bumped on every invalidation; render results from older generations are dropped
    generation: u64,
    render: Option<RenderJob>,
    renders_launched: u64,
    rendered: Option<RenderedFrame>,
    /// Viewport of a render that failed; anchors moves until something changes
    failed_viewport: Option<Viewport>,
    /// Column the playhead was last drawn at
    playhead_drawn_x: Option<usize>,
    placeholder: Option<&'static str>,

    /// When the last viewport tick was applied
    last_update: Option<Instant>,
    pending: Option<PendingViewport>,
}

impl WaveformDisplay {
    /// Create an empty display with a 0x0 frame; call [`resize`](Self::resize) before use
    pub fn new(
        config: &VisualizerConfig,
        pool: Arc<WorkerPool>,
        analyzer: Option<Arc<dyn SpectralAnalyzer>>,
        cache: Option<Arc<dyn ResultCache>>,
    ) -> Self {
        let waveform = config.waveform.clone().validated();
        let classifier = Arc::new(BandClassifier::new(config.bands.clone()));

        if analyzer.is_none() {
            log::warn!("WaveformDisplay: no spectral analyzer bound, colors fall back to gray");
        }

        let precomputer = TrackPrecomputer::new(
            Arc::clone(&pool),
            analyzer.clone(),
            cache,
            Arc::clone(&classifier),
            waveform.fft_size,
        );

        Self {
            config: waveform,
            pool,
            analyzer,
            classifier,
            precomputer,
            audio: None,
            beats: Vec::new(),
            timeline: TimelineState::NotComputed,
            duration_ms: 0.0,
            position_ms: 0.0,
            frame: FrameBuffer::new(0, 0, theme::BACKGROUND),
            state: FrameState::Valid,
            generation: 0,
            render: None,
            renders_launched: 0,
            rendered: None,
            failed_viewport: None,
            playhead_drawn_x: None,
            placeholder: Some(LOAD_TRACK_MESSAGE),
            last_update: None,
            pending: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entry points
    // ─────────────────────────────────────────────────────────────────────

    /// Load a track
    ///
    /// Identical samples with identical beats are a no-op. Identical samples
    /// with different beats only invalidate the frame. Empty samples unload.
    pub fn set_samples(&mut self, audio: AudioSamples, beats: &[f64]) -> FrameUpdate {
        if audio.is_empty() || audio.sample_rate() == 0 {
            return self.unload();
        }

        if let Some(current) = &self.audio {
            if current.same_content(&audio) {
                if self.beats == beats {
                    log::debug!("set_samples: unchanged track and beats, skipping");
                    return FrameUpdate::None;
                }
                log::debug!("set_samples: beats changed ({} -> {})", self.beats.len(), beats.len());
                self.beats = beats.to_vec();
                self.invalidate();
                self.launch_if_needed();
                return FrameUpdate::None;
            }
        }

        log::info!(
            "Loading track into waveform: {:.1}s @ {} Hz, {} beats",
            audio.duration_ms() / 1000.0,
            audio.sample_rate(),
            beats.len()
        );

        self.duration_ms = audio.duration_ms();
        self.beats = beats.to_vec();
        self.timeline = TimelineState::NotComputed;
        self.rendered = None;
        self.playhead_drawn_x = None;
        self.placeholder = None;
        self.precomputer.request(&audio);
        self.audio = Some(audio);
        self.invalidate();
        self.launch_if_needed();
        FrameUpdate::None
    }

    /// Viewport tick using the current time for the update gate
    pub fn set_viewport(&mut self, position_ms: f64, duration_ms: f64, beats: Option<&[f64]>) -> FrameUpdate {
        self.set_viewport_at(position_ms, duration_ms, beats, Instant::now())
    }

    /// Viewport tick at `now`
    ///
    /// Ticks closer together than `min_update_interval_ms` are held back and
    /// applied from [`poll_at`](Self::poll_at); the last one wins.
    pub fn set_viewport_at(
        &mut self,
        position_ms: f64,
        duration_ms: f64,
        beats: Option<&[f64]>,
        now: Instant,
    ) -> FrameUpdate {
        if !self.gate_open(now) {
            self.pending = Some(PendingViewport {
                position_ms,
                duration_ms,
                beats: beats.map(<[f64]>::to_vec),
            });
            return FrameUpdate::None;
        }

        self.last_update = Some(now);
        self.pending = None;
        self.apply_viewport(position_ms, duration_ms, beats)
    }

    /// Resize the frame; zero in either dimension is rejected
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(VisualizationError::InvalidDimensions { width, height });
        }
        if width == self.frame.width() && height == self.frame.height() {
            return Ok(());
        }

        log::debug!("WaveformDisplay resized to {}x{}", width, height);
        self.frame = FrameBuffer::new(width, height, theme::BACKGROUND);
        self.rendered = None;
        self.playhead_drawn_x = None;

        if self.audio.is_none() {
            self.show_placeholder(LOAD_TRACK_MESSAGE, false);
        } else {
            self.invalidate();
            self.launch_if_needed();
        }
        Ok(())
    }

    /// Tick handler using the current time
    pub fn poll(&mut self) -> FrameUpdate {
        self.poll_at(Instant::now())
    }

    /// Tick handler: collect finished jobs and apply any held-back viewport
    pub fn poll_at(&mut self, now: Instant) -> FrameUpdate {
        let mut update = FrameUpdate::None;

        if let Some(event) = self.precomputer.poll() {
            self.on_precompute(event);
        }

        update = update.merge(self.collect_render());

        if self.pending.is_some() && self.gate_open(now) {
            if let Some(pending) = self.pending.take() {
                self.last_update = Some(now);
                update = update.merge(self.apply_viewport(
                    pending.position_ms,
                    pending.duration_ms,
                    pending.beats.as_deref(),
                ));
            }
        }

        self.launch_if_needed();
        update
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Segments of the frame on screen (empty for a placeholder)
    pub fn segments(&self) -> &[RenderSegment] {
        self.rendered.as_ref().map(|r| r.segments.as_slice()).unwrap_or_default()
    }

    /// Time ticks of the frame on screen, for the host to label
    pub fn ticks(&self) -> &[TimeTick] {
        self.rendered.as_ref().map(|r| r.overlay.ticks.as_slice()).unwrap_or_default()
    }

    /// Viewport the frame on screen was rendered at
    pub fn rendered_viewport(&self) -> Option<Viewport> {
        self.rendered.as_ref().map(|r| r.viewport)
    }

    pub fn timeline_state(&self) -> &TimelineState {
        &self.timeline
    }

    pub fn playhead_x(&self) -> Option<usize> {
        self.playhead_drawn_x
    }

    /// Message to overlay on a placeholder frame
    pub fn placeholder(&self) -> Option<&'static str> {
        self.placeholder
    }

    pub fn position_ms(&self) -> f64 {
        self.position_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    /// Track precompute jobs launched so far
    pub fn precompute_runs(&self) -> u64 {
        self.precomputer.launches()
    }

    pub fn renders_launched(&self) -> u64 {
        self.renders_launched
    }

    /// Whether any job is still outstanding
    pub fn is_busy(&self) -> bool {
        self.render.is_some() || self.precomputer.is_busy()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn gate_open(&self, now: Instant) -> bool {
        let interval = Duration::from_millis(self.config.min_update_interval_ms);
        self.last_update
            .map_or(true, |last| now.saturating_duration_since(last) >= interval)
    }

    fn apply_viewport(&mut self, position_ms: f64, duration_ms: f64, beats: Option<&[f64]>) -> FrameUpdate {
        let Some(audio) = &self.audio else {
            self.position_ms = position_ms;
            return FrameUpdate::None;
        };

        let mut invalidate = false;

        let duration = audio.duration_ms();
        if duration_ms > 0.0 && (duration_ms - duration).abs() > 1.0 {
            log::debug!("set_viewport: host duration {:.0}ms ignored, track is {:.0}ms", duration_ms, duration);
        }
        if (duration - self.duration_ms).abs() > f64::EPSILON {
            self.duration_ms = duration;
            invalidate = true;
        }

        match beats {
            Some(beats) if beats != self.beats.as_slice() => {
                self.beats = beats.to_vec();
                invalidate = true;
            }
            None if !self.beats.is_empty() => {
                self.beats.clear();
                invalidate = true;
            }
            _ => {}
        }

        self.position_ms = position_ms;

        let significant = self.anchor_viewport().map_or(true, |anchor| {
            anchor.is_significant_move(position_ms, self.config.invalidate_threshold)
        });

        if invalidate || significant {
            self.invalidate();
            self.launch_if_needed();
            return FrameUpdate::None;
        }

        if self.state == FrameState::Valid {
            return self.patch_playhead();
        }
        FrameUpdate::None
    }

    /// Viewport of the render in flight, else of the frame on screen, else
    /// of the last failed render
    ///
    /// Anchoring on a failed render keeps unchanged ticks from retrying it.
    fn anchor_viewport(&self) -> Option<Viewport> {
        self.render
            .as_ref()
            .filter(|r| r.generation == self.generation)
            .map(|r| r.viewport)
            .or_else(|| self.rendered_viewport())
            .or(self.failed_viewport)
    }

    /// Column of the current position within the frame on screen
    fn playhead_column(&self, viewport: &Viewport) -> usize {
        let width = self.frame.width();
        viewport
            .x_for_time(self.position_ms, width)
            .unwrap_or_else(|| viewport.playhead_x(width))
            .min(width.saturating_sub(1))
    }

    /// Move the playhead within the retained frame
    fn patch_playhead(&mut self) -> FrameUpdate {
        let Some(rendered) = &self.rendered else {
            return FrameUpdate::None;
        };
        let new_x = self.playhead_column(&rendered.viewport);
        if self.playhead_drawn_x == Some(new_x) {
            return FrameUpdate::None;
        }

        let (width, height) = (self.frame.width(), self.frame.height());
        let margin = self.config.playhead_margin_px;
        let new_strip = playhead_strip(new_x, margin, width, height);

        let dirty = match self.playhead_drawn_x {
            Some(old_x) => {
                let old_strip = playhead_strip(old_x, margin, width, height);
                restore_columns(&mut self.frame, &rendered.segments, &rendered.overlay, &old_strip);
                old_strip.union(&new_strip)
            }
            None => new_strip,
        };

        draw_playhead(&mut self.frame, new_x);
        self.playhead_drawn_x = Some(new_x);
        FrameUpdate::Partial(dirty)
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.state = FrameState::Invalid;
        self.failed_viewport = None;
    }

    /// Start a render if the frame is invalid and none is in flight
    fn launch_if_needed(&mut self) {
        if self.state != FrameState::Invalid || self.render.is_some() {
            return;
        }
        let Some(audio) = &self.audio else {
            return;
        };
        let (width, height) = (self.frame.width(), self.frame.height());
        if width == 0 || height == 0 {
            return;
        }

        let viewport = Viewport::new(self.position_ms, self.config.view_window_ms, self.config.playhead_ratio);
        let request = RenderRequest::new(
            audio.clone(),
            viewport,
            width,
            height,
            self.timeline.clone(),
            &self.config,
        );
        let analyzer = self.analyzer.clone();
        let classifier = Arc::clone(&self.classifier);

        log::debug!("Launching render (generation {}): {:?}", self.generation, request);
        let job = self.pool.spawn_job("render", move || {
            Ok(render_segments(&request, analyzer.as_deref(), &classifier))
        });

        self.state = FrameState::Rendering { request_id: job.id() };
        self.renders_launched += 1;
        self.render = Some(RenderJob {
            generation: self.generation,
            viewport,
            job,
        });
    }

    fn collect_render(&mut self) -> FrameUpdate {
        let Some(render) = self.render.as_mut() else {
            return FrameUpdate::None;
        };
        let result = match render.job.poll() {
            JobPoll::Pending => return FrameUpdate::None,
            JobPoll::Done(result) => result,
        };
        let (generation, viewport) = (render.generation, render.viewport);
        self.render = None;

        if generation != self.generation {
            log::debug!(
                "Discarding stale render (generation {}, current {})",
                generation,
                self.generation
            );
            return FrameUpdate::None;
        }

        match result {
            Ok(segments) => {
                let width = self.frame.width();
                let overlay = FrameOverlay::new(&viewport, &self.beats, width);
                let playhead_x = self.playhead_column(&viewport);
                draw_frame(&mut self.frame, &segments, &overlay, playhead_x);

                self.rendered = Some(RenderedFrame {
                    viewport,
                    segments,
                    overlay,
                });
                self.playhead_drawn_x = Some(playhead_x);
                self.placeholder = None;
            }
            Err(e) => {
                log::error!("Waveform render failed: {}", e);
                self.show_placeholder(ERROR_MESSAGE, true);
                self.failed_viewport = Some(viewport);
            }
        }
        self.state = FrameState::Valid;
        FrameUpdate::Full
    }

    fn on_precompute(&mut self, event: PrecomputeEvent) {
        match event {
            PrecomputeEvent::Ready { generation, .. } | PrecomputeEvent::Failed { generation, .. }
                if generation != self.precomputer.generation() =>
            {
                log::debug!(
                    "Ignoring precompute for replaced track (generation {}, current {})",
                    generation,
                    self.precomputer.generation()
                );
            }
            PrecomputeEvent::Ready { generation, timeline } => {
                log::info!("Timeline ready (generation {}, {} entries)", generation, timeline.len());
                self.timeline = TimelineState::from_timeline(timeline);
                self.invalidate();
            }
            PrecomputeEvent::Failed { generation, error } => {
                log::warn!(
                    "Timeline precompute failed (generation {}): {}; coloring on the fly",
                    generation,
                    error
                );
            }
        }
    }

    fn unload(&mut self) -> FrameUpdate {
        if self.audio.is_some() {
            log::info!("Unloading track from waveform");
        }
        self.audio = None;
        self.beats.clear();
        self.timeline = TimelineState::NotComputed;
        self.duration_ms = 0.0;
        self.precomputer.cancel();
        // Any render in flight is now stale
        self.generation += 1;
        self.show_placeholder(LOAD_TRACK_MESSAGE, false);
        FrameUpdate::Full
    }

    fn show_placeholder(&mut self, message: &'static str, center_line: bool) {
        draw_placeholder(&mut self.frame, center_line);
        self.placeholder = Some(message);
        self.rendered = None;
        self.playhead_drawn_x = None;
        self.state = FrameState::Valid;
    }
}

impl std::fmt::Debug for WaveformDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaveformDisplay")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("audio", &self.audio)
            .field("beats", &self.beats.len())
            .field("position_ms", &self.position_ms)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
