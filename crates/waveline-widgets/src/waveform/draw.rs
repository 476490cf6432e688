//! Software drawing of waveform frames into a [`FrameBuffer`]

use crate::frame_buffer::{DirtyRect, FrameBuffer, Rgba};
use crate::theme;

use super::render::{coalesce_runs, time_ticks, visible_beats, RenderSegment, TimeTick};
use super::viewport::Viewport;

/// Beat and tick positions for the viewport a frame was rendered at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOverlay {
    pub beat_columns: Vec<usize>,
    pub ticks: Vec<TimeTick>,
}

impl FrameOverlay {
    pub fn new(viewport: &Viewport, beats: &[f64], width: usize) -> Self {
        Self {
            beat_columns: visible_beats(viewport, beats, width),
            ticks: time_ticks(viewport, width),
        }
    }
}

/// Full redraw: background, envelope runs, beats, ticks, playhead
pub fn draw_frame(frame: &mut FrameBuffer, segments: &[RenderSegment], overlay: &FrameOverlay, playhead_x: usize) {
    frame.fill(theme::BACKGROUND);

    for run in coalesce_runs(segments) {
        let color = Rgba::from(run.color);
        for segment in run.segments {
            frame.vline(segment.x, segment.top, segment.bottom, color);
        }
    }

    let all = DirtyRect::full(frame.width(), frame.height());
    draw_overlay(frame, overlay, &all);
    draw_playhead(frame, playhead_x);
}

/// Repaint the columns of `rect` from retained segments, without the playhead
pub fn restore_columns(frame: &mut FrameBuffer, segments: &[RenderSegment], overlay: &FrameOverlay, rect: &DirtyRect) {
    frame.fill_rect(*rect, theme::BACKGROUND);

    let end = rect.right().min(segments.len());
    if rect.x < end {
        for segment in &segments[rect.x..end] {
            frame.vline(segment.x, segment.top, segment.bottom, Rgba::from(segment.color));
        }
    }
    draw_overlay(frame, overlay, rect);
}

fn draw_overlay(frame: &mut FrameBuffer, overlay: &FrameOverlay, rect: &DirtyRect) {
    let height = frame.height();
    if height == 0 {
        return;
    }
    let in_rect = |x: usize| x >= rect.x && x < rect.right();

    for &x in overlay.beat_columns.iter().filter(|&&x| in_rect(x)) {
        frame.vline(x, 0.0, (height - 1) as f32, theme::BEAT_MARKER);
    }

    let tick_top = height.saturating_sub(theme::TIME_TICK_TOP_OFFSET) as f32;
    let tick_bottom = height.saturating_sub(theme::TIME_TICK_BOTTOM_OFFSET) as f32;
    for tick in overlay.ticks.iter().filter(|t| in_rect(t.x)) {
        frame.vline(tick.x, tick_top, tick_bottom, theme::TIME_TICK);
    }
}

pub fn draw_playhead(frame: &mut FrameBuffer, x: usize) {
    let bottom = frame.height().saturating_sub(1) as f32;
    for dx in 0..theme::PLAYHEAD_WIDTH {
        frame.vline(x + dx, 0.0, bottom, theme::PLAYHEAD);
    }
}

/// Columns a playhead at `x` can touch, widened by `margin` on both sides
pub fn playhead_strip(x: usize, margin: usize, width: usize, height: usize) -> DirtyRect {
    let right = x + margin.max(theme::PLAYHEAD_WIDTH - 1) + 1;
    DirtyRect::columns(x.saturating_sub(margin), right, width, height)
}

/// Background plus an optional neutral centre line
pub fn draw_placeholder(frame: &mut FrameBuffer, center_line: bool) {
    frame.fill(theme::BACKGROUND);
    if center_line && frame.height() > 0 {
        let rect = DirtyRect {
            x: 0,
            y: frame.height() / 2,
            width: frame.width(),
            height: 1,
        };
        frame.fill_rect(rect, theme::PLACEHOLDER_LINE);
    }
}
