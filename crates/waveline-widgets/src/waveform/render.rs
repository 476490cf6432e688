//! Viewport render job: one envelope + color per output column

use std::fmt;

use rayon::prelude::*;
use waveline_core::analysis::spectral::{apply_window, window_for};
use waveline_core::analysis::spectrogram::format_clock;
use waveline_core::analysis::{BandClassifier, SpectralAnalyzer, TimelineState, DEFAULT_SEGMENT_COLOR};
use waveline_core::config::WaveformConfig;
use waveline_core::{AudioSamples, Rgb};

use super::viewport::Viewport;

/// Drawable unit for one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSegment {
    pub x: usize,
    /// Row of the envelope maximum (smaller = higher)
    pub top: f32,
    /// Row of the envelope minimum
    pub bottom: f32,
    pub color: Rgb,
}

/// Snapshot of everything a render job needs
///
/// Owns `Arc`-backed handles only, so building one never copies samples.
#[derive(Clone)]
pub struct RenderRequest {
    pub audio: AudioSamples,
    pub viewport: Viewport,
    pub width: usize,
    pub height: usize,
    pub timeline: TimelineState,
    pub fft_size: usize,
    /// On-the-fly coloring classifies every Nth column
    pub calc_interval: usize,
    pub amplitude_scale_divisor: f64,
}

impl RenderRequest {
    pub fn new(
        audio: AudioSamples,
        viewport: Viewport,
        width: usize,
        height: usize,
        timeline: TimelineState,
        config: &WaveformConfig,
    ) -> Self {
        Self {
            audio,
            viewport,
            width,
            height,
            timeline,
            fft_size: config.fft_size,
            calc_interval: config.fft_calc_interval_pixels,
            amplitude_scale_divisor: config.amplitude_scale_divisor,
        }
    }
}

impl fmt::Debug for RenderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timeline = match &self.timeline {
            TimelineState::NotComputed => "not computed".to_string(),
            TimelineState::Empty => "empty".to_string(),
            TimelineState::Ready(t) => format!("{} entries", t.len()),
        };
        f.debug_struct("RenderRequest")
            .field("audio", &self.audio)
            .field("viewport", &self.viewport)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("timeline", &timeline)
            .finish_non_exhaustive()
    }
}

/// Compute exactly `width` segments, or none without samples or width
pub fn render_segments(
    request: &RenderRequest,
    analyzer: Option<&dyn SpectralAnalyzer>,
    classifier: &BandClassifier,
) -> Vec<RenderSegment> {
    let width = request.width;
    let audio = &request.audio;
    if width == 0 || audio.is_empty() || audio.sample_rate() == 0 {
        return Vec::new();
    }

    let samples = audio.samples();
    let sample_rate = audio.sample_rate();
    let viewport = &request.viewport;
    let samples_per_ms = sample_rate as f64 / 1000.0;
    let samples_per_pixel = viewport.samples_per_pixel(sample_rate, width);
    let center_y = request.height as f64 / 2.0;
    let scale_y = request.height as f64 / request.amplitude_scale_divisor;

    let times: Vec<f64> = (0..width).map(|x| viewport.column_time_ms(x, width)).collect();
    let colors = column_colors(request, &times, analyzer, classifier);

    times
        .par_iter()
        .zip(colors.par_iter())
        .enumerate()
        .map(|(x, (&time_ms, &color))| {
            let start = ((time_ms * samples_per_ms) as usize).min(samples.len());
            let end = (start + samples_per_pixel).min(samples.len());
            let (min, max) = envelope(&samples[start..end]);

            RenderSegment {
                x,
                top: (center_y - max as f64 * scale_y) as f32,
                bottom: (center_y - min as f64 * scale_y) as f32,
                color,
            }
        })
        .collect()
}

/// (min, max) of a chunk; flat for an empty one
fn envelope(chunk: &[f32]) -> (f32, f32) {
    if chunk.is_empty() {
        return (0.0, 0.0);
    }
    chunk
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)))
}

/// One color per column
///
/// With a timeline: nearest entry per column. Without one: classify a
/// centered window every `calc_interval` columns and hold the last good
/// color in between and across failed classifications.
fn column_colors(
    request: &RenderRequest,
    times: &[f64],
    analyzer: Option<&dyn SpectralAnalyzer>,
    classifier: &BandClassifier,
) -> Vec<Rgb> {
    if let Some(timeline) = request.timeline.timeline() {
        return times
            .iter()
            .map(|&t| timeline.color_at(t).unwrap_or(DEFAULT_SEGMENT_COLOR))
            .collect();
    }

    let Some(analyzer) = analyzer else {
        return vec![DEFAULT_SEGMENT_COLOR; times.len()];
    };

    let interval = request.calc_interval.max(1);
    let fft_size = request.fft_size.max(2);
    let window = window_for(analyzer, fft_size);
    let samples = request.audio.samples();
    let sample_rate = request.audio.sample_rate();

    let keyed: Vec<Option<Rgb>> = (0..times.len().div_ceil(interval))
        .into_par_iter()
        .map(|k| {
            let center = (times[k * interval] * sample_rate as f64 / 1000.0) as usize;
            let start = center.saturating_sub(fft_size / 2);
            if start >= samples.len() {
                return None;
            }
            let end = (start + fft_size).min(samples.len());
            let magnitudes = analyzer.fft_magnitudes(&apply_window(&samples[start..end], &window))?;
            Some(classifier.classify(&magnitudes, sample_rate))
        })
        .collect();

    let mut held = DEFAULT_SEGMENT_COLOR;
    (0..times.len())
        .map(|x| {
            if x % interval == 0 {
                if let Some(color) = keyed[x / interval] {
                    held = color;
                }
            }
            held
        })
        .collect()
}

/// Adjacent same-color columns, for batching draw calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRun<'a> {
    pub color: Rgb,
    pub segments: &'a [RenderSegment],
}

pub fn coalesce_runs(segments: &[RenderSegment]) -> Vec<ColorRun<'_>> {
    segments
        .chunk_by(|a, b| a.color == b.color && b.x == a.x + 1)
        .map(|run| ColorRun {
            color: run[0].color,
            segments: run,
        })
        .collect()
}

/// Whole-second tick inside the view, with its `m:ss` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTick {
    pub x: usize,
    pub label: String,
}

pub fn time_ticks(viewport: &Viewport, width: usize) -> Vec<TimeTick> {
    let start = viewport.visible_start_ms();
    let first_second = (start / 1000.0).ceil() as u64;

    (first_second..)
        .map(|s| s as f64 * 1000.0)
        .take_while(|&t| t <= viewport.visible_end_ms())
        .filter_map(|t| {
            let x = viewport.x_for_time(t, width).filter(|&x| x < width)?;
            Some(TimeTick {
                x,
                label: format_clock(t / 1000.0),
            })
        })
        .collect()
}

/// Columns of beats that fall inside the view
pub fn visible_beats(viewport: &Viewport, beats: &[f64], width: usize) -> Vec<usize> {
    beats
        .iter()
        .filter_map(|&beat| viewport.x_for_time(beat, width).filter(|&x| x < width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use waveline_core::analysis::{RealFftAnalyzer, Timeline, TimelineEntry, NEUTRAL_COLOR};

    fn request(audio: AudioSamples, width: usize, timeline: TimelineState) -> RenderRequest {
        RenderRequest::new(
            audio,
            Viewport::new(5000.0, 10_000.0, 0.3),
            width,
            100,
            timeline,
            &WaveformConfig::default(),
        )
    }

    fn ramp(secs: usize, sample_rate: u32) -> AudioSamples {
        let n = secs * sample_rate as usize;
        let samples: Vec<f32> = (0..n).map(|i| (i % 100) as f32 / 100.0 - 0.5).collect();
        AudioSamples::new(samples, sample_rate)
    }

    #[test]
    fn test_segment_count_matches_width() {
        let classifier = BandClassifier::default();
        let audio = ramp(20, 8000);

        let segments = render_segments(&request(audio.clone(), 800, TimelineState::NotComputed), None, &classifier);
        assert_eq!(segments.len(), 800);
        assert!(segments.iter().enumerate().all(|(i, s)| s.x == i));

        assert!(render_segments(&request(audio, 0, TimelineState::NotComputed), None, &classifier).is_empty());

        let empty = AudioSamples::new(Vec::<f32>::new(), 8000);
        assert!(render_segments(&request(empty, 800, TimelineState::NotComputed), None, &classifier).is_empty());
    }

    #[test]
    fn test_envelope_geometry() {
        let classifier = BandClassifier::default();
        // Constant 0.5 everywhere
        let audio = AudioSamples::new(vec![0.5f32; 20 * 8000], 8000);
        let segments = render_segments(&request(audio, 100, TimelineState::NotComputed), None, &classifier);

        // center 50, scale 100 / 2.5 = 40
        assert!((segments[0].top - 30.0).abs() < 1e-4);
        assert!((segments[0].bottom - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_past_end_is_flat() {
        let classifier = BandClassifier::default();
        // 3 s of audio, view covers 2..12 s
        let audio = AudioSamples::new(vec![0.9f32; 3 * 8000], 8000);
        let segments = render_segments(&request(audio, 100, TimelineState::NotComputed), None, &classifier);

        let last = segments.last().unwrap();
        assert_eq!((last.top, last.bottom), (50.0, 50.0));
        assert!(segments[0].top < 50.0);
    }

    #[test]
    fn test_colors_from_timeline() {
        let classifier = BandClassifier::default();
        let timeline = Timeline::from_entries(vec![
            TimelineEntry { time_ms: 0.0, color: Rgb::RED },
            TimelineEntry { time_ms: 7000.0, color: Rgb::BLUE },
        ]);
        let state = TimelineState::from_timeline(Arc::new(timeline));
        let segments = render_segments(&request(ramp(20, 8000), 800, state), None, &classifier);

        // Column 0 is at 2000 ms, nearer to 0 than to 7000
        assert_eq!(segments[0].color, Rgb::RED);
        assert_eq!(segments[799].color, Rgb::BLUE);
    }

    #[test]
    fn test_no_analyzer_uses_default_color() {
        let classifier = BandClassifier::default();
        let segments = render_segments(&request(ramp(20, 8000), 50, TimelineState::Empty), None, &classifier);
        assert!(segments.iter().all(|s| s.color == DEFAULT_SEGMENT_COLOR));
    }

    #[test]
    fn test_on_the_fly_classification_is_throttled() {
        struct Counting {
            inner: RealFftAnalyzer,
            calls: AtomicUsize,
        }
        impl SpectralAnalyzer for Counting {
            fn hanning_window(&self, size: usize) -> Option<Vec<f32>> {
                self.inner.hanning_window(size)
            }
            fn fft_magnitudes(&self, windowed: &[f32]) -> Option<Vec<f32>> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.inner.fft_magnitudes(windowed)
            }
        }

        let analyzer = Counting {
            inner: RealFftAnalyzer::new(),
            calls: AtomicUsize::new(0),
        };
        let classifier = BandClassifier::default();
        let silence = AudioSamples::new(vec![0.0f32; 20 * 8000], 8000);
        let segments = render_segments(
            &request(silence, 100, TimelineState::NotComputed),
            Some(&analyzer),
            &classifier,
        );

        // Every 5th column is classified
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 20);
        assert!(segments.iter().all(|s| s.color == NEUTRAL_COLOR));
    }

    #[test]
    fn test_failed_classification_holds_previous_color() {
        // Only silent windows can be analyzed
        struct SilenceOnly;
        impl SpectralAnalyzer for SilenceOnly {
            fn hanning_window(&self, _size: usize) -> Option<Vec<f32>> {
                None
            }
            fn fft_magnitudes(&self, windowed: &[f32]) -> Option<Vec<f32>> {
                windowed
                    .iter()
                    .all(|&s| s == 0.0)
                    .then(|| vec![0.0; windowed.len() / 2 + 1])
            }
        }

        // Silent for 5 s, loud after
        let mut samples = vec![0.0f32; 5 * 8000];
        samples.extend(std::iter::repeat(0.5f32).take(15 * 8000));
        let classifier = BandClassifier::default();
        let mut req = request(AudioSamples::new(samples, 8000), 20, TimelineState::NotComputed);
        // Columns 0 (2 s, silent) and 10 (7 s, loud) are classified
        req.calc_interval = 10;

        let segments = render_segments(&req, Some(&SilenceOnly), &classifier);
        assert!(segments.iter().all(|s| s.color == NEUTRAL_COLOR));
    }

    #[test]
    fn test_coalesce_runs() {
        let seg = |x, color| RenderSegment { x, top: 0.0, bottom: 1.0, color };
        let segments = vec![
            seg(0, Rgb::RED),
            seg(1, Rgb::RED),
            seg(2, Rgb::BLUE),
            seg(3, Rgb::RED),
            seg(4, Rgb::RED),
            seg(5, Rgb::RED),
        ];
        let runs = coalesce_runs(&segments);
        let lens: Vec<usize> = runs.iter().map(|r| r.segments.len()).collect();
        assert_eq!(lens, vec![2, 1, 3]);
        assert_eq!(runs[1].color, Rgb::BLUE);
    }

    #[test]
    fn test_time_ticks_on_whole_seconds() {
        let vp = Viewport::new(5500.0, 10_000.0, 0.3);
        // Visible 2500..12500 ms
        let ticks = time_ticks(&vp, 1000);
        assert_eq!(ticks.len(), 10);
        assert_eq!(ticks[0], TimeTick { x: 50, label: "0:03".into() });
        assert_eq!(ticks[9].label, "0:12");
    }

    #[test]
    fn test_visible_beats() {
        let vp = Viewport::new(5000.0, 10_000.0, 0.3);
        let beats = [500.0, 2000.0, 7000.0, 12_000.0, 15_000.0];
        assert_eq!(visible_beats(&vp, &beats, 800), vec![0, 400]);
    }
}
