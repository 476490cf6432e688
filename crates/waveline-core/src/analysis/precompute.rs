//! Whole-track timeline precompute
//!
//! Walks a track once in overlapping windows (hop = window / 2) and
//! classifies each window's spectrum. This is the job body only; scheduling,
//! caching and stale-result handling live with the consumer.

use std::time::Instant;

use rayon::prelude::*;

use super::classifier::{BandClassifier, DEFAULT_SEGMENT_COLOR};
use super::spectral::{apply_window, window_for, SpectralAnalyzer};
use super::timeline::{Timeline, TimelineEntry};
use crate::error::{Result, VisualizationError};
use crate::types::AudioSamples;

/// Number of full windows that fit in `total` samples
///
/// Zero when the track is shorter than one window.
pub fn num_windows(total: usize, window: usize, hop: usize) -> usize {
    if window == 0 || hop == 0 || total < window {
        return 0;
    }
    (total - window) / hop + 1
}

/// Compute the (time, color) timeline for a whole track
///
/// Windows are classified in parallel on the current rayon pool. A window
/// the analyzer cannot transform gets the default segment color instead of
/// failing the whole track.
pub fn precompute_timeline(
    audio: &AudioSamples,
    analyzer: Option<&dyn SpectralAnalyzer>,
    classifier: &BandClassifier,
    window_size: usize,
) -> Result<Timeline> {
    if audio.is_empty() || audio.sample_rate() == 0 || window_size == 0 {
        return Err(VisualizationError::EmptyInput);
    }
    let analyzer = analyzer.ok_or(VisualizationError::AnalyzerUnavailable)?;

    let start = Instant::now();
    let samples = audio.samples();
    let sample_rate = audio.sample_rate();
    let hop = (window_size / 2).max(1);
    let count = num_windows(samples.len(), window_size, hop);
    let window = window_for(analyzer, window_size);

    let entries: Vec<TimelineEntry> = (0..count)
        .into_par_iter()
        .map(|i| {
            let offset = i * hop;
            let frame = &samples[offset..offset + window_size];
            let color = match analyzer.fft_magnitudes(&apply_window(frame, &window)) {
                Some(magnitudes) => classifier.classify(&magnitudes, sample_rate),
                None => DEFAULT_SEGMENT_COLOR,
            };
            TimelineEntry {
                time_ms: offset as f64 / sample_rate as f64 * 1000.0,
                color,
            }
        })
        .collect();

    log::debug!(
        "precompute_timeline: {} windows ({} samples @ {} Hz) in {:?}",
        entries.len(),
        samples.len(),
        sample_rate,
        start.elapsed()
    );

    Ok(Timeline::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::NEUTRAL_COLOR;
    use crate::analysis::spectral::RealFftAnalyzer;
    use std::f32::consts::PI;

    #[test]
    fn test_num_windows() {
        assert_eq!(num_windows(441_000, 2048, 1024), 428);
        assert_eq!(num_windows(2048, 2048, 1024), 1);
        assert_eq!(num_windows(2047, 2048, 1024), 0);
        assert_eq!(num_windows(0, 2048, 1024), 0);
    }

    #[test]
    fn test_ten_seconds_of_silence() {
        let _ = env_logger::builder().is_test(true).try_init();
        let audio = AudioSamples::new(vec![0.0f32; 441_000], 44100);
        let analyzer = RealFftAnalyzer::new();
        let timeline =
            precompute_timeline(&audio, Some(&analyzer), &BandClassifier::default(), 2048).unwrap();

        assert_eq!(timeline.len(), 428);
        assert!(timeline.entries().iter().all(|e| e.color == NEUTRAL_COLOR));
        assert_eq!(timeline.entries()[1].time_ms, 1024.0 / 44100.0 * 1000.0);
    }

    #[test]
    fn test_timeline_is_monotonic_and_idempotent() {
        let audio = AudioSamples::new(
            (0..44100)
                .map(|i| (2.0 * PI * 110.0 * i as f32 / 44100.0).sin() * 0.5)
                .collect::<Vec<f32>>(),
            44100,
        );
        let analyzer = RealFftAnalyzer::new();
        let classifier = BandClassifier::default();

        let first = precompute_timeline(&audio, Some(&analyzer), &classifier, 2048).unwrap();
        let second = precompute_timeline(&audio, Some(&analyzer), &classifier, 2048).unwrap();

        assert!(first.entries().windows(2).all(|w| w[0].time_ms <= w[1].time_ms));
        assert_eq!(first, second);
        // 110 Hz sine is bass
        assert!(first.entries().iter().all(|e| e.color.r > e.color.b));
    }

    #[test]
    fn test_short_track_yields_empty_timeline() {
        let audio = AudioSamples::new(vec![0.1f32; 1000], 44100);
        let analyzer = RealFftAnalyzer::new();
        let timeline =
            precompute_timeline(&audio, Some(&analyzer), &BandClassifier::default(), 2048).unwrap();
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_errors() {
        let classifier = BandClassifier::default();
        let analyzer = RealFftAnalyzer::new();

        let empty = AudioSamples::new(Vec::<f32>::new(), 44100);
        assert_eq!(
            precompute_timeline(&empty, Some(&analyzer), &classifier, 2048),
            Err(VisualizationError::EmptyInput)
        );

        let audio = AudioSamples::new(vec![0.0f32; 4096], 44100);
        assert_eq!(
            precompute_timeline(&audio, None, &classifier, 2048),
            Err(VisualizationError::AnalyzerUnavailable)
        );
    }
}
