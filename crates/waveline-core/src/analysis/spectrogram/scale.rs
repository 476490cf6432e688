//! Log-frequency scale and axis geometry
//!
//! One mapping serves the bitmap rows, the frequency axis labels and the EQ
//! band overlay, so a label always lines up with the row it names.

use serde::{Deserialize, Serialize};

use crate::config::BandConfig;

/// Frequencies that get an axis label, bottom to top
pub const FREQUENCY_LABEL_POINTS: [f64; 10] = [
    20.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10_000.0, 20_000.0,
];

/// A label and its position (row for the frequency axis, column for time)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisLabel {
    pub position: usize,
    pub text: String,
}

/// Logarithmic mapping between frequency and vertical position
///
/// Position 0 is the top edge (highest frequency).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyScale {
    min_freq: f64,
    max_freq: f64,
    nyquist: f64,
}

impl FrequencyScale {
    /// Display range clamped to `[1 Hz, nyquist]`
    pub fn new(min_display: f64, max_display: f64, sample_rate: f64) -> Self {
        let nyquist = sample_rate / 2.0;
        let min_freq = min_display.max(1.0);
        let mut max_freq = max_display.min(nyquist);
        if !(max_freq > min_freq) {
            log::warn!(
                "FrequencyScale: empty range {}..{} Hz at {} Hz, widening",
                min_freq,
                max_freq,
                sample_rate
            );
            max_freq = min_freq * 2.0;
        }
        Self {
            min_freq,
            max_freq,
            nyquist,
        }
    }

    pub fn min_freq(&self) -> f64 {
        self.min_freq
    }

    pub fn max_freq(&self) -> f64 {
        self.max_freq
    }

    pub fn nyquist(&self) -> f64 {
        self.nyquist
    }

    /// 0.0 at `min_freq`, 1.0 at `max_freq`, clamped
    pub fn ratio(&self, freq_hz: f64) -> f64 {
        let freq = freq_hz.clamp(self.min_freq, self.max_freq);
        let (log_min, log_max) = (self.min_freq.log10(), self.max_freq.log10());
        (freq.log10() - log_min) / (log_max - log_min)
    }

    /// Vertical position of `freq_hz` in a `height`-tall area
    ///
    /// Non-positive frequencies map to the bottom edge.
    pub fn y_for_frequency(&self, freq_hz: f64, height: usize) -> usize {
        if freq_hz <= 0.0 {
            return height;
        }
        (height as f64 * (1.0 - self.ratio(freq_hz))) as usize
    }

    /// Frequency shown at vertical position `y` (may be fractional)
    pub fn frequency_at_y(&self, y: f64, height: usize) -> f64 {
        if height == 0 {
            return self.min_freq;
        }
        let ratio = (1.0 - y / height as f64).clamp(0.0, 1.0);
        let (log_min, log_max) = (self.min_freq.log10(), self.max_freq.log10());
        10f64.powf(log_min + ratio * (log_max - log_min))
    }

    /// Frequency axis labels, stopping at the first point above Nyquist
    pub fn frequency_labels(&self, height: usize) -> Vec<AxisLabel> {
        FREQUENCY_LABEL_POINTS
            .iter()
            .take_while(|&&freq| freq <= self.nyquist)
            .map(|&freq| AxisLabel {
                position: self.y_for_frequency(freq, height),
                text: format_frequency(freq),
            })
            .collect()
    }
}

/// `500Hz`, `2kHz`
pub fn format_frequency(freq_hz: f64) -> String {
    let hz = freq_hz as u64;
    if hz >= 1000 {
        format!("{}kHz", hz / 1000)
    } else {
        format!("{}Hz", hz)
    }
}

/// `m:ss`
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Spacing between time labels for a track of this length
pub fn time_label_interval_secs(duration_secs: f64) -> u32 {
    if duration_secs <= 30.0 {
        5
    } else if duration_secs <= 120.0 {
        10
    } else if duration_secs <= 300.0 {
        30
    } else {
        60
    }
}

/// Time axis labels across a whole track
pub fn time_labels(duration_ms: f64, width: usize) -> Vec<AxisLabel> {
    if !(duration_ms > 0.0) {
        return Vec::new();
    }
    let duration_secs = duration_ms / 1000.0;
    let interval = time_label_interval_secs(duration_secs) as usize;

    (0u64..)
        .step_by(interval)
        .map(|t| t as f64)
        .take_while(|&t| t <= duration_secs)
        .map(|t| AxisLabel {
            position: (width as f64 * t * 1000.0 / duration_ms) as usize,
            text: format_clock(t),
        })
        .collect()
}

/// EQ gain per band (1.0 = unity)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqGains {
    pub bass: f64,
    pub mid: f64,
    pub treble: f64,
}

impl Default for EqGains {
    fn default() -> Self {
        Self {
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
        }
    }
}

/// Where the EQ bands sit over the spectrogram and how strongly to tint them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqBandOverlay {
    /// Boundary between bass and mid
    pub bass_y: usize,
    /// Boundary between mid and treble
    pub mid_y: usize,
    pub bass_alpha: u8,
    pub mid_alpha: u8,
    pub treble_alpha: u8,
}

/// Tint alpha for a band: `40 * gain`, clamped to 20..=80
pub fn band_alpha(gain: f64) -> u8 {
    ((40.0 * gain) as i64).clamp(20, 80) as u8
}

pub fn eq_band_overlay(
    scale: &FrequencyScale,
    bands: &BandConfig,
    height: usize,
    gains: EqGains,
) -> EqBandOverlay {
    EqBandOverlay {
        bass_y: scale.y_for_frequency(bands.low_mid_cutoff_hz, height),
        mid_y: scale.y_for_frequency(bands.mid_high_cutoff_hz, height),
        bass_alpha: band_alpha(gains.bass),
        mid_alpha: band_alpha(gains.mid),
        treble_alpha: band_alpha(gains.treble),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> FrequencyScale {
        FrequencyScale::new(20.0, 20_000.0, 44100.0)
    }

    #[test]
    fn test_endpoints() {
        let scale = scale();
        assert_eq!(scale.y_for_frequency(20_000.0, 100), 0);
        assert_eq!(scale.y_for_frequency(20.0, 100), 100);
        assert_eq!(scale.y_for_frequency(0.0, 100), 100);
        // Clamped outside the display range
        assert_eq!(scale.y_for_frequency(5.0, 100), 100);
    }

    #[test]
    fn test_geometric_midpoint_is_centered() {
        let scale = scale();
        let mid = (20.0f64 * 20_000.0).sqrt();
        assert!((scale.ratio(mid) - 0.5).abs() < 1e-9);
        assert!((scale.frequency_at_y(50.0, 100) - mid).abs() < 1e-6);
    }

    #[test]
    fn test_max_clamped_to_nyquist() {
        let scale = FrequencyScale::new(20.0, 20_000.0, 22050.0);
        assert_eq!(scale.max_freq(), 11025.0);
        let labels = scale.frequency_labels(256);
        assert_eq!(labels.last().unwrap().text, "10kHz");
        assert_eq!(labels.len(), 9);
    }

    #[test]
    fn test_frequency_labels() {
        let labels = scale().frequency_labels(256);
        let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["20Hz", "50Hz", "100Hz", "200Hz", "500Hz", "1kHz", "2kHz", "5kHz", "10kHz", "20kHz"]
        );
        assert!(labels.windows(2).all(|w| w[0].position >= w[1].position));
    }

    #[test]
    fn test_time_labels() {
        assert_eq!(time_label_interval_secs(30.0), 5);
        assert_eq!(time_label_interval_secs(90.0), 10);
        assert_eq!(time_label_interval_secs(240.0), 30);
        assert_eq!(time_label_interval_secs(600.0), 60);

        let labels = time_labels(20_000.0, 200);
        let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["0:00", "0:05", "0:10", "0:15", "0:20"]);
        assert_eq!(labels[1].position, 50);

        assert!(time_labels(0.0, 200).is_empty());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(65.9), "1:05");
        assert_eq!(format_clock(600.0), "10:00");
    }

    #[test]
    fn test_eq_overlay() {
        assert_eq!(band_alpha(1.0), 40);
        assert_eq!(band_alpha(0.0), 20);
        assert_eq!(band_alpha(3.0), 80);

        let overlay = eq_band_overlay(&scale(), &BandConfig::default(), 256, EqGains::default());
        assert!(overlay.mid_y < overlay.bass_y);
        assert_eq!(overlay.bass_y, scale().y_for_frequency(250.0, 256));
    }
}
