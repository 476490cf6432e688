//! Band-energy frequency classification
//!
//! Maps a magnitude spectrum to a single color: bins are split into low, mid
//! and high bands by center frequency, squared magnitudes are summed per
//! band, and the three band colors are blended by their share of the total
//! energy. Bass-heavy material renders red, mids green, hats and air blue.

use crate::config::BandConfig;
use crate::types::Rgb;

/// Color for a spectrum with no measurable energy (silence)
pub const NEUTRAL_COLOR: Rgb = Rgb::new(50, 50, 50);

/// Sentinel for spectra that cannot be classified (empty or no sample rate)
pub const INVALID_COLOR: Rgb = Rgb::new(17, 17, 17);

/// Color used when no classification ran at all
pub const DEFAULT_SEGMENT_COLOR: Rgb = Rgb::new(128, 128, 128);

/// Total energy below which a spectrum counts as silent
const ENERGY_EPSILON: f64 = 1e-9;

/// Accumulated squared magnitude per band
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

impl BandEnergies {
    pub fn total(&self) -> f64 {
        self.low + self.mid + self.high
    }
}

/// Stateless band-energy classifier
#[derive(Debug, Clone, PartialEq)]
pub struct BandClassifier {
    bands: BandConfig,
}

impl BandClassifier {
    pub fn new(bands: BandConfig) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &BandConfig {
        &self.bands
    }

    /// Per-band energy, or `None` if the spectrum is unusable
    ///
    /// `magnitudes` holds `fft_n / 2 + 1` bins, so bin `i` sits at
    /// `i * sample_rate / fft_n` Hz.
    pub fn band_energies(&self, magnitudes: &[f32], sample_rate: u32) -> Option<BandEnergies> {
        if magnitudes.is_empty() || sample_rate == 0 {
            return None;
        }

        let fft_n = (magnitudes.len() - 1) * 2;
        if fft_n == 0 {
            return None;
        }
        let hz_per_bin = sample_rate as f64 / fft_n as f64;

        let mut energies = BandEnergies::default();
        for (i, &magnitude) in magnitudes.iter().enumerate() {
            let freq = i as f64 * hz_per_bin;
            let energy = magnitude as f64 * magnitude as f64;

            if freq >= self.bands.mid_high_cutoff_hz {
                energies.high += energy;
            } else if freq >= self.bands.low_mid_cutoff_hz {
                energies.mid += energy;
            } else if freq >= self.bands.low_min_hz {
                energies.low += energy;
            }
        }

        Some(energies)
    }

    /// Classify a magnitude spectrum into a display color
    pub fn classify(&self, magnitudes: &[f32], sample_rate: u32) -> Rgb {
        let Some(energies) = self.band_energies(magnitudes, sample_rate) else {
            return INVALID_COLOR;
        };

        let total = energies.total();
        if total < ENERGY_EPSILON {
            return NEUTRAL_COLOR;
        }

        let (low, mid, high) = (&self.bands.low_color, &self.bands.mid_color, &self.bands.high_color);
        let blend = |l: f64, m: f64, h: f64| {
            let value = (energies.low * l + energies.mid * m + energies.high * h) / total;
            (value * 255.0).clamp(0.0, 255.0) as u8
        };

        Rgb::new(
            blend(low.red_f(), mid.red_f(), high.red_f()),
            blend(low.green_f(), mid.green_f(), high.green_f()),
            blend(low.blue_f(), mid.blue_f(), high.blue_f()),
        )
    }
}

impl Default for BandClassifier {
    fn default() -> Self {
        Self::new(BandConfig::default())
    }
}
