//! Common types for waveline
//!
//! Sample buffers and colors used by the analysis passes and the display
//! pipelines built on top of them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Audio sample type (mono, 32-bit float)
pub type Sample = f32;

/// An 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    /// Named "green" in CSS terms, i.e. #008000
    pub const GREEN: Rgb = Rgb::new(0, 128, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Red channel as 0.0-1.0
    #[inline]
    pub fn red_f(&self) -> f64 {
        self.r as f64 / 255.0
    }

    /// Green channel as 0.0-1.0
    #[inline]
    pub fn green_f(&self) -> f64 {
        self.g as f64 / 255.0
    }

    /// Blue channel as 0.0-1.0
    #[inline]
    pub fn blue_f(&self) -> f64 {
        self.b as f64 / 255.0
    }

    /// Linear interpolation towards `other` (`t` in 0.0-1.0, truncating)
    pub fn lerp(&self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t) as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Mono audio for one loaded track
///
/// The sample data sits behind an `Arc` so the buffer can be handed to any
/// number of worker jobs without copying. Once built it is never mutated.
#[derive(Clone)]
pub struct AudioSamples {
    samples: Arc<[Sample]>,
    sample_rate: u32,
}

impl AudioSamples {
    pub fn new(samples: impl Into<Arc<[Sample]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Track duration in milliseconds (0 for an unset sample rate)
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64 * 1000.0
    }

    /// True when both buffers hold the same samples at the same rate
    ///
    /// Shared buffers short-circuit on pointer identity; otherwise this is a
    /// full element-wise comparison.
    pub fn same_content(&self, other: &AudioSamples) -> bool {
        if self.sample_rate != other.sample_rate || self.len() != other.len() {
            return false;
        }
        Arc::ptr_eq(&self.samples, &other.samples) || self.samples[..] == other.samples[..]
    }
}

impl fmt::Debug for AudioSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSamples")
            .field("samples", &format!("<{} samples>", self.samples.len()))
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
