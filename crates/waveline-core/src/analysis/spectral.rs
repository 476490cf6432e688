//! Spectral analyzer seam
//!
//! The pipeline never calls an FFT directly. It goes through a
//! [`SpectralAnalyzer`] injected at construction time, so hosts can bind a
//! native analysis library, and tests can bind a counting double.
//! [`RealFftAnalyzer`] is the stock implementation.

use std::f32::consts::PI;
use std::sync::Mutex;

use realfft::RealFftPlanner;

/// Windowing and magnitude-spectrum provider
pub trait SpectralAnalyzer: Send + Sync {
    /// Hanning window of `size` coefficients, or `None` if unavailable
    fn hanning_window(&self, size: usize) -> Option<Vec<f32>>;

    /// Magnitude spectrum (`len / 2 + 1` bins) of an already windowed frame
    ///
    /// Returns `None` when the frame cannot be analyzed.
    fn fft_magnitudes(&self, windowed: &[f32]) -> Option<Vec<f32>>;
}

/// Symmetric Hanning window: `0.5 * (1 - cos(2πi / (N - 1)))`
///
/// Used whenever the bound analyzer does not supply a window.
pub fn hanning_window_fallback(size: usize) -> Vec<f32> {
    match size {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (size - 1) as f32;
            (0..size)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
                .collect()
        }
    }
}

/// Window from the analyzer if it provides a correctly sized one, else the fallback
pub fn window_for(analyzer: &dyn SpectralAnalyzer, size: usize) -> Vec<f32> {
    match analyzer.hanning_window(size) {
        Some(window) if window.len() == size => window,
        Some(window) => {
            log::warn!(
                "Analyzer returned a {}-point window for size {}, using fallback",
                window.len(),
                size
            );
            hanning_window_fallback(size)
        }
        None => hanning_window_fallback(size),
    }
}

/// Multiply `frame` by `window`, zero-padding to the window length
pub fn apply_window(frame: &[f32], window: &[f32]) -> Vec<f32> {
    window
        .iter()
        .enumerate()
        .map(|(i, w)| frame.get(i).copied().unwrap_or(0.0) * w)
        .collect()
}

/// Default analyzer backed by `realfft`
///
/// Plans are cached by the planner, so repeated calls with the same frame
/// size only pay for planning once. Magnitudes are unnormalized.
pub struct RealFftAnalyzer {
    planner: Mutex<RealFftPlanner<f32>>,
}

impl RealFftAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: Mutex::new(RealFftPlanner::new()),
        }
    }
}

impl Default for RealFftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralAnalyzer for RealFftAnalyzer {
    fn hanning_window(&self, size: usize) -> Option<Vec<f32>> {
        Some(hanning_window_fallback(size))
    }

    fn fft_magnitudes(&self, windowed: &[f32]) -> Option<Vec<f32>> {
        if windowed.is_empty() {
            return None;
        }

        let fft = {
            let mut planner = self.planner.lock().ok()?;
            planner.plan_fft_forward(windowed.len())
        };

        let mut input = windowed.to_vec();
        let mut spectrum = fft.make_output_vec();
        let mut scratch = fft.make_scratch_vec();

        if let Err(e) = fft.process_with_scratch(&mut input, &mut spectrum, &mut scratch) {
            log::warn!("FFT failed for {}-point frame: {:?}", windowed.len(), e);
            return None;
        }

        Some(spectrum.iter().map(|c| c.norm()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hanning_window_shape() {
        let w = hanning_window_fallback(5);
        assert_eq!(w.len(), 5);
        assert!(w[0].abs() < 1e-6);
        assert!(w[4].abs() < 1e-6);
        assert!((w[2] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[3]).abs() < 1e-6);

        assert!(hanning_window_fallback(0).is_empty());
        assert_eq!(hanning_window_fallback(1), vec![1.0]);
    }

    #[test]
    fn test_apply_window_pads_short_frames() {
        let window = vec![1.0, 0.5, 0.5, 1.0];
        let out = apply_window(&[2.0, 2.0], &window);
        assert_eq!(out, vec![2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_realfft_magnitude_length_and_peak() {
        let analyzer = RealFftAnalyzer::new();
        let n = 1024;
        let bin = 32;
        let frame: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / n as f32).sin())
            .collect();

        let mags = analyzer.fft_magnitudes(&frame).unwrap();
        assert_eq!(mags.len(), n / 2 + 1);

        let peak = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
    }

    #[test]
    fn test_realfft_rejects_empty_frame() {
        let analyzer = RealFftAnalyzer::new();
        assert!(analyzer.fft_magnitudes(&[]).is_none());
    }

    struct NoWindow;

    impl SpectralAnalyzer for NoWindow {
        fn hanning_window(&self, _size: usize) -> Option<Vec<f32>> {
            None
        }
        fn fft_magnitudes(&self, _windowed: &[f32]) -> Option<Vec<f32>> {
            None
        }
    }

    #[test]
    fn test_window_for_falls_back() {
        let w = window_for(&NoWindow, 8);
        assert_eq!(w, hanning_window_fallback(8));
    }
}
