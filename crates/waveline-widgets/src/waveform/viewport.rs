//! Visible time window and its pixel mapping

/// The visible span of a scrolling waveform
///
/// The playhead sits at `playhead_ratio` of the width from the left edge;
/// the window scrolls underneath it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub position_ms: f64,
    pub view_window_ms: f64,
    pub playhead_ratio: f64,
}

impl Viewport {
    pub fn new(position_ms: f64, view_window_ms: f64, playhead_ratio: f64) -> Self {
        Self {
            position_ms,
            view_window_ms,
            playhead_ratio,
        }
    }

    /// Time at the left edge, never negative
    pub fn visible_start_ms(&self) -> f64 {
        (self.position_ms - self.view_window_ms * self.playhead_ratio).max(0.0)
    }

    pub fn visible_end_ms(&self) -> f64 {
        self.visible_start_ms() + self.view_window_ms
    }

    /// Time at the left edge of column `x`
    pub fn column_time_ms(&self, x: usize, width: usize) -> f64 {
        if width == 0 {
            return self.visible_start_ms();
        }
        self.visible_start_ms() + x as f64 / width as f64 * self.view_window_ms
    }

    /// Column for `time_ms`, or `None` if it falls outside the window
    pub fn x_for_time(&self, time_ms: f64, width: usize) -> Option<usize> {
        let start = self.visible_start_ms();
        if time_ms < start || time_ms > start + self.view_window_ms || self.view_window_ms <= 0.0 {
            return None;
        }
        let x = ((time_ms - start) / self.view_window_ms * width as f64) as usize;
        Some(x)
    }

    pub fn playhead_x(&self, width: usize) -> usize {
        (width as f64 * self.playhead_ratio) as usize
    }

    /// Samples folded into one column, at least one
    pub fn samples_per_pixel(&self, sample_rate: u32, width: usize) -> usize {
        if width == 0 {
            return 1;
        }
        let per_pixel = self.view_window_ms * sample_rate as f64 / 1000.0 / width as f64;
        (per_pixel as usize).max(1)
    }

    /// Whether moving to `position_ms` shifts the view by at least
    /// `threshold` of the window
    pub fn is_significant_move(&self, position_ms: f64, threshold: f64) -> bool {
        (position_ms - self.position_ms).abs() >= self.view_window_ms * threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mapping() {
        let vp = Viewport::new(5000.0, 10_000.0, 0.3);
        assert_eq!(vp.visible_start_ms(), 2000.0);
        assert_eq!(vp.column_time_ms(0, 800), 2000.0);
        assert!((vp.column_time_ms(799, 800) - 11_987.5).abs() < 1e-9);
        assert_eq!(vp.playhead_x(800), 240);
    }

    #[test]
    fn test_start_clamped_at_zero() {
        let vp = Viewport::new(1000.0, 10_000.0, 0.3);
        assert_eq!(vp.visible_start_ms(), 0.0);
        assert_eq!(vp.visible_end_ms(), 10_000.0);
    }

    #[test]
    fn test_x_for_time() {
        let vp = Viewport::new(5000.0, 10_000.0, 0.3);
        assert_eq!(vp.x_for_time(2000.0, 800), Some(0));
        assert_eq!(vp.x_for_time(7000.0, 800), Some(400));
        assert_eq!(vp.x_for_time(1999.0, 800), None);
        assert_eq!(vp.x_for_time(12_001.0, 800), None);
    }

    #[test]
    fn test_samples_per_pixel() {
        let vp = Viewport::new(0.0, 10_000.0, 0.3);
        assert_eq!(vp.samples_per_pixel(44100, 800), 551);
        // Very wide display still reads one sample per column
        assert_eq!(vp.samples_per_pixel(100, 5000), 1);
    }

    #[test]
    fn test_significant_move_threshold() {
        let vp = Viewport::new(5000.0, 10_000.0, 0.3);
        assert!(!vp.is_significant_move(5499.0, 0.05));
        assert!(vp.is_significant_move(5500.0, 0.05));
        assert!(vp.is_significant_move(4400.0, 0.05));
    }
}
