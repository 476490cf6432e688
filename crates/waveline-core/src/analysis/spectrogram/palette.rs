//! 256-entry spectrogram palette
//!
//! black → dark blue → blue → light blue → cyan → light green → yellow →
//! orange → red → white

use std::sync::OnceLock;

use crate::types::Rgb;

pub const PALETTE_SIZE: usize = 256;

const KEY_COLORS: [Rgb; 10] = [
    Rgb::new(0, 0, 0),
    Rgb::new(0, 0, 64),
    Rgb::new(0, 0, 128),
    Rgb::new(0, 64, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(128, 255, 128),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 128, 0),
    Rgb::new(255, 0, 0),
    Rgb::new(255, 255, 255),
];

fn build_palette() -> [Rgb; PALETTE_SIZE] {
    let segments = KEY_COLORS.len() - 1;
    let per_segment = PALETTE_SIZE / segments;

    let mut palette = [Rgb::WHITE; PALETTE_SIZE];
    let mut idx = 0;
    for segment in 0..segments {
        let (from, to) = (KEY_COLORS[segment], KEY_COLORS[segment + 1]);
        for i in 0..per_segment {
            // Leave the final slot of the last segment to the white padding
            if segment == segments - 1 && i == per_segment - 1 {
                continue;
            }
            palette[idx] = from.lerp(to, i as f64 / per_segment as f64);
            idx += 1;
        }
    }
    palette
}

/// The shared spectrogram palette
pub fn spectrogram_palette() -> &'static [Rgb; PALETTE_SIZE] {
    static PALETTE: OnceLock<[Rgb; PALETTE_SIZE]> = OnceLock::new();
    PALETTE.get_or_init(build_palette)
}
