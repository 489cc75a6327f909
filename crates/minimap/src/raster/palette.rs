use image::RgbaImage;
use thiserror::Error;

use super::{IndexedImage, PixelBuffer, TRANSPARENT};

pub const PALETTE_SIZE: usize = 256;

const ALPHA_CUTOFF: u8 = 128;
const TRANSPARENT_RGBA: [u8; 4] = [0, 0, 0, 0];

const BASE_COLORS: [[u8; 4]; 16] = [
    [20, 22, 28, 255],
    [74, 112, 56, 255],
    [112, 83, 58, 255],
    [54, 92, 160, 255],
    [200, 200, 210, 255],
    [220, 60, 60, 255],
    [255, 210, 70, 255],
    [80, 220, 255, 255],
    [160, 90, 200, 255],
    [240, 140, 40, 255],
    [40, 160, 90, 255],
    [130, 130, 140, 255],
    [60, 60, 70, 255],
    [250, 250, 250, 255],
    [180, 150, 100, 255],
    [30, 60, 110, 255],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette index 0 is reserved for transparency")]
    ReservedIndex,
}

/// Maps palette indices to RGBA colours. Index 0 always renders transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 4]; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        let mut colors = [TRANSPARENT_RGBA; PALETTE_SIZE];
        for (slot, color) in colors[1..].iter_mut().zip(BASE_COLORS) {
            *slot = color;
        }
        let ramp_start = BASE_COLORS.len() + 1;
        let ramp_len = PALETTE_SIZE - ramp_start;
        for (offset, slot) in colors[ramp_start..].iter_mut().enumerate() {
            let level = (offset * 255 / (ramp_len - 1)) as u8;
            *slot = [level, level, level, 255];
        }
        Self { colors }
    }
}

impl Palette {
    pub fn color(&self, index: u8) -> [u8; 4] {
        self.colors[index as usize]
    }

    pub fn set_color(&mut self, index: u8, color: [u8; 4]) -> Result<(), PaletteError> {
        if index == TRANSPARENT {
            return Err(PaletteError::ReservedIndex);
        }
        self.colors[index as usize] = color;
        Ok(())
    }

    pub fn to_rgba(&self, image: &IndexedImage) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(image.pixels().len() * 4);
        for index in image.pixels() {
            rgba.extend_from_slice(&self.color(*index));
        }
        rgba
    }

    /// Nearest-colour quantization. Pixels under half alpha become transparent.
    pub fn quantize(&self, source: &RgbaImage) -> IndexedImage {
        let mut image = IndexedImage::new(source.width(), source.height());
        for (x, y, pixel) in source.enumerate_pixels() {
            if pixel.0[3] < ALPHA_CUTOFF {
                continue;
            }
            image.set_pixel(x, y, self.nearest_index(pixel.0));
        }
        image
    }

    fn nearest_index(&self, rgba: [u8; 4]) -> u8 {
        let mut best_index = 1u8;
        let mut best_distance = u32::MAX;
        for (index, color) in self.colors.iter().enumerate().skip(1) {
            let distance = color_distance(*color, rgba);
            if distance < best_distance {
                best_distance = distance;
                best_index = index as u8;
                if distance == 0 {
                    break;
                }
            }
        }
        best_index
    }
}

fn color_distance(a: [u8; 4], b: [u8; 4]) -> u32 {
    a.iter()
        .zip(b.iter())
        .take(3)
        .map(|(lhs, rhs)| {
            let delta = i32::from(*lhs) - i32::from(*rhs);
            (delta * delta) as u32
        })
        .sum()
}
