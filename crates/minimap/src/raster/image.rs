use thiserror::Error;

/// Palette index reserved for "no pixel". Renderers never write it.
pub const TRANSPARENT: u8 = 0;

/// Indexed-colour pixel surface the minimap renders through.
///
/// Coordinates are unsigned; callers are expected to stay inside
/// `width() x height()`. Reads outside the surface return
/// [`TRANSPARENT`] and writes outside it are ignored.
pub trait PixelBuffer {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel(&self, x: u32, y: u32) -> u8;
    fn set_pixel(&mut self, x: u32, y: u32, value: u8);
    fn fill(&mut self, value: u8);

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width()) && y < i64::from(self.height())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("pixel count mismatch: expected {expected}, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl IndexedImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        let actual = pixels.len();
        if expected != actual {
            return Err(ImageError::PixelCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|value| *value == TRANSPARENT)
    }

    pub fn count_value(&self, value: u8) -> usize {
        self.pixels.iter().filter(|pixel| **pixel == value).count()
    }

    fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl PixelBuffer for IndexedImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> u8 {
        self.index_of(x, y)
            .and_then(|index| self.pixels.get(index).copied())
            .unwrap_or(TRANSPARENT)
    }

    fn set_pixel(&mut self, x: u32, y: u32, value: u8) {
        if let Some(index) = self.index_of(x, y) {
            self.pixels[index] = value;
        }
    }

    fn fill(&mut self, value: u8) {
        self.pixels.fill(value);
    }
}
