mod image;
mod palette;
mod render;
mod scale;

pub use image::{ImageError, IndexedImage, PixelBuffer, TRANSPARENT};
pub use palette::{Palette, PaletteError, PALETTE_SIZE};
pub use render::{render_scaled, render_scaled_clipped, Footprint, RasterError, RenderStats};
pub use scale::{ScaleLevel, ScaleLevelError, MAX_SCALE_EXPONENT};
