use thiserror::Error;

use super::{PixelBuffer, ScaleLevel, TRANSPARENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Footprint {
    pub fn of<S: PixelBuffer + ?Sized>(
        source: &S,
        origin_x: i64,
        origin_y: i64,
        scale: ScaleLevel,
    ) -> Self {
        Self {
            x: origin_x,
            y: origin_y,
            width: scale.sample_count(source.width()),
            height: scale.sample_count(source.height()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        if self.is_empty() {
            return true;
        }
        self.x >= 0
            && self.y >= 0
            && self.x + i64::from(self.width) <= i64::from(width)
            && self.y + i64::from(self.height) <= i64::from(height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error(
        "footprint {}x{} at ({}, {}) does not fit destination {destination_width}x{destination_height}",
        footprint.width,
        footprint.height,
        footprint.x,
        footprint.y
    )]
    OutOfBounds {
        footprint: Footprint,
        destination_width: u32,
        destination_height: u32,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub written: usize,
    pub clipped: usize,
}

/// Stamps `source` into `destination` at `2^scale` downscale.
///
/// Only source pixels whose coordinates are both multiples of the scale
/// factor are sampled, and transparent samples never touch the destination.
/// The whole footprint must fit inside the destination; otherwise nothing is
/// written and [`RasterError::OutOfBounds`] is returned.
pub fn render_scaled<S, D>(
    source: &S,
    destination: &mut D,
    origin_x: i64,
    origin_y: i64,
    scale: ScaleLevel,
) -> Result<RenderStats, RasterError>
where
    S: PixelBuffer + ?Sized,
    D: PixelBuffer + ?Sized,
{
    let footprint = Footprint::of(source, origin_x, origin_y, scale);
    if !footprint.fits_within(destination.width(), destination.height()) {
        return Err(RasterError::OutOfBounds {
            footprint,
            destination_width: destination.width(),
            destination_height: destination.height(),
        });
    }
    Ok(stamp(source, destination, footprint, scale))
}

pub fn render_scaled_clipped<S, D>(
    source: &S,
    destination: &mut D,
    origin_x: i64,
    origin_y: i64,
    scale: ScaleLevel,
) -> RenderStats
where
    S: PixelBuffer + ?Sized,
    D: PixelBuffer + ?Sized,
{
    let footprint = Footprint::of(source, origin_x, origin_y, scale);
    stamp(source, destination, footprint, scale)
}

fn stamp<S, D>(source: &S, destination: &mut D, footprint: Footprint, scale: ScaleLevel) -> RenderStats
where
    S: PixelBuffer + ?Sized,
    D: PixelBuffer + ?Sized,
{
    let mut stats = RenderStats::default();
    let step = scale.factor() as usize;
    for j in (0..source.height()).step_by(step) {
        for i in (0..source.width()).step_by(step) {
            let value = source.pixel(i, j);
            if value == TRANSPARENT {
                continue;
            }
            let x = footprint.x + i64::from(scale.downscale(i));
            let y = footprint.y + i64::from(scale.downscale(j));
            if !destination.contains(x, y) {
                stats.clipped += 1;
                continue;
            }
            destination.set_pixel(x as u32, y as u32, value);
            stats.written += 1;
        }
    }
    stats
}
