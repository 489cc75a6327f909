//! PNG output and content fingerprints for published minimaps.

mod atomic_io;

use std::fmt::Write as _;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::builder::MinimapInstance;
use crate::raster::{IndexedImage, Palette, PixelBuffer};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("rgba buffer does not match {width}x{height}")]
    InvalidBuffer { width: u32, height: u32 },
    #[error("failed to encode png: {0}")]
    Encode(#[source] image::ImageError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn to_rgba_image(image: &IndexedImage, palette: &Palette) -> Result<RgbaImage, ExportError> {
    RgbaImage::from_raw(image.width(), image.height(), palette.to_rgba(image)).ok_or(
        ExportError::InvalidBuffer {
            width: image.width(),
            height: image.height(),
        },
    )
}

pub fn encode_png(instance: &MinimapInstance, palette: &Palette) -> Result<Vec<u8>, ExportError> {
    let rgba = to_rgba_image(instance.image(), palette)?;
    let mut bytes = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(ExportError::Encode)?;
    Ok(bytes)
}

/// Encodes `instance` and replaces `path` atomically.
pub fn write_png(path: &Path, instance: &MinimapInstance, palette: &Palette) -> Result<(), ExportError> {
    let bytes = encode_png(instance, palette)?;
    atomic_io::write_bytes_atomic(path, &bytes).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        width = instance.width(),
        height = instance.height(),
        bytes = bytes.len(),
        "minimap_png_written"
    );
    Ok(())
}

/// SHA-256 over dimensions and palette indices, lower-case hex.
pub fn image_fingerprint(image: &IndexedImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.width().to_le_bytes());
    hasher.update(image.height().to_le_bytes());
    hasher.update(image.pixels());
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
