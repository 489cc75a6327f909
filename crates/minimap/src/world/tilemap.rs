use thiserror::Error;

use crate::raster::{IndexedImage, PixelBuffer};

pub type TileId = u16;

/// Largest tile edge the grid accepts, as an exponent (256 px).
pub const MAX_TILE_SCALE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub columns: u32,
    pub rows: u32,
    /// Tile edge length is `2^tile_scale` pixels on both axes.
    pub tile_scale: u8,
}

impl GridGeometry {
    pub const fn tile_width(&self) -> u32 {
        1 << self.tile_scale
    }

    pub fn pixel_width(&self) -> u32 {
        self.columns.saturating_mul(self.tile_width())
    }

    pub fn pixel_height(&self) -> u32 {
        self.rows.saturating_mul(self.tile_width())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile id {id} at ({column}, {row}) is not in the tile set")]
    UnknownTile { id: TileId, column: u32, row: u32 },
    #[error("tile {id} is {width}x{height}, expected {expected}x{expected}")]
    TileSizeMismatch {
        id: TileId,
        width: u32,
        height: u32,
        expected: u32,
    },
    #[error("tile scale {tile_scale} exceeds maximum {MAX_TILE_SCALE}")]
    TileScaleTooLarge { tile_scale: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_scale: u8,
    tiles: Vec<TileId>,
}

impl TileGrid {
    pub fn new(
        columns: u32,
        rows: u32,
        tile_scale: u8,
        tiles: Vec<TileId>,
    ) -> Result<Self, TilemapError> {
        if tile_scale > MAX_TILE_SCALE {
            return Err(TilemapError::TileScaleTooLarge { tile_scale });
        }
        let expected = columns as usize * rows as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            columns,
            rows,
            tile_scale,
            tiles,
        })
    }

    pub fn uniform(columns: u32, rows: u32, tile_scale: u8, id: TileId) -> Result<Self, TilemapError> {
        Self::new(
            columns,
            rows,
            tile_scale,
            vec![id; columns as usize * rows as usize],
        )
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry {
            columns: self.columns,
            rows: self.rows,
            tile_scale: self.tile_scale,
        }
    }

    pub fn index_of(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(row as usize * self.columns as usize + column as usize)
    }

    pub fn tile_at(&self, column: u32, row: u32) -> Option<TileId> {
        self.index_of(column, row)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Returns the previous id, or `None` when the cell is outside the grid.
    pub fn set_tile(&mut self, column: u32, row: u32, id: TileId) -> Option<TileId> {
        let index = self.index_of(column, row)?;
        Some(std::mem::replace(&mut self.tiles[index], id))
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (u32, u32, TileId)> + '_ {
        let columns = self.columns.max(1);
        self.tiles.iter().enumerate().map(move |(index, id)| {
            let index = index as u32;
            (index % columns, index / columns, *id)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    tile_scale: u8,
    images: Vec<IndexedImage>,
}

impl TileSet {
    pub fn new(tile_scale: u8, images: Vec<IndexedImage>) -> Result<Self, TilemapError> {
        if tile_scale > MAX_TILE_SCALE {
            return Err(TilemapError::TileScaleTooLarge { tile_scale });
        }
        let expected = 1u32 << tile_scale;
        for (id, image) in images.iter().enumerate() {
            if image.width() != expected || image.height() != expected {
                return Err(TilemapError::TileSizeMismatch {
                    id: id as TileId,
                    width: image.width(),
                    height: image.height(),
                    expected,
                });
            }
        }
        Ok(Self { tile_scale, images })
    }

    pub fn tile_scale(&self) -> u8 {
        self.tile_scale
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn image(&self, id: TileId) -> Option<&IndexedImage> {
        self.images.get(id as usize)
    }
}
