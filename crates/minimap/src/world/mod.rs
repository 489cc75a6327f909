//! Host-side collaborators of the minimap, plus a reference [`World`] that
//! implements them.

mod sprites;
mod tilemap;

use crate::raster::IndexedImage;

pub use sprites::{Sprite, SpriteId, SpriteIdAllocator, SpriteStore};
pub use tilemap::{GridGeometry, TileGrid, TileId, TileSet, TilemapError, MAX_TILE_SCALE};

pub trait TileWorld {
    fn tile_grid(&self) -> Option<GridGeometry>;
    fn tile_image(&self, column: u32, row: u32) -> Option<&IndexedImage>;
}

/// Read-only view of a sprite. Querying it must not have side effects.
pub trait SpriteView {
    fn world_position(&self) -> (i32, i32);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn image(&self) -> &IndexedImage;
    fn is_destroyed(&self) -> bool;
}

pub trait SpriteHost {
    type Sprite: SpriteView;

    fn sprite(&self, id: SpriteId) -> Option<&Self::Sprite>;
}

/// A sprite is destroyed when the host no longer knows it or flags it.
pub fn is_destroyed<H: SpriteHost + ?Sized>(host: &H, id: SpriteId) -> bool {
    host.sprite(id).map_or(true, |sprite| sprite.is_destroyed())
}

#[derive(Debug, Default)]
pub struct World {
    grid: Option<TileGrid>,
    tiles: Option<TileSet>,
    sprites: SpriteStore,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a grid and the tile images it refers to. Every cell must
    /// name a tile in `tiles`, and both must agree on the tile size.
    pub fn set_tilemap(&mut self, grid: TileGrid, tiles: TileSet) -> Result<(), TilemapError> {
        let geometry = grid.geometry();
        if tiles.tile_scale() != geometry.tile_scale {
            let expected = geometry.tile_width();
            let actual = 1u32 << tiles.tile_scale();
            return Err(TilemapError::TileSizeMismatch {
                id: 0,
                width: actual,
                height: actual,
                expected,
            });
        }
        if let Some((column, row, id)) = grid
            .cells()
            .find(|(_, _, id)| tiles.image(*id).is_none())
        {
            return Err(TilemapError::UnknownTile { id, column, row });
        }
        self.grid = Some(grid);
        self.tiles = Some(tiles);
        Ok(())
    }

    pub fn clear_tilemap(&mut self) {
        self.grid = None;
        self.tiles = None;
    }

    pub fn grid(&self) -> Option<&TileGrid> {
        self.grid.as_ref()
    }

    /// Map edit. Fails for cells outside the grid and ids missing from the tile set.
    pub fn set_tile(&mut self, column: u32, row: u32, id: TileId) -> Result<TileId, TilemapError> {
        let known = self
            .tiles
            .as_ref()
            .is_some_and(|tiles| tiles.image(id).is_some());
        let grid = match self.grid.as_mut() {
            Some(grid) if known => grid,
            _ => return Err(TilemapError::UnknownTile { id, column, row }),
        };
        grid.set_tile(column, row, id)
            .ok_or(TilemapError::UnknownTile { id, column, row })
    }

    pub fn sprites(&self) -> &SpriteStore {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteStore {
        &mut self.sprites
    }

    pub fn spawn_sprite(&mut self, x: i32, y: i32, image: IndexedImage) -> SpriteId {
        self.sprites.spawn(x, y, image)
    }

    pub fn despawn_sprite(&mut self, id: SpriteId) -> bool {
        self.sprites.despawn(id)
    }

    pub fn apply_pending(&mut self) {
        self.sprites.apply_pending();
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        self.grid
            .as_ref()
            .map(|grid| {
                let geometry = grid.geometry();
                (geometry.pixel_width(), geometry.pixel_height())
            })
            .unwrap_or((0, 0))
    }
}

impl TileWorld for World {
    fn tile_grid(&self) -> Option<GridGeometry> {
        self.grid.as_ref().map(TileGrid::geometry)
    }

    fn tile_image(&self, column: u32, row: u32) -> Option<&IndexedImage> {
        let id = self.grid.as_ref()?.tile_at(column, row)?;
        self.tiles.as_ref()?.image(id)
    }
}

impl SpriteHost for World {
    type Sprite = Sprite;

    fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(id)
    }
}
