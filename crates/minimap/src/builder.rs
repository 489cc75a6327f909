use tracing::{debug, warn};

use crate::overlay::overlay_sprite;
use crate::raster::{render_scaled, IndexedImage, PixelBuffer, ScaleLevel};
use crate::world::{SpriteView, TileWorld};

/// Base parameters of a minimap, re-read on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimapParams {
    pub scale: ScaleLevel,
    pub border_width: u32,
    pub border_color: u8,
}

impl MinimapParams {
    pub fn with_scale(self, scale: ScaleLevel) -> Self {
        Self { scale, ..self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimapInstance {
    image: IndexedImage,
    params: MinimapParams,
}

impl MinimapInstance {
    pub fn image(&self) -> &IndexedImage {
        &self.image
    }

    pub fn params(&self) -> MinimapParams {
        self.params
    }

    pub fn scale(&self) -> ScaleLevel {
        self.params.scale
    }

    pub fn border_width(&self) -> u32 {
        self.params.border_width
    }

    pub fn border_color(&self) -> u8 {
        self.params.border_color
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> IndexedImage {
        self.image
    }
}

#[derive(Debug, Clone)]
pub struct MinimapCanvas {
    image: IndexedImage,
    params: MinimapParams,
}

impl MinimapCanvas {
    /// Renders the world's tile grid at `params.scale`.
    ///
    /// A world without a grid yields a blank 1x1 canvas carrying `params`.
    /// Cells without a tile image are left as background. A tile whose
    /// image does not fit its slot is skipped and logged.
    pub fn build<W: TileWorld + ?Sized>(world: &W, params: MinimapParams) -> Self {
        let Some(geometry) = world.tile_grid() else {
            debug!(scale = params.scale.exponent(), "minimap_built_without_grid");
            return Self {
                image: IndexedImage::new(1, 1),
                params,
            };
        };

        let scale = params.scale;
        let border = params.border_width;
        let tile_width = geometry.tile_width();
        let width = scale
            .sample_count(geometry.pixel_width())
            .saturating_add(border.saturating_mul(2));
        let height = scale
            .sample_count(geometry.pixel_height())
            .saturating_add(border.saturating_mul(2));

        let mut image = IndexedImage::new(width, height);
        if border > 0 {
            image.fill(params.border_color);
        }

        let mut missing_tiles = 0usize;
        let mut skipped_tiles = 0usize;
        for row in 0..geometry.rows {
            for column in 0..geometry.columns {
                let Some(tile) = world.tile_image(column, row) else {
                    missing_tiles += 1;
                    continue;
                };
                let nx = scale.downscale(column * tile_width) + border;
                let ny = scale.downscale(row * tile_width) + border;
                if let Err(error) = render_scaled(tile, &mut image, i64::from(nx), i64::from(ny), scale) {
                    skipped_tiles += 1;
                    warn!(column, row, error = %error, "minimap_tile_out_of_bounds");
                }
            }
        }

        debug!(
            columns = geometry.columns,
            rows = geometry.rows,
            width,
            height,
            scale = scale.exponent(),
            missing_tiles,
            skipped_tiles,
            "minimap_built"
        );

        Self { image, params }
    }

    pub fn image(&self) -> &IndexedImage {
        &self.image
    }

    pub fn params(&self) -> MinimapParams {
        self.params
    }

    pub(crate) fn image_mut(&mut self) -> &mut IndexedImage {
        &mut self.image
    }

    pub fn overlay_sprite<V: SpriteView + ?Sized>(&mut self, sprite: &V, sprite_scale: ScaleLevel) -> usize {
        overlay_sprite(self, sprite, sprite_scale)
    }

    pub fn publish(self) -> MinimapInstance {
        MinimapInstance {
            image: self.image,
            params: self.params,
        }
    }
}

pub fn build_minimap<W: TileWorld + ?Sized>(world: &W, params: MinimapParams) -> MinimapInstance {
    MinimapCanvas::build(world, params).publish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::TRANSPARENT;
    use crate::world::{GridGeometry, TileGrid, TileSet, World};

    fn uniform_world(columns: u32, rows: u32, tile_scale: u8, color: u8) -> World {
        let width = 1u32 << tile_scale;
        let tiles =
            TileSet::new(tile_scale, vec![IndexedImage::filled(width, width, color)]).expect("tiles");
        let grid = TileGrid::uniform(columns, rows, tile_scale, 0).expect("grid");
        let mut world = World::new();
        world.set_tilemap(grid, tiles).expect("tilemap");
        world
    }

    fn params(scale: ScaleLevel, border_width: u32, border_color: u8) -> MinimapParams {
        MinimapParams {
            scale,
            border_width,
            border_color,
        }
    }

    #[test]
    fn world_without_grid_yields_single_blank_pixel() {
        let world = World::new();
        for requested in [params(ScaleLevel::FULL, 0, 0), params(ScaleLevel::SIXTEENTH, 6, 3)] {
            let minimap = build_minimap(&world, requested);
            assert_eq!((minimap.width(), minimap.height()), (1, 1));
            assert_eq!(minimap.image().pixel(0, 0), TRANSPARENT);
            assert_eq!(minimap.params(), requested);
        }
    }

    #[test]
    fn half_scale_grid_without_border() {
        let mut world = World::new();
        let tiles = TileSet::new(
            3,
            (1..=16u8).map(|color| IndexedImage::filled(8, 8, color)).collect(),
        )
        .expect("tiles");
        let grid = TileGrid::new(4, 4, 3, (0..16).collect()).expect("grid");
        world.set_tilemap(grid, tiles).expect("tilemap");

        let minimap = build_minimap(&world, params(ScaleLevel::HALF, 0, 0));

        assert_eq!((minimap.width(), minimap.height()), (16, 16));
        for y in 0..16 {
            for x in 0..16 {
                let expected = (y / 4 * 4 + x / 4 + 1) as u8;
                assert_eq!(minimap.image().pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn border_ring_keeps_border_colour() {
        let world = uniform_world(4, 4, 3, 9);

        let minimap = build_minimap(&world, params(ScaleLevel::HALF, 2, 5));

        assert_eq!((minimap.width(), minimap.height()), (20, 20));
        for y in 0..20 {
            for x in 0..20 {
                let in_ring = x < 2 || y < 2 || x >= 18 || y >= 18;
                let expected = if in_ring { 5 } else { 9 };
                assert_eq!(minimap.image().pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn transparent_tile_pixels_show_border_colour_underneath() {
        let mut world = World::new();
        let mut tile = IndexedImage::filled(2, 2, 4);
        tile.set_pixel(1, 1, TRANSPARENT);
        let tiles = TileSet::new(1, vec![tile]).expect("tiles");
        world
            .set_tilemap(TileGrid::uniform(1, 1, 1, 0).expect("grid"), tiles)
            .expect("tilemap");

        let minimap = build_minimap(&world, params(ScaleLevel::FULL, 1, 7));

        assert_eq!((minimap.width(), minimap.height()), (4, 4));
        assert_eq!(minimap.image().pixel(1, 1), 4);
        assert_eq!(minimap.image().pixel(2, 2), 7);
    }

    #[test]
    fn tiles_smaller_than_the_scale_factor_still_fit() {
        let world = uniform_world(3, 1, 0, 2);

        let minimap = build_minimap(&world, params(ScaleLevel::HALF, 0, 0));

        assert_eq!((minimap.width(), minimap.height()), (2, 1));
        assert_eq!(minimap.image().count_value(2), 2);
    }

    struct OversizedTileWorld {
        tile: IndexedImage,
    }

    impl TileWorld for OversizedTileWorld {
        fn tile_grid(&self) -> Option<GridGeometry> {
            Some(GridGeometry {
                columns: 2,
                rows: 1,
                tile_scale: 1,
            })
        }

        fn tile_image(&self, column: u32, _row: u32) -> Option<&IndexedImage> {
            (column == 1).then_some(&self.tile)
        }
    }

    #[test]
    fn oversized_and_missing_tiles_are_skipped() {
        let world = OversizedTileWorld {
            tile: IndexedImage::filled(4, 4, 3),
        };

        let minimap = build_minimap(&world, params(ScaleLevel::FULL, 0, 0));

        assert_eq!((minimap.width(), minimap.height()), (4, 2));
        assert!(minimap.image().is_blank());
    }

    #[test]
    fn rebuilding_after_map_edit_leaves_previous_instance_alone() {
        let mut world = World::new();
        let tiles = TileSet::new(
            1,
            vec![IndexedImage::filled(2, 2, 1), IndexedImage::filled(2, 2, 2)],
        )
        .expect("tiles");
        world
            .set_tilemap(TileGrid::uniform(2, 1, 1, 0).expect("grid"), tiles)
            .expect("tilemap");

        let before = build_minimap(&world, params(ScaleLevel::FULL, 0, 0));
        world.set_tile(1, 0, 1).expect("edit");
        let after = build_minimap(&world, params(ScaleLevel::FULL, 0, 0));

        assert_eq!(before.image().count_value(2), 0);
        assert_eq!(after.image().count_value(2), 4);
    }
}
