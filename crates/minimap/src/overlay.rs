use crate::builder::{MinimapCanvas, MinimapParams};
use crate::raster::{render_scaled_clipped, ScaleLevel};
use crate::world::SpriteView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayPlacement {
    pub x: i64,
    pub y: i64,
    pub scale: ScaleLevel,
}

/// Centres a sprite on its world position.
///
/// The sprite is drawn at `minimap scale - sprite_scale`, clamped at full
/// resolution, so a sprite can be enlarged relative to the tiles but never
/// drawn above its native size.
pub fn overlay_placement(
    params: &MinimapParams,
    world_position: (i32, i32),
    sprite_size: (u32, u32),
    sprite_scale: ScaleLevel,
) -> OverlayPlacement {
    let effective = params.scale.saturating_sub(sprite_scale);
    let border = i64::from(params.border_width);
    let (world_x, world_y) = world_position;
    let (width, height) = sprite_size;
    OverlayPlacement {
        x: i64::from(params.scale.downscale_signed(world_x)) - i64::from(effective.downscale(width / 2))
            + border,
        y: i64::from(params.scale.downscale_signed(world_y)) - i64::from(effective.downscale(height / 2))
            + border,
        scale: effective,
    }
}

/// Samples falling outside the canvas are dropped, so sprites at the world
/// edge are partially drawn. Returns the number of pixels written.
pub fn overlay_sprite<V: SpriteView + ?Sized>(
    canvas: &mut MinimapCanvas,
    sprite: &V,
    sprite_scale: ScaleLevel,
) -> usize {
    let placement = overlay_placement(
        &canvas.params(),
        sprite.world_position(),
        (sprite.width(), sprite.height()),
        sprite_scale,
    );
    render_scaled_clipped(
        sprite.image(),
        canvas.image_mut(),
        placement.x,
        placement.y,
        placement.scale,
    )
    .written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MinimapCanvas;
    use crate::raster::{IndexedImage, PixelBuffer};
    use crate::world::{TileGrid, TileSet, World};

    struct TestSprite {
        position: (i32, i32),
        image: IndexedImage,
    }

    impl SpriteView for TestSprite {
        fn world_position(&self) -> (i32, i32) {
            self.position
        }

        fn width(&self) -> u32 {
            self.image.width()
        }

        fn height(&self) -> u32 {
            self.image.height()
        }

        fn image(&self) -> &IndexedImage {
            &self.image
        }

        fn is_destroyed(&self) -> bool {
            false
        }
    }

    fn canvas(scale: ScaleLevel, border_width: u32) -> MinimapCanvas {
        let mut world = World::new();
        let tiles = TileSet::new(3, vec![IndexedImage::filled(8, 8, 1)]).expect("tiles");
        world
            .set_tilemap(TileGrid::uniform(4, 4, 3, 0).expect("grid"), tiles)
            .expect("tilemap");
        MinimapCanvas::build(
            &world,
            MinimapParams {
                scale,
                border_width,
                border_color: 2,
            },
        )
    }

    #[test]
    fn sprite_scale_above_minimap_scale_clamps_to_full() {
        let params = MinimapParams {
            scale: ScaleLevel::EIGHTH,
            ..MinimapParams::default()
        };
        let placement = overlay_placement(&params, (0, 0), (4, 4), ScaleLevel::SIXTEENTH);
        assert_eq!(placement.scale, ScaleLevel::FULL);
    }

    #[test]
    fn placement_centres_sprite_and_adds_border() {
        let params = MinimapParams {
            scale: ScaleLevel::HALF,
            border_width: 3,
            border_color: 0,
        };
        let placement = overlay_placement(&params, (20, 10), (8, 6), ScaleLevel::FULL);
        assert_eq!(
            placement,
            OverlayPlacement {
                x: 10 - 2 + 3,
                y: 5 - 1 + 3,
                scale: ScaleLevel::HALF,
            }
        );
    }

    #[test]
    fn placement_at_extreme_world_positions_does_not_overflow() {
        let params = MinimapParams {
            scale: ScaleLevel::FULL,
            border_width: 2,
            border_color: 0,
        };

        let right = overlay_placement(&params, (i32::MAX, 0), (2, 2), ScaleLevel::FULL);
        assert_eq!(right.x, i64::from(i32::MAX) - 1 + 2);
        assert_eq!(right.y, -1 + 2);

        let wide_border = MinimapParams {
            border_width: u32::MAX,
            ..params
        };
        let left = overlay_placement(&wide_border, (i32::MIN, i32::MIN), (4, 4), ScaleLevel::FULL);
        assert_eq!(left.x, i64::from(i32::MIN) - 2 + i64::from(u32::MAX));
        assert_eq!(left.y, left.x);
    }

    #[test]
    fn sprites_far_outside_the_world_are_clipped_away() {
        let mut canvas = canvas(ScaleLevel::FULL, 2);
        let before = canvas.image().clone();

        for position in [(i32::MAX, 0), (0, i32::MAX), (i32::MIN, i32::MIN)] {
            let sprite = TestSprite {
                position,
                image: IndexedImage::filled(2, 2, 6),
            };
            assert_eq!(canvas.overlay_sprite(&sprite, ScaleLevel::FULL), 0);
        }
        assert_eq!(canvas.image(), &before);
    }

    #[test]
    fn sprite_scale_equal_to_minimap_scale_draws_native_size() {
        let mut canvas = canvas(ScaleLevel::HALF, 0);
        let sprite = TestSprite {
            position: (16, 16),
            image: IndexedImage::filled(2, 2, 6),
        };

        let written = canvas.overlay_sprite(&sprite, ScaleLevel::HALF);

        assert_eq!(written, 4);
        assert_eq!(canvas.image().count_value(6), 4);
        assert_eq!(canvas.image().pixel(7, 7), 6);
        assert_eq!(canvas.image().pixel(8, 8), 6);
    }

    #[test]
    fn all_transparent_sprite_leaves_canvas_unchanged() {
        let mut canvas = canvas(ScaleLevel::HALF, 2);
        let before = canvas.image().clone();
        let sprite = TestSprite {
            position: (10, 10),
            image: IndexedImage::new(6, 6),
        };

        assert_eq!(canvas.overlay_sprite(&sprite, ScaleLevel::FULL), 0);
        assert_eq!(canvas.image(), &before);
    }

    #[test]
    fn sprite_at_world_edge_is_clipped() {
        let mut canvas = canvas(ScaleLevel::FULL, 0);
        let sprite = TestSprite {
            position: (0, 0),
            image: IndexedImage::filled(4, 4, 6),
        };

        let written = overlay_sprite(&mut canvas, &sprite, ScaleLevel::FULL);

        assert_eq!(written, 4);
        assert_eq!(canvas.image().pixel(0, 0), 6);
        assert_eq!(canvas.image().pixel(1, 1), 6);
        assert_eq!(canvas.image().pixel(2, 2), 1);
    }

    #[test]
    fn published_instance_is_detached_from_later_canvases() {
        let mut first = canvas(ScaleLevel::HALF, 0);
        let sprite = TestSprite {
            position: (8, 8),
            image: IndexedImage::filled(2, 2, 6),
        };
        first.overlay_sprite(&sprite, ScaleLevel::FULL);
        let published = first.publish();

        let mut second = canvas(ScaleLevel::HALF, 0);
        second.overlay_sprite(&sprite, ScaleLevel::HALF);

        assert_eq!(published.image().count_value(6), 1);
        assert_eq!(second.image().count_value(6), 4);
    }
}
