use std::time::Duration;

use tracing::info;

use crate::builder::MinimapInstance;
use crate::raster::{Palette, ScaleLevel};
use crate::tracker::{DisplayHandle, RefreshReport, TrackerError, UpdateTracker};
use crate::world::World;

/// Game logic driven by a [`MinimapSession`] on every fixed step.
pub trait ViewerScene {
    fn update(&mut self, fixed_dt_seconds: f32, world: &mut World);
    fn shutdown(&mut self, _world: &mut World) {}
}

/// A world, its minimap tracker and the one display being presented.
///
/// Each [`step`](Self::step) updates the scene, applies deferred sprite
/// spawns/despawns and then lets the tracker run any due refreshes.
pub struct MinimapSession {
    world: World,
    tracker: UpdateTracker,
    display: DisplayHandle,
    palette: Palette,
    scene: Box<dyn ViewerScene>,
}

impl MinimapSession {
    pub fn new(
        world: World,
        tracker: UpdateTracker,
        display: DisplayHandle,
        palette: Palette,
        scene: Box<dyn ViewerScene>,
    ) -> Self {
        Self {
            world,
            tracker,
            display,
            palette,
            scene,
        }
    }

    pub fn step(&mut self, fixed_dt: Duration) -> Vec<RefreshReport> {
        self.scene.update(fixed_dt.as_secs_f32(), &mut self.world);
        self.world.apply_pending();
        self.tracker.advance(fixed_dt, &self.world)
    }

    /// Positive steps zoom in (finer scale), negative steps zoom out. The
    /// display is rebuilt and refreshed immediately when the scale changes.
    pub fn zoom(&mut self, steps: i32) -> Result<Option<ScaleLevel>, TrackerError> {
        let params = self
            .tracker
            .params(self.display)
            .ok_or(TrackerError::UnknownDisplay(self.display))?;
        let mut scale = params.scale;
        for _ in 0..steps.unsigned_abs() {
            scale = if steps > 0 { scale.finer() } else { scale.coarser() };
        }
        if scale == params.scale {
            return Ok(None);
        }

        self.tracker
            .replace_display(self.display, &self.world, params.with_scale(scale))?;
        self.tracker.refresh(self.display, &self.world)?;
        info!(display = self.display.0, scale = %scale, "minimap_zoom_changed");
        Ok(Some(scale))
    }

    pub fn current(&self) -> Option<&MinimapInstance> {
        self.tracker.current(self.display)
    }

    pub fn current_rgba(&self) -> Option<(u32, u32, Vec<u8>)> {
        self.current().map(|instance| {
            (
                instance.width(),
                instance.height(),
                self.palette.to_rgba(instance.image()),
            )
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn tracker(&self) -> &UpdateTracker {
        &self.tracker
    }

    pub fn display(&self) -> DisplayHandle {
        self.display
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn shutdown(&mut self) {
        self.scene.shutdown(&mut self.world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MinimapParams;
    use crate::raster::{IndexedImage, PixelBuffer};
    use crate::world::{SpriteId, TileGrid, TileSet};

    struct DespawnAfter {
        sprite: SpriteId,
        remaining_steps: u32,
    }

    impl ViewerScene for DespawnAfter {
        fn update(&mut self, _fixed_dt_seconds: f32, world: &mut World) {
            if let Some(sprite) = world.sprites_mut().get_mut(self.sprite) {
                sprite.x += 8;
            }
            if self.remaining_steps == 0 {
                world.despawn_sprite(self.sprite);
            } else {
                self.remaining_steps -= 1;
            }
        }
    }

    fn session(remaining_steps: u32) -> (MinimapSession, SpriteId) {
        let mut world = World::new();
        let tiles = TileSet::new(3, vec![IndexedImage::filled(8, 8, 1)]).expect("tiles");
        world
            .set_tilemap(TileGrid::uniform(4, 4, 3, 0).expect("grid"), tiles)
            .expect("tilemap");
        let sprite = world.spawn_sprite(4, 4, IndexedImage::filled(2, 2, 6));
        world.apply_pending();

        let mut tracker = UpdateTracker::default();
        let display = tracker.create_display(
            &world,
            MinimapParams {
                scale: ScaleLevel::HALF,
                ..MinimapParams::default()
            },
        );
        tracker.track(display, sprite, ScaleLevel::HALF).expect("track");
        tracker
            .start_periodic_refresh(display, Duration::from_millis(100))
            .expect("start");
        let scene = DespawnAfter {
            sprite,
            remaining_steps,
        };
        (
            MinimapSession::new(world, tracker, display, Palette::default(), Box::new(scene)),
            sprite,
        )
    }

    #[test]
    fn step_moves_sprite_and_refreshes_when_due() {
        let (mut session, _) = session(5);

        let reports = session.step(Duration::from_millis(100));

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].overlaid, 1);
        let image = session.current().expect("display").image();
        assert_eq!(image.pixel(6, 2), 6);
    }

    #[test]
    fn despawned_sprite_is_pruned_by_following_refresh() {
        let (mut session, sprite) = session(0);

        let reports = session.step(Duration::from_millis(100));

        assert_eq!(reports[0].pruned, 1);
        assert!(!session
            .tracker()
            .tracked(session.display())
            .iter()
            .any(|entry| entry.sprite == sprite));
        assert_eq!(session.current().expect("display").image().count_value(6), 0);
    }

    #[test]
    fn zoom_rebuilds_display_and_saturates() {
        let (mut session, _) = session(5);

        assert_eq!(session.zoom(1).expect("zoom"), Some(ScaleLevel::FULL));
        assert_eq!(session.current().expect("display").width(), 32);
        assert_eq!(session.current().expect("display").image().count_value(6), 4);
        assert_eq!(session.zoom(1).expect("zoom"), None);
        assert_eq!(session.zoom(-10).expect("zoom"), Some(ScaleLevel::SIXTEENTH));
    }

    #[test]
    fn current_rgba_matches_display_size() {
        let (session, _) = session(5);
        let (width, height, rgba) = session.current_rgba().expect("rgba");
        assert_eq!((width, height), (16, 16));
        assert_eq!(rgba.len(), 16 * 16 * 4);
    }
}
