use minimap::{SpriteId, ViewerScene, World};
use tracing::{debug, info};

use super::scenario::SpawnedSprite;

#[derive(Debug, Clone, PartialEq)]
struct Actor {
    id: SpriteId,
    position: (f32, f32),
    velocity: (f32, f32),
    remaining_ticks: Option<u32>,
}

/// Moves scenario sprites, bouncing them off the world edges, and despawns
/// the ones with a lifetime once it runs out.
#[derive(Debug)]
pub(crate) struct DemoScene {
    actors: Vec<Actor>,
    tick: u64,
}

impl DemoScene {
    pub(crate) fn new(spawned: &[SpawnedSprite]) -> Self {
        let actors = spawned
            .iter()
            .map(|sprite| Actor {
                id: sprite.id,
                position: sprite.position,
                velocity: sprite.velocity,
                remaining_ticks: sprite.lifetime_ticks,
            })
            .collect();
        Self { actors, tick: 0 }
    }

    pub(crate) fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

impl ViewerScene for DemoScene {
    fn update(&mut self, fixed_dt_seconds: f32, world: &mut World) {
        self.tick = self.tick.saturating_add(1);
        let (world_width, world_height) = world.pixel_size();
        let bounds = (world_width as f32, world_height as f32);
        let tick = self.tick;

        self.actors.retain_mut(|actor| {
            if let Some(remaining) = actor.remaining_ticks.as_mut() {
                if *remaining == 0 {
                    world.despawn_sprite(actor.id);
                    info!(sprite = actor.id.0, tick, "sprite_expired");
                    return false;
                }
                *remaining -= 1;
            }

            let Some(sprite) = world.sprites_mut().get_mut(actor.id) else {
                debug!(sprite = actor.id.0, "actor_sprite_missing");
                return false;
            };
            actor.position.0 += actor.velocity.0 * fixed_dt_seconds;
            actor.position.1 += actor.velocity.1 * fixed_dt_seconds;
            bounce(&mut actor.position.0, &mut actor.velocity.0, bounds.0);
            bounce(&mut actor.position.1, &mut actor.velocity.1, bounds.1);
            sprite.x = actor.position.0.round() as i32;
            sprite.y = actor.position.1.round() as i32;
            true
        });
    }

    fn shutdown(&mut self, world: &mut World) {
        info!(
            ticks = self.tick,
            actors = self.actor_count(),
            sprites = world.sprites().len(),
            "demo_scene_shutdown"
        );
    }
}

/// Reflects `position` into `0..=limit`, flipping `velocity` on contact.
fn bounce(position: &mut f32, velocity: &mut f32, limit: f32) {
    if *position < 0.0 {
        *position = -*position;
        *velocity = velocity.abs();
    } else if *position > limit {
        *position = (2.0 * limit - *position).max(0.0);
        *velocity = -velocity.abs();
    }
}
