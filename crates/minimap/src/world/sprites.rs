use crate::raster::{IndexedImage, PixelBuffer};

use super::SpriteView;

/// Opaque sprite handle. Ids are never reused, so two equal ids always
/// refer to the same sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(pub u64);

#[derive(Debug, Default)]
pub struct SpriteIdAllocator {
    next: u64,
}

impl SpriteIdAllocator {
    pub fn allocate(&mut self) -> SpriteId {
        let id = SpriteId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// World-space sprite. `x`/`y` is the sprite centre in world pixels.
#[derive(Debug, Clone)]
pub struct Sprite {
    id: SpriteId,
    pub x: i32,
    pub y: i32,
    image: IndexedImage,
    destroyed: bool,
}

impl Sprite {
    pub fn id(&self) -> SpriteId {
        self.id
    }

    pub fn set_image(&mut self, image: IndexedImage) {
        self.image = image;
    }
}

impl SpriteView for Sprite {
    fn world_position(&self) -> (i32, i32) {
        (self.x, self.y)
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
        self.destroyed
    }
}

/// Sprite storage with deferred spawn and despawn.
///
/// Spawns become visible and despawned sprites are dropped at the next
/// [`apply_pending`](Self::apply_pending). Between a despawn and that call
/// the sprite is still reachable but reports itself destroyed.
#[derive(Debug, Default)]
pub struct SpriteStore {
    allocator: SpriteIdAllocator,
    sprites: Vec<Sprite>,
    pending_spawns: Vec<Sprite>,
    pending_despawns: Vec<SpriteId>,
}

impl SpriteStore {
    pub fn spawn(&mut self, x: i32, y: i32, image: IndexedImage) -> SpriteId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Sprite {
            id,
            x,
            y,
            image,
            destroyed: false,
        });
        id
    }

    pub fn despawn(&mut self, id: SpriteId) -> bool {
        if let Some(sprite) = self.sprites.iter_mut().find(|sprite| sprite.id == id) {
            sprite.destroyed = true;
        } else if let Some(sprite) = self.pending_spawns.iter_mut().find(|sprite| sprite.id == id) {
            sprite.destroyed = true;
        } else {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.sprites
                .retain(|sprite| pending.binary_search_by_key(&sprite.id.0, |id| id.0).is_err());
            self.pending_spawns
                .retain(|sprite| pending.binary_search_by_key(&sprite.id.0, |id| id.0).is_err());
            self.pending_despawns.clear();
        }

        self.sprites.append(&mut self.pending_spawns);
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|sprite| sprite.id == id)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|sprite| sprite.id == id)
    }
}
