//! Live minimap displays: tracked sprites and periodic refresh.
//!
//! Each display is addressed through the [`DisplayHandle`] returned by
//! [`UpdateTracker::create_display`]. Destroyed sprites are pruned lazily:
//! only a refresh notices them, so a sprite destroyed between two ticks
//! stays in the tracked list until the next tick runs.

mod timer;

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::builder::{build_minimap, MinimapCanvas, MinimapInstance, MinimapParams};
use crate::raster::ScaleLevel;
use crate::world::{is_destroyed, SpriteHost, SpriteId, TileWorld};

pub use timer::{RefreshPlan, RefreshTimer, DEFAULT_REFRESH_INTERVAL};

pub const DEFAULT_MAX_REFRESHES_PER_ADVANCE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayHandle(pub u64);

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedSprite {
    pub sprite: SpriteId,
    pub scale: ScaleLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub display: DisplayHandle,
    pub overlaid: usize,
    pub pruned: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("unknown minimap display {0}")]
    UnknownDisplay(DisplayHandle),
}

#[derive(Debug)]
struct MinimapDisplay {
    handle: DisplayHandle,
    params: MinimapParams,
    current: MinimapInstance,
    tracked: Vec<TrackedSprite>,
    timer: Option<RefreshTimer>,
}

#[derive(Debug)]
pub struct UpdateTracker {
    next_handle: u64,
    displays: Vec<MinimapDisplay>,
    max_refreshes_per_advance: u32,
}

impl Default for UpdateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REFRESHES_PER_ADVANCE)
    }
}

impl UpdateTracker {
    pub fn new(max_refreshes_per_advance: u32) -> Self {
        Self {
            next_handle: 0,
            displays: Vec::new(),
            max_refreshes_per_advance: max_refreshes_per_advance.max(1),
        }
    }

    pub fn create_display<W: TileWorld + ?Sized>(
        &mut self,
        world: &W,
        params: MinimapParams,
    ) -> DisplayHandle {
        let handle = DisplayHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        let current = build_minimap(world, params);
        info!(
            display = handle.0,
            width = current.width(),
            height = current.height(),
            scale = params.scale.exponent(),
            "minimap_display_created"
        );
        self.displays.push(MinimapDisplay {
            handle,
            params,
            current,
            tracked: Vec::new(),
            timer: None,
        });
        handle
    }

    /// Rebuilds a display with new base parameters. Its tracked sprites and
    /// timer are kept; overlays reappear on the next refresh.
    pub fn replace_display<W: TileWorld + ?Sized>(
        &mut self,
        handle: DisplayHandle,
        world: &W,
        params: MinimapParams,
    ) -> Result<(), TrackerError> {
        let slot = self.display_mut(handle)?;
        slot.params = params;
        slot.current = build_minimap(world, params);
        info!(
            display = handle.0,
            width = slot.current.width(),
            height = slot.current.height(),
            scale = params.scale.exponent(),
            "minimap_display_replaced"
        );
        Ok(())
    }

    pub fn remove_display(&mut self, handle: DisplayHandle) -> Result<(), TrackerError> {
        let index = self
            .displays
            .iter()
            .position(|display| display.handle == handle)
            .ok_or(TrackerError::UnknownDisplay(handle))?;
        self.displays.remove(index);
        info!(display = handle.0, "minimap_display_removed");
        Ok(())
    }

    /// Appends an entry. Tracking the same sprite twice draws it twice.
    pub fn track(
        &mut self,
        handle: DisplayHandle,
        sprite: SpriteId,
        scale: ScaleLevel,
    ) -> Result<(), TrackerError> {
        let slot = self.display_mut(handle)?;
        if slot.tracked.iter().any(|entry| entry.sprite == sprite) {
            warn!(
                display = handle.0,
                sprite = sprite.0,
                "minimap_duplicate_tracked_sprite"
            );
        }
        slot.tracked.push(TrackedSprite { sprite, scale });
        Ok(())
    }

    /// Removes every entry for `sprite`; returns how many were removed.
    pub fn untrack(&mut self, handle: DisplayHandle, sprite: SpriteId) -> Result<usize, TrackerError> {
        let slot = self.display_mut(handle)?;
        Ok(remove_entries(&mut slot.tracked, sprite))
    }

    /// One refresh tick: rebuild from the current world, overlay every live
    /// tracked sprite, prune destroyed ones, then publish.
    pub fn refresh<W>(&mut self, handle: DisplayHandle, world: &W) -> Result<RefreshReport, TrackerError>
    where
        W: TileWorld + SpriteHost + ?Sized,
    {
        let slot = self.display_mut(handle)?;
        let mut canvas = MinimapCanvas::build(world, slot.params);

        let snapshot = slot.tracked.clone();
        let mut overlaid = 0usize;
        let mut pruned = 0usize;
        for entry in &snapshot {
            if is_destroyed(world, entry.sprite) {
                pruned += remove_entries(&mut slot.tracked, entry.sprite);
                continue;
            }
            if let Some(sprite) = world.sprite(entry.sprite) {
                canvas.overlay_sprite(sprite, entry.scale);
                overlaid += 1;
            }
        }

        slot.current = canvas.publish();
        let report = RefreshReport {
            display: handle,
            overlaid,
            pruned,
            width: slot.current.width(),
            height: slot.current.height(),
        };
        debug!(
            display = handle.0,
            overlaid,
            pruned,
            tracked = slot.tracked.len(),
            "minimap_refreshed"
        );
        Ok(report)
    }

    pub fn start_periodic_refresh(
        &mut self,
        handle: DisplayHandle,
        interval: Duration,
    ) -> Result<(), TrackerError> {
        let slot = self.display_mut(handle)?;
        let timer = RefreshTimer::new(interval);
        info!(
            display = handle.0,
            interval_ms = timer.interval().as_millis() as u64,
            "minimap_refresh_started"
        );
        slot.timer = Some(timer);
        Ok(())
    }

    pub fn stop_periodic_refresh(&mut self, handle: DisplayHandle) -> Result<(), TrackerError> {
        let slot = self.display_mut(handle)?;
        if slot.timer.take().is_some() {
            info!(display = handle.0, "minimap_refresh_stopped");
        }
        Ok(())
    }

    /// Feeds elapsed host time to every display timer and runs the refreshes
    /// that became due, in display creation order.
    pub fn advance<W>(&mut self, elapsed: Duration, world: &W) -> Vec<RefreshReport>
    where
        W: TileWorld + SpriteHost + ?Sized,
    {
        let max_due = self.max_refreshes_per_advance;
        let mut due = Vec::new();
        for slot in &mut self.displays {
            let Some(timer) = slot.timer.as_mut() else {
                continue;
            };
            let plan = timer.advance(elapsed, max_due);
            if plan.dropped_backlog > Duration::ZERO {
                warn!(
                    display = slot.handle.0,
                    dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                    max_refreshes_per_advance = max_due,
                    "minimap_refresh_backlog_dropped"
                );
            }
            if plan.due > 0 {
                due.push((slot.handle, plan.due));
            }
        }

        let mut reports = Vec::new();
        for (handle, count) in due {
            for _ in 0..count {
                if let Ok(report) = self.refresh(handle, world) {
                    reports.push(report);
                }
            }
        }
        reports
    }

    pub fn current(&self, handle: DisplayHandle) -> Option<&MinimapInstance> {
        self.display(handle).map(|display| &display.current)
    }

    pub fn params(&self, handle: DisplayHandle) -> Option<MinimapParams> {
        self.display(handle).map(|display| display.params)
    }

    pub fn tracked(&self, handle: DisplayHandle) -> &[TrackedSprite] {
        self.display(handle)
            .map(|display| display.tracked.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_refreshing(&self, handle: DisplayHandle) -> bool {
        self.display(handle)
            .is_some_and(|display| display.timer.is_some())
    }

    pub fn display_count(&self) -> usize {
        self.displays.len()
    }

    pub fn handles(&self) -> impl Iterator<Item = DisplayHandle> + '_ {
        self.displays.iter().map(|display| display.handle)
    }

    fn display(&self, handle: DisplayHandle) -> Option<&MinimapDisplay> {
        self.displays.iter().find(|display| display.handle == handle)
    }

    fn display_mut(&mut self, handle: DisplayHandle) -> Result<&mut MinimapDisplay, TrackerError> {
        self.displays
            .iter_mut()
            .find(|display| display.handle == handle)
            .ok_or(TrackerError::UnknownDisplay(handle))
    }
}

fn remove_entries(tracked: &mut Vec<TrackedSprite>, sprite: SpriteId) -> usize {
    let before = tracked.len();
    tracked.retain(|entry| entry.sprite != sprite);
    before - tracked.len()
}
