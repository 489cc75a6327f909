use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LockResult, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::tracker::RefreshReport;

static POISON_REPORTED: AtomicBool = AtomicBool::new(false);

/// Takes the guard out of a poisoned lock, logging the first occurrence only.
fn recover<G>(result: LockResult<G>, operation: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        if !POISON_REPORTED.swap(true, Ordering::Relaxed) {
            warn!(operation, "viewer_metrics_lock_poisoned");
        }
        poisoned.into_inner()
    })
}

/// One interval's worth of viewer and refresh statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewerMetricsSnapshot {
    pub fps: f32,
    pub frame_time_ms: f32,
    pub refreshes_per_second: f32,
    /// Mean sprites stamped per refresh in the interval.
    pub overlaid_per_refresh: f32,
    /// Tracked entries pruned as destroyed during the interval.
    pub pruned: u32,
}

/// Latest metrics, readable from outside the event loop.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<ViewerMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> ViewerMetricsSnapshot {
        *recover(self.latest.read(), "read")
    }

    pub(crate) fn publish(&self, snapshot: ViewerMetricsSnapshot) {
        *recover(self.latest.write(), "write") = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    window_start: Instant,
    window: Duration,
    frames: u32,
    busy: Duration,
    refreshes: u32,
    overlaid: u64,
    pruned: u32,
}

impl MetricsAccumulator {
    pub(crate) fn new(window: Duration) -> Self {
        Self::starting_at(Instant::now(), window)
    }

    fn starting_at(window_start: Instant, window: Duration) -> Self {
        Self {
            window_start,
            window,
            frames: 0,
            busy: Duration::ZERO,
            refreshes: 0,
            overlaid: 0,
            pruned: 0,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.busy = self.busy.saturating_add(frame_dt);
    }

    pub(crate) fn record_refreshes(&mut self, reports: &[RefreshReport]) {
        for report in reports {
            self.refreshes = self.refreshes.saturating_add(1);
            self.overlaid = self.overlaid.saturating_add(report.overlaid as u64);
            self.pruned = self.pruned.saturating_add(report.pruned as u32);
        }
    }

    /// Closes the window and returns its snapshot once `now` is past it.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<ViewerMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let per = |total: f32, count: u32| if count == 0 { 0.0 } else { total / count as f32 };
        let snapshot = ViewerMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            frame_time_ms: per(self.busy.as_secs_f32() * 1000.0, self.frames),
            refreshes_per_second: self.refreshes as f32 / seconds,
            overlaid_per_refresh: per(self.overlaid as f32, self.refreshes),
            pruned: self.pruned,
        };
        *self = Self::starting_at(now, self.window);
        Some(snapshot)
    }
}
