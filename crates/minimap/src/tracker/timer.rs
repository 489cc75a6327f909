use std::time::Duration;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    pub due: u32,
    pub dropped_backlog: Duration,
}

/// Fixed-interval accumulator. Elapsed time is fed in by the host loop and
/// converted into a whole number of due refreshes.
#[derive(Debug, Clone)]
pub struct RefreshTimer {
    interval: Duration,
    accumulator: Duration,
}

impl RefreshTimer {
    /// A zero interval falls back to [`DEFAULT_REFRESH_INTERVAL`].
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: normalize_non_zero_duration(interval, DEFAULT_REFRESH_INTERVAL),
            accumulator: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Adds `elapsed` and plans at most `max_due` refreshes. Any backlog
    /// still worth a full interval after that is dropped.
    pub fn advance(&mut self, elapsed: Duration, max_due: u32) -> RefreshPlan {
        let accumulator = self.accumulator.saturating_add(elapsed);
        let (plan, remaining) = plan_refreshes(accumulator, self.interval, max_due.max(1));
        self.accumulator = remaining;
        plan
    }
}

fn plan_refreshes(
    mut accumulator: Duration,
    interval: Duration,
    max_due: u32,
) -> (RefreshPlan, Duration) {
    let mut due = 0u32;

    while accumulator >= interval && due < max_due {
        accumulator = accumulator.saturating_sub(interval);
        due = due.saturating_add(1);
    }

    if accumulator >= interval {
        let dropped_backlog = accumulator;
        (
            RefreshPlan {
                due,
                dropped_backlog,
            },
            Duration::ZERO,
        )
    } else {
        (
            RefreshPlan {
                due,
                dropped_backlog: Duration::ZERO,
            },
            accumulator,
        )
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
