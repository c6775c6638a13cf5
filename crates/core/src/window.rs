//! Due-window matching.
//!
//! A task is due when its reminder instant has passed but by no more than
//! the window tolerance. Anything later than that is *missed*: it is not
//! dispatched and nothing retires it, so it stays pending until someone
//! fixes it by hand.

use chrono::{DateTime, Duration, Utc};

/// Default tolerance after the reminder instant, in seconds.
pub const DEFAULT_DUE_WINDOW_SECS: i64 = 300;

/// Largest accepted tolerance, in seconds (one year).
pub const MAX_DUE_WINDOW_SECS: i64 = 365 * 24 * 60 * 60;

/// Classification of a task's reminder instant relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVerdict {
    /// Reminder instant is still ahead.
    Future { remaining: Duration },
    /// Inside the window; send now.
    Due { late_by: Duration },
    /// Window elapsed without a send.
    Missed { overdue_by: Duration },
}

impl WindowVerdict {
    pub fn is_due(&self) -> bool {
        matches!(self, WindowVerdict::Due { .. })
    }
}

/// Tolerance applied after a task's reminder instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    tolerance: Duration,
}

impl DueWindow {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Window of `secs` seconds, clamped to `0..=MAX_DUE_WINDOW_SECS`.
    pub fn from_secs(secs: i64) -> Self {
        let secs = secs.clamp(0, MAX_DUE_WINDOW_SECS);
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::zero()))
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Classify `notify_at` against `now`.
    ///
    /// Compared at millisecond resolution; both bounds are inclusive, so a
    /// task exactly at `now` or exactly `tolerance` old is due.
    pub fn classify(&self, now: DateTime<Utc>, notify_at: DateTime<Utc>) -> WindowVerdict {
        let delta_ms = now.signed_duration_since(notify_at).num_milliseconds();
        let delta = Duration::milliseconds(delta_ms);

        if delta_ms < 0 {
            WindowVerdict::Future { remaining: -delta }
        } else if delta_ms <= self.tolerance.num_milliseconds() {
            WindowVerdict::Due { late_by: delta }
        } else {
            WindowVerdict::Missed {
                overdue_by: delta - self.tolerance,
            }
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>, notify_at: DateTime<Utc>) -> bool {
        self.classify(now, notify_at).is_due()
    }
}

impl Default for DueWindow {
    fn default() -> Self {
        Self::from_secs(DEFAULT_DUE_WINDOW_SECS)
    }
}
