use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Seconds in one wall-clock day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Wall-clock time of day in whole seconds since midnight (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u32);

impl ClockTime {
    /// Build from seconds since midnight, wrapping whole days away.
    pub fn from_seconds(seconds: u32) -> Self {
        Self(seconds % SECONDS_PER_DAY)
    }

    /// Current time of day. A clock set before the epoch reads as midnight.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() % u64::from(SECONDS_PER_DAY))
            .unwrap_or(0);
        Self::from_seconds(secs as u32)
    }

    /// Seconds since midnight.
    pub fn seconds(self) -> u32 {
        self.0
    }

    /// Time from `self` forward to `later`, assuming less than a day passed.
    ///
    /// A `later` that reads earlier on the clock means midnight was crossed.
    pub fn elapsed_until(self, later: ClockTime) -> Duration {
        let secs = if later.0 >= self.0 {
            later.0 - self.0
        } else {
            SECONDS_PER_DAY - self.0 + later.0
        };
        Duration::from_secs(u64::from(secs))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

/// Monotonic timer that also remembers the wall-clock start for log lines.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    started: Instant,
    started_at: ClockTime,
}

impl Stopwatch {
    /// Start timing now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: ClockTime::now(),
        }
    }

    /// Monotonic time since [`Stopwatch::start`].
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock time of day when the stopwatch started.
    pub fn started_at(&self) -> ClockTime {
        self.started_at
    }

    /// Current time of day and the wall-clock span since the start, wrapping past midnight.
    pub fn wall_clock(&self) -> (ClockTime, Duration) {
        let now = ClockTime::now();
        (now, self.started_at.elapsed_until(now))
    }
}

/// `"<m>m <s>s"`, the format used in batch progress lines.
pub fn format_minutes_seconds(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/elapsed.rs"]
mod tests;
