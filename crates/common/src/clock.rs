//! Loop timing: the session epoch, the per-iteration cadence budget, and a
//! throttle for periodic status output.

use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

/// Convert a millisecond setting into a `Duration`.
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Monotonic time since a tracking session started, plus the wall-clock
/// start for reports.
#[derive(Debug, Clone)]
pub struct SessionClock {
    started: Instant,
    started_at: DateTime<Utc>,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Wall-clock session start, RFC 3339 with millisecond precision.
    pub fn started_at(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Counts loop iterations that took longer than the cadence allows.
#[derive(Debug, Clone)]
pub struct CadenceBudget {
    cadence: Duration,
    overruns: u64,
    worst: Duration,
}

impl CadenceBudget {
    pub fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            overruns: 0,
            worst: Duration::ZERO,
        }
    }

    /// Record one iteration. Returns `true` if it overran the cadence.
    pub fn record(&mut self, spent: Duration) -> bool {
        self.worst = self.worst.max(spent);
        let overran = spent > self.cadence;
        if overran {
            self.overruns += 1;
        }
        overran
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Longest iteration seen so far.
    pub fn worst(&self) -> Duration {
        self.worst
    }
}

/// Lets periodic work through at most once per period.
#[derive(Debug)]
pub struct Throttle {
    period: Duration,
    last: Option<Duration>,
}

impl Throttle {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// Whether the work should run at `now` (time since some fixed epoch).
    /// The first call always passes.
    pub fn ready(&mut self, now: Duration) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now >= last + self.period,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}
