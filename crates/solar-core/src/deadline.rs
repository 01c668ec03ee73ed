//! Cooperative time budget for aggregation passes
//!
//! The engine shares its thread with the network poller, so every pass is
//! bounded by the caller's next scheduled action. Running out of time is a
//! normal stop, not an error.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;

/// Slack left before the caller's deadline
pub const DEFAULT_GRACE_SECS: i64 = 5;

/// Wall-clock source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Absolute stop time, checked between scan chunks and between slots
#[derive(Clone)]
pub struct Deadline {
    /// `None` never expires
    cutoff: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl Deadline {
    /// Expire `DEFAULT_GRACE_SECS` before `at`
    pub fn new(at: DateTime<Utc>) -> Self {
        Self::with_grace(at, Duration::seconds(DEFAULT_GRACE_SECS))
    }

    pub fn with_grace(at: DateTime<Utc>, grace: Duration) -> Self {
        Self {
            cutoff: Some(at.checked_sub_signed(grace).unwrap_or(at)),
            clock: Arc::new(SystemClock),
        }
    }

    /// A budget that never runs out (one-shot catch-up runs)
    pub fn unbounded() -> Self {
        Self {
            cutoff: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock the deadline is checked against
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn expired(&self) -> bool {
        match self.cutoff {
            Some(cutoff) => self.clock.now() >= cutoff,
            None => false,
        }
    }

    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline")
            .field("cutoff", &self.cutoff)
            .finish()
    }
}
