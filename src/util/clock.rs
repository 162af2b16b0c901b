//! Wall-clock helpers and the injectable [`Clock`] used by the scheduler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Source of "now" for cooldown arithmetic.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary but fixed epoch.
    fn now_ms(&self) -> u128;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u128 {
        now_ms()
    }
}

/// Manually advanced clock for deterministic tests and simulations.
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and hand another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock frozen at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(by, Ordering::AcqRel);
    }

    /// Jump to an absolute instant.
    pub fn set_ms(&self, ms: u64) {
        self.millis.store(ms, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u128 {
        u128::from(self.millis.load(Ordering::Acquire))
    }
}
