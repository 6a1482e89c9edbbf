use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds or milliseconds since the Unix epoch, depending on the deployment's
/// [`TimestampUnit`]. Unsigned, so a data point can never carry a negative time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Seconds,
    Millis,
}

/// Time source for data points.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock. A system clock set before 1970 reads as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    pub unit: TimestampUnit,
}

impl SystemClock {
    pub fn new(unit: TimestampUnit) -> Self {
        Self { unit }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        match self.unit {
            TimestampUnit::Seconds => Timestamp(elapsed.as_secs()),
            TimestampUnit::Millis => Timestamp(elapsed.as_millis() as u64),
        }
    }
}

/// Deterministic clock for tests and replays. Reads do not advance it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self { now: AtomicU64::new(start) }
    }

    pub fn set(&self, value: u64) {
        self.now.store(value, Ordering::SeqCst);
    }

    pub fn advance(&self, by: u64) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}
