use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock instant, in milliseconds since the UNIX epoch.
///
/// Serialized as a bare integer. Two entities created in the same
/// millisecond share a timestamp; ordering ties are resolved by storage
/// order, never by id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// The zero timestamp (UNIX epoch).
    pub const fn zero() -> Self {
        Self(0)
    }

    fn wall_clock() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of creation timestamps for new entities.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock that never runs backwards within a process.
///
/// If the system clock steps back (NTP adjustment), the last issued value is
/// repeated until the wall clock catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_ms: Mutex<u64>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = Timestamp::wall_clock().as_millis();
        let mut last = self.last_ms.lock().expect("clock mutex poisoned");
        *last = wall.max(*last);
        Timestamp(*last)
    }
}

/// Manually driven clock for tests and deterministic replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            ms: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_reasonable() {
        let ts = SystemClock::new().now();
        // After 2020-01-01.
        assert!(ts.as_millis() > 1_577_836_800_000);
    }

    #[test]
    fn system_clock_never_goes_backwards() {
        let clock = SystemClock::new();
        let mut prev = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= prev, "{prev:?} > {next:?}");
            prev = next;
        }
    }

    #[test]
    fn system_clock_holds_when_wall_clock_is_behind() {
        let clock = SystemClock::new();
        *clock.last_ms.lock().unwrap() = u64::MAX;
        assert_eq!(clock.now(), Timestamp::from_millis(u64::MAX));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), Timestamp::from_millis(1_000));
        clock.advance(5);
        assert_eq!(clock.now(), Timestamp::from_millis(1_005));
        clock.set(7);
        assert_eq!(clock.now().as_millis(), 7);
    }

    #[test]
    fn serializes_as_integer() {
        let ts = Timestamp::from_millis(1_718_000_000_123);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1718000000123");
    }

    #[test]
    fn ordering_follows_millis() {
        assert!(Timestamp::zero() < Timestamp::from_millis(1));
        assert_eq!(format!("{}", Timestamp::from_millis(42)), "42");
    }
}
