//! GPS Time Reference
//!
//! Snapshot of the most recent GPS time fix and the dead-reckoning helpers
//! that carry absolute time forward on the local monotonic clock.
//!
//! The snapshot is written by the NMEA ingestion path and read by the
//! scheduler. Fields may be observed mid-update; every helper here tolerates
//! a snapshot whose fix timestamp lies ahead of the clock reading.

use crate::config::HOLDOVER_LIMIT_S;

/// Latest GPS time fix as seen by the scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TimeReference {
    /// Number of fixes ever received (0 = absolute time unknown)
    pub fix_count: u32,
    /// Receiver currently reports a valid solution
    pub solution_active: bool,
    /// Local uptime at the last fix, microseconds
    pub last_fix_uptime_us: u64,
    /// UTC unix time carried by the last fix, seconds
    pub last_fix_unix: u32,
}

impl TimeReference {
    /// True once at least one fix has been received
    #[must_use]
    pub const fn has_fix(&self) -> bool {
        self.fix_count != 0
    }

    /// Whole seconds elapsed since the last fix
    ///
    /// Saturates to zero when the fix timestamp is newer than `now_us`.
    #[must_use]
    pub const fn age_secs(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.last_fix_uptime_us) / 1_000_000
    }

    /// Fix is usable under the holdover override (strictly younger than the bound)
    #[must_use]
    pub const fn within_holdover(&self, now_us: u64) -> bool {
        self.age_secs(now_us) < HOLDOVER_LIMIT_S
    }

    /// Current unix time dead-reckoned from the last fix
    ///
    /// Only the monotonic clock is used for elapsed time.
    #[must_use]
    pub const fn extrapolate_unix(&self, now_us: u64) -> u64 {
        self.last_fix_unix as u64 + self.age_secs(now_us)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TimeReference {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Fix(n={}, active={}, at={}us, unix={})",
            self.fix_count,
            self.solution_active,
            self.last_fix_uptime_us,
            self.last_fix_unix
        );
    }
}

/// Source of time reference snapshots
pub trait TimeSource {
    /// Read the current snapshot
    fn snapshot(&self) -> TimeReference;
}

impl TimeSource for TimeReference {
    fn snapshot(&self) -> TimeReference {
        *self
    }
}

impl TimeSource for core::cell::Cell<TimeReference> {
    fn snapshot(&self) -> TimeReference {
        self.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn snapshot(&self) -> TimeReference {
        (**self).snapshot()
    }
}

/// Local monotonic clock with microsecond resolution
pub trait MonotonicClock {
    /// Microseconds since boot
    fn uptime_us(&self) -> u64;
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn uptime_us(&self) -> u64 {
        (**self).uptime_us()
    }
}

impl MonotonicClock for core::cell::Cell<u64> {
    fn uptime_us(&self) -> u64 {
        self.get()
    }
}

#[cfg(feature = "embedded")]
pub use shared::SharedTimeReference;

#[cfg(feature = "embedded")]
mod shared {
    use core::cell::Cell;

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::blocking_mutex::Mutex;

    use super::{TimeReference, TimeSource};

    /// Time reference shared between the NMEA ingestion task and the scheduler
    pub struct SharedTimeReference {
        inner: Mutex<CriticalSectionRawMutex, Cell<TimeReference>>,
    }

    impl SharedTimeReference {
        /// Create an empty reference (no fix yet)
        #[must_use]
        pub const fn new() -> Self {
            Self {
                inner: Mutex::new(Cell::new(TimeReference {
                    fix_count: 0,
                    solution_active: false,
                    last_fix_uptime_us: 0,
                    last_fix_unix: 0,
                })),
            }
        }

        /// Record a valid fix taken at `uptime_us`
        pub fn publish_fix(&self, uptime_us: u64, unix: u32) {
            self.inner.lock(|cell| {
                let mut r = cell.get();
                r.fix_count = r.fix_count.saturating_add(1);
                r.solution_active = true;
                r.last_fix_uptime_us = uptime_us;
                r.last_fix_unix = unix;
                cell.set(r);
            });
        }

        /// Receiver lost its solution; the last fix is kept for holdover
        pub fn mark_solution_lost(&self) {
            self.inner.lock(|cell| {
                let mut r = cell.get();
                r.solution_active = false;
                cell.set(r);
            });
        }
    }

    impl Default for SharedTimeReference {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TimeSource for SharedTimeReference {
        fn snapshot(&self) -> TimeReference {
            self.inner.lock(Cell::get)
        }
    }
}
