//! Timer Abstractions
//!
//! Uptime for the scheduler and the drift-free symbol clock.

use embassy_time::{Duration, Instant, Ticker};

use crate::gps::MonotonicClock;

/// Monotonic uptime from the embassy time driver
#[derive(Clone, Copy, Debug, Default)]
pub struct UptimeClock;

impl MonotonicClock for UptimeClock {
    fn uptime_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}

impl defmt::Format for UptimeClock {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "UptimeClock({}us)", self.uptime_us());
    }
}

/// Periodic tick at the WSPR symbol rate
///
/// Built on [`Ticker`], so a late wake-up shortens the next wait instead of
/// stretching the transmission.
pub struct SymbolClock {
    period_us: u32,
    ticker: Ticker,
}

impl SymbolClock {
    /// Create a symbol clock from period in microseconds
    #[must_use]
    pub fn from_period_us(period_us: u32) -> Self {
        Self {
            period_us,
            ticker: Ticker::every(Duration::from_micros(u64::from(period_us))),
        }
    }

    /// Symbol period in microseconds
    #[must_use]
    pub const fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Wait for the next symbol boundary
    pub async fn tick(&mut self) {
        self.ticker.next().await;
    }

    /// Realign the grid to now (call when a new packet starts)
    pub fn reset(&mut self) {
        self.ticker.reset();
    }
}

impl defmt::Format for SymbolClock {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "SymbolClock({}us)", self.period_us);
    }
}
