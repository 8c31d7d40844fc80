//! Transmission Scheduler
//!
//! Decides, on every poll, whether "now" falls inside a qualifying WSPR slot
//! and edge-triggers exactly one transmission per qualifying slot.
//!
//! # Slot arithmetic
//!
//! Absolute time is dead-reckoned from the last GPS fix on the monotonic
//! clock. Each hour is split into thirty 2-minute slots:
//!
//! ```text
//! slot = (unix mod 3600) / 120        0 ..= 29
//! qualifying  <=>  slot mod skip == 0
//! ```
//!
//! A poll is eligible when the receiver has an active solution, or when the
//! holdover override is set and the last fix is strictly younger than two
//! hours.
//!
//! This module is the functional core: it only computes decisions and the
//! latch transition. Keying the hardware is done by the caller on the
//! returned [`TxAction`].

use crate::config::{ScheduleConfig, SECONDS_PER_HOUR, SLOT_WIDTH_S};
use crate::gps::TimeReference;

/// Slot index (0-29) of a unix time
#[must_use]
pub const fn slot_index(unix: u64) -> u8 {
    ((unix % SECONDS_PER_HOUR) / SLOT_WIDTH_S) as u8
}

/// Why absolute time could not be used
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No fix has ever been received
    NoFix,
    /// No active solution, and the last fix is too old (or override is off)
    HoldoverExpired,
}

#[cfg(feature = "embedded")]
impl defmt::Format for UnavailableReason {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NoFix => defmt::write!(f, "no fix"),
            Self::HoldoverExpired => defmt::write!(f, "holdover expired"),
        }
    }
}

/// Result of evaluating one poll against the slot grid
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotDecision {
    /// Dead-reckoned unix time, seconds
    pub unix_now: u64,
    /// Age of the fix, whole seconds
    pub age_secs: u64,
    /// Slot index within the hour
    pub slot: u8,
    /// Slot is selected by the skip factor
    pub qualifying: bool,
}

/// Action the caller must perform after a poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxAction {
    /// Rising edge: encode, start the oscillator, settle, hand off symbols
    Key,
    /// Inside a slot that already transmitted
    Hold,
    /// Outside a qualifying slot: stop the oscillator
    Unkey {
        /// The latch was set before this poll
        was_armed: bool,
    },
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxAction {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Key => defmt::write!(f, "Key"),
            Self::Hold => defmt::write!(f, "Hold"),
            Self::Unkey { was_armed } => defmt::write!(f, "Unkey(armed={})", was_armed),
        }
    }
}

/// Edge-trigger latch, owned by one scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SchedulerState {
    armed: bool,
}

impl SchedulerState {
    /// True when the current qualifying slot has already transmitted
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Slot scheduler
#[derive(Clone, Copy, Debug, Default)]
pub struct TxScheduler {
    config: ScheduleConfig,
    state: SchedulerState,
}

impl TxScheduler {
    /// Create a scheduler with a cleared latch
    #[must_use]
    pub const fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            state: SchedulerState { armed: false },
        }
    }

    /// Scheduling policy
    #[must_use]
    pub const fn config(&self) -> ScheduleConfig {
        self.config
    }

    /// Replace the scheduling policy; the latch is kept
    pub fn set_config(&mut self, config: ScheduleConfig) {
        self.config = config;
    }

    /// Latch state
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Evaluate the slot grid without touching the latch
    ///
    /// # Errors
    ///
    /// Returns the reason absolute time is unavailable.
    pub fn evaluate(
        &self,
        reference: &TimeReference,
        now_us: u64,
    ) -> Result<SlotDecision, UnavailableReason> {
        if !reference.has_fix() {
            return Err(UnavailableReason::NoFix);
        }

        let age_secs = reference.age_secs(now_us);
        let eligible = reference.solution_active
            || (self.config.holdover_override && reference.within_holdover(now_us));
        if !eligible {
            return Err(UnavailableReason::HoldoverExpired);
        }

        let unix_now = reference.extrapolate_unix(now_us);
        let slot = slot_index(unix_now);
        let qualifying = slot % self.config.slot_skip.get() == 0;

        Ok(SlotDecision {
            unix_now,
            age_secs,
            slot,
            qualifying,
        })
    }

    /// Evaluate and advance the latch
    ///
    /// The latch is untouched when time is unavailable.
    ///
    /// # Errors
    ///
    /// Returns the reason absolute time is unavailable.
    pub fn update(
        &mut self,
        reference: &TimeReference,
        now_us: u64,
    ) -> Result<(SlotDecision, TxAction), UnavailableReason> {
        let decision = self.evaluate(reference, now_us)?;

        let action = if decision.qualifying {
            if self.state.armed {
                TxAction::Hold
            } else {
                self.state.armed = true;
                TxAction::Key
            }
        } else {
            let was_armed = self.state.armed;
            self.state.armed = false;
            TxAction::Unkey { was_armed }
        };

        Ok((decision, action))
    }
}
