//! System configuration and protocol constants
//!
//! This module defines compile-time constants for the WSPR beacon and the
//! runtime [`BeaconConfig`] consumed by [`crate::beacon::WsprBeacon::init`].
//! All protocol timing, scheduling bounds and hardware parameters are
//! centralized here.

use core::num::NonZeroU8;

use crate::types::{Band, ClockOutput, Frequency};

/// Number of channel symbols in one WSPR transmission
pub const WSPR_SYMBOL_COUNT: usize = 162;

/// Duration of one WSPR symbol in microseconds (8192 / 12000 s)
pub const WSPR_SYMBOL_PERIOD_US: u32 = 682_667;

/// Spacing between adjacent WSPR tones in milli-hertz (12000 / 8192 Hz)
///
/// Kept as a ratio so the tone offset can be computed without rounding the
/// spacing first.
pub const TONE_SPACING_NUM_MHZ: u64 = 12_000_000;

/// Denominator of [`TONE_SPACING_NUM_MHZ`]
pub const TONE_SPACING_DEN: u64 = 8192;

/// Width of one transmission slot in seconds
pub const SLOT_WIDTH_S: u64 = 120;

/// Seconds per hour
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Number of slots in an hour
pub const SLOTS_PER_HOUR: u64 = SECONDS_PER_HOUR / SLOT_WIDTH_S;

/// Maximum fix age tolerated by the holdover override, in seconds
///
/// The comparison is strict: a fix exactly this old is no longer usable.
pub const HOLDOVER_LIMIT_S: u64 = 2 * SECONDS_PER_HOUR;

/// Oscillator settle time between start and the first symbol, in milliseconds
pub const SETTLE_DELAY_MS: u32 = 100;

/// Lowest carrier frequency the RF stage may be keyed at
pub const HARDWARE_FLOOR_HZ: u32 = 1_100_000;

/// Recommended scheduler poll period in milliseconds (slot width / 4 or finer)
pub const POLL_PERIOD_MS: u64 = 250;

/// Legal WSPR power levels in dBm
pub const WSPR_POWER_LEVELS_DBM: [u8; 19] = [
    0, 3, 7, 10, 13, 17, 20, 23, 27, 30, 33, 37, 40, 43, 47, 50, 53, 57, 60,
];

/// Capacity of the transmit symbol ring (power of two, holds one packet)
pub const SYMBOL_RING_SIZE: usize = 256;

/// `Si5351A` crystal frequency (25 MHz standard)
pub const SI5351_XTAL_FREQ: u32 = 25_000_000;

/// `Si5351A` I2C address
pub const SI5351_I2C_ADDR: u8 = 0x60;

/// I2C bus frequency for `Si5351A`
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Default band
pub const DEFAULT_BAND: Band = Band::M20;

/// Default audio shift within the 200 Hz WSPR passband (1400-1600 Hz)
pub const DEFAULT_SHIFT_HZ: u32 = 1_500;

/// Default slot skip factor (every other slot)
pub const DEFAULT_SLOT_SKIP: u8 = 2;

/// Default holdover override
pub const DEFAULT_HOLDOVER_OVERRIDE: bool = true;

/// Default callsign placeholder
pub const DEFAULT_CALLSIGN: &str = "N0CALL";

/// Default grid locator placeholder
pub const DEFAULT_LOCATOR: &str = "AA00";

/// Default reported power in dBm
pub const DEFAULT_POWER_DBM: u8 = 23;

/// Scheduling policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Transmit only in slots whose index is a multiple of this
    pub slot_skip: NonZeroU8,
    /// Allow transmission on a stale fix younger than [`HOLDOVER_LIMIT_S`]
    pub holdover_override: bool,
}

impl ScheduleConfig {
    /// Create a schedule
    #[must_use]
    pub const fn new(slot_skip: NonZeroU8, holdover_override: bool) -> Self {
        Self {
            slot_skip,
            holdover_override,
        }
    }

    /// Transmit in every slot
    #[must_use]
    pub const fn every_slot(holdover_override: bool) -> Self {
        Self::new(NonZeroU8::MIN, holdover_override)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_skip: NonZeroU8::new(DEFAULT_SLOT_SKIP).unwrap_or(NonZeroU8::MIN),
            holdover_override: DEFAULT_HOLDOVER_OVERRIDE,
        }
    }
}

/// Frequency plan of one beacon
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyPlan {
    /// USB dial frequency
    pub dial: Frequency,
    /// Audio shift added to the dial frequency
    pub shift_hz: u32,
    /// RF output channel
    pub output: ClockOutput,
}

impl FrequencyPlan {
    /// Plan for the WSPR sub-band of `band`
    #[must_use]
    pub const fn for_band(band: Band, shift_hz: u32) -> Self {
        Self {
            dial: band.wspr_dial(),
            shift_hz,
            output: ClockOutput::Clk0,
        }
    }

    /// Carrier actually keyed: dial + shift
    #[must_use]
    pub const fn effective(&self) -> Frequency {
        self.dial.offset(self.shift_hz)
    }
}

impl Default for FrequencyPlan {
    fn default() -> Self {
        Self::for_band(DEFAULT_BAND, DEFAULT_SHIFT_HZ)
    }
}

/// Runtime beacon configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeaconConfig<'a> {
    /// Station callsign
    pub callsign: &'a str,
    /// Maidenhead locator
    pub locator: &'a str,
    /// Reported power in dBm
    pub power_dbm: u8,
    /// Dial, shift and output channel
    pub plan: FrequencyPlan,
    /// Scheduling policy
    pub schedule: ScheduleConfig,
}

impl Default for BeaconConfig<'_> {
    fn default() -> Self {
        Self {
            callsign: DEFAULT_CALLSIGN,
            locator: DEFAULT_LOCATOR,
            power_dbm: DEFAULT_POWER_DBM,
            plan: FrequencyPlan::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}
