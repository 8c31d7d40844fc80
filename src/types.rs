//! Shared types used across the beacon firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at construction time and provide type safety throughout the codebase.

use core::fmt;
use heapless::String;

use crate::config::{HARDWARE_FLOOR_HZ, WSPR_POWER_LEVELS_DBM};

/// Carrier frequency in Hertz
///
/// Any value is representable; [`Frequency::is_keyable`] tells whether the
/// RF hardware may be keyed at it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Frequency(u32);

impl Frequency {
    /// Create a frequency from Hz
    #[must_use]
    pub const fn from_hz(hz: u32) -> Self {
        Self(hz)
    }

    /// Create a frequency from kHz
    #[must_use]
    pub const fn from_khz(khz: u32) -> Self {
        Self(khz * 1000)
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Get the frequency in milli-hertz
    #[must_use]
    pub const fn as_millihertz(self) -> u64 {
        self.0 as u64 * 1000
    }

    /// Shift upward by `hz`, saturating at the `u32` range
    #[must_use]
    pub const fn offset(self, hz: u32) -> Self {
        Self(self.0.saturating_add(hz))
    }

    /// True when the frequency is strictly above the hardware floor
    #[must_use]
    pub const fn is_keyable(self) -> bool {
        self.0 > HARDWARE_FLOOR_HZ
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.0);
    }
}

/// Validation failure for a bounded identity field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// Input was empty
    Empty,
    /// Input was longer than the field capacity
    TooLong {
        /// Field capacity in bytes
        capacity: usize,
        /// Length of the rejected input in bytes
        len: usize,
    },
    /// Input fits but is not a well-formed value for the field
    Malformed,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "field is empty"),
            Self::TooLong { capacity, len } => {
                write!(f, "field holds {capacity} bytes, got {len}")
            }
            Self::Malformed => write!(f, "field is malformed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FieldError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Empty => defmt::write!(f, "Empty"),
            Self::TooLong { capacity, len } => {
                defmt::write!(f, "TooLong({}>{})", len, capacity);
            }
            Self::Malformed => defmt::write!(f, "Malformed"),
        }
    }
}

/// ASCII string with a fixed upper bound on its length
///
/// Two construction policies are offered:
/// - [`BoundedStr::truncating`] silently drops whatever does not fit. This is
///   the legacy behaviour and loses data without telling anyone.
/// - [`BoundedStr::new`] rejects oversized or empty input.
///
/// Input is upper-cased and surrounding whitespace trimmed in both cases.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BoundedStr<const N: usize>(String<N>);

impl<const N: usize> BoundedStr<N> {
    /// Maximum length in bytes
    pub const CAPACITY: usize = N;

    /// Build from `s`, keeping at most `N` characters
    #[must_use]
    pub fn truncating(s: &str) -> Self {
        let mut out = String::new();
        for ch in s.trim().chars().map(|c| c.to_ascii_uppercase()) {
            if out.push(ch).is_err() {
                break;
            }
        }
        Self(out)
    }

    /// Build from `s`, rejecting input that does not fit
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Empty`] for blank input and
    /// [`FieldError::TooLong`] when `s` exceeds `N` bytes.
    pub fn new(s: &str) -> Result<Self, FieldError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(FieldError::Empty);
        }
        if trimmed.len() > N {
            return Err(FieldError::TooLong {
                capacity: N,
                len: trimmed.len(),
            });
        }
        Ok(Self::truncating(trimmed))
    }

    /// Borrow as `&str`
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> fmt::Debug for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_str())
    }
}

impl<const N: usize> fmt::Display for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(feature = "embedded")]
impl<const N: usize> defmt::Format for BoundedStr<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.0.as_str());
    }
}

/// Amateur callsign, 12 characters max
pub type Callsign = BoundedStr<12>;

/// Maidenhead grid locator, 4 or 6 characters
pub type Locator = BoundedStr<6>;

impl BoundedStr<6> {
    /// Build a Maidenhead locator, rejecting anything that is not a grid square
    ///
    /// Accepts a field pair `A`-`R`, a square pair `0`-`9` and an optional
    /// subsquare pair `A`-`X`, in either case.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Empty`] or [`FieldError::TooLong`] like
    /// [`BoundedStr::new`], and [`FieldError::Malformed`] for a length other
    /// than 4 or 6 or a character outside its range.
    pub fn grid(s: &str) -> Result<Self, FieldError> {
        let locator = Self::new(s)?;
        let b = locator.as_str().as_bytes();
        if b.len() != 4 && b.len() != 6 {
            return Err(FieldError::Malformed);
        }
        let well_formed = b.iter().enumerate().all(|(i, &c)| match i {
            0 | 1 => (b'A'..=b'R').contains(&c),
            2 | 3 => c.is_ascii_digit(),
            _ => (b'A'..=b'X').contains(&c),
        });
        if well_formed {
            Ok(locator)
        } else {
            Err(FieldError::Malformed)
        }
    }
}

/// Transmit power as reported in the WSPR message
///
/// WSPR only carries a fixed set of dBm values; anything else is snapped
/// down to the nearest legal level and clamped to 0..=60 dBm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxPower(u8);

impl TxPower {
    /// Lowest encodable level (1 mW)
    pub const MIN: Self = Self(0);

    /// Highest encodable level (1 kW)
    pub const MAX: Self = Self(60);

    /// Snap `dbm` down to the nearest legal WSPR power level
    #[must_use]
    pub fn from_dbm(dbm: u8) -> Self {
        let snapped = WSPR_POWER_LEVELS_DBM
            .iter()
            .rev()
            .copied()
            .find(|&level| level <= dbm)
            .unwrap_or(0);
        Self(snapped)
    }

    /// Get the level in dBm
    #[must_use]
    pub const fn as_dbm(self) -> u8 {
        self.0
    }
}

impl Default for TxPower {
    fn default() -> Self {
        Self(23) // 200 mW
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxPower {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} dBm", self.0);
    }
}

/// RF output channel identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClockOutput {
    /// CLK0 output
    #[default]
    Clk0,
    /// CLK1 output
    Clk1,
    /// CLK2 output
    Clk2,
}

impl ClockOutput {
    /// Index of the output (0-2)
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Clk0 => 0,
            Self::Clk1 => 1,
            Self::Clk2 => 2,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockOutput {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Clk0 => defmt::write!(f, "CLK0"),
            Self::Clk1 => defmt::write!(f, "CLK1"),
            Self::Clk2 => defmt::write!(f, "CLK2"),
        }
    }
}

/// Amateur band with a WSPR allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// 160 meters
    M160,
    /// 80 meters
    M80,
    /// 40 meters
    M40,
    /// 30 meters
    M30,
    /// 20 meters
    M20,
    /// 17 meters
    M17,
    /// 15 meters
    M15,
    /// 12 meters
    M12,
    /// 10 meters
    M10,
}

impl Band {
    /// All bands, lowest first
    pub const ALL: [Self; 9] = [
        Self::M160,
        Self::M80,
        Self::M40,
        Self::M30,
        Self::M20,
        Self::M17,
        Self::M15,
        Self::M12,
        Self::M10,
    ];

    /// USB dial frequency of the WSPR sub-band
    #[must_use]
    pub const fn wspr_dial(self) -> Frequency {
        Frequency::from_hz(match self {
            Self::M160 => 1_836_600,
            Self::M80 => 3_568_600,
            Self::M40 => 7_038_600,
            Self::M30 => 10_138_700,
            Self::M20 => 14_095_600,
            Self::M17 => 18_104_600,
            Self::M15 => 21_094_600,
            Self::M12 => 24_924_600,
            Self::M10 => 28_124_600,
        })
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Band {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::M160 => defmt::write!(f, "160m"),
            Self::M80 => defmt::write!(f, "80m"),
            Self::M40 => defmt::write!(f, "40m"),
            Self::M30 => defmt::write!(f, "30m"),
            Self::M20 => defmt::write!(f, "20m"),
            Self::M17 => defmt::write!(f, "17m"),
            Self::M15 => defmt::write!(f, "15m"),
            Self::M12 => defmt::write!(f, "12m"),
            Self::M10 => defmt::write!(f, "10m"),
        }
    }
}
