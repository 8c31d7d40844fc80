//! WSPR Packet Encoding
//!
//! Turns a callsign, locator and power level into the 162 channel symbols
//! of a type-1 WSPR message.
//!
//! # Pipeline
//!
//! ```text
//! callsign ──► 28 bits ─┐
//!                       ├─► 50 bits ─► K=32 r=1/2 conv ─► 162 bits
//! locator+dBm ► 22 bits ┘                                    │
//!                                        bit-reversal interleave
//!                                                            │
//!                          symbol[i] = sync[i] + 2 * data[i] ◄┘
//! ```
//!
//! Characters outside the WSPR alphabet do not fail the encode; they are
//! mapped to the nearest representable value so the output is always a
//! well-formed symbol sequence.

use crate::config::WSPR_SYMBOL_COUNT;
use crate::types::{Callsign, Locator, TxPower};

/// Convolutional encoder polynomial G1
const POLY_G1: u32 = 0xF2D0_5351;

/// Convolutional encoder polynomial G2
const POLY_G2: u32 = 0xE461_3C47;

/// Source bits fed through the encoder: 50 message bits + 31 flush bits
const SOURCE_BITS: usize = 81;

/// Sync vector, one bit per channel symbol
pub const SYNC_VECTOR: [u8; WSPR_SYMBOL_COUNT] = [
    1, 1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 0, //
    0, 1, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 1, //
    0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 0, 1, //
    1, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, //
    0, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1, 0, 1, 0, 0, 0, 1, 0, //
    0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1, 1, 0, 1, 1, 0, 0, 1, 1, //
    0, 1, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 1, 1, //
    0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 0, 1, 1, 0, 0, 0, 1, 1, 0, //
    0, 0,
];

/// One encoded WSPR transmission
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPacket([u8; WSPR_SYMBOL_COUNT]);

impl EncodedPacket {
    /// All-zero packet
    #[must_use]
    pub const fn empty() -> Self {
        Self([0; WSPR_SYMBOL_COUNT])
    }

    /// Channel symbols, each 0..=3
    #[must_use]
    pub const fn symbols(&self) -> &[u8; WSPR_SYMBOL_COUNT] {
        &self.0
    }
}

impl Default for EncodedPacket {
    fn default() -> Self {
        Self::empty()
    }
}

impl core::fmt::Debug for EncodedPacket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EncodedPacket({:?}..)", &self.0[..8])
    }
}

/// Maps identity fields to a channel symbol sequence
pub trait PacketEncoder {
    /// Encode one transmission; must be deterministic
    fn encode(&self, callsign: &Callsign, locator: &Locator, power: TxPower) -> EncodedPacket;
}

/// Type-1 WSPR message encoder
#[derive(Clone, Copy, Debug, Default)]
pub struct WsprEncoder;

impl PacketEncoder for WsprEncoder {
    fn encode(&self, callsign: &Callsign, locator: &Locator, power: TxPower) -> EncodedPacket {
        let n = pack_callsign(callsign.as_str());
        let m = pack_locator_power(locator.as_str(), power);
        let coded = convolve(&message_bytes(n, m));
        let data = interleave(&coded);

        let mut symbols = [0u8; WSPR_SYMBOL_COUNT];
        for (i, symbol) in symbols.iter_mut().enumerate() {
            *symbol = SYNC_VECTOR[i] + 2 * data[i];
        }
        EncodedPacket(symbols)
    }
}

/// Character code over the 37-symbol alphabet (digits, letters, space)
fn alnum_code(c: u8) -> u32 {
    match c {
        b'0'..=b'9' => u32::from(c - b'0'),
        b'A'..=b'Z' => u32::from(c - b'A') + 10,
        _ => 36,
    }
}

/// Letter-or-space code used for the callsign suffix (A-Z = 0-25, space = 26)
fn suffix_code(c: u8) -> u32 {
    match c {
        b'A'..=b'Z' => u32::from(c - b'A'),
        _ => 26,
    }
}

/// Align a callsign so its area digit sits at index 2, padded to 6 bytes
fn align_callsign(call: &str) -> [u8; 6] {
    let bytes = call.as_bytes();
    let shift = usize::from(
        bytes.get(2).map_or(true, |b| !b.is_ascii_digit())
            && bytes.get(1).is_some_and(u8::is_ascii_digit),
    );

    let mut aligned = [b' '; 6];
    for (dst, &src) in aligned[shift..].iter_mut().zip(bytes) {
        *dst = src.to_ascii_uppercase();
    }
    aligned
}

/// Pack a callsign into the 28-bit WSPR field
#[must_use]
pub fn pack_callsign(call: &str) -> u32 {
    let c = align_callsign(call);

    let mut n = alnum_code(c[0]);
    n = n * 36 + alnum_code(c[1]).min(35);
    n = n * 10 + if c[2].is_ascii_digit() { u32::from(c[2] - b'0') } else { 0 };
    n = n * 27 + suffix_code(c[3]);
    n = n * 27 + suffix_code(c[4]);
    n = n * 27 + suffix_code(c[5]);
    n
}

/// Pack a 4-character locator and power into the 22-bit WSPR field
///
/// Only the first four locator characters are used.
#[must_use]
pub fn pack_locator_power(locator: &str, power: TxPower) -> u32 {
    let l = locator.as_bytes();
    let field = |i: usize| {
        l.get(i)
            .map_or(0, |&b| u32::from(b.to_ascii_uppercase().saturating_sub(b'A')).min(17))
    };
    let square = |i: usize| l.get(i).map_or(0, |&b| u32::from(b.saturating_sub(b'0')).min(9));

    let m = (179 - 10 * field(0) - square(2)) * 180 + 10 * field(1) + square(3);
    m * 128 + u32::from(power.as_dbm()) + 64
}

/// Lay out the 50 message bits MSB-first in 11 bytes (tail zeroed)
fn message_bytes(n: u32, m: u32) -> [u8; 11] {
    let mut c = [0u8; 11];
    c[0] = (n >> 20) as u8;
    c[1] = (n >> 12) as u8;
    c[2] = (n >> 4) as u8;
    c[3] = (((n & 0x0F) << 4) | ((m >> 18) & 0x0F)) as u8;
    c[4] = (m >> 10) as u8;
    c[5] = (m >> 2) as u8;
    c[6] = ((m & 0x03) << 6) as u8;
    c
}

/// Rate-1/2, K=32 convolutional encode of the first 81 source bits
fn convolve(bytes: &[u8; 11]) -> [u8; WSPR_SYMBOL_COUNT] {
    let mut out = [0u8; WSPR_SYMBOL_COUNT];
    let mut reg: u32 = 0;

    for i in 0..SOURCE_BITS {
        let bit = (bytes[i / 8] >> (7 - i % 8)) & 1;
        reg = (reg << 1) | u32::from(bit);
        out[2 * i] = ((reg & POLY_G1).count_ones() & 1) as u8;
        out[2 * i + 1] = ((reg & POLY_G2).count_ones() & 1) as u8;
    }
    out
}

/// Bit-reversal interleave over 256 positions, keeping those below 162
fn interleave(bits: &[u8; WSPR_SYMBOL_COUNT]) -> [u8; WSPR_SYMBOL_COUNT] {
    let mut out = [0u8; WSPR_SYMBOL_COUNT];
    let mut p = 0;

    for i in 0..=255u8 {
        let j = usize::from(i.reverse_bits());
        if j < WSPR_SYMBOL_COUNT {
            out[j] = bits[p];
            p += 1;
            if p == WSPR_SYMBOL_COUNT {
                break;
            }
        }
    }
    out
}
