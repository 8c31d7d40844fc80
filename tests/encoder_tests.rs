//! WSPR Encoder Tests
//!
//! Field packing and full channel-symbol output for type-1 messages.
//! Run with: cargo test --test encoder_tests

use wspr_beacon::config::WSPR_SYMBOL_COUNT;
use wspr_beacon::types::{Callsign, Locator, TxPower};
use wspr_beacon::wspr::{pack_callsign, pack_locator_power, PacketEncoder, WsprEncoder, SYNC_VECTOR};

fn encode(call: &str, locator: &str, dbm: u8) -> [u8; WSPR_SYMBOL_COUNT] {
    *WsprEncoder
        .encode(
            &Callsign::truncating(call),
            &Locator::truncating(locator),
            TxPower::from_dbm(dbm),
        )
        .symbols()
}

// =============================================================================
// Field packing
// =============================================================================

#[test]
fn pack_callsign_reference_values() {
    assert_eq!(pack_callsign("K1ABC"), 259_047_992);
    assert_eq!(pack_callsign("VK2XYZ"), 223_655_686);
    assert_eq!(pack_callsign("W1AW"), 261_410_543);
    assert_eq!(pack_callsign("G4ABC"), 258_319_721);
}

#[test]
fn pack_callsign_fits_28_bits() {
    for call in ["K1ABC", "ZZ9ZZZ", "VK2XYZ", "A1A", "99"] {
        assert!(pack_callsign(call) < 1 << 28, "{call}");
    }
}

#[test]
fn pack_callsign_is_case_insensitive() {
    assert_eq!(pack_callsign("k1abc"), pack_callsign("K1ABC"));
}

#[test]
fn invalid_suffix_characters_pack_as_space() {
    assert_eq!(pack_callsign("K1A#C"), pack_callsign("K1A C"));
    assert_eq!(pack_callsign("K1A C"), 259_048_667);
}

#[test]
fn pack_locator_power_reference_values() {
    assert_eq!(pack_locator_power("FN42", TxPower::from_dbm(37)), 2_896_997);
    assert_eq!(pack_locator_power("AA00", TxPower::MIN), 4_124_224);
    assert_eq!(pack_locator_power("RR99", TxPower::MAX), 23_036);
    assert_eq!(pack_locator_power("IO91", TxPower::default()), 2_091_735);
}

#[test]
fn pack_locator_uses_first_four_characters() {
    let power = TxPower::from_dbm(30);
    assert_eq!(
        pack_locator_power("FN42AB", power),
        pack_locator_power("FN42", power)
    );
}

#[test]
fn pack_locator_fits_22_bits() {
    for locator in ["AA00", "RR99", "JJ55", "ZZ99"] {
        assert!(pack_locator_power(locator, TxPower::MAX) < 1 << 22, "{locator}");
    }
}

// =============================================================================
// Channel symbols
// =============================================================================

#[test]
fn k1abc_fn42_37_matches_reference_vector() {
    const EXPECTED: [u8; WSPR_SYMBOL_COUNT] = [
        3, 3, 0, 0, 2, 0, 0, 0, 1, 0, 2, 0, 1, 3, 1, 2, 2, 2, 1, 0, //
        0, 3, 2, 3, 1, 3, 3, 2, 2, 0, 2, 0, 0, 0, 3, 2, 0, 1, 2, 3, //
        2, 2, 0, 0, 2, 2, 3, 2, 1, 1, 0, 2, 3, 3, 2, 1, 0, 2, 2, 1, //
        3, 2, 1, 2, 2, 2, 0, 3, 3, 0, 3, 0, 3, 0, 1, 2, 1, 0, 2, 1, //
        2, 0, 3, 2, 1, 3, 2, 0, 0, 3, 3, 2, 3, 0, 3, 2, 2, 0, 3, 0, //
        2, 0, 2, 0, 1, 0, 2, 3, 0, 2, 1, 1, 1, 2, 3, 3, 0, 2, 3, 1, //
        2, 1, 2, 2, 2, 1, 3, 3, 2, 0, 0, 0, 0, 1, 0, 3, 2, 0, 1, 3, //
        2, 2, 2, 2, 2, 0, 2, 3, 3, 2, 3, 2, 3, 3, 2, 0, 0, 3, 1, 2, //
        2, 2,
    ];
    assert_eq!(encode("K1ABC", "FN42", 37), EXPECTED);
}

#[test]
fn symbols_carry_sync_in_low_bit() {
    for (call, locator, dbm) in [("K1ABC", "FN42", 37), ("VK2XYZ", "QF56", 10), ("G4ABC", "IO91", 0)] {
        let symbols = encode(call, locator, dbm);
        for (i, (&symbol, &sync)) in symbols.iter().zip(SYNC_VECTOR.iter()).enumerate() {
            assert!(symbol < 4, "{call}: symbol {i} = {symbol}");
            assert_eq!(symbol & 1, sync, "{call}: symbol {i}");
        }
    }
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(encode("W1AW", "FN31", 23), encode("W1AW", "FN31", 23));
}

#[test]
fn different_messages_differ() {
    let base = encode("K1ABC", "FN42", 37);
    assert_ne!(base, encode("K1ABD", "FN42", 37));
    assert_ne!(base, encode("K1ABC", "FN43", 37));
    assert_ne!(base, encode("K1ABC", "FN42", 40));
}

#[test]
fn power_is_snapped_before_encoding() {
    // 38 dBm is not a WSPR level; it goes out as 37
    assert_eq!(encode("K1ABC", "FN42", 38), encode("K1ABC", "FN42", 37));
}
