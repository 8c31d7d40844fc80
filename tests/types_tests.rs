//! Types Module Tests
//!
//! Tests for domain types (Frequency, BoundedStr, TxPower, Band, ClockOutput)
//! Run with: cargo test --test types_tests

use wspr_beacon::config::WSPR_POWER_LEVELS_DBM;
use wspr_beacon::types::{Band, BoundedStr, Callsign, ClockOutput, FieldError, Frequency, Locator, TxPower};

// =============================================================================
// Frequency Tests
// =============================================================================

#[test]
fn test_frequency_units() {
    let freq = Frequency::from_khz(7_040);
    assert_eq!(freq.as_hz(), 7_040_000);
    assert_eq!(freq.as_millihertz(), 7_040_000_000);
}

#[test]
fn test_frequency_offset() {
    let dial = Frequency::from_hz(14_095_600);
    assert_eq!(dial.offset(1_500).as_hz(), 14_097_100);
    assert_eq!(dial.offset(0), dial);
}

#[test]
fn test_frequency_offset_saturates() {
    assert_eq!(Frequency::from_hz(u32::MAX - 1).offset(10).as_hz(), u32::MAX);
}

#[test]
fn test_frequency_keyable_floor_is_exclusive() {
    assert!(!Frequency::from_hz(0).is_keyable());
    assert!(!Frequency::from_hz(1_099_999).is_keyable());
    assert!(!Frequency::from_hz(1_100_000).is_keyable());
    assert!(Frequency::from_hz(1_100_001).is_keyable());
}

#[test]
fn test_frequency_display() {
    assert_eq!(Frequency::from_hz(7_040_100).to_string(), "7040100 Hz");
}

// =============================================================================
// BoundedStr Tests
// =============================================================================

#[test]
fn test_truncating_keeps_prefix() {
    let call = Callsign::truncating("ABCDEFGHIJKLMNOP");
    assert_eq!(call.as_str(), "ABCDEFGHIJKL");
    assert_eq!(call.len(), Callsign::CAPACITY);
}

#[test]
fn test_truncating_normalises_case_and_whitespace() {
    assert_eq!(Locator::truncating("  fn42  ").as_str(), "FN42");
}

#[test]
fn test_truncating_accepts_empty() {
    let empty = Callsign::truncating("");
    assert!(empty.is_empty());
    assert_eq!(empty, Callsign::default());
}

#[test]
fn test_strict_rejects_empty() {
    assert_eq!(Locator::new(""), Err(FieldError::Empty));
    assert_eq!(Locator::new("   "), Err(FieldError::Empty));
}

#[test]
fn test_strict_rejects_too_long() {
    assert_eq!(
        Locator::new("FN42ABC"),
        Err(FieldError::TooLong {
            capacity: 6,
            len: 7
        })
    );
}

#[test]
fn test_strict_accepts_exact_capacity() {
    let loc = Locator::new("fn42ab").unwrap();
    assert_eq!(loc.as_str(), "FN42AB");
    assert_eq!(BoundedStr::<3>::new("abc").unwrap().as_str(), "ABC");
}

#[test]
fn test_grid_accepts_square_and_subsquare() {
    assert_eq!(Locator::grid("fn42").unwrap().as_str(), "FN42");
    assert_eq!(Locator::grid(" io91wm ").unwrap().as_str(), "IO91WM");
    assert!(Locator::grid("AA00").is_ok());
    assert!(Locator::grid("RR99XX").is_ok());
}

#[test]
fn test_grid_rejects_partial_lengths() {
    for locator in ["F", "FN4", "FN42A"] {
        assert_eq!(Locator::grid(locator), Err(FieldError::Malformed), "{locator}");
    }
}

#[test]
fn test_grid_rejects_out_of_range_characters() {
    // Fields stop at R, subsquares at X
    for locator in ["ZZ99", "SA00", "12AB", "FNA2", "FN4B", "FN42YA", "FN4200"] {
        assert_eq!(Locator::grid(locator), Err(FieldError::Malformed), "{locator}");
    }
}

#[test]
fn test_grid_keeps_length_errors() {
    assert_eq!(Locator::grid(""), Err(FieldError::Empty));
    assert_eq!(
        Locator::grid("FN42ABC"),
        Err(FieldError::TooLong {
            capacity: 6,
            len: 7
        })
    );
}

#[test]
fn test_field_error_display() {
    let err = FieldError::TooLong {
        capacity: 12,
        len: 20,
    };
    assert_eq!(err.to_string(), "field holds 12 bytes, got 20");
    assert_eq!(FieldError::Empty.to_string(), "field is empty");
    assert_eq!(FieldError::Malformed.to_string(), "field is malformed");
}

// =============================================================================
// TxPower Tests
// =============================================================================

#[test]
fn test_power_legal_levels_round_trip() {
    for &dbm in &WSPR_POWER_LEVELS_DBM {
        assert_eq!(TxPower::from_dbm(dbm).as_dbm(), dbm);
    }
}

#[test]
fn test_power_snaps_down() {
    assert_eq!(TxPower::from_dbm(1).as_dbm(), 0);
    assert_eq!(TxPower::from_dbm(25).as_dbm(), 23);
    assert_eq!(TxPower::from_dbm(39).as_dbm(), 37);
}

#[test]
fn test_power_clamps_high() {
    assert_eq!(TxPower::from_dbm(61), TxPower::MAX);
    assert_eq!(TxPower::from_dbm(u8::MAX), TxPower::MAX);
}

#[test]
fn test_power_default() {
    assert_eq!(TxPower::default().as_dbm(), 23);
}

// =============================================================================
// Band / ClockOutput Tests
// =============================================================================

#[test]
fn test_band_dials_are_ascending_and_keyable() {
    let dials: Vec<u32> = Band::ALL.iter().map(|b| b.wspr_dial().as_hz()).collect();
    assert!(dials.windows(2).all(|w| w[0] < w[1]));
    assert!(Band::ALL.iter().all(|b| b.wspr_dial().is_keyable()));
}

#[test]
fn test_band_20m_dial() {
    assert_eq!(Band::M20.wspr_dial(), Frequency::from_hz(14_095_600));
}

#[test]
fn test_clock_output_index() {
    assert_eq!(ClockOutput::Clk0.index(), 0);
    assert_eq!(ClockOutput::Clk1.index(), 1);
    assert_eq!(ClockOutput::Clk2.index(), 2);
    assert_eq!(ClockOutput::default(), ClockOutput::Clk0);
}
