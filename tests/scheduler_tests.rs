//! Tests for the slot scheduler
//!
//! Slot arithmetic, eligibility, holdover bounds and the edge-trigger latch.
//! Run with: cargo test --test scheduler_tests

use core::num::NonZeroU8;

use wspr_beacon::config::{ScheduleConfig, HOLDOVER_LIMIT_S};
use wspr_beacon::gps::TimeReference;
use wspr_beacon::radio::scheduler::{slot_index, TxAction, TxScheduler, UnavailableReason};

const SEC: u64 = 1_000_000;

/// 2024-01-01 00:00:00 UTC, top of the hour
const TOP_OF_HOUR: u32 = 1_704_067_200;

fn fix(unix: u32, uptime_us: u64, active: bool) -> TimeReference {
    TimeReference {
        fix_count: 1,
        solution_active: active,
        last_fix_uptime_us: uptime_us,
        last_fix_unix: unix,
    }
}

fn schedule(skip: u8, holdover_override: bool) -> ScheduleConfig {
    ScheduleConfig::new(NonZeroU8::new(skip).unwrap(), holdover_override)
}

// ============================================================================
// Slot arithmetic
// ============================================================================

#[test]
fn slot_index_stays_in_range() {
    for t in (0..20_000u64).chain([u64::from(u32::MAX), u64::MAX]) {
        let slot = slot_index(t);
        assert!(slot < 30, "t={t} slot={slot}");
        assert_eq!(u64::from(slot), (t % 3600) / 120);
    }
}

#[test]
fn slot_index_boundaries() {
    assert_eq!(slot_index(0), 0);
    assert_eq!(slot_index(119), 0);
    assert_eq!(slot_index(120), 1);
    assert_eq!(slot_index(3599), 29);
    assert_eq!(slot_index(3600), 0);
    assert_eq!(slot_index(u64::from(TOP_OF_HOUR) + 240), 2);
}

// ============================================================================
// Eligibility
// ============================================================================

#[test]
fn no_fix_is_unavailable() {
    // Scenario A
    let mut sched = TxScheduler::new(schedule(1, true));
    let reference = TimeReference::default();

    for now in [0, SEC, 500 * SEC] {
        assert_eq!(
            sched.update(&reference, now),
            Err(UnavailableReason::NoFix)
        );
    }
    assert!(!sched.state().is_armed());
}

#[test]
fn active_solution_ignores_age() {
    let sched = TxScheduler::new(schedule(1, false));
    let reference = fix(TOP_OF_HOUR, 0, true);

    let decision = sched.evaluate(&reference, 10_000 * SEC).unwrap();
    assert_eq!(decision.age_secs, 10_000);
    assert_eq!(decision.unix_now, u64::from(TOP_OF_HOUR) + 10_000);
}

#[test]
fn holdover_just_inside_bound() {
    // Scenario C, first half
    let sched = TxScheduler::new(schedule(1, true));
    let reference = fix(TOP_OF_HOUR, 0, false);

    let decision = sched.evaluate(&reference, 7199 * SEC).unwrap();
    assert_eq!(decision.age_secs, 7199);
    assert_eq!(decision.unix_now, u64::from(TOP_OF_HOUR) + 7199);
}

#[test]
fn holdover_at_bound_is_expired() {
    let sched = TxScheduler::new(schedule(1, true));
    let reference = fix(TOP_OF_HOUR, 0, false);

    assert_eq!(
        sched.evaluate(&reference, HOLDOVER_LIMIT_S * SEC),
        Err(UnavailableReason::HoldoverExpired)
    );
    // Fractional seconds truncate: 7200.999 s is still age 7200
    assert_eq!(
        sched.evaluate(&reference, HOLDOVER_LIMIT_S * SEC + 999_999),
        Err(UnavailableReason::HoldoverExpired)
    );
    // 7199.999 s truncates to 7199 and is eligible
    assert!(sched.evaluate(&reference, HOLDOVER_LIMIT_S * SEC - 1).is_ok());
}

#[test]
fn holdover_past_bound_is_expired() {
    // Scenario C, second half
    let mut sched = TxScheduler::new(schedule(1, true));
    let reference = fix(TOP_OF_HOUR, 0, false);

    assert_eq!(
        sched.update(&reference, 7201 * SEC),
        Err(UnavailableReason::HoldoverExpired)
    );
    assert!(!sched.state().is_armed());
}

#[test]
fn stale_fix_without_override_is_expired() {
    let sched = TxScheduler::new(schedule(1, false));
    let reference = fix(TOP_OF_HOUR, 0, false);

    assert_eq!(
        sched.evaluate(&reference, SEC),
        Err(UnavailableReason::HoldoverExpired)
    );
}

#[test]
fn eligibility_truth_table() {
    let now = 100 * SEC;
    for active in [false, true] {
        for holdover_override in [false, true] {
            for age in [0u64, 7199, 7200, 9000] {
                let reference = fix(TOP_OF_HOUR, 0, active);
                let sched = TxScheduler::new(schedule(1, holdover_override));
                let result = sched.evaluate(&reference, now.max(age * SEC));
                let expected = active || (holdover_override && age.max(100) < 7200);
                assert_eq!(
                    result.is_ok(),
                    expected,
                    "active={active} override={holdover_override} age={age}"
                );
            }
        }
    }
}

// ============================================================================
// Extrapolation
// ============================================================================

#[test]
fn extrapolation_uses_whole_seconds_of_monotonic_time() {
    let sched = TxScheduler::new(schedule(1, true));
    let reference = fix(TOP_OF_HOUR, 5 * SEC, true);

    for elapsed_us in [0, 999_999, SEC, 61 * SEC + 500_000, 3_599 * SEC] {
        let decision = sched.evaluate(&reference, 5 * SEC + elapsed_us).unwrap();
        assert_eq!(decision.unix_now, u64::from(TOP_OF_HOUR) + elapsed_us / SEC);
    }
}

#[test]
fn snapshot_newer_than_clock_saturates() {
    // A fix stamped after the clock was read (torn update) is age zero
    let sched = TxScheduler::new(schedule(1, true));
    let reference = fix(TOP_OF_HOUR, 50 * SEC, false);

    let decision = sched.evaluate(&reference, 10 * SEC).unwrap();
    assert_eq!(decision.age_secs, 0);
    assert_eq!(decision.unix_now, u64::from(TOP_OF_HOUR));
}

// ============================================================================
// Edge trigger
// ============================================================================

#[test]
fn first_poll_keys_second_holds() {
    // Scenario B
    let mut sched = TxScheduler::new(ScheduleConfig::every_slot(false));
    let reference = fix(TOP_OF_HOUR, 0, true);

    let (decision, action) = sched.update(&reference, 0).unwrap();
    assert_eq!(decision.slot, 0);
    assert!(decision.qualifying);
    assert_eq!(action, TxAction::Key);
    assert!(sched.state().is_armed());

    let (_, action) = sched.update(&reference, 0).unwrap();
    assert_eq!(action, TxAction::Hold);
}

#[test]
fn latch_holds_for_whole_slot() {
    let mut sched = TxScheduler::new(schedule(2, false));
    let reference = fix(TOP_OF_HOUR, 0, true);

    let mut keys = 0;
    // 250 ms polls through the first 2-minute slot
    let mut now = 0;
    while now < 120 * SEC {
        if sched.update(&reference, now).unwrap().1 == TxAction::Key {
            keys += 1;
        }
        now += 250_000;
    }
    assert_eq!(keys, 1);
}

#[test]
fn skip_three_qualifies_slots_zero_and_three() {
    // Scenario D
    let mut sched = TxScheduler::new(schedule(3, false));
    let reference = fix(TOP_OF_HOUR, 0, true);

    let qualifying: Vec<bool> = (0..6u64)
        .map(|slot| sched.update(&reference, slot * 120 * SEC).unwrap().0.qualifying)
        .collect();
    assert_eq!(qualifying, [true, false, false, true, false, false]);
}

#[test]
fn latch_rearms_after_non_qualifying_slot() {
    let mut sched = TxScheduler::new(schedule(2, false));
    let reference = fix(TOP_OF_HOUR, 0, true);

    let actions: Vec<TxAction> = [0, 60, 120, 180, 240, 300]
        .iter()
        .map(|&s| sched.update(&reference, s * SEC).unwrap().1)
        .collect();

    assert_eq!(
        actions,
        [
            TxAction::Key,
            TxAction::Hold,
            TxAction::Unkey { was_armed: true },
            TxAction::Unkey { was_armed: false },
            TxAction::Key,
            TxAction::Hold,
        ]
    );
}

#[test]
fn unavailable_poll_keeps_latch() {
    let mut sched = TxScheduler::new(schedule(1, false));
    let active = fix(TOP_OF_HOUR, 0, true);
    assert_eq!(sched.update(&active, 0).unwrap().1, TxAction::Key);

    // Solution drops mid-slot without override
    let lost = fix(TOP_OF_HOUR, 0, false);
    assert!(sched.update(&lost, 10 * SEC).is_err());
    assert!(sched.state().is_armed());

    // Coming back inside the same slot must not key again
    assert_eq!(sched.update(&active, 20 * SEC).unwrap().1, TxAction::Hold);
}

#[test]
fn schedulers_are_independent() {
    let reference = fix(TOP_OF_HOUR, 0, true);
    let mut a = TxScheduler::new(ScheduleConfig::every_slot(false));
    let mut b = TxScheduler::new(ScheduleConfig::every_slot(false));

    assert_eq!(a.update(&reference, 0).unwrap().1, TxAction::Key);
    assert!(!b.state().is_armed());
    assert_eq!(b.update(&reference, 0).unwrap().1, TxAction::Key);
}

#[test]
fn set_config_keeps_latch() {
    let mut sched = TxScheduler::new(ScheduleConfig::every_slot(false));
    let reference = fix(TOP_OF_HOUR, 0, true);
    sched.update(&reference, 0).unwrap();

    sched.set_config(schedule(2, true));
    assert!(sched.state().is_armed());
    assert_eq!(sched.config().slot_skip.get(), 2);
}
