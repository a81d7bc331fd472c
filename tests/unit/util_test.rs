//! Tests for utility types and clocks

use retail_counter::util::{
    Clock, ClientClass, ManualClock, ShiftType, SystemClock, AGING_STEP_SECS, PUBLIC_AGING_CAP,
};
use std::time::Duration;

#[test]
fn test_base_priorities() {
    assert_eq!(ClientClass::Business.base_priority(), 10);
    assert_eq!(ClientClass::Public.base_priority(), 1);
}

#[test]
fn test_aging_step() {
    let step = Duration::from_secs(AGING_STEP_SECS);
    assert_eq!(ClientClass::Public.aging_bonus(step - Duration::from_millis(1)), 0);
    assert_eq!(ClientClass::Public.aging_bonus(step), 1);
    assert_eq!(ClientClass::Public.priority_after(step * 3), 4);
}

#[test]
fn test_public_never_reaches_business_base() {
    let forever = Duration::from_secs(86_400);
    assert_eq!(ClientClass::Public.aging_bonus(forever), PUBLIC_AGING_CAP);
    assert!(ClientClass::Public.priority_after(forever) < ClientClass::Business.base_priority());
}

#[test]
fn test_shift_quotas() {
    let quotas: Vec<usize> = ShiftType::ALL.iter().map(|s| s.quota()).collect();
    assert_eq!(quotas, vec![35, 35, 30]);
    assert_eq!(ShiftType::Night.index(), 2);
}

#[test]
fn test_display_and_serde_names() {
    assert_eq!(ClientClass::Business.to_string(), "business");
    assert_eq!(ShiftType::Afternoon.to_string(), "afternoon");
    assert_eq!(serde_json::to_string(&ClientClass::Public).unwrap(), "\"public\"");
}

#[test]
fn test_manual_clock_only_moves_when_advanced() {
    let clock = ManualClock::new();
    assert_eq!(clock.now(), Duration::ZERO);
    clock.advance(Duration::from_secs(45));
    assert_eq!(clock.now(), Duration::from_secs(45));
}

#[test]
fn test_system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}

#[test]
fn test_init_tracing_is_idempotent() {
    retail_counter::util::init_tracing();
    retail_counter::util::init_tracing();
    tracing::info!("subscriber installed");
}
