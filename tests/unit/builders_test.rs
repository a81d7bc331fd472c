//! Tests for counter assembly

use retail_counter::builders::{build_counter, build_counter_with_clock};
use retail_counter::config::CounterConfig;
use retail_counter::core::{CounterError, ShiftEnd};
use retail_counter::util::{ClientClass, ManualClock, ShiftType};
use std::sync::Arc;
use std::time::Duration;

fn quick_config() -> CounterConfig {
    CounterConfig {
        queue_capacity: 20,
        pool_size: 10,
        starve_timeout_ms: 50,
        service_delay_ms: 0,
        ..CounterConfig::default()
    }
}

#[test]
fn test_build_rejects_zero_agencies() {
    let cfg = CounterConfig {
        agency_count: 0,
        ..CounterConfig::default()
    };
    assert!(matches!(build_counter(&cfg), Err(CounterError::InvalidConfig(_))));
}

#[test]
fn test_run_shift_records_sales() {
    let counter = build_counter(&quick_config()).unwrap();
    counter.queue().bulk_enqueue(4, ClientClass::Public);
    counter.queue().bulk_enqueue(2, ClientClass::Business);

    let outcome = counter.run_shift(ShiftType::Afternoon);
    assert_eq!(outcome.reason, ShiftEnd::QueueStarved);
    assert_eq!(outcome.served, 6);

    let sales = counter.stats().report();
    assert_eq!(sales.total, 6);
    assert_eq!(sales.for_class(ClientClass::Business), 2);
    assert_eq!(sales.for_shift(ShiftType::Afternoon), 6);
}

#[test]
fn test_close_to_public_leaves_business() {
    let clock = Arc::new(ManualClock::new());
    let counter = build_counter_with_clock(&quick_config(), clock.clone()).unwrap();
    counter.queue().bulk_enqueue(3, ClientClass::Public);
    clock.advance(Duration::from_secs(60));
    counter.queue().bulk_enqueue(2, ClientClass::Business);

    assert_eq!(counter.close_to_public(), 3);
    let snap = counter.snapshot();
    assert_eq!(snap.queue.len(), 2);
    assert!(snap.queue.iter().all(|e| e.class == ClientClass::Business));
}

#[test]
fn test_snapshot_serializes() {
    let counter = build_counter(&quick_config()).unwrap();
    counter.queue().enqueue(1, ClientClass::Business);
    let json = serde_json::to_value(counter.snapshot()).unwrap();
    assert_eq!(json["queue"][0]["class"], "business");
    assert_eq!(json["pool"]["total"], 10);
}
