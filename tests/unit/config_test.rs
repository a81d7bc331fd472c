//! Tests for configuration validation and loading

use retail_counter::config::CounterConfig;
use std::time::Duration;

#[test]
fn test_default_config_matches_counter_defaults() {
    let cfg = CounterConfig::default();
    assert_eq!(cfg.queue_capacity, 200);
    assert_eq!(cfg.pool_size, 100);
    assert_eq!(cfg.agency_count, 2);
    assert_eq!(cfg.starve_timeout(), Duration::from_secs(2));
    assert_eq!(cfg.service_delay(), Duration::from_millis(100));
    assert_eq!(cfg.first_client_id, 1000);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_invalid_queue_capacity() {
    let invalid = CounterConfig {
        queue_capacity: 0,
        ..CounterConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_pool_size() {
    let invalid = CounterConfig {
        pool_size: 0,
        ..CounterConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_config_invalid_starve_timeout() {
    let invalid = CounterConfig {
        starve_timeout_ms: 0,
        ..CounterConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_zero_service_delay_is_allowed() {
    let cfg = CounterConfig {
        service_delay_ms: 0,
        ..CounterConfig::default()
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_from_json_partial_uses_defaults() {
    let cfg = CounterConfig::from_json_str(r#"{"pool_size": 5, "agency_count": 4}"#).unwrap();
    assert_eq!(cfg.pool_size, 5);
    assert_eq!(cfg.agency_count, 4);
    assert_eq!(cfg.queue_capacity, 200);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(CounterConfig::from_json_str(r#"{"queue_capacity": 0}"#).is_err());
    assert!(CounterConfig::from_json_str("not json").is_err());
}

#[test]
fn test_shift_timing_and_agency_config_follow_config() {
    let cfg = CounterConfig {
        starve_timeout_ms: 250,
        service_delay_ms: 5,
        agency_count: 3,
        ..CounterConfig::default()
    };
    let timing = cfg.shift_timing();
    assert_eq!(timing.starve_timeout, Duration::from_millis(250));
    assert_eq!(timing.service_delay, Duration::from_millis(5));

    let agencies = cfg.agency_config();
    assert_eq!(agencies.agencies, 3);
    assert_eq!(agencies.wait_timeout, Duration::from_millis(250));
}

#[test]
fn test_config_json_roundtrip() {
    let cfg = CounterConfig {
        first_client_id: 7,
        ..CounterConfig::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(CounterConfig::from_json_str(&json).unwrap(), cfg);
}
