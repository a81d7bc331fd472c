//! Tests for error types

use retail_counter::core::CounterError;
use std::error::Error as _;

#[test]
fn test_invalid_config_error() {
    let err = CounterError::InvalidConfig("pool_size must be greater than 0".to_string());
    assert_eq!(
        format!("{err}"),
        "invalid configuration: pool_size must be greater than 0"
    );
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = CounterError::Spawn {
        agency: 2,
        source: std::io::Error::other("no threads left"),
    };
    assert_eq!(
        format!("{err}"),
        "failed to spawn agency worker 2: no threads left"
    );
    assert!(err.source().is_some());
}

#[test]
fn test_counter_error_converts_to_anyhow() {
    let result: retail_counter::core::AppResult<()> =
        Err(CounterError::InvalidConfig("bad".into()).into());
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<CounterError>().is_some());
}
