//! Builders that assemble a counter from configuration.

pub mod counter_builder;

pub use counter_builder::{build_counter, build_counter_with_clock, CounterSnapshot, CounterSystem};
