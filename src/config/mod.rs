//! Configuration models for the counter, its shifts and agencies.

pub mod counter;

pub use counter::CounterConfig;
