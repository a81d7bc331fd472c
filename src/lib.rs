//! # Retail Counter
//!
//! Concurrency core of a simulated retail counter that serves waiting customers
//! in priority order while drawing from a finite, shared inventory.
//!
//! ## Components
//!
//! - **`PriorityWaitQueue`**: bounded, priority-ordered line of waiting clients.
//!   Business clients start at priority 10, public clients at 1, and everyone
//!   gains one point per 30 seconds of waiting (public clients stop at +8).
//!   Admission blocks while the queue is full; servers block until a client is
//!   available, optionally with a timeout.
//! - **`ResourcePool`**: fixed set of countable units handed out lowest index
//!   first, with `available + reserved == total` at every observation.
//! - **`ShiftProcessor`**: serves one shift until its quota (35/35/30) is met or
//!   the shift stalls on an exhausted pool, a starved queue or a lost race.
//! - **`AgencyPool`**: N worker threads running the same service cycle
//!   concurrently, with cooperative, interrupt-assisted shutdown.
//!
//! ## Example
//!
//! ```rust,no_run
//! use retail_counter::builders::build_counter;
//! use retail_counter::config::CounterConfig;
//! use retail_counter::core::ShiftEnd;
//! use retail_counter::util::{ClientClass, ShiftType};
//!
//! let counter = build_counter(&CounterConfig::default())?;
//! counter.queue().bulk_enqueue(40, ClientClass::Business);
//!
//! let outcome = counter.run_shift(ShiftType::Morning);
//! match outcome.reason {
//!     ShiftEnd::QuotaMet => println!("served {}", outcome.served),
//!     other => println!("stopped early: {other:?}"),
//! }
//! # Ok::<(), retail_counter::core::CounterError>(())
//! ```
//!
//! For complete scenarios, see the integration tests under `tests/`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core queue, pool, shift and agency primitives.
pub mod core;
/// Configuration models.
pub mod config;
/// Builders that assemble a counter from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
