//! Core queueing, inventory and service primitives.

pub mod agency;
pub mod error;
pub mod resource_pool;
pub mod semaphore;
pub mod shift;
pub mod stats;
pub mod wait_queue;

pub use agency::{AgencyConfig, AgencyPool, AgencyReport, DEFAULT_AGENCY_COUNT};
pub use error::{AppResult, CounterError};
pub use resource_pool::{PoolStats, ResourcePool, ResourceUnit, UnitStatus, DEFAULT_POOL_SIZE};
pub use semaphore::Semaphore;
pub use shift::{
    ServiceEvent, ShiftEnd, ShiftOutcome, ShiftProcessor, ShiftTiming, DEFAULT_SERVICE_DELAY,
    DEFAULT_STARVE_TIMEOUT,
};
pub use stats::{SalesReport, ServiceStats};
pub use wait_queue::{
    ClientSnapshot, PriorityWaitQueue, QueueEntry, WaitToken, DEFAULT_FIRST_CLIENT_ID,
    DEFAULT_QUEUE_CAPACITY,
};
