//! Assemble queue, pool and statistics into one counter from configuration.

use std::sync::Arc;

use serde::Serialize;

use crate::config::CounterConfig;
use crate::core::{
    AgencyPool, CounterError, PoolStats, PriorityWaitQueue, QueueEntry, ResourcePool,
    SalesReport, ServiceStats, ShiftOutcome, ShiftProcessor,
};
use crate::util::clock::{now_ms, Clock, SystemClock};
use crate::util::types::{ClientClass, ShiftType};

/// Read-only view of the whole counter for dashboards and reports.
#[derive(Debug, Clone, Serialize)]
pub struct CounterSnapshot {
    /// Queue contents in service order.
    pub queue: Vec<QueueEntry>,
    /// Queue capacity.
    pub queue_capacity: usize,
    /// Pool counts.
    pub pool: PoolStats,
    /// Sales so far.
    pub sales: SalesReport,
    /// Milliseconds since epoch when the snapshot was taken.
    pub taken_at_ms: u128,
}

/// A configured counter: one queue, one pool and shared sales statistics.
pub struct CounterSystem {
    config: CounterConfig,
    queue: Arc<PriorityWaitQueue>,
    pool: Arc<ResourcePool>,
    stats: Arc<ServiceStats>,
}

/// Build a counter that ages clients on the wall clock.
///
/// # Errors
///
/// Returns `CounterError::InvalidConfig` if the configuration does not validate.
pub fn build_counter(cfg: &CounterConfig) -> Result<CounterSystem, CounterError> {
    build_counter_with_clock(cfg, Arc::new(SystemClock::new()))
}

/// Build a counter that ages clients on `clock`.
///
/// # Errors
///
/// Returns `CounterError::InvalidConfig` if the configuration does not validate.
pub fn build_counter_with_clock(
    cfg: &CounterConfig,
    clock: Arc<dyn Clock>,
) -> Result<CounterSystem, CounterError> {
    cfg.validate().map_err(CounterError::InvalidConfig)?;

    let queue = PriorityWaitQueue::with_clock(cfg.queue_capacity, clock)
        .with_first_id(cfg.first_client_id);
    tracing::info!(
        queue_capacity = cfg.queue_capacity,
        pool_size = cfg.pool_size,
        agencies = cfg.agency_count,
        "counter initialized"
    );
    Ok(CounterSystem {
        config: cfg.clone(),
        queue: Arc::new(queue),
        pool: Arc::new(ResourcePool::new(cfg.pool_size)),
        stats: Arc::new(ServiceStats::new()),
    })
}

impl CounterSystem {
    /// Configuration the counter was built from.
    #[must_use]
    pub const fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Shared waiting queue.
    #[must_use]
    pub const fn queue(&self) -> &Arc<PriorityWaitQueue> {
        &self.queue
    }

    /// Shared inventory pool.
    #[must_use]
    pub const fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    /// Shared sales statistics.
    #[must_use]
    pub const fn stats(&self) -> &Arc<ServiceStats> {
        &self.stats
    }

    /// A shift processor wired to this counter.
    #[must_use]
    pub fn shift_processor(&self) -> ShiftProcessor {
        ShiftProcessor::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.pool),
            Arc::clone(&self.stats),
        )
        .with_timing(self.config.shift_timing())
    }

    /// Run one shift on the calling thread.
    pub fn run_shift(&self, shift: ShiftType) -> ShiftOutcome {
        self.shift_processor().run(shift)
    }

    /// Start the configured number of agencies serving `shift`.
    ///
    /// # Errors
    ///
    /// Propagates [`AgencyPool::start`] failures.
    pub fn start_agencies(&self, shift: ShiftType) -> Result<AgencyPool, CounterError> {
        AgencyPool::start(
            self.config.agency_config(),
            shift,
            Arc::clone(&self.queue),
            Arc::clone(&self.pool),
            Arc::clone(&self.stats),
        )
    }

    /// Close the counter to walk-in customers: drop every public client.
    pub fn close_to_public(&self) -> usize {
        self.queue.remove_all_of_class(ClientClass::Public)
    }

    /// Consistent-per-component copy of queue, pool and sales.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            queue: self.queue.snapshot(),
            queue_capacity: self.queue.capacity(),
            pool: self.pool.stats(),
            sales: self.stats.report(),
            taken_at_ms: now_ms(),
        }
    }
}
