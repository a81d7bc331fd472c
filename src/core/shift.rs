//! Shift processing: serve clients until the quota or a stall ends the shift.
//!
//! A shift repeatedly waits for the highest-priority client, reserves a unit
//! from the shared pool and removes the client it is serving. It ends in one of
//! four terminal states; only [`ShiftEnd::QuotaMet`] means the quota was
//! reached, the others are expected stalls that callers branch on.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::core::resource_pool::ResourcePool;
use crate::core::stats::ServiceStats;
use crate::core::wait_queue::{ClientSnapshot, PriorityWaitQueue, WaitToken};
use crate::util::types::{ClientClass, ClientId, Priority, ShiftType, UnitId};

/// How long a shift waits for a client before declaring the queue starved.
pub const DEFAULT_STARVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Simulated service time per client.
pub const DEFAULT_SERVICE_DELAY: Duration = Duration::from_millis(100);

/// Terminal state of a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftEnd {
    /// The quota was served.
    QuotaMet,
    /// The pool had no available unit left.
    PoolExhausted,
    /// No client showed up within the starve timeout.
    QueueStarved,
    /// Another server took the last available unit first.
    AllocationRace,
}

/// Record of one served client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEvent {
    /// 1-based order within the shift.
    pub sequence: usize,
    /// Served client.
    pub client_id: ClientId,
    /// Class of the served client.
    pub class: ClientClass,
    /// Unit handed to the client.
    pub unit_id: UnitId,
    /// Client priority at service time.
    pub priority: Priority,
    /// Time the client waited.
    pub waited: Duration,
}

/// Result of [`ShiftProcessor::run`].
#[derive(Debug, Clone, Serialize)]
pub struct ShiftOutcome {
    /// Unique id of this shift run.
    pub shift_id: Uuid,
    /// Shift that ran.
    pub shift: ShiftType,
    /// Quota in force.
    pub quota: usize,
    /// Clients served.
    pub served: usize,
    /// Why the shift ended.
    pub reason: ShiftEnd,
    /// Served clients in order.
    pub events: Vec<ServiceEvent>,
}

/// Timing knobs for a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftTiming {
    /// Wait for a client before ending with [`ShiftEnd::QueueStarved`].
    pub starve_timeout: Duration,
    /// Pause after each sale.
    pub service_delay: Duration,
}

impl Default for ShiftTiming {
    fn default() -> Self {
        Self {
            starve_timeout: DEFAULT_STARVE_TIMEOUT,
            service_delay: DEFAULT_SERVICE_DELAY,
        }
    }
}

/// Outcome of one peek, reserve, remove attempt.
#[derive(Debug)]
pub(crate) enum Cycle {
    Served { client: ClientSnapshot, unit: UnitId },
    PoolExhausted,
    QueueStarved,
    AllocationRace,
}

/// Serve one client: wait for the head, reserve a unit, then take the head.
///
/// The client is removed with an atomic take after the unit is secured, so a
/// concurrent server can never be handed the same client. If the queue was
/// emptied between peek and take, the unit goes back and the cycle waits again.
/// With a `token`, an interrupt ends the wait early as [`Cycle::QueueStarved`].
pub(crate) fn service_cycle(
    queue: &PriorityWaitQueue,
    pool: &ResourcePool,
    wait: Duration,
    token: Option<&WaitToken>,
) -> Cycle {
    if pool.available_count() == 0 {
        return Cycle::PoolExhausted;
    }
    loop {
        let head = match token {
            Some(token) => queue.peek_highest_interruptible(Some(wait), token),
            None => queue.peek_highest(Some(wait)),
        };
        let Some(head) = head else {
            return Cycle::QueueStarved;
        };
        let Some(unit) = pool.reserve_next() else {
            return Cycle::AllocationRace;
        };
        if let Some(client) = queue.take_highest() {
            return Cycle::Served { client, unit };
        }
        pool.release(unit);
        tracing::debug!(client_id = head.id, "client taken by another server");
    }
}

/// Drives shifts against a shared queue and pool.
pub struct ShiftProcessor {
    queue: Arc<PriorityWaitQueue>,
    pool: Arc<ResourcePool>,
    stats: Arc<ServiceStats>,
    timing: ShiftTiming,
}

impl ShiftProcessor {
    /// Create a processor with default timing.
    #[must_use]
    pub fn new(
        queue: Arc<PriorityWaitQueue>,
        pool: Arc<ResourcePool>,
        stats: Arc<ServiceStats>,
    ) -> Self {
        Self {
            queue,
            pool,
            stats,
            timing: ShiftTiming::default(),
        }
    }

    /// Override the starve timeout and pacing delay.
    #[must_use]
    pub const fn with_timing(mut self, timing: ShiftTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Timing in force.
    #[must_use]
    pub const fn timing(&self) -> ShiftTiming {
        self.timing
    }

    /// Run `shift` with its standard quota.
    pub fn run(&self, shift: ShiftType) -> ShiftOutcome {
        self.run_with_quota(shift, shift.quota())
    }

    /// Run `shift` until `quota` clients are served or the shift stalls.
    pub fn run_with_quota(&self, shift: ShiftType, quota: usize) -> ShiftOutcome {
        let shift_id = Uuid::new_v4();
        let span = tracing::info_span!("shift", %shift, %shift_id);
        let _guard = span.enter();
        tracing::info!(quota, queued = self.queue.size(), "shift started");

        let mut events: Vec<ServiceEvent> = Vec::with_capacity(quota);
        let reason = if quota == 0 {
            ShiftEnd::QuotaMet
        } else {
            loop {
                match service_cycle(&self.queue, &self.pool, self.timing.starve_timeout, None) {
                    Cycle::Served { client, unit } => {
                        self.stats.record(client.class, shift);
                        let event = ServiceEvent {
                            sequence: events.len() + 1,
                            client_id: client.id,
                            class: client.class,
                            unit_id: unit,
                            priority: client.priority,
                            waited: client.waited,
                        };
                        tracing::info!(
                            sequence = event.sequence,
                            quota,
                            client_id = event.client_id,
                            class = %event.class,
                            unit_id = event.unit_id,
                            priority = event.priority,
                            wait_secs = client.wait_seconds(),
                            "sale completed"
                        );
                        events.push(event);

                        if !self.timing.service_delay.is_zero() {
                            thread::sleep(self.timing.service_delay);
                        }
                        if events.len() >= quota {
                            break ShiftEnd::QuotaMet;
                        }
                    }
                    Cycle::PoolExhausted => {
                        tracing::warn!(served = events.len(), quota, "pool exhausted");
                        break ShiftEnd::PoolExhausted;
                    }
                    Cycle::QueueStarved => {
                        tracing::warn!(served = events.len(), quota, "queue starved");
                        break ShiftEnd::QueueStarved;
                    }
                    Cycle::AllocationRace => {
                        tracing::warn!(served = events.len(), quota, "lost allocation race");
                        break ShiftEnd::AllocationRace;
                    }
                }
            }
        };

        tracing::info!(
            served = events.len(),
            quota,
            ?reason,
            remaining_units = self.pool.available_count(),
            "shift finished"
        );
        ShiftOutcome {
            shift_id,
            shift,
            quota,
            served: events.len(),
            reason,
            events,
        }
    }
}
