//! Agency workers: independent OS threads serving the same queue and pool.
//!
//! Each agency runs the shift service cycle in an unbounded loop until the
//! pool is stopped. The stop flag is cooperative and checked once per cycle;
//! every blocking wait inside the loop is bounded by the wait timeout, and
//! [`AgencyPool::stop`] additionally interrupts this pool's queue waiters and
//! parked workers so shutdown does not wait for the timeouts to expire. Other
//! users of the same queue, such as a running shift, are not interrupted.
//!
//! # Example
//!
//! ```rust,ignore
//! let agencies = AgencyPool::start(AgencyConfig::default(), ShiftType::Morning, queue, pool, stats)?;
//! // ... admit clients ...
//! let reports = agencies.stop();
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::error::CounterError;
use crate::core::resource_pool::ResourcePool;
use crate::core::shift::{service_cycle, Cycle, DEFAULT_SERVICE_DELAY, DEFAULT_STARVE_TIMEOUT};
use crate::core::stats::ServiceStats;
use crate::core::wait_queue::{PriorityWaitQueue, WaitToken};
use crate::util::types::ShiftType;

/// Default number of agencies.
pub const DEFAULT_AGENCY_COUNT: usize = 2;

/// Agency pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgencyConfig {
    /// Number of worker threads.
    pub agencies: usize,
    /// Bound on every blocking wait inside a worker cycle.
    pub wait_timeout: Duration,
    /// Pause after each sale.
    pub service_delay: Duration,
}

impl Default for AgencyConfig {
    fn default() -> Self {
        Self {
            agencies: DEFAULT_AGENCY_COUNT,
            wait_timeout: DEFAULT_STARVE_TIMEOUT,
            service_delay: DEFAULT_SERVICE_DELAY,
        }
    }
}

/// Snapshot of one agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgencyReport {
    /// Agency number, starting at 1.
    pub id: usize,
    /// Display name.
    pub name: String,
    /// Clients served so far.
    pub served: u64,
    /// Whether the worker thread is still looping.
    pub active: bool,
}

struct AgencyState {
    id: usize,
    name: String,
    served: AtomicU64,
    active: AtomicBool,
}

impl AgencyState {
    fn report(&self) -> AgencyReport {
        AgencyReport {
            id: self.id,
            name: self.name.clone(),
            served: self.served.load(Ordering::Acquire),
            active: self.active.load(Ordering::Acquire),
        }
    }
}

/// Cooperative stop flag that parked workers can sleep on.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Returns `true` if this call flipped the flag.
    fn stop(&self) -> bool {
        let mut stopped = self.stopped.lock();
        let first = !*stopped;
        *stopped = true;
        drop(stopped);
        self.wake.notify_all();
        first
    }

    /// Sleep up to `duration` unless stopped. Returns the flag afterwards.
    fn park(&self, duration: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.wake.wait_for(&mut stopped, duration);
        }
        *stopped
    }
}

/// Handles shared by one worker thread.
struct WorkerContext {
    state: Arc<AgencyState>,
    shift: ShiftType,
    queue: Arc<PriorityWaitQueue>,
    pool: Arc<ResourcePool>,
    stats: Arc<ServiceStats>,
    signal: Arc<StopSignal>,
    token: Arc<WaitToken>,
    config: AgencyConfig,
}

/// A running set of agency worker threads.
pub struct AgencyPool {
    shift: ShiftType,
    config: AgencyConfig,
    agencies: Vec<Arc<AgencyState>>,
    handles: Mutex<Vec<JoinHandle<u64>>>,
    signal: Arc<StopSignal>,
    token: Arc<WaitToken>,
    queue: Arc<PriorityWaitQueue>,
}

impl AgencyPool {
    /// Spawn `config.agencies` workers serving `shift`.
    ///
    /// # Errors
    ///
    /// - `CounterError::InvalidConfig` when no agencies or a zero wait timeout is requested
    /// - `CounterError::Spawn` if a thread could not be started; workers that
    ///   did start are stopped before returning
    pub fn start(
        config: AgencyConfig,
        shift: ShiftType,
        queue: Arc<PriorityWaitQueue>,
        pool: Arc<ResourcePool>,
        stats: Arc<ServiceStats>,
    ) -> Result<Self, CounterError> {
        if config.agencies == 0 {
            return Err(CounterError::InvalidConfig(
                "agencies must be greater than 0".into(),
            ));
        }
        if config.wait_timeout.is_zero() {
            return Err(CounterError::InvalidConfig(
                "wait_timeout must be greater than 0".into(),
            ));
        }

        let signal = Arc::new(StopSignal::default());
        let token = Arc::new(WaitToken::new());
        let mut agencies = Vec::with_capacity(config.agencies);
        let mut handles = Vec::with_capacity(config.agencies);

        for id in 1..=config.agencies {
            let state = Arc::new(AgencyState {
                id,
                name: format!("Agency {id}"),
                served: AtomicU64::new(0),
                active: AtomicBool::new(true),
            });
            let ctx = WorkerContext {
                state: Arc::clone(&state),
                shift,
                queue: Arc::clone(&queue),
                pool: Arc::clone(&pool),
                stats: Arc::clone(&stats),
                signal: Arc::clone(&signal),
                token: Arc::clone(&token),
                config,
            };
            let spawned = thread::Builder::new()
                .name(format!("agency-{id}"))
                .spawn(move || run_agency(&ctx));
            match spawned {
                Ok(handle) => {
                    agencies.push(state);
                    handles.push(handle);
                }
                Err(source) => {
                    signal.stop();
                    queue.interrupt_waiters(&token);
                    return Err(CounterError::Spawn { agency: id, source });
                }
            }
        }

        info!(agencies = config.agencies, %shift, "agency workers started");
        Ok(Self {
            shift,
            config,
            agencies,
            handles: Mutex::new(handles),
            signal,
            token,
            queue,
        })
    }

    /// Shift the agencies are serving.
    #[must_use]
    pub const fn shift(&self) -> ShiftType {
        self.shift
    }

    /// Live per-agency reports.
    #[must_use]
    pub fn reports(&self) -> Vec<AgencyReport> {
        self.agencies.iter().map(|a| a.report()).collect()
    }

    /// Clients served by all agencies so far.
    #[must_use]
    pub fn total_served(&self) -> u64 {
        self.agencies
            .iter()
            .map(|a| a.served.load(Ordering::Acquire))
            .sum()
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }

    /// Stop every worker and wait for them to exit.
    ///
    /// Sets the stop flag, then wakes this pool's queue waiters and parked
    /// workers. All workers share one deadline of twice the wait timeout to
    /// finish their current cycle; those that miss it are detached with a
    /// warning. Calling this again only returns the reports.
    pub fn stop(&self) -> Vec<AgencyReport> {
        if self.signal.stop() {
            info!(shift = %self.shift, "stopping agency workers");
        }
        self.queue.interrupt_waiters(&self.token);

        let handles: Vec<JoinHandle<u64>> = self.handles.lock().drain(..).collect();
        let detached = join_workers(handles, self.config.wait_timeout.saturating_mul(2));
        if detached > 0 {
            warn!(detached, "agency workers detached after shutdown deadline");
        }

        let reports = self.reports();
        info!(total = self.total_served(), "agency workers stopped");
        reports
    }
}

impl Drop for AgencyPool {
    fn drop(&mut self) {
        // Signal only; joining is left to an explicit stop().
        if self.signal.stop() {
            self.queue.interrupt_waiters(&self.token);
            debug!("AgencyPool dropped without explicit stop - workers will be detached");
        }
    }
}

/// Join every worker against one shared deadline. Returns how many were detached.
fn join_workers(handles: Vec<JoinHandle<u64>>, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    let pending: Vec<_> = handles
        .into_iter()
        .map(|handle| {
            let (tx, rx) = bounded(1);
            let joiner = thread::spawn(move || {
                let _ = tx.send(handle.join());
            });
            (rx, joiner)
        })
        .collect();

    let mut detached = 0;
    for (idx, (rx, joiner)) in pending.into_iter().enumerate() {
        match rx.recv_deadline(deadline) {
            Ok(Ok(served)) => debug!(agency = idx + 1, served, "agency joined"),
            Ok(Err(_)) => warn!(agency = idx + 1, "agency worker panicked"),
            Err(_) => {
                warn!(agency = idx + 1, "agency did not exit before deadline - detaching");
                detached += 1;
                continue;
            }
        }
        let _ = joiner.join();
    }
    detached
}

/// Worker loop. Returns the agency's private count.
fn run_agency(ctx: &WorkerContext) -> u64 {
    let agency = ctx.state.id;
    let mut served: u64 = 0;
    debug!(agency, "agency worker started");

    while !ctx.signal.is_stopped() {
        match service_cycle(&ctx.queue, &ctx.pool, ctx.config.wait_timeout, Some(&ctx.token)) {
            Cycle::Served { client, unit } => {
                served += 1;
                ctx.state.served.fetch_add(1, Ordering::AcqRel);
                ctx.stats.record(client.class, ctx.shift);
                info!(
                    agency,
                    client_id = client.id,
                    class = %client.class,
                    unit_id = unit,
                    priority = client.priority,
                    "sale completed"
                );
                if !ctx.config.service_delay.is_zero() {
                    ctx.signal.park(ctx.config.service_delay);
                }
            }
            Cycle::QueueStarved => {
                debug!(agency, "no client within wait timeout");
            }
            Cycle::PoolExhausted | Cycle::AllocationRace => {
                debug!(agency, "no unit available, parking");
                ctx.signal.park(ctx.config.wait_timeout);
            }
        }
    }

    ctx.state.active.store(false, Ordering::Release);
    debug!(agency, served, "agency worker exiting");
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_park_wakes_on_stop() {
        let signal = Arc::new(StopSignal::default());
        let parked = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                let stopped = signal.park(Duration::from_secs(10));
                (stopped, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(20));
        assert!(signal.stop());
        assert!(!signal.stop());
        let (stopped, elapsed) = parked.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_join_workers_shares_one_deadline() {
        let stuck: Vec<JoinHandle<u64>> = (0..3)
            .map(|_| {
                thread::spawn(|| {
                    thread::sleep(Duration::from_millis(600));
                    0
                })
            })
            .collect();
        let start = Instant::now();
        assert_eq!(join_workers(stuck, Duration::from_millis(150)), 3);
        assert!(start.elapsed() < Duration::from_millis(450));
    }

    #[test]
    fn test_join_workers_collects_finished() {
        let done: Vec<JoinHandle<u64>> = (0..2u64).map(|n| thread::spawn(move || n)).collect();
        assert_eq!(join_workers(done, Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_zero_agencies_rejected() {
        let result = AgencyPool::start(
            AgencyConfig {
                agencies: 0,
                ..AgencyConfig::default()
            },
            ShiftType::Morning,
            Arc::new(PriorityWaitQueue::new(4)),
            Arc::new(ResourcePool::new(4)),
            Arc::new(ServiceStats::new()),
        );
        assert!(matches!(result, Err(CounterError::InvalidConfig(_))));
    }
}
