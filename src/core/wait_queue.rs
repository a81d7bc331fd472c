//! Bounded priority wait queue with time-based aging.
//!
//! Clients are kept in a sequence sorted by their *current* priority, which is
//! recomputed from class and elapsed wait whenever nodes are compared. Admission
//! is throttled by a counting semaphore holding one permit per free slot, and
//! callers waiting for a client block on a condition variable paired with the
//! queue mutex. Nothing that leaves the queue borrows from it: every query hands
//! back an owned [`ClientSnapshot`] or [`QueueEntry`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;

use crate::core::semaphore::Semaphore;
use crate::util::clock::{Clock, SystemClock};
use crate::util::types::{ClientClass, ClientId, Priority};

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// First id handed out by a queue's id generator.
pub const DEFAULT_FIRST_CLIENT_ID: ClientId = 1000;

/// A client waiting in line.
#[derive(Debug, Clone)]
struct WaitingClient {
    id: ClientId,
    class: ClientClass,
    /// Clock reading at admission.
    arrival: Duration,
    /// Last computed priority; a hint, never authoritative.
    cached_priority: Priority,
}

impl WaitingClient {
    fn waited(&self, now: Duration) -> Duration {
        now.saturating_sub(self.arrival)
    }

    fn refresh(&mut self, now: Duration) -> Priority {
        self.cached_priority = self.class.priority_after(self.waited(now));
        self.cached_priority
    }

    fn snapshot(&self, now: Duration) -> ClientSnapshot {
        ClientSnapshot {
            id: self.id,
            class: self.class,
            priority: self.cached_priority,
            waited: self.waited(now),
        }
    }
}

#[derive(Debug)]
struct QueueNode {
    client: WaitingClient,
}

#[derive(Debug, Default)]
struct QueueState {
    nodes: VecDeque<QueueNode>,
}

/// Cancellation handle for [`PriorityWaitQueue::peek_highest_interruptible`].
///
/// Once interrupted it stays interrupted. Waits made without a token, or with a
/// different token, are never cut short by it.
#[derive(Debug, Default)]
pub struct WaitToken {
    interrupted: AtomicBool,
}

impl WaitToken {
    /// Create a token that has not been interrupted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interrupted: AtomicBool::new(false),
        }
    }

    /// Whether [`PriorityWaitQueue::interrupt_waiters`] fired for this token.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }
}

/// Owned copy of a queued client's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: ClientId,
    /// Client class.
    pub class: ClientClass,
    /// Priority computed when the snapshot was taken.
    pub priority: Priority,
    /// Time spent in the queue so far.
    pub waited: Duration,
}

impl ClientSnapshot {
    /// Whole seconds spent waiting.
    #[must_use]
    pub const fn wait_seconds(&self) -> u64 {
        self.waited.as_secs()
    }
}

/// One row of [`PriorityWaitQueue::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    /// 1-based position in service order.
    pub position: usize,
    /// Client identifier.
    pub id: ClientId,
    /// Client class.
    pub class: ClientClass,
    /// Current priority.
    pub priority: Priority,
    /// Whole seconds spent waiting.
    pub wait_seconds: u64,
}

/// Bounded, priority-ordered queue of waiting clients.
///
/// All methods take `&self`; share the queue between threads with `Arc`.
pub struct PriorityWaitQueue {
    capacity: usize,
    state: Mutex<QueueState>,
    /// Signaled whenever a client is admitted or waiters are interrupted.
    items: Condvar,
    /// One permit per free slot.
    slots: Semaphore,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
}

impl PriorityWaitQueue {
    /// Create a queue measuring waits on the wall clock.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock::new()))
    }

    /// Create a queue measuring waits on `clock`.
    #[must_use]
    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState {
                nodes: VecDeque::with_capacity(capacity.min(1024)),
            }),
            items: Condvar::new(),
            slots: Semaphore::new(capacity),
            clock,
            next_id: AtomicU64::new(DEFAULT_FIRST_CLIENT_ID),
        }
    }

    /// Start the id generator at `first_id`.
    #[must_use]
    pub fn with_first_id(self, first_id: ClientId) -> Self {
        self.next_id.store(first_id, Ordering::Relaxed);
        self
    }

    /// Allocate a fresh client id from this queue's generator.
    pub fn next_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Admit a client, blocking while the queue is full.
    pub fn enqueue(&self, id: ClientId, class: ClientClass) {
        self.slots.acquire();
        self.insert(id, class);
    }

    /// Admit a client, giving up if no slot frees within `timeout`.
    ///
    /// Returns `false` when the client was not admitted.
    pub fn enqueue_timeout(&self, id: ClientId, class: ClientClass, timeout: Duration) -> bool {
        if !self.slots.acquire_timeout(timeout) {
            tracing::debug!(client_id = id, "queue full, admission timed out");
            return false;
        }
        self.insert(id, class);
        true
    }

    /// Admit `count` clients of one class with generated ids.
    pub fn bulk_enqueue(&self, count: usize, class: ClientClass) -> Vec<ClientId> {
        let ids: Vec<ClientId> = (0..count)
            .map(|_| {
                let id = self.next_id();
                self.enqueue(id, class);
                id
            })
            .collect();
        tracing::info!(count, %class, "bulk admission complete");
        ids
    }

    /// Insert behind every client whose current priority is at least as high.
    fn insert(&self, id: ClientId, class: ClientClass) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let mut client = WaitingClient {
            id,
            class,
            arrival: now,
            cached_priority: class.base_priority(),
        };
        let priority = client.refresh(now);
        let tail = state.nodes.len();
        let position = state
            .nodes
            .iter_mut()
            .position(|node| node.client.refresh(now) < priority)
            .unwrap_or(tail);
        state.nodes.insert(position, QueueNode { client });
        let size = state.nodes.len();
        drop(state);

        self.items.notify_all();
        tracing::debug!(client_id = id, %class, priority, position, size, "client enqueued");
    }

    /// Copy of the highest-priority client, left in place.
    ///
    /// Waits while the queue is empty: forever with `None`, or up to the given
    /// timeout. Returns `None` only on timeout.
    pub fn peek_highest(&self, timeout: Option<Duration>) -> Option<ClientSnapshot> {
        self.wait_for_head(timeout, None)
    }

    /// Like [`peek_highest`](Self::peek_highest), but also gives up once
    /// `token` is interrupted through [`interrupt_waiters`](Self::interrupt_waiters).
    pub fn peek_highest_interruptible(
        &self,
        timeout: Option<Duration>,
        token: &WaitToken,
    ) -> Option<ClientSnapshot> {
        self.wait_for_head(timeout, Some(token))
    }

    fn wait_for_head(
        &self,
        timeout: Option<Duration>,
        token: Option<&WaitToken>,
    ) -> Option<ClientSnapshot> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();
        while state.nodes.is_empty() {
            if token.is_some_and(WaitToken::is_interrupted) {
                return None;
            }
            match deadline {
                Some(deadline) => {
                    if self.items.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.items.wait(&mut state),
            }
        }
        let now = self.clock.now();
        state.nodes.front_mut().map(|node| {
            node.client.refresh(now);
            node.client.snapshot(now)
        })
    }

    /// Remove and return the highest-priority client in one critical section.
    ///
    /// Never blocks; `None` when the queue is empty.
    pub fn take_highest(&self) -> Option<ClientSnapshot> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let mut node = state.nodes.pop_front()?;
        drop(state);

        self.slots.release();
        node.client.refresh(now);
        Some(node.client.snapshot(now))
    }

    /// Remove a client by id. Returns whether it was still queued.
    ///
    /// A missing id is not an error: a concurrent server may have removed it.
    pub fn remove_by_id(&self, id: ClientId) -> bool {
        let mut state = self.state.lock();
        let Some(position) = state.nodes.iter().position(|node| node.client.id == id) else {
            return false;
        };
        state.nodes.remove(position);
        drop(state);

        self.slots.release();
        tracing::debug!(client_id = id, "client removed");
        true
    }

    /// Remove every client of `class`, returning how many left the queue.
    pub fn remove_all_of_class(&self, class: ClientClass) -> usize {
        let mut state = self.state.lock();
        let before = state.nodes.len();
        state.nodes.retain(|node| node.client.class != class);
        let removed = before - state.nodes.len();
        drop(state);

        self.slots.release_many(removed);
        if removed > 0 {
            tracing::info!(removed, %class, "clients removed from queue");
        }
        removed
    }

    /// Ordered copy of the queue contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state
            .nodes
            .iter_mut()
            .enumerate()
            .map(|(idx, node)| QueueEntry {
                position: idx + 1,
                id: node.client.id,
                class: node.client.class,
                priority: node.client.refresh(now),
                wait_seconds: node.client.waited(now).as_secs(),
            })
            .collect()
    }

    /// Interrupt `token` and wake the threads waiting with it.
    ///
    /// Those waiters return `None` if the queue is still empty. Other waiters
    /// wake, see an empty queue and go back to waiting.
    pub fn interrupt_waiters(&self, token: &WaitToken) {
        // Set under the queue lock; waiters check the token before every wait.
        let state = self.state.lock();
        token.interrupted.store(true, Ordering::Release);
        drop(state);
        self.items.notify_all();
    }

    /// Number of queued clients.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.lock().nodes.len()
    }

    /// Whether the queue holds no clients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Maximum number of queued clients.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not yet claimed by an admission.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.slots.available()
    }
}
