//! Blocking counting semaphore built on `parking_lot`.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Counting semaphore with blocking, timed and non-blocking acquisition.
///
/// Permits are plain counts; releasing does not require a prior acquire, which
/// lets the queue hand slots back when clients are removed by id or class.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Take one permit, blocking until one is released.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Take one permit, giving up after `timeout`.
    ///
    /// Returns `true` if a permit was taken.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.available.wait_until(&mut permits, deadline).timed_out() {
                break;
            }
        }
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Take one permit if one is immediately available.
    pub fn try_acquire(&self) -> bool {
        let mut permits = self.permits.lock();
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    /// Return one permit and wake a single waiter.
    pub fn release(&self) {
        self.release_many(1);
    }

    /// Return `n` permits and wake up to `n` waiters.
    pub fn release_many(&self, n: usize) {
        if n == 0 {
            return;
        }
        let mut permits = self.permits.lock();
        *permits += n;
        drop(permits);
        if n == 1 {
            self.available.notify_one();
        } else {
            self.available.notify_all();
        }
    }

    /// Current number of free permits.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}
