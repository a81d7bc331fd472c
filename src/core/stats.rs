//! Sales statistics shared by shift processors and agencies.
//!
//! The counters sit behind their own mutex so recording a sale never contends
//! with the queue or pool locks.

use parking_lot::Mutex;
use serde::Serialize;

use crate::util::types::{ClientClass, ShiftType};

/// Point-in-time sales totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SalesReport {
    /// Every recorded sale.
    pub total: u64,
    /// Sales to business clients.
    pub business: u64,
    /// Sales to public clients.
    pub public: u64,
    /// Sales per shift, indexed by [`ShiftType::index`].
    pub per_shift: [u64; 3],
}

impl SalesReport {
    /// Sales recorded during `shift`.
    #[must_use]
    pub const fn for_shift(&self, shift: ShiftType) -> u64 {
        self.per_shift[shift.index()]
    }

    /// Sales recorded for `class`.
    #[must_use]
    pub const fn for_class(&self, class: ClientClass) -> u64 {
        match class {
            ClientClass::Business => self.business,
            ClientClass::Public => self.public,
        }
    }
}

/// Thread-safe sales counters.
#[derive(Debug, Default)]
pub struct ServiceStats {
    inner: Mutex<SalesReport>,
}

impl ServiceStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sale.
    pub fn record(&self, class: ClientClass, shift: ShiftType) {
        let mut report = self.inner.lock();
        report.total += 1;
        match class {
            ClientClass::Business => report.business += 1,
            ClientClass::Public => report.public += 1,
        }
        report.per_shift[shift.index()] += 1;
    }

    /// Copy of the current totals.
    #[must_use]
    pub fn report(&self) -> SalesReport {
        *self.inner.lock()
    }

    /// Zero every counter.
    pub fn reset(&self) {
        *self.inner.lock() = SalesReport::default();
    }
}
