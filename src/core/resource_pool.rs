//! Fixed inventory of countable units shared by every server.
//!
//! Units never come or go after construction; only their status flips between
//! `Available` and `Reserved`. Every read and write happens under one
//! `parking_lot::Mutex`, so `available + reserved == total` holds at every
//! observation.

use parking_lot::Mutex;
use serde::Serialize;

use crate::util::clock::now_ms;
use crate::util::types::UnitId;

/// Default number of units in a pool.
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Status of one inventory unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Free to be reserved.
    Available,
    /// Handed out to a served client.
    Reserved,
}

/// One countable inventory unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUnit {
    /// Unit identifier, equal to its index in the pool.
    pub id: UnitId,
    /// Current status.
    pub status: UnitStatus,
    /// Reservation time in milliseconds since epoch.
    pub reserved_at: Option<u128>,
}

impl ResourceUnit {
    const fn new(id: UnitId) -> Self {
        Self {
            id,
            status: UnitStatus::Available,
            reserved_at: None,
        }
    }

    const fn is_available(&self) -> bool {
        matches!(self.status, UnitStatus::Available)
    }

    fn reserve(&mut self) {
        self.status = UnitStatus::Reserved;
        self.reserved_at = Some(now_ms());
    }

    fn release(&mut self) {
        self.status = UnitStatus::Available;
        self.reserved_at = None;
    }
}

/// Consistent counts of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    /// Units in the pool.
    pub total: usize,
    /// Units free to reserve.
    pub available: usize,
    /// Units handed out.
    pub reserved: usize,
}

/// Shared pool of inventory units.
///
/// Allocation always picks the lowest-numbered free unit. That bias is
/// deliberate and gives no fairness guarantee between callers.
#[derive(Debug)]
pub struct ResourcePool {
    units: Mutex<Vec<ResourceUnit>>,
}

impl ResourcePool {
    /// Create a pool of `size` available units numbered `0..size`.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            units: Mutex::new((0..size).map(ResourceUnit::new).collect()),
        }
    }

    /// Reserve the lowest-numbered available unit.
    ///
    /// `None` means the pool is exhausted; callers branch on it.
    pub fn reserve_next(&self) -> Option<UnitId> {
        let mut units = self.units.lock();
        let unit = units.iter_mut().find(|u| u.is_available())?;
        unit.reserve();
        let id = unit.id;
        drop(units);
        tracing::debug!(unit_id = id, "unit reserved");
        Some(id)
    }

    /// Reserve a named unit if it exists and is available.
    pub fn reserve_specific(&self, id: UnitId) -> bool {
        let mut units = self.units.lock();
        match units.get_mut(id) {
            Some(unit) if unit.is_available() => {
                unit.reserve();
                true
            }
            _ => false,
        }
    }

    /// Return a reserved unit to the pool.
    ///
    /// Returns `false` for unknown ids or units that were not reserved.
    pub fn release(&self, id: UnitId) -> bool {
        let mut units = self.units.lock();
        let released = match units.get_mut(id) {
            Some(unit) if !unit.is_available() => {
                unit.release();
                true
            }
            _ => false,
        };
        drop(units);
        if released {
            tracing::debug!(unit_id = id, "unit released");
        }
        released
    }

    /// Release every reserved unit, returning how many were restocked.
    pub fn restock(&self) -> usize {
        let mut units = self.units.lock();
        let mut restocked = 0;
        for unit in units.iter_mut().filter(|u| !u.is_available()) {
            unit.release();
            restocked += 1;
        }
        drop(units);
        tracing::info!(restocked, "pool restocked");
        restocked
    }

    /// Units currently available.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.units.lock().iter().filter(|u| u.is_available()).count()
    }

    /// Units currently reserved.
    #[must_use]
    pub fn reserved_count(&self) -> usize {
        self.units.lock().iter().filter(|u| !u.is_available()).count()
    }

    /// Total units in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.units.lock().len()
    }

    /// Counts taken under a single lock acquisition.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let units = self.units.lock();
        let available = units.iter().filter(|u| u.is_available()).count();
        PoolStats {
            total: units.len(),
            available,
            reserved: units.len() - available,
        }
    }

    /// Owned copy of every unit.
    #[must_use]
    pub fn units(&self) -> Vec<ResourceUnit> {
        self.units.lock().clone()
    }
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
