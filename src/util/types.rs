//! Shared domain types for clients, units and shifts.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Client identifier.
pub type ClientId = u64;

/// Inventory unit identifier (its index in the pool).
pub type UnitId = usize;

/// Computed client priority; larger is served first.
pub type Priority = u32;

/// Seconds of waiting that earn one aging point.
pub const AGING_STEP_SECS: u64 = 30;

/// Upper bound on the aging bonus a public client can accumulate.
pub const PUBLIC_AGING_CAP: u32 = 8;

/// Client category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientClass {
    /// Corporate customer.
    Business,
    /// Walk-in customer.
    Public,
}

impl ClientClass {
    /// Fixed starting priority of the class.
    #[must_use]
    pub const fn base_priority(self) -> Priority {
        match self {
            Self::Business => 10,
            Self::Public => 1,
        }
    }

    /// Aging bonus earned after waiting `waited`.
    ///
    /// Public clients stop aging at [`PUBLIC_AGING_CAP`]; business clients never
    /// stop, so a public client (at most 9) never outranks a fresh business one.
    #[must_use]
    pub fn aging_bonus(self, waited: Duration) -> Priority {
        let steps = Priority::try_from(waited.as_secs() / AGING_STEP_SECS).unwrap_or(Priority::MAX);
        match self {
            Self::Business => steps,
            Self::Public => steps.min(PUBLIC_AGING_CAP),
        }
    }

    /// Priority after waiting `waited`.
    #[must_use]
    pub fn priority_after(self, waited: Duration) -> Priority {
        self.base_priority().saturating_add(self.aging_bonus(waited))
    }
}

impl fmt::Display for ClientClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Business => write!(f, "business"),
            Self::Public => write!(f, "public"),
        }
    }
}

/// Service shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    /// Morning shift.
    Morning,
    /// Afternoon shift.
    Afternoon,
    /// Night shift.
    Night,
}

impl ShiftType {
    /// Every shift, in daily order.
    pub const ALL: [Self; 3] = [Self::Morning, Self::Afternoon, Self::Night];

    /// Number of clients the shift serves before closing.
    #[must_use]
    pub const fn quota(self) -> usize {
        match self {
            Self::Morning | Self::Afternoon => 35,
            Self::Night => 30,
        }
    }

    /// Position of the shift within [`ShiftType::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Afternoon => 1,
            Self::Night => 2,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
            Self::Night => write!(f, "night"),
        }
    }
}
