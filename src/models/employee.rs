//! Employee model.
//!
//! Employees are owned by the roster provider; the scheduler only reads
//! them. Each holds exactly one [`Position`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Position;

/// Employee identifier as issued by the roster provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A member of staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier.
    pub id: EmployeeId,
    /// Display name.
    pub full_name: String,
    /// Job category.
    pub position: Position,
    /// Inactive employees are never scheduled.
    pub active: bool,
}

impl Employee {
    /// Creates an active employee.
    pub fn new(id: u64, full_name: impl Into<String>, position: Position) -> Self {
        Self {
            id: EmployeeId(id),
            full_name: full_name.into(),
            position,
            active: true,
        }
    }

    /// Marks the employee inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}
