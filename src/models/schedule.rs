//! Assignment and schedule models.
//!
//! An assignment records that one employee works one shift (or rests) on
//! one date. A schedule is a set of assignments over a date range, as
//! produced by weekly generation.
//!
//! # Invariants (of a generated schedule)
//! - exactly one assignment per `(employee, date)`
//! - per `(position, date, working shift)`, headcount ≥ configured minimum
//! - per employee, REST count within the range ≤ rest cap

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use super::{DateRange, EmployeeId, Position, Shift};

/// Assignment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub Uuid);

impl AssignmentId {
    /// A fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One `(employee, date, shift)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier.
    pub id: AssignmentId,
    /// Assigned employee.
    pub employee_id: EmployeeId,
    /// Employee position (denormalized for coverage counting).
    pub position: Position,
    /// Calendar day the shift is dated on.
    pub date: NaiveDate,
    /// Shift worked, or REST.
    pub shift: Shift,
    /// Optimistic-concurrency version, bumped on every write.
    pub version: u64,
}

impl Assignment {
    /// Creates a new assignment at version 1.
    pub fn new(employee_id: EmployeeId, position: Position, date: NaiveDate, shift: Shift) -> Self {
        Self {
            id: AssignmentId::new(),
            employee_id,
            position,
            date,
            shift,
            version: 1,
        }
    }

    /// Whether this assignment counts towards `(position, date, shift)` coverage.
    #[inline]
    pub fn covers(&self, position: Position, date: NaiveDate, shift: Shift) -> bool {
        shift.is_working() && self.position == position && self.date == date && self.shift == shift
    }
}

/// A set of assignments over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    /// Days covered.
    pub range: DateRange,
    /// Assignments, ordered by date then employee.
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Creates a schedule, sorting assignments by `(date, employee)`.
    pub fn new(range: DateRange, mut assignments: Vec<Assignment>) -> Self {
        assignments.sort_by_key(|a| (a.date, a.employee_id));
        Self { range, assignments }
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// The assignment for an employee on a date.
    pub fn assignment_for(&self, employee_id: EmployeeId, date: NaiveDate) -> Option<&Assignment> {
        self.assignments
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
    }

    /// All assignments of one employee, in date order.
    pub fn assignments_for_employee(&self, employee_id: EmployeeId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .collect()
    }

    /// Headcount for a `(position, date, shift)` tuple.
    pub fn headcount(&self, position: Position, date: NaiveDate, shift: Shift) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.position == position && a.date == date && a.shift == shift)
            .count()
    }

    /// REST days of one employee within the schedule.
    pub fn rest_days(&self, employee_id: EmployeeId) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.employee_id == employee_id && a.shift == Shift::Rest)
            .count()
    }

    /// Assignments grouped by employee.
    pub fn by_employee(&self) -> BTreeMap<EmployeeId, Vec<&Assignment>> {
        let mut map: BTreeMap<EmployeeId, Vec<&Assignment>> = BTreeMap::new();
        for a in &self.assignments {
            map.entry(a.employee_id).or_default().push(a);
        }
        map
    }

    /// Consumes the schedule, returning its assignments.
    pub fn into_assignments(self) -> Vec<Assignment> {
        self.assignments
    }
}
