//! Roster and persistence ports.
//!
//! The scheduler reads employees from a [`RosterProvider`] and persists
//! assignments through an [`AssignmentStore`]. Both are external
//! collaborators; [`InMemoryRoster`] and [`InMemoryStore`] implement them
//! for embedding and tests.

mod memory;

pub use memory::{InMemoryRoster, InMemoryStore};

use chrono::NaiveDate;

use crate::error::ScheduleResult;
use crate::models::{Assignment, AssignmentId, DateRange, Employee, EmployeeId, Position, Shift};

/// Source of employees.
pub trait RosterProvider: Send + Sync {
    /// Active employees holding any of the given positions.
    fn list_active_employees_by_positions(
        &self,
        positions: &[Position],
    ) -> ScheduleResult<Vec<Employee>>;

    /// Looks up one employee, active or not.
    fn find_employee(&self, id: EmployeeId) -> ScheduleResult<Option<Employee>>;
}

/// Transactional storage of assignment rows.
///
/// Rows are unique per `(employee, date)`. Writes to existing rows are
/// versioned: `update`/`delete` fail with `ConcurrentModification` when the
/// stored version differs from the one the caller read.
pub trait AssignmentStore: Send + Sync {
    /// One assignment by ID.
    fn get(&self, id: AssignmentId) -> ScheduleResult<Option<Assignment>>;

    /// Every row for an employee on a date (normally zero or one).
    fn find_by_employee_date(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> ScheduleResult<Vec<Assignment>>;

    /// Rows dated within a range, ordered by `(date, employee)`.
    fn list_range(&self, range: DateRange) -> ScheduleResult<Vec<Assignment>>;

    /// Rows of one employee within a range, in date order.
    fn list_for_employee(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
    ) -> ScheduleResult<Vec<Assignment>>;

    /// Headcount for a `(position, date, shift)` tuple.
    fn count_coverage(&self, position: Position, date: NaiveDate, shift: Shift)
        -> ScheduleResult<usize>;

    /// Inserts a new row. Fails with `DuplicateAssignment` if the employee
    /// already has a row that day.
    fn insert(&self, assignment: Assignment) -> ScheduleResult<Assignment>;

    /// Overwrites a row if its stored version equals `assignment.version`.
    /// Returns the row with its version bumped.
    fn update(&self, assignment: Assignment) -> ScheduleResult<Assignment>;

    /// Removes a row if its stored version equals `expected_version`.
    fn delete(&self, id: AssignmentId, expected_version: u64) -> ScheduleResult<()>;

    /// Atomically deletes every row dated in `range` and inserts `rows`.
    ///
    /// All-or-nothing: if any new row is invalid nothing changes. The range
    /// is remembered as a generated window.
    fn replace_range(&self, range: DateRange, rows: Vec<Assignment>) -> ScheduleResult<()>;

    /// The generated window containing `date`, if any.
    fn generated_window_containing(&self, date: NaiveDate) -> ScheduleResult<Option<DateRange>>;
}
