//! Input and schedule validation.
//!
//! Two passes:
//! - [`validate_roster`] checks a roster before a model is built
//!   (duplicate IDs, inactive employees).
//! - [`validate_schedule`] checks a finished schedule against the three
//!   roster invariants (one assignment per employee-day, coverage, rest cap).
//!
//! Both collect every problem instead of stopping at the first one.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::models::{Employee, EmployeeId, Position, Schedule, Shift, StaffingTable};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two employees share the same ID.
    DuplicateId,
    /// An inactive employee was handed to the scheduler.
    InactiveEmployee,
    /// An employee has no assignment on a day of the range.
    MissingAssignment,
    /// An employee has more than one assignment on a day.
    DuplicateAssignment,
    /// An assignment references an employee outside the roster.
    UnknownEmployee,
    /// An assignment is dated outside the schedule range.
    OutOfRange,
    /// Headcount below the configured minimum.
    CoverageShortfall,
    /// Too many REST days for one employee.
    RestCapExceeded,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a roster before scheduling.
///
/// Checks:
/// 1. No duplicate employee IDs
/// 2. Every employee is active
///
/// An empty roster is not a validation error here; the generator reports
/// it separately.
pub fn validate_roster(employees: &[Employee]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for e in employees {
        if !ids.insert(e.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate employee ID: {}", e.id),
            ));
        }
        if !e.active {
            errors.push(ValidationError::new(
                ValidationErrorKind::InactiveEmployee,
                format!("Employee '{}' is inactive", e.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a schedule against the roster invariants.
///
/// Checks:
/// 1. Every assignment is dated inside the range and names a rostered employee
/// 2. Exactly one assignment per `(employee, date)`
/// 3. Headcount per `(position, date, working shift)` ≥ minimum
/// 4. REST days per employee ≤ `rest_cap`
pub fn validate_schedule(
    schedule: &Schedule,
    employees: &[Employee],
    staffing: &StaffingTable,
    rest_cap: u32,
) -> ValidationResult {
    let mut errors = Vec::new();
    let roster: HashMap<EmployeeId, Position> =
        employees.iter().map(|e| (e.id, e.position)).collect();

    let mut per_day: HashMap<(EmployeeId, NaiveDate), usize> = HashMap::new();
    let mut headcount: HashMap<(Position, NaiveDate, Shift), usize> = HashMap::new();
    let mut rests: HashMap<EmployeeId, usize> = HashMap::new();

    for a in &schedule.assignments {
        if !schedule.range.contains(a.date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OutOfRange,
                format!("Assignment {} dated {} is outside the schedule", a.id, a.date),
            ));
            continue;
        }
        if !roster.contains_key(&a.employee_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownEmployee,
                format!("Assignment {} references unknown employee {}", a.id, a.employee_id),
            ));
            continue;
        }
        *per_day.entry((a.employee_id, a.date)).or_insert(0) += 1;
        *headcount.entry((a.position, a.date, a.shift)).or_insert(0) += 1;
        if a.shift == Shift::Rest {
            *rests.entry(a.employee_id).or_insert(0) += 1;
        }
    }

    for e in employees {
        for date in schedule.range.days() {
            match per_day.get(&(e.id, date)).copied().unwrap_or(0) {
                0 => errors.push(ValidationError::new(
                    ValidationErrorKind::MissingAssignment,
                    format!("Employee {} has no assignment on {date}", e.id),
                )),
                1 => {}
                n => errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateAssignment,
                    format!("Employee {} has {n} assignments on {date}", e.id),
                )),
            }
        }

        let rest_days = rests.get(&e.id).copied().unwrap_or(0);
        if rest_days > rest_cap as usize {
            errors.push(ValidationError::new(
                ValidationErrorKind::RestCapExceeded,
                format!("Employee {} rests {rest_days} days, cap is {rest_cap}", e.id),
            ));
        }
    }

    for position in staffing.positions() {
        for date in schedule.range.days() {
            for shift in Shift::WORKING {
                let minimum = staffing.minimum(position, shift) as usize;
                let count = headcount
                    .get(&(position, date, shift))
                    .copied()
                    .unwrap_or(0);
                if count < minimum {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::CoverageShortfall,
                        format!("{position} {shift} on {date}: {count} on duty, minimum {minimum}"),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
