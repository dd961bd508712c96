//! Error taxonomy.
//!
//! All errors are plain data. The engine never retries or relaxes
//! constraints on its own; callers decide.

use chrono::NaiveDate;

use crate::models::{AssignmentId, EmployeeId, Position, Shift};
use crate::validation::ValidationError;

/// Result alias used throughout the crate.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    // Input errors: rejected before any model is built.
    #[error("no active employees to schedule")]
    EmptyRoster,
    #[error("unknown position code '{0}'")]
    UnknownPosition(String),
    #[error("unknown shift code '{0}'")]
    UnknownShift(String),
    #[error("invalid date range {start}..={end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("invalid input: {}", join_messages(.0))]
    InvalidInput(Vec<ValidationError>),
    #[error("invalid configuration: {0}")]
    Config(String),

    // Solver outcomes.
    #[error("no schedule satisfies all staffing constraints for the week starting {start}")]
    InfeasibleSchedule { start: NaiveDate },
    #[error("solver reached no verdict within {budget_ms} ms")]
    SchedulingTimeout { budget_ms: u64 },
    #[error("schedule generation cancelled")]
    Cancelled,
    #[error("solver returned an inconsistent solution: {0}")]
    InvalidSolution(String),

    // Incremental edit rejections.
    #[error("assignment {0} not found")]
    NotFound(AssignmentId),
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("employee {0} is not active")]
    InactiveEmployee(EmployeeId),
    #[error("employee {employee_id} already has {count} assignment(s) on {date}")]
    DuplicateAssignment {
        employee_id: EmployeeId,
        date: NaiveDate,
        count: usize,
    },
    #[error(
        "{position} {shift} coverage on {date} would drop to {remaining}, below minimum {minimum}"
    )]
    CoverageViolation {
        position: Position,
        date: NaiveDate,
        shift: Shift,
        remaining: usize,
        minimum: u32,
    },
    #[error("employee {employee_id} would have {rest_days} rest days in the week of {week_start}, cap is {cap}")]
    RestCapViolation {
        employee_id: EmployeeId,
        week_start: NaiveDate,
        rest_days: usize,
        cap: u32,
    },

    // Concurrency.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),
}

impl ScheduleError {
    /// Whether retrying the same call can succeed.
    ///
    /// Timeouts and concurrency conflicts are transient; everything else
    /// needs different inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScheduleError::SchedulingTimeout { .. } | ScheduleError::ConcurrentModification(_)
        )
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
