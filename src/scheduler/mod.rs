//! Weekly roster generation, edits, queries and KPI evaluation.
//!
//! # Algorithm
//!
//! `WeeklyScheduler` encodes the week as a boolean model
//! ([`ShiftModelBuilder`]) and hands it to a [`CpSolver`](crate::cp::CpSolver).
//! The solved week is re-validated before it replaces the stored week.
//!
//! `ScheduleEditor` applies single-row edits that keep every cell at or
//! above its minimum, and `ScheduleQuery` answers read-only questions.
//!
//! # KPI
//!
//! `ScheduleKpi` computes staffing metrics: headcount, shortfalls,
//! coverage rate, rest days and surplus.
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of applications, methods and models"
//! - Burke et al. (2004), "The State of the Art of Nurse Rostering"

mod builder;
mod editor;
mod generator;
mod kpi;
mod query;

pub use builder::{ShiftModel, ShiftModelBuilder};
pub use editor::{CreatedAssignment, ScheduleEditor};
pub use generator::WeeklyScheduler;
pub use kpi::{CoverageShortfall, ScheduleKpi};
pub use query::{EmployeeWeek, ScheduleQuery, WeekFilter};
