//! Staff shift scheduling for the U-Engine ecosystem.
//!
//! Generates weekly rosters by constraint solving and keeps them valid
//! under single-row edits. Every employee gets exactly one shift per day
//! (MORNING, AFTERNOON, NIGHT or REST), every position meets its minimum
//! headcount on every working shift, and nobody rests more than the cap.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Employee`, `Position`, `Shift`,
//!   `Assignment`, `Schedule`, `StaffingTable`, `DateRange`
//! - **`cp`**: Boolean constraint model, `CpSolver` contract and the
//!   built-in backtracking backend
//! - **`scheduler`**: Model builder, weekly generator, incremental editor,
//!   query layer and KPIs
//! - **`store`**: Roster and persistence ports with in-memory implementations
//! - **`locks`**: Date-scoped mutual exclusion
//! - **`validation`**: Roster and schedule integrity checks
//! - **`config`**: `SchedulerConfig`, loadable from JSON
//! - **`service`**: `ShiftService`, the caller-facing facade
//!
//! # Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of applications, methods and models"
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming"

pub mod config;
pub mod cp;
pub mod error;
pub mod locks;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod validation;

pub use config::SchedulerConfig;
pub use error::{ScheduleError, ScheduleResult};
pub use service::ShiftService;
