//! Shift-scheduling domain models.
//!
//! Provides the core data types for rostering: who can work
//! ([`Employee`], [`Position`]), what they can be assigned ([`Shift`]),
//! how many are needed ([`StaffingTable`]) and what was decided
//! ([`Assignment`], [`Schedule`]).
//!
//! # Domain Mappings
//!
//! | u-shift | Hotel | Hospital | Retail |
//! |---------|-------|----------|--------|
//! | Position | Front desk, housekeeping | Ward nurse, porter | Cashier, stocker |
//! | Shift | Morning/afternoon/night | Early/late/night | Open/close |
//! | StaffingTable | Minimum per desk | Safe staffing ratio | Minimum tills |

mod calendar;
mod employee;
mod position;
mod schedule;
mod shift;
mod staffing;

pub use calendar::{DateRange, WEEK_DAYS};
pub use employee::{Employee, EmployeeId};
pub use position::Position;
pub use schedule::{Assignment, AssignmentId, Schedule};
pub use shift::{Shift, ShiftCatalogue, ShiftWindow};
pub use staffing::{ShiftMinimums, StaffingTable};
