//! Job position model.
//!
//! Positions are the closed set of job categories an employee can hold.
//! Staffing minimums are configured per position, so every coverage
//! question in the engine is asked for one position at a time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// A job category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    /// Reception and guest check-in/out.
    FrontDesk,
    /// Room cleaning staff.
    Housekeeping,
    /// Building and equipment upkeep.
    Maintenance,
    /// Restaurant floor and room service.
    FoodService,
    /// Kitchen staff.
    Kitchen,
    /// Security guards.
    Security,
    /// Shop and bar tills.
    PointOfSale,
}

impl Position {
    /// Every position, in declaration order.
    pub const ALL: [Position; 7] = [
        Position::FrontDesk,
        Position::Housekeeping,
        Position::Maintenance,
        Position::FoodService,
        Position::Kitchen,
        Position::Security,
        Position::PointOfSale,
    ];

    /// Canonical code (e.g. `FRONT_DESK`).
    pub fn code(&self) -> &'static str {
        match self {
            Position::FrontDesk => "FRONT_DESK",
            Position::Housekeeping => "HOUSEKEEPING",
            Position::Maintenance => "MAINTENANCE",
            Position::FoodService => "FOOD_SERVICE",
            Position::Kitchen => "KITCHEN",
            Position::Security => "SECURITY",
            Position::PointOfSale => "POINT_OF_SALE",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = ScheduleError;

    /// Parses a position code.
    ///
    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Position::ALL
            .into_iter()
            .find(|p| p.code() == normalized)
            .ok_or_else(|| ScheduleError::UnknownPosition(s.to_string()))
    }
}
