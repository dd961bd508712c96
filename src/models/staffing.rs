//! Minimum staffing table.
//!
//! For each position and each working shift, the headcount that must be on
//! duty company-wide every day. REST carries no minimum; positions absent
//! from the table have no minimums at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Position, Shift};

/// Per-shift minimum headcount for one position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftMinimums {
    #[serde(default)]
    pub morning: u32,
    #[serde(default)]
    pub afternoon: u32,
    #[serde(default)]
    pub night: u32,
}

impl ShiftMinimums {
    /// Creates a minimums row.
    pub const fn new(morning: u32, afternoon: u32, night: u32) -> Self {
        Self {
            morning,
            afternoon,
            night,
        }
    }

    /// Minimum for one shift (0 for REST).
    pub fn get(&self, shift: Shift) -> u32 {
        match shift {
            Shift::Morning => self.morning,
            Shift::Afternoon => self.afternoon,
            Shift::Night => self.night,
            Shift::Rest => 0,
        }
    }

    /// Sum over the three working shifts, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.morning
            .saturating_add(self.afternoon)
            .saturating_add(self.night)
    }

    fn set(&mut self, shift: Shift, value: u32) {
        match shift {
            Shift::Morning => self.morning = value,
            Shift::Afternoon => self.afternoon = value,
            Shift::Night => self.night = value,
            Shift::Rest => {}
        }
    }
}

/// Minimum staffing per position and working shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffingTable {
    minimums: BTreeMap<Position, ShiftMinimums>,
}

impl Default for StaffingTable {
    /// The hotel's standard table.
    fn default() -> Self {
        Self::empty()
            .with_position(Position::FrontDesk, ShiftMinimums::new(2, 2, 1))
            .with_position(Position::Housekeeping, ShiftMinimums::new(3, 2, 0))
            .with_position(Position::Maintenance, ShiftMinimums::new(1, 1, 0))
            .with_position(Position::FoodService, ShiftMinimums::new(2, 2, 0))
            .with_position(Position::Kitchen, ShiftMinimums::new(2, 2, 0))
            .with_position(Position::Security, ShiftMinimums::new(1, 1, 1))
            .with_position(Position::PointOfSale, ShiftMinimums::new(1, 1, 0))
    }
}

impl StaffingTable {
    /// A table with no minimums.
    pub fn empty() -> Self {
        Self {
            minimums: BTreeMap::new(),
        }
    }

    /// Sets the whole row for a position.
    pub fn with_position(mut self, position: Position, minimums: ShiftMinimums) -> Self {
        self.minimums.insert(position, minimums);
        self
    }

    /// Sets one cell. Setting REST is a no-op.
    pub fn with_minimum(mut self, position: Position, shift: Shift, value: u32) -> Self {
        self.minimums.entry(position).or_default().set(shift, value);
        self
    }

    /// Minimum headcount for `(position, shift)`.
    pub fn minimum(&self, position: Position, shift: Shift) -> u32 {
        self.minimums
            .get(&position)
            .map(|m| m.get(shift))
            .unwrap_or(0)
    }

    /// The row for a position (all zeros if absent).
    pub fn row(&self, position: Position) -> ShiftMinimums {
        self.minimums.get(&position).copied().unwrap_or_default()
    }

    /// Positions with an explicit row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.minimums.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let t = StaffingTable::default();
        assert_eq!(t.minimum(Position::FrontDesk, Shift::Morning), 2);
        assert_eq!(t.minimum(Position::Security, Shift::Night), 1);
        assert_eq!(t.minimum(Position::Housekeeping, Shift::Night), 0);
        assert_eq!(t.minimum(Position::FrontDesk, Shift::Rest), 0);
        assert_eq!(t.positions().count(), Position::ALL.len());
    }

    #[test]
    fn test_with_minimum() {
        let t = StaffingTable::empty()
            .with_minimum(Position::Kitchen, Shift::Afternoon, 4)
            .with_minimum(Position::Kitchen, Shift::Rest, 9);
        assert_eq!(t.minimum(Position::Kitchen, Shift::Afternoon), 4);
        assert_eq!(t.minimum(Position::Kitchen, Shift::Morning), 0);
        assert_eq!(t.row(Position::Kitchen).total(), 4);
        assert_eq!(t.minimum(Position::Security, Shift::Night), 0);
    }

    #[test]
    fn test_total_saturates() {
        let row = ShiftMinimums::new(u32::MAX, 1, 1);
        assert_eq!(row.total(), u32::MAX);
    }

    #[test]
    fn test_json_shape() {
        let t = StaffingTable::empty()
            .with_position(Position::Security, ShiftMinimums::new(1, 1, 1));
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"SECURITY": {"morning": 1, "afternoon": 1, "night": 1}})
        );

        let parsed: StaffingTable =
            serde_json::from_str(r#"{"KITCHEN": {"morning": 3}}"#).unwrap();
        assert_eq!(parsed.minimum(Position::Kitchen, Shift::Morning), 3);
        assert_eq!(parsed.minimum(Position::Kitchen, Shift::Night), 0);
    }
}
