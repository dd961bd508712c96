//! Scheduler configuration.
//!
//! One immutable value carries every tunable: staffing minimums, rest cap,
//! shift windows, solver budget and lock timeouts. It is passed into the
//! scheduler explicitly, so tests can inject their own tables.
//!
//! Loadable from JSON; every field has a default, so a file only needs
//! the parts it overrides:
//!
//! ```json
//! {
//!   "rest_cap": 2,
//!   "staffing": { "FRONT_DESK": { "morning": 2, "afternoon": 2, "night": 1 } },
//!   "solver": { "time_limit_ms": 5000, "max_nodes": 1000000, "seed": 7 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cp::SolverConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Shift, ShiftCatalogue, StaffingTable, WEEK_DAYS};

/// Largest minimum headcount accepted for a single cell.
pub const MAX_SHIFT_MINIMUM: u32 = 10_000;

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum headcount per position and working shift.
    pub staffing: StaffingTable,
    /// Maximum REST days per employee in a generated week.
    pub rest_cap: u32,
    /// Wall-clock windows of the working shifts.
    pub shifts: ShiftCatalogue,
    /// Solver budget.
    pub solver: SolverConfig,
    /// How long generation and edits wait for overlapping work (ms).
    pub lock_timeout_ms: u64,
    /// Extra time granted to the solver beyond its own budget before the
    /// generator abandons it (ms).
    pub solve_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            staffing: StaffingTable::default(),
            rest_cap: 2,
            shifts: ShiftCatalogue::default(),
            solver: SolverConfig::default(),
            lock_timeout_ms: 5_000,
            solve_grace_ms: 1_000,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> ScheduleResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ScheduleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ScheduleResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// Sets the staffing table.
    pub fn with_staffing(mut self, staffing: StaffingTable) -> Self {
        self.staffing = staffing;
        self
    }

    /// Sets the rest cap.
    pub fn with_rest_cap(mut self, rest_cap: u32) -> Self {
        self.rest_cap = rest_cap;
        self
    }

    /// Sets the solver configuration.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the lock wait timeout.
    pub fn with_lock_timeout_ms(mut self, ms: u64) -> Self {
        self.lock_timeout_ms = ms;
        self
    }

    /// Lock wait timeout.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Longest the generator waits for a verdict.
    pub fn solve_deadline(&self) -> Duration {
        Duration::from_millis(self.solver.time_limit_ms.saturating_add(self.solve_grace_ms))
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.rest_cap as u64 > WEEK_DAYS {
            return Err(ScheduleError::Config(format!(
                "rest_cap {} exceeds the {WEEK_DAYS}-day horizon",
                self.rest_cap
            )));
        }
        for position in self.staffing.positions() {
            for shift in Shift::WORKING {
                let minimum = self.staffing.minimum(position, shift);
                if minimum > MAX_SHIFT_MINIMUM {
                    return Err(ScheduleError::Config(format!(
                        "{position} {shift} minimum {minimum} exceeds {MAX_SHIFT_MINIMUM}"
                    )));
                }
            }
        }
        for shift in Shift::WORKING {
            if let Some(window) = self.shifts.window(shift) {
                if window.length_minutes == 0 || window.length_minutes > 24 * 60 {
                    return Err(ScheduleError::Config(format!(
                        "{shift} shift length must be 1..=1440 minutes, got {}",
                        window.length_minutes
                    )));
                }
            }
        }
        if self.solver.time_limit_ms == 0 || self.solver.max_nodes == 0 {
            return Err(ScheduleError::Config(
                "solver budget must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    #[test]
    fn test_default_is_valid() {
        let c = SchedulerConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.rest_cap, 2);
        assert_eq!(c.solve_deadline(), Duration::from_millis(11_000));
    }

    #[test]
    fn test_partial_json() {
        let c = SchedulerConfig::from_json_str(
            r#"{
                "rest_cap": 1,
                "staffing": { "SECURITY": { "night": 2 } },
                "solver": { "time_limit_ms": 500, "max_nodes": 1000, "seed": 3 }
            }"#,
        )
        .unwrap();
        assert_eq!(c.rest_cap, 1);
        assert_eq!(c.staffing.minimum(Position::Security, Shift::Night), 2);
        assert_eq!(c.staffing.minimum(Position::FrontDesk, Shift::Morning), 0);
        assert_eq!(c.solver.seed, 3);
        assert_eq!(c.lock_timeout_ms, 5_000);
    }

    #[test]
    fn test_unknown_position_rejected() {
        let err = SchedulerConfig::from_json_str(r#"{"staffing": {"SPA": {"morning": 1}}}"#)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SchedulerConfig::from_json_str(r#"{"rest_cap": 8}"#).unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));

        let err = SchedulerConfig::from_json_str(
            r#"{"shifts": {
                "morning": {"start": "07:00:00", "length_minutes": 0},
                "afternoon": {"start": "15:00:00", "length_minutes": 480},
                "night": {"start": "23:00:00", "length_minutes": 480}
            }}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("MORNING"));
    }

    #[test]
    fn test_oversized_minimum_rejected() {
        let err = SchedulerConfig::from_json_str(
            r#"{"staffing": {"KITCHEN": {"morning": 4294967295, "afternoon": 1}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
        assert!(err.to_string().contains("KITCHEN"));
    }

    #[test]
    fn test_missing_file() {
        let err = SchedulerConfig::from_json_file("/nonexistent/u-shift.json").unwrap_err();
        assert!(matches!(err, ScheduleError::Config(_)));
    }

    #[test]
    fn test_json_round_trip() {
        let c = SchedulerConfig::default().with_rest_cap(1);
        let text = serde_json::to_string(&c).unwrap();
        let back = SchedulerConfig::from_json_str(&text).unwrap();
        assert_eq!(back.rest_cap, 1);
        assert_eq!(back.staffing, c.staffing);
        assert_eq!(back.shifts, c.shifts);
    }
}
