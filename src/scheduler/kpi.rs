//! Roster quality metrics.
//!
//! Computes staffing indicators from a set of assignments and the
//! staffing table they were planned against.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Headcount | On-duty count per (position, date, working shift) |
//! | Shortfalls | Cells whose headcount is below the minimum |
//! | Coverage rate | Fraction of required cells that meet their minimum |
//! | Rest days | REST assignments per employee |
//! | Surplus | Σ max(0, headcount − minimum) over required cells |

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Assignment, DateRange, EmployeeId, Position, Shift, StaffingTable};

/// A `(position, date, shift)` cell below its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageShortfall {
    pub position: Position,
    pub date: NaiveDate,
    pub shift: Shift,
    /// Current headcount.
    pub on_duty: usize,
    /// Configured minimum.
    pub minimum: u32,
}

/// Roster performance indicators.
#[derive(Debug, Clone)]
pub struct ScheduleKpi {
    /// Number of assignments considered.
    pub assignment_count: usize,
    /// Headcount per working cell (cells with nobody on duty are omitted).
    pub headcount: BTreeMap<(Position, NaiveDate, Shift), usize>,
    /// Cells below their minimum.
    pub shortfalls: Vec<CoverageShortfall>,
    /// Fraction of required cells meeting their minimum (1.0 if none required).
    pub coverage_rate: f64,
    /// REST days per employee.
    pub rest_days: BTreeMap<EmployeeId, usize>,
    /// Staff on duty beyond the minimums.
    pub surplus: usize,
}

impl ScheduleKpi {
    /// Computes KPIs over `range`.
    ///
    /// Assignments dated outside the range are ignored.
    pub fn calculate(
        assignments: &[Assignment],
        range: DateRange,
        staffing: &StaffingTable,
    ) -> Self {
        let mut headcount: BTreeMap<(Position, NaiveDate, Shift), usize> = BTreeMap::new();
        let mut rest_days: HashMap<EmployeeId, usize> = HashMap::new();
        let mut assignment_count = 0;

        for a in assignments.iter().filter(|a| range.contains(a.date)) {
            assignment_count += 1;
            if a.shift.is_working() {
                *headcount.entry((a.position, a.date, a.shift)).or_insert(0) += 1;
            } else {
                *rest_days.entry(a.employee_id).or_insert(0) += 1;
            }
        }

        let mut shortfalls = Vec::new();
        let mut required_cells = 0usize;
        let mut surplus = 0usize;

        for position in staffing.positions() {
            for date in range.days() {
                for shift in Shift::WORKING {
                    let minimum = staffing.minimum(position, shift);
                    if minimum == 0 {
                        continue;
                    }
                    required_cells += 1;
                    let on_duty = headcount.get(&(position, date, shift)).copied().unwrap_or(0);
                    if on_duty < minimum as usize {
                        shortfalls.push(CoverageShortfall {
                            position,
                            date,
                            shift,
                            on_duty,
                            minimum,
                        });
                    } else {
                        surplus += on_duty - minimum as usize;
                    }
                }
            }
        }

        let coverage_rate = if required_cells == 0 {
            1.0
        } else {
            (required_cells - shortfalls.len()) as f64 / required_cells as f64
        };

        Self {
            assignment_count,
            headcount,
            shortfalls,
            coverage_rate,
            rest_days: rest_days.into_iter().collect(),
            surplus,
        }
    }

    /// Whether every required cell meets its minimum.
    pub fn is_fully_covered(&self) -> bool {
        self.shortfalls.is_empty()
    }

    /// Largest REST count of any employee.
    pub fn max_rest_days(&self) -> usize {
        self.rest_days.values().copied().max().unwrap_or(0)
    }
}
