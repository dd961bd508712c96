//! Shift constraint model builder.
//!
//! Translates employees × days × shifts into a boolean [`CpModel`]:
//!
//! - one variable per `(employee, date, shift)`
//! - exactly one shift (REST included) per employee and day
//! - per `(position, date, working shift)`, headcount ≥ minimum
//! - per employee, REST days over the range ≤ rest cap
//!
//! Plus one implied constraint per `(position, date)`: REST headcount ≤
//! staff − sum of that day's minimums. It follows from the others, but lets
//! the solver refute an understaffed position without searching.
//!
//! Variables are created date-major so the solver settles one day before
//! moving to the next.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::cp::{BoolVar, CpModel, CpSolution};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    Assignment, DateRange, Employee, EmployeeId, Position, Schedule, Shift, StaffingTable,
};

/// Builds the weekly rostering model.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_shift::models::{DateRange, Employee, Position, StaffingTable, ShiftMinimums};
/// use u_shift::scheduler::ShiftModelBuilder;
///
/// let employees = vec![
///     Employee::new(1, "Ana", Position::Security),
///     Employee::new(2, "Ben", Position::Security),
/// ];
/// let staffing = StaffingTable::empty()
///     .with_position(Position::Security, ShiftMinimums::new(1, 0, 1));
/// let week = DateRange::week(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()).unwrap();
///
/// let shift_model = ShiftModelBuilder::new(&employees, week, &staffing).build();
/// assert_eq!(shift_model.model().var_count(), 2 * 7 * 4);
/// ```
pub struct ShiftModelBuilder<'a> {
    employees: &'a [Employee],
    range: DateRange,
    staffing: &'a StaffingTable,
    rest_cap: u32,
}

impl<'a> ShiftModelBuilder<'a> {
    /// Default REST days allowed per employee over the range.
    pub const DEFAULT_REST_CAP: u32 = 2;

    /// Creates a builder.
    pub fn new(employees: &'a [Employee], range: DateRange, staffing: &'a StaffingTable) -> Self {
        Self {
            employees,
            range,
            staffing,
            rest_cap: Self::DEFAULT_REST_CAP,
        }
    }

    /// Sets the REST cap.
    pub fn with_rest_cap(mut self, rest_cap: u32) -> Self {
        self.rest_cap = rest_cap;
        self
    }

    /// Builds the model.
    pub fn build(&self) -> ShiftModel {
        let mut model = CpModel::new(format!("roster-{}", self.range.start()));
        let dates: Vec<NaiveDate> = self.range.days().collect();

        // Employees grouped by position keep each coverage sum contiguous.
        let mut staff: Vec<(EmployeeId, Position)> =
            self.employees.iter().map(|e| (e.id, e.position)).collect();
        staff.sort_by_key(|&(id, position)| (position, id));

        let mut vars: Vec<Vec<[BoolVar; 4]>> = Vec::with_capacity(dates.len());
        for date in &dates {
            let mut day = Vec::with_capacity(staff.len());
            for (id, _) in &staff {
                let cell = Shift::ALL.map(|s| model.add_bool_var(format!("{id}@{date}:{s}")));
                model.add_exactly_one(cell.to_vec());
                day.push(cell);
            }
            vars.push(day);
        }

        let mut by_position: BTreeMap<Position, Vec<usize>> = BTreeMap::new();
        for (ei, (_, position)) in staff.iter().enumerate() {
            by_position.entry(*position).or_default().push(ei);
        }

        for position in self.staffing.positions() {
            let members = by_position.get(&position).map(Vec::as_slice).unwrap_or(&[]);
            let row = self.staffing.row(position);

            for day in &vars {
                for shift in Shift::WORKING {
                    let minimum = row.get(shift);
                    if minimum == 0 {
                        continue;
                    }
                    let cover = members.iter().map(|&ei| day[ei][shift.index()]).collect();
                    model.add_linear_at_least(cover, minimum);
                }

                if row.total() > 0 {
                    // Σ working = |members| − Σ rest, so Σ rest ≤ |members| − Σ minimums.
                    let rests: Vec<BoolVar> = members
                        .iter()
                        .map(|&ei| day[ei][Shift::Rest.index()])
                        .collect();
                    match u32::try_from(members.len() as i64 - i64::from(row.total())) {
                        Ok(slack) => model.add_linear_at_most(rests, slack),
                        // Negative slack: state the contradiction as an unreachable lower bound.
                        Err(_) => {
                            let unreachable = rests.len() as u32 + 1;
                            model.add_linear_at_least(rests, unreachable);
                        }
                    }
                }
            }
        }

        let rest = Shift::Rest.index();
        for ei in 0..staff.len() {
            let rests = vars.iter().map(|day| day[ei][rest]).collect();
            model.add_linear_at_most(rests, self.rest_cap);
        }

        ShiftModel {
            model,
            range: self.range,
            dates,
            staff,
            vars,
        }
    }
}

/// A built model plus the mapping back to the domain.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    model: CpModel,
    range: DateRange,
    dates: Vec<NaiveDate>,
    staff: Vec<(EmployeeId, Position)>,
    /// `vars[day][employee][shift]`
    vars: Vec<Vec<[BoolVar; 4]>>,
}

impl ShiftModel {
    /// The underlying CP model.
    pub fn model(&self) -> &CpModel {
        &self.model
    }

    /// Consumes self, returning the CP model.
    pub fn into_model(self) -> CpModel {
        self.model
    }

    /// Variable for `(employee, date, shift)`, if both are in the model.
    pub fn var(&self, employee_id: EmployeeId, date: NaiveDate, shift: Shift) -> Option<BoolVar> {
        let ei = self.staff.iter().position(|(id, _)| *id == employee_id)?;
        let di = self.dates.iter().position(|d| *d == date)?;
        Some(self.vars[di][ei][shift.index()])
    }

    /// Reads one assignment per `(employee, date)` out of a solution.
    ///
    /// Fails with `InvalidSolution` unless exactly one shift variable of
    /// every employee-day is true.
    pub fn decode(&self, solution: &CpSolution) -> ScheduleResult<Schedule> {
        if !solution.is_solution_found() || solution.values.len() != self.model.var_count() {
            return Err(ScheduleError::InvalidSolution(format!(
                "expected {} values with a found solution, got {} ({:?})",
                self.model.var_count(),
                solution.values.len(),
                solution.status
            )));
        }

        let mut assignments = Vec::with_capacity(self.dates.len() * self.staff.len());
        for (di, date) in self.dates.iter().enumerate() {
            for (ei, (employee_id, position)) in self.staff.iter().enumerate() {
                let chosen: Vec<Shift> = Shift::ALL
                    .into_iter()
                    .filter(|s| solution.value(self.vars[di][ei][s.index()]))
                    .collect();
                let [shift] = chosen.as_slice() else {
                    return Err(ScheduleError::InvalidSolution(format!(
                        "employee {employee_id} has {} shifts on {date}",
                        chosen.len()
                    )));
                };
                assignments.push(Assignment::new(*employee_id, *position, *date, *shift));
            }
        }

        Ok(Schedule::new(self.range, assignments))
    }
}
