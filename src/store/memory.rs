//! In-memory roster and assignment store.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{AssignmentStore, RosterProvider};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Assignment, AssignmentId, DateRange, Employee, EmployeeId, Position, Shift};

fn poisoned(what: &str) -> ScheduleError {
    ScheduleError::ConcurrentModification(format!("{what} lock poisoned"))
}

/// Roster held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    employees: RwLock<Vec<Employee>>,
}

impl InMemoryRoster {
    /// Creates a roster.
    pub fn new(employees: Vec<Employee>) -> Self {
        Self {
            employees: RwLock::new(employees),
        }
    }

    /// Inserts or replaces an employee by ID.
    pub fn upsert(&self, employee: Employee) -> ScheduleResult<()> {
        let mut guard = self.employees.write().map_err(|_| poisoned("roster"))?;
        match guard.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee,
            None => guard.push(employee),
        }
        Ok(())
    }
}

impl RosterProvider for InMemoryRoster {
    fn list_active_employees_by_positions(
        &self,
        positions: &[Position],
    ) -> ScheduleResult<Vec<Employee>> {
        let guard = self.employees.read().map_err(|_| poisoned("roster"))?;
        Ok(guard
            .iter()
            .filter(|e| e.active && positions.contains(&e.position))
            .cloned()
            .collect())
    }

    fn find_employee(&self, id: EmployeeId) -> ScheduleResult<Option<Employee>> {
        let guard = self.employees.read().map_err(|_| poisoned("roster"))?;
        Ok(guard.iter().find(|e| e.id == id).cloned())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    rows: HashMap<AssignmentId, Assignment>,
    windows: Vec<DateRange>,
}

impl StoreState {
    fn rows_for(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> impl Iterator<Item = &Assignment> {
        self.rows
            .values()
            .filter(move |a| a.employee_id == employee_id && a.date == date)
    }

    fn check_version(&self, id: AssignmentId, expected: u64) -> ScheduleResult<()> {
        let stored = self.rows.get(&id).ok_or(ScheduleError::NotFound(id))?;
        if stored.version != expected {
            return Err(ScheduleError::ConcurrentModification(format!(
                "assignment {id} is at version {}, caller read {expected}",
                stored.version
            )));
        }
        Ok(())
    }
}

/// Assignment store held in memory.
///
/// A single `RwLock` makes every write, including `replace_range`, atomic
/// with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows.
    pub fn len(&self) -> ScheduleResult<usize> {
        Ok(self.read()?.rows.len())
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> ScheduleResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> ScheduleResult<RwLockReadGuard<'_, StoreState>> {
        self.state.read().map_err(|_| poisoned("store"))
    }

    fn write(&self) -> ScheduleResult<RwLockWriteGuard<'_, StoreState>> {
        self.state.write().map_err(|_| poisoned("store"))
    }

    /// Inserts a row without the uniqueness check, to simulate corrupt data.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, assignment: Assignment) {
        if let Ok(mut state) = self.write() {
            state.rows.insert(assignment.id, assignment);
        }
    }
}

fn sorted(mut rows: Vec<Assignment>) -> Vec<Assignment> {
    rows.sort_by_key(|a| (a.date, a.employee_id, a.shift));
    rows
}

impl AssignmentStore for InMemoryStore {
    fn get(&self, id: AssignmentId) -> ScheduleResult<Option<Assignment>> {
        Ok(self.read()?.rows.get(&id).cloned())
    }

    fn find_by_employee_date(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> ScheduleResult<Vec<Assignment>> {
        let state = self.read()?;
        Ok(sorted(state.rows_for(employee_id, date).cloned().collect()))
    }

    fn list_range(&self, range: DateRange) -> ScheduleResult<Vec<Assignment>> {
        let state = self.read()?;
        Ok(sorted(
            state
                .rows
                .values()
                .filter(|a| range.contains(a.date))
                .cloned()
                .collect(),
        ))
    }

    fn list_for_employee(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
    ) -> ScheduleResult<Vec<Assignment>> {
        let state = self.read()?;
        Ok(sorted(
            state
                .rows
                .values()
                .filter(|a| a.employee_id == employee_id && range.contains(a.date))
                .cloned()
                .collect(),
        ))
    }

    fn count_coverage(
        &self,
        position: Position,
        date: NaiveDate,
        shift: Shift,
    ) -> ScheduleResult<usize> {
        let state = self.read()?;
        Ok(state
            .rows
            .values()
            .filter(|a| a.covers(position, date, shift))
            .count())
    }

    fn insert(&self, assignment: Assignment) -> ScheduleResult<Assignment> {
        let mut state = self.write()?;
        let existing = state.rows_for(assignment.employee_id, assignment.date).count();
        if existing > 0 {
            return Err(ScheduleError::DuplicateAssignment {
                employee_id: assignment.employee_id,
                date: assignment.date,
                count: existing,
            });
        }
        if state.rows.contains_key(&assignment.id) {
            return Err(ScheduleError::ConcurrentModification(format!(
                "assignment {} already exists",
                assignment.id
            )));
        }
        state.rows.insert(assignment.id, assignment.clone());
        Ok(assignment)
    }

    fn update(&self, assignment: Assignment) -> ScheduleResult<Assignment> {
        let mut state = self.write()?;
        state.check_version(assignment.id, assignment.version)?;

        let updated = Assignment {
            version: assignment.version + 1,
            ..assignment
        };
        state.rows.insert(updated.id, updated.clone());
        Ok(updated)
    }

    fn delete(&self, id: AssignmentId, expected_version: u64) -> ScheduleResult<()> {
        let mut state = self.write()?;
        state.check_version(id, expected_version)?;
        state.rows.remove(&id);
        Ok(())
    }

    fn replace_range(&self, range: DateRange, rows: Vec<Assignment>) -> ScheduleResult<()> {
        let mut seen = HashSet::new();
        for a in &rows {
            if !range.contains(a.date) {
                return Err(ScheduleError::InvalidDateRange {
                    start: range.start(),
                    end: range.end(),
                });
            }
            if !seen.insert((a.employee_id, a.date)) {
                return Err(ScheduleError::DuplicateAssignment {
                    employee_id: a.employee_id,
                    date: a.date,
                    count: 2,
                });
            }
        }

        let mut state = self.write()?;
        state.rows.retain(|_, a| !range.contains(a.date));
        state.rows.extend(rows.into_iter().map(|a| (a.id, a)));
        state.windows.retain(|w| !w.overlaps(&range));
        state.windows.push(range);
        Ok(())
    }

    fn generated_window_containing(&self, date: NaiveDate) -> ScheduleResult<Option<DateRange>> {
        let state = self.read()?;
        Ok(state.windows.iter().find(|w| w.contains(date)).copied())
    }
}
