//! Incremental edits to a persisted schedule.
//!
//! Each edit locks the assignment's day, re-reads what it needs and then
//! writes, so two edits that both re-check coverage of the same day cannot
//! both pass on stale counts. An edit into REST locks the employee's whole
//! rest-cap window instead, since its check reads every day of it.
//!
//! # Rules
//!
//! | Edit | Rejected when |
//! |------|---------------|
//! | create | employee unknown or inactive; a row already exists that day; REST would exceed the rest cap |
//! | update | row missing; vacating a working shift drops it below minimum; moving to REST exceeds the rest cap |
//! | delete | row missing; removing a working shift drops it below minimum |
//!
//! The rest cap is counted over the generated window holding the date, or
//! the Monday-started week when no generated window covers it.

use chrono::NaiveDate;
use std::sync::Arc;

use tracing::{info, warn};

use super::CoverageShortfall;
use crate::config::SchedulerConfig;
use crate::error::{ScheduleError, ScheduleResult};
use crate::locks::{DateLockGuard, DateLocks};
use crate::models::{Assignment, AssignmentId, DateRange, EmployeeId, Shift};
use crate::store::{AssignmentStore, RosterProvider};

/// Outcome of a single-row creation.
#[derive(Debug, Clone)]
pub struct CreatedAssignment {
    /// The stored row.
    pub assignment: Assignment,
    /// Set when the cell is still below its minimum after the insert.
    pub shortfall: Option<CoverageShortfall>,
}

/// Applies single-row edits under the date lock.
#[derive(Clone)]
pub struct ScheduleEditor {
    roster: Arc<dyn RosterProvider>,
    store: Arc<dyn AssignmentStore>,
    locks: Arc<DateLocks>,
    config: Arc<SchedulerConfig>,
}

impl ScheduleEditor {
    pub fn new(
        roster: Arc<dyn RosterProvider>,
        store: Arc<dyn AssignmentStore>,
        locks: Arc<DateLocks>,
        config: Arc<SchedulerConfig>,
    ) -> Self {
        Self {
            roster,
            store,
            locks,
            config,
        }
    }

    /// Adds one assignment for an employee who has none that day.
    ///
    /// A working shift is accepted even if the cell stays understaffed; the
    /// shortfall is logged and returned so the caller can react.
    pub fn create_single(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        shift: Shift,
    ) -> ScheduleResult<CreatedAssignment> {
        let employee = self
            .roster
            .find_employee(employee_id)?
            .ok_or(ScheduleError::EmployeeNotFound(employee_id))?;
        if !employee.active {
            return Err(ScheduleError::InactiveEmployee(employee_id));
        }

        let (_guard, rest_window) = self.lock_edit(date, shift)?;

        let existing = self.store.find_by_employee_date(employee_id, date)?;
        if !existing.is_empty() {
            return Err(ScheduleError::DuplicateAssignment {
                employee_id,
                date,
                count: existing.len(),
            });
        }
        if let Some(window) = rest_window {
            self.check_rest_cap(employee_id, date, window, None)?;
        }

        let assignment = self
            .store
            .insert(Assignment::new(employee_id, employee.position, date, shift))?;

        let mut shortfall = None;
        if shift.is_working() {
            let on_duty = self.store.count_coverage(employee.position, date, shift)?;
            let minimum = self.config.staffing.minimum(employee.position, shift);
            if on_duty < minimum as usize {
                warn!(
                    position = %employee.position,
                    %date,
                    %shift,
                    on_duty,
                    minimum,
                    "cell still below minimum after insert"
                );
                shortfall = Some(CoverageShortfall {
                    position: employee.position,
                    date,
                    shift,
                    on_duty,
                    minimum,
                });
            }
        }

        info!(
            id = %assignment.id,
            employee = %employee_id,
            %date,
            %shift,
            "assignment created"
        );
        Ok(CreatedAssignment {
            assignment,
            shortfall,
        })
    }

    /// Moves an assignment to another shift on the same day.
    ///
    /// Returns the stored row unchanged when `new_shift` equals its
    /// current shift.
    pub fn update_shift(&self, id: AssignmentId, new_shift: Shift) -> ScheduleResult<Assignment> {
        let seen = self.store.get(id)?.ok_or(ScheduleError::NotFound(id))?;
        let (_guard, rest_window) = self.lock_edit(seen.date, new_shift)?;
        let current = self.reread(&seen)?;

        let same_day = self
            .store
            .find_by_employee_date(current.employee_id, current.date)?;
        if same_day.len() > 1 {
            return Err(ScheduleError::DuplicateAssignment {
                employee_id: current.employee_id,
                date: current.date,
                count: same_day.len(),
            });
        }

        if current.shift == new_shift {
            return Ok(current);
        }
        if current.shift.is_working() {
            self.check_vacate(&current)?;
        }
        if let Some(window) = rest_window {
            self.check_rest_cap(current.employee_id, current.date, window, Some(current.id))?;
        }

        let old_shift = current.shift;
        let updated = self.store.update(Assignment {
            shift: new_shift,
            ..current
        })?;
        info!(%id, from = %old_shift, to = %new_shift, "assignment updated");
        Ok(updated)
    }

    /// Removes an assignment.
    pub fn delete_schedule(&self, id: AssignmentId) -> ScheduleResult<()> {
        let seen = self.store.get(id)?.ok_or(ScheduleError::NotFound(id))?;
        let _guard = self
            .locks
            .lock(DateRange::day(seen.date), self.config.lock_timeout())?;
        let current = self.reread(&seen)?;

        if current.shift.is_working() {
            self.check_vacate(&current)?;
        }
        self.store.delete(id, current.version)?;
        info!(%id, employee = %current.employee_id, date = %current.date, "assignment deleted");
        Ok(())
    }

    /// Locks what an edit to `shift` on `date` reads: the day itself, or
    /// for REST the rest-cap window holding it, which is returned.
    fn lock_edit(
        &self,
        date: NaiveDate,
        shift: Shift,
    ) -> ScheduleResult<(DateLockGuard<'_>, Option<DateRange>)> {
        if shift != Shift::Rest {
            let guard = self.locks.lock(DateRange::day(date), self.config.lock_timeout())?;
            return Ok((guard, None));
        }

        let window = self.rest_window(date)?;
        let guard = self.locks.lock(window, self.config.lock_timeout())?;
        // a generation may have replaced the window while we waited
        if self.rest_window(date)? != window {
            return Err(ScheduleError::ConcurrentModification(format!(
                "rest-cap window around {date} changed while waiting"
            )));
        }
        Ok((guard, Some(window)))
    }

    /// The generated window holding `date`, else its Monday-started week.
    fn rest_window(&self, date: NaiveDate) -> ScheduleResult<DateRange> {
        match self.store.generated_window_containing(date)? {
            Some(window) => Ok(window),
            None => DateRange::iso_week_of(date),
        }
    }

    /// Fetches the row again now that its day is locked. Any change since
    /// the unlocked read fails the edit; the caller retries from scratch.
    fn reread(&self, seen: &Assignment) -> ScheduleResult<Assignment> {
        let current = self
            .store
            .get(seen.id)?
            .ok_or(ScheduleError::NotFound(seen.id))?;
        if current.date != seen.date || current.version != seen.version {
            return Err(ScheduleError::ConcurrentModification(format!(
                "assignment {} changed while waiting for {}",
                seen.id, seen.date
            )));
        }
        Ok(current)
    }

    /// Rejects removing `assignment` from its cell if that leaves the cell
    /// below its minimum.
    fn check_vacate(&self, assignment: &Assignment) -> ScheduleResult<()> {
        let on_duty =
            self.store
                .count_coverage(assignment.position, assignment.date, assignment.shift)?;
        let remaining = on_duty.saturating_sub(1);
        let minimum = self
            .config
            .staffing
            .minimum(assignment.position, assignment.shift);
        if remaining < minimum as usize {
            warn!(
                id = %assignment.id,
                position = %assignment.position,
                date = %assignment.date,
                shift = %assignment.shift,
                remaining,
                minimum,
                "edit rejected: coverage"
            );
            return Err(ScheduleError::CoverageViolation {
                position: assignment.position,
                date: assignment.date,
                shift: assignment.shift,
                remaining,
                minimum,
            });
        }
        Ok(())
    }

    /// Rejects one more REST day in `window` for the employee if it would
    /// exceed the cap. `replacing` is the row being turned into REST, if any.
    fn check_rest_cap(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        window: DateRange,
        replacing: Option<AssignmentId>,
    ) -> ScheduleResult<()> {
        let rest_days = self
            .store
            .list_for_employee(employee_id, window)?
            .iter()
            .filter(|a| a.shift == Shift::Rest && Some(a.id) != replacing)
            .count()
            + 1;
        let cap = self.config.rest_cap;
        if rest_days > cap as usize {
            warn!(employee = %employee_id, %date, rest_days, cap, "edit rejected: rest cap");
            return Err(ScheduleError::RestCapViolation {
                employee_id,
                week_start: window.start(),
                rest_days,
                cap,
            });
        }
        Ok(())
    }
}
