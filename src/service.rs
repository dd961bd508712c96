//! Caller-facing facade.
//!
//! [`ShiftService`] wires the generator, editor and query layer to one
//! roster, one store, one lock table and one configuration, and exposes
//! the operations a host application calls.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::cp::{BacktrackingSolver, CpSolver};
use crate::error::ScheduleResult;
use crate::locks::DateLocks;
use crate::models::{Assignment, AssignmentId, DateRange, EmployeeId, Position, Schedule, Shift};
use crate::scheduler::{
    CreatedAssignment, EmployeeWeek, ScheduleEditor, ScheduleKpi, ScheduleQuery, WeekFilter,
    WeeklyScheduler,
};
use crate::store::{AssignmentStore, RosterProvider};

/// Shift scheduling service.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use u_shift::config::SchedulerConfig;
/// use u_shift::models::{Employee, Position, ShiftMinimums, StaffingTable};
/// use u_shift::service::ShiftService;
/// use u_shift::store::{InMemoryRoster, InMemoryStore};
///
/// let roster = Arc::new(InMemoryRoster::new(vec![
///     Employee::new(1, "Ana", Position::Security),
///     Employee::new(2, "Ben", Position::Security),
/// ]));
/// let staffing = StaffingTable::empty()
///     .with_position(Position::Security, ShiftMinimums::new(1, 0, 0));
/// let config = SchedulerConfig::default().with_staffing(staffing);
/// let service = ShiftService::new(roster, Arc::new(InMemoryStore::new()), config).unwrap();
///
/// let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
/// let week = service.generate_week(monday).unwrap();
/// assert_eq!(week.assignment_count(), 14);
/// ```
#[derive(Clone)]
pub struct ShiftService {
    generator: WeeklyScheduler,
    editor: ScheduleEditor,
    query: ScheduleQuery,
    store: Arc<dyn AssignmentStore>,
    config: Arc<SchedulerConfig>,
}

impl ShiftService {
    /// Creates a service backed by the built-in solver.
    ///
    /// Fails with `Config` if the configuration is inconsistent.
    pub fn new(
        roster: Arc<dyn RosterProvider>,
        store: Arc<dyn AssignmentStore>,
        config: SchedulerConfig,
    ) -> ScheduleResult<Self> {
        Self::with_solver(roster, store, Arc::new(BacktrackingSolver::new()), config)
    }

    /// Creates a service backed by the given solver.
    pub fn with_solver(
        roster: Arc<dyn RosterProvider>,
        store: Arc<dyn AssignmentStore>,
        solver: Arc<dyn CpSolver>,
        config: SchedulerConfig,
    ) -> ScheduleResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let locks = Arc::new(DateLocks::new());

        Ok(Self {
            generator: WeeklyScheduler::new(
                Arc::clone(&roster),
                Arc::clone(&store),
                solver,
                Arc::clone(&locks),
                Arc::clone(&config),
            ),
            editor: ScheduleEditor::new(
                roster,
                Arc::clone(&store),
                locks,
                Arc::clone(&config),
            ),
            query: ScheduleQuery::new(Arc::clone(&store), config.shifts.clone()),
            store,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Generates and persists the week starting at `start`.
    pub fn generate_week(&self, start: NaiveDate) -> ScheduleResult<Schedule> {
        self.generator.generate_week(start)
    }

    /// Generates the week, giving up if `cancel` is raised before the
    /// result is persisted.
    pub fn generate_week_cancellable(
        &self,
        start: NaiveDate,
        cancel: &AtomicBool,
    ) -> ScheduleResult<Schedule> {
        self.generator.generate_week_cancellable(start, cancel)
    }

    pub fn create_single(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        shift: Shift,
    ) -> ScheduleResult<CreatedAssignment> {
        self.editor.create_single(employee_id, date, shift)
    }

    pub fn update_shift(&self, id: AssignmentId, new_shift: Shift) -> ScheduleResult<Assignment> {
        self.editor.update_shift(id, new_shift)
    }

    pub fn delete_schedule(&self, id: AssignmentId) -> ScheduleResult<()> {
        self.editor.delete_schedule(id)
    }

    pub fn on_duty_at(
        &self,
        instant: NaiveDateTime,
        position: Position,
    ) -> ScheduleResult<Vec<Assignment>> {
        self.query.on_duty_at(instant, position)
    }

    pub fn schedule_for_employee(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
    ) -> ScheduleResult<Vec<Assignment>> {
        self.query.schedule_for_employee(employee_id, range)
    }

    pub fn schedule_for_week(
        &self,
        start: NaiveDate,
        filter: &WeekFilter,
    ) -> ScheduleResult<Vec<EmployeeWeek>> {
        self.query.schedule_for_week(start, filter)
    }

    /// Staffing metrics of the stored week starting at `start`.
    pub fn week_kpi(&self, start: NaiveDate) -> ScheduleResult<ScheduleKpi> {
        let range = DateRange::week(start)?;
        let rows = self.store.list_range(range)?;
        Ok(ScheduleKpi::calculate(&rows, range, &self.config.staffing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;
    use crate::models::{Employee, ShiftMinimums, StaffingTable};
    use crate::store::{InMemoryRoster, InMemoryStore};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn service(employees: Vec<Employee>, config: SchedulerConfig) -> ShiftService {
        ShiftService::new(
            Arc::new(InMemoryRoster::new(employees)),
            Arc::new(InMemoryStore::new()),
            config,
        )
        .unwrap()
    }

    fn hotel() -> Vec<Employee> {
        let mut staff = Vec::new();
        let mut next = 1;
        for (position, count) in [
            (Position::FrontDesk, 7),
            (Position::Security, 5),
            (Position::Kitchen, 6),
        ] {
            for _ in 0..count {
                staff.push(Employee::new(next, format!("{position} {next}"), position));
                next += 1;
            }
        }
        staff
    }

    fn hotel_table() -> StaffingTable {
        StaffingTable::empty()
            .with_position(Position::FrontDesk, ShiftMinimums::new(2, 2, 1))
            .with_position(Position::Security, ShiftMinimums::new(1, 1, 1))
            .with_position(Position::Kitchen, ShiftMinimums::new(2, 2, 0))
    }

    #[test]
    fn test_rejects_bad_config() {
        let result = ShiftService::new(
            Arc::new(InMemoryRoster::default()),
            Arc::new(InMemoryStore::new()),
            SchedulerConfig::default().with_rest_cap(9),
        );
        assert!(matches!(result, Err(ScheduleError::Config(_))));
    }

    #[test]
    fn test_generate_then_query() {
        let svc = service(hotel(), SchedulerConfig::default().with_staffing(hotel_table()));
        let week = svc.generate_week(d(4)).unwrap();
        assert_eq!(week.assignment_count(), hotel().len() * 7);

        let kpi = svc.week_kpi(d(4)).unwrap();
        assert!(kpi.is_fully_covered());
        assert!(kpi.max_rest_days() <= 2);

        let grouped = svc.schedule_for_week(d(4), &WeekFilter::new()).unwrap();
        assert_eq!(grouped.len(), hotel().len());
        assert!(grouped.iter().all(|w| w.assignments.len() == 7));

        // someone on the front desk at every hour of Wednesday
        for hour in 0..24 {
            let instant = d(6).and_hms_opt(hour, 30, 0).unwrap();
            assert!(!svc.on_duty_at(instant, Position::FrontDesk).unwrap().is_empty());
        }
    }

    #[test]
    fn test_generated_week_edit_respects_window() {
        let svc = service(
            vec![Employee::new(1, "Solo", Position::Security)],
            SchedulerConfig::default().with_staffing(StaffingTable::empty()),
        );
        // a week starting on a Thursday
        let week = DateRange::week(d(7)).unwrap();
        svc.generate_week(d(7)).unwrap();
        let working: Vec<Assignment> = svc
            .schedule_for_employee(EmployeeId(1), week)
            .unwrap()
            .into_iter()
            .filter(|a| a.shift.is_working())
            .collect();

        // turn working days into REST until the cap refuses one
        let err = working
            .iter()
            .find_map(|a| svc.update_shift(a.id, Shift::Rest).err())
            .unwrap();
        assert!(matches!(
            err,
            ScheduleError::RestCapViolation { rest_days: 3, cap: 2, week_start, .. }
                if week_start == d(7)
        ));
        let rests = svc
            .schedule_for_employee(EmployeeId(1), week)
            .unwrap()
            .iter()
            .filter(|a| a.shift == Shift::Rest)
            .count();
        assert_eq!(rests, 2);
    }

    #[test]
    fn test_front_desk_scenario() {
        let staffing =
            StaffingTable::empty().with_position(Position::FrontDesk, ShiftMinimums::new(2, 0, 0));
        let svc = service(
            vec![
                Employee::new(1, "A", Position::FrontDesk),
                Employee::new(2, "B", Position::FrontDesk),
                Employee::new(3, "C", Position::FrontDesk),
            ],
            SchedulerConfig::default().with_staffing(staffing),
        );
        let a = svc.create_single(EmployeeId(1), d(6), Shift::Morning).unwrap();
        svc.create_single(EmployeeId(2), d(6), Shift::Morning).unwrap();
        let c = svc.create_single(EmployeeId(3), d(6), Shift::Rest).unwrap();

        let err = svc.delete_schedule(a.assignment.id).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::CoverageViolation { remaining: 1, minimum: 2, .. }
        ));
        assert!(svc
            .schedule_for_employee(EmployeeId(1), DateRange::day(d(6)))
            .unwrap()
            .iter()
            .any(|r| r.id == a.assignment.id));

        svc.update_shift(c.assignment.id, Shift::Morning).unwrap();
        svc.delete_schedule(a.assignment.id).unwrap();

        let on_duty = svc
            .on_duty_at(d(6).and_hms_opt(9, 0, 0).unwrap(), Position::FrontDesk)
            .unwrap();
        let mut ids: Vec<EmployeeId> = on_duty.iter().map(|r| r.employee_id).collect();
        ids.sort();
        assert_eq!(ids, vec![EmployeeId(2), EmployeeId(3)]);
    }

    #[test]
    fn test_infeasible_leaves_store_untouched() {
        let svc = service(
            vec![Employee::new(1, "Cook", Position::Kitchen)],
            SchedulerConfig::default().with_staffing(
                StaffingTable::empty().with_minimum(Position::Maintenance, Shift::Night, 1),
            ),
        );
        let kept = svc.create_single(EmployeeId(1), d(5), Shift::Night).unwrap();

        assert!(matches!(
            svc.generate_week(d(4)),
            Err(ScheduleError::InfeasibleSchedule { .. })
        ));
        let rows = svc
            .schedule_for_employee(EmployeeId(1), DateRange::week(d(4)).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, kept.assignment.id);
    }

    #[test]
    fn test_empty_roster_error() {
        let svc = service(vec![], SchedulerConfig::default());
        assert!(matches!(
            svc.generate_week(d(4)),
            Err(ScheduleError::EmptyRoster)
        ));
    }

    #[test]
    fn test_config_from_json_drives_service() {
        let config = SchedulerConfig::from_json_str(
            r#"{ "staffing": { "SECURITY": { "night": 1 } }, "rest_cap": 0 }"#,
        )
        .unwrap();
        let svc = service(
            vec![
                Employee::new(1, "N1", Position::Security),
                Employee::new(2, "N2", Position::Security),
            ],
            config,
        );
        let week = svc.generate_week(d(4)).unwrap();
        assert_eq!(week.rest_days(EmployeeId(1)), 0);
        assert_eq!(week.rest_days(EmployeeId(2)), 0);
        for date in week.range.days() {
            assert!(week.headcount(Position::Security, date, Shift::Night) >= 1);
        }
    }
}
