//! Read-only views over persisted assignments.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ScheduleResult;
use crate::models::{Assignment, DateRange, EmployeeId, Position, Shift, ShiftCatalogue};
use crate::store::AssignmentStore;

/// Narrows a weekly view. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekFilter {
    pub positions: Vec<Position>,
    pub employee_ids: Vec<EmployeeId>,
    pub shift: Option<Shift>,
}

impl WeekFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    pub fn with_employee(mut self, employee_id: EmployeeId) -> Self {
        self.employee_ids.push(employee_id);
        self
    }

    pub fn with_shift(mut self, shift: Shift) -> Self {
        self.shift = Some(shift);
        self
    }

    fn matches(&self, a: &Assignment) -> bool {
        (self.positions.is_empty() || self.positions.contains(&a.position))
            && (self.employee_ids.is_empty() || self.employee_ids.contains(&a.employee_id))
            && self.shift.map_or(true, |s| s == a.shift)
    }
}

/// One employee's rows within a weekly view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeWeek {
    pub employee_id: EmployeeId,
    pub position: Position,
    /// In date order.
    pub assignments: Vec<Assignment>,
}

/// Answers who works when.
#[derive(Clone)]
pub struct ScheduleQuery {
    store: Arc<dyn AssignmentStore>,
    shifts: ShiftCatalogue,
}

impl ScheduleQuery {
    pub fn new(store: Arc<dyn AssignmentStore>, shifts: ShiftCatalogue) -> Self {
        Self { store, shifts }
    }

    /// Staff of `position` on duty at `instant`.
    ///
    /// A night shift runs into the next morning, so an early-morning
    /// instant resolves to the previous day's night rows.
    pub fn on_duty_at(
        &self,
        instant: NaiveDateTime,
        position: Position,
    ) -> ScheduleResult<Vec<Assignment>> {
        let Some((date, shift)) = self.shifts.resolve(instant) else {
            debug!(%instant, "instant falls in no shift window");
            return Ok(Vec::new());
        };
        Ok(self
            .store
            .list_range(DateRange::day(date))?
            .into_iter()
            .filter(|a| a.covers(position, date, shift))
            .collect())
    }

    /// One employee's rows over a range, in date order.
    pub fn schedule_for_employee(
        &self,
        employee_id: EmployeeId,
        range: DateRange,
    ) -> ScheduleResult<Vec<Assignment>> {
        self.store.list_for_employee(employee_id, range)
    }

    /// The seven days from `start`, grouped by employee.
    ///
    /// Employees with no matching rows are left out.
    pub fn schedule_for_week(
        &self,
        start: NaiveDate,
        filter: &WeekFilter,
    ) -> ScheduleResult<Vec<EmployeeWeek>> {
        let range = DateRange::week(start)?;
        let mut grouped: BTreeMap<EmployeeId, EmployeeWeek> = BTreeMap::new();
        for a in self.store.list_range(range)?.into_iter().filter(|a| filter.matches(a)) {
            grouped
                .entry(a.employee_id)
                .or_insert_with(|| EmployeeWeek {
                    employee_id: a.employee_id,
                    position: a.position,
                    assignments: Vec::new(),
                })
                .assignments
                .push(a);
        }
        Ok(grouped.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        d(day).and_hms_opt(h, m, 0).unwrap()
    }

    fn seeded() -> ScheduleQuery {
        let store = Arc::new(InMemoryStore::new());
        let fd = Position::FrontDesk;
        for a in [
            Assignment::new(EmployeeId(1), fd, d(4), Shift::Morning),
            Assignment::new(EmployeeId(2), fd, d(4), Shift::Night),
            Assignment::new(EmployeeId(3), Position::Security, d(4), Shift::Night),
            Assignment::new(EmployeeId(1), fd, d(5), Shift::Rest),
            Assignment::new(EmployeeId(2), fd, d(5), Shift::Morning),
            Assignment::new(EmployeeId(1), fd, d(11), Shift::Morning),
        ] {
            store.insert(a).unwrap();
        }
        ScheduleQuery::new(store, ShiftCatalogue::default())
    }

    fn ids(rows: &[Assignment]) -> Vec<EmployeeId> {
        rows.iter().map(|a| a.employee_id).collect()
    }

    #[test]
    fn test_on_duty_boundaries() {
        let q = seeded();
        let fd = Position::FrontDesk;
        // 06:59 on the 5th is still the 4th's night shift
        assert_eq!(ids(&q.on_duty_at(at(5, 6, 59), fd).unwrap()), vec![EmployeeId(2)]);
        // 07:00 starts the 5th's morning
        assert_eq!(ids(&q.on_duty_at(at(5, 7, 0), fd).unwrap()), vec![EmployeeId(2)]);
        assert_eq!(
            q.on_duty_at(at(5, 7, 0), fd).unwrap()[0].shift,
            Shift::Morning
        );
        assert_eq!(ids(&q.on_duty_at(at(4, 14, 59), fd).unwrap()), vec![EmployeeId(1)]);
        assert!(q.on_duty_at(at(4, 15, 0), fd).unwrap().is_empty());
        assert_eq!(
            ids(&q.on_duty_at(at(4, 23, 30), Position::Security).unwrap()),
            vec![EmployeeId(3)]
        );
    }

    #[test]
    fn test_employee_range() {
        let q = seeded();
        let rows = q
            .schedule_for_employee(EmployeeId(1), DateRange::week(d(4)).unwrap())
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d(4));
        assert_eq!(rows[1].shift, Shift::Rest);
    }

    #[test]
    fn test_week_grouping_and_filters() {
        let q = seeded();
        let all = q.schedule_for_week(d(4), &WeekFilter::new()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].employee_id, EmployeeId(1));
        assert_eq!(all[0].assignments.len(), 2);

        let desk = q
            .schedule_for_week(d(4), &WeekFilter::new().with_position(Position::FrontDesk))
            .unwrap();
        assert_eq!(desk.len(), 2);

        let nights = q
            .schedule_for_week(d(4), &WeekFilter::new().with_shift(Shift::Night))
            .unwrap();
        assert_eq!(nights.len(), 2);
        assert!(nights.iter().all(|w| w.assignments.len() == 1));

        let one = q
            .schedule_for_week(d(4), &WeekFilter::new().with_employee(EmployeeId(2)))
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].assignments.len(), 2);
    }
}
