//! Date ranges.
//!
//! Schedules are planned per calendar day. A [`DateRange`] is a closed
//! interval of days `[start, end]`, the unit that generation replaces and
//! locks.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::{ScheduleError, ScheduleResult};

/// Number of days in a generated schedule.
pub const WEEK_DAYS: u64 = 7;

/// A closed interval of calendar days `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range. Fails if `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ScheduleResult<Self> {
        if end < start {
            return Err(ScheduleError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The seven days `[start, start + 6]`.
    pub fn week(start: NaiveDate) -> ScheduleResult<Self> {
        let end = start
            .checked_add_days(Days::new(WEEK_DAYS - 1))
            .ok_or(ScheduleError::InvalidDateRange { start, end: start })?;
        Ok(Self { start, end })
    }

    /// The Monday-started week containing `date`.
    pub fn iso_week_of(date: NaiveDate) -> ScheduleResult<Self> {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let monday = date
            .checked_sub_days(Days::new(offset))
            .ok_or(ScheduleError::InvalidDateRange {
                start: date,
                end: date,
            })?;
        Self::week(monday)
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range (at least 1).
    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Iterates the days in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    /// Whether a day falls within the range.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether two ranges share at least one day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week() {
        let w = DateRange::week(d(2024, 12, 28)).unwrap();
        assert_eq!(w.end(), d(2025, 1, 3));
        assert_eq!(w.len_days(), 7);
        let days: Vec<_> = w.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], d(2024, 12, 28));
        assert_eq!(days[6], d(2025, 1, 3));
    }

    #[test]
    fn test_invalid_range() {
        let err = DateRange::new(d(2024, 3, 5), d(2024, 3, 4)).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let a = DateRange::new(d(2024, 3, 1), d(2024, 3, 7)).unwrap();
        let b = DateRange::new(d(2024, 3, 7), d(2024, 3, 10)).unwrap();
        let c = DateRange::new(d(2024, 3, 8), d(2024, 3, 10)).unwrap();

        assert!(a.contains(d(2024, 3, 1)));
        assert!(a.contains(d(2024, 3, 7))); // closed end
        assert!(!a.contains(d(2024, 3, 8)));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_iso_week_of() {
        // 2024-03-07 is a Thursday
        let w = DateRange::iso_week_of(d(2024, 3, 7)).unwrap();
        assert_eq!(w.start(), d(2024, 3, 4));
        assert_eq!(w.end(), d(2024, 3, 10));
    }

    #[test]
    fn test_single_day() {
        let r = DateRange::day(d(2024, 3, 7));
        assert_eq!(r.len_days(), 1);
        assert_eq!(r.days().count(), 1);
    }
}
