//! Shift catalogue.
//!
//! A shift is one of three working windows or a rest day. Shifts are a
//! constant catalogue, not stored entities: the only configurable part is
//! the wall-clock window of each working shift.
//!
//! # Time Model
//! Each working shift starts at a local time on the assignment's date and
//! lasts a fixed number of minutes, possibly crossing midnight. The night
//! shift dated `D` therefore covers the early hours of `D + 1`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// What an employee does on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
    /// Day off. Carries no staffing minimum.
    Rest,
}

impl Shift {
    /// Every shift, in decision-variable order.
    pub const ALL: [Shift; 4] = [Shift::Morning, Shift::Afternoon, Shift::Night, Shift::Rest];

    /// The shifts that count towards coverage.
    pub const WORKING: [Shift; 3] = [Shift::Morning, Shift::Afternoon, Shift::Night];

    /// Whether this shift counts towards coverage.
    #[inline]
    pub fn is_working(&self) -> bool {
        !matches!(self, Shift::Rest)
    }

    /// Index into [`Shift::ALL`].
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Shift::Morning => 0,
            Shift::Afternoon => 1,
            Shift::Night => 2,
            Shift::Rest => 3,
        }
    }

    /// Canonical code (e.g. `MORNING`).
    pub fn code(&self) -> &'static str {
        match self {
            Shift::Morning => "MORNING",
            Shift::Afternoon => "AFTERNOON",
            Shift::Night => "NIGHT",
            Shift::Rest => "REST",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Shift {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Shift::ALL
            .into_iter()
            .find(|shift| shift.code() == normalized)
            .ok_or_else(|| ScheduleError::UnknownShift(s.to_string()))
    }
}

/// Wall-clock window of one working shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    /// Local start time on the assignment's date.
    pub start: NaiveTime,
    /// Length in minutes.
    pub length_minutes: u32,
}

impl ShiftWindow {
    /// Creates a window starting at `hour:00` lasting `hours` hours.
    ///
    /// Out-of-range hours clamp to midnight.
    pub fn hours(hour: u32, hours: u32) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN),
            length_minutes: hours * 60,
        }
    }

    /// Half-open `[start, end)` instants of this window for a given date.
    pub fn bounds_on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start);
        (start, start + Duration::minutes(i64::from(self.length_minutes)))
    }

    /// Whether `instant` falls inside this window dated `date`.
    pub fn contains(&self, date: NaiveDate, instant: NaiveDateTime) -> bool {
        let (start, end) = self.bounds_on(date);
        instant >= start && instant < end
    }
}

/// Windows of the three working shifts.
///
/// Defaults: morning 07:00, afternoon 15:00, night 23:00, eight hours each,
/// so the day is covered without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftCatalogue {
    pub morning: ShiftWindow,
    pub afternoon: ShiftWindow,
    pub night: ShiftWindow,
}

impl Default for ShiftCatalogue {
    fn default() -> Self {
        Self {
            morning: ShiftWindow::hours(7, 8),
            afternoon: ShiftWindow::hours(15, 8),
            night: ShiftWindow::hours(23, 8),
        }
    }
}

impl ShiftCatalogue {
    /// Window of a working shift. `None` for [`Shift::Rest`].
    pub fn window(&self, shift: Shift) -> Option<&ShiftWindow> {
        match shift {
            Shift::Morning => Some(&self.morning),
            Shift::Afternoon => Some(&self.afternoon),
            Shift::Night => Some(&self.night),
            Shift::Rest => None,
        }
    }

    /// Maps an instant to the `(assignment date, shift)` on duty.
    ///
    /// Windows dated the instant's own day are checked first, then windows
    /// dated the previous day (a night shift spilling past midnight).
    /// Returns `None` when the instant is outside every window.
    pub fn resolve(&self, instant: NaiveDateTime) -> Option<(NaiveDate, Shift)> {
        let today = instant.date();
        let candidates = [Some(today), today.pred_opt()];

        candidates.into_iter().flatten().find_map(|date| {
            Shift::WORKING.into_iter().find_map(|shift| {
                self.window(shift)
                    .filter(|w| w.contains(date, instant))
                    .map(|_| (date, shift))
            })
        })
    }
}
