//! Date-scoped mutual exclusion.
//!
//! Generation replaces a whole week and edits re-check coverage of a single
//! day; both are read-then-write sequences. [`DateLocks`] serializes them by
//! calendar day: a caller takes every day of its range at once (or waits),
//! so overlapping work cannot interleave and disjoint work runs in parallel.
//!
//! Taking all days in one step under a single mutex means two callers can
//! never each hold part of the other's range, so there is no lock-order
//! deadlock.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::DateRange;

/// Table of locked days.
#[derive(Debug, Default)]
pub struct DateLocks {
    held: Mutex<HashSet<NaiveDate>>,
    released: Condvar,
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every day of `range`, waiting up to `timeout` for overlapping
    /// holders to release.
    ///
    /// Fails with `ConcurrentModification` when the wait times out.
    pub fn lock(&self, range: DateRange, timeout: Duration) -> ScheduleResult<DateLockGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().map_err(|_| poisoned())?;

        loop {
            if range.days().all(|d| !held.contains(&d)) {
                let dates: Vec<NaiveDate> = range.days().collect();
                held.extend(dates.iter().copied());
                debug!(start = %range.start(), end = %range.end(), "dates locked");
                return Ok(DateLockGuard { locks: self, dates });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ScheduleError::ConcurrentModification(format!(
                    "dates {}..={} are locked by another operation",
                    range.start(),
                    range.end()
                )));
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| poisoned())?;
            held = guard;
        }
    }

    /// Whether a day is currently locked.
    pub fn is_locked(&self, date: NaiveDate) -> bool {
        self.held
            .lock()
            .map(|held| held.contains(&date))
            .unwrap_or(false)
    }
}

fn poisoned() -> ScheduleError {
    ScheduleError::ConcurrentModification("date lock table poisoned".into())
}

/// Releases its days on drop.
#[derive(Debug)]
pub struct DateLockGuard<'a> {
    locks: &'a DateLocks,
    dates: Vec<NaiveDate>,
}

impl Drop for DateLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for d in &self.dates {
            held.remove(d);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
