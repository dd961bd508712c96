//! Weekly schedule generator.
//!
//! # Algorithm
//!
//! 1. Validate the roster (non-empty, unique, active).
//! 2. Build the 7-day model ([`ShiftModelBuilder`]).
//! 3. Solve on a worker thread, waiting at most the solver budget plus a
//!    grace period; on expiry raise the solver's interrupt flag and give up.
//! 4. Decode one assignment per employee-day and re-check every invariant.
//! 5. Lock the week's dates and replace its rows in one atomic store call.
//!
//! Cancellation is honoured up to step 5; once the replace starts it runs
//! to completion or fails without changing anything.

use chrono::NaiveDate;
use crossbeam::channel::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{ScheduleKpi, ShiftModelBuilder};
use crate::config::SchedulerConfig;
use crate::cp::{CpSolution, CpSolver, SolveStatus, StopReason};
use crate::error::{ScheduleError, ScheduleResult};
use crate::locks::DateLocks;
use crate::models::{DateRange, Employee, Position, Schedule};
use crate::store::{AssignmentStore, RosterProvider};
use crate::validation::{validate_roster, validate_schedule};

/// Interval at which the generator re-checks the caller's cancel flag
/// while the solver runs.
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// Generates and persists full weeks.
#[derive(Clone)]
pub struct WeeklyScheduler {
    roster: Arc<dyn RosterProvider>,
    store: Arc<dyn AssignmentStore>,
    solver: Arc<dyn CpSolver>,
    locks: Arc<DateLocks>,
    config: Arc<SchedulerConfig>,
}

impl WeeklyScheduler {
    /// Creates a generator.
    pub fn new(
        roster: Arc<dyn RosterProvider>,
        store: Arc<dyn AssignmentStore>,
        solver: Arc<dyn CpSolver>,
        locks: Arc<DateLocks>,
        config: Arc<SchedulerConfig>,
    ) -> Self {
        Self {
            roster,
            store,
            solver,
            locks,
            config,
        }
    }

    /// Generates the week starting at `start` for every active employee
    /// and replaces whatever was stored for those seven days.
    pub fn generate_week(&self, start: NaiveDate) -> ScheduleResult<Schedule> {
        self.generate_week_cancellable(start, &AtomicBool::new(false))
    }

    /// Like [`generate_week`](Self::generate_week), stopping with
    /// `Cancelled` if `cancel` is raised before persistence begins.
    pub fn generate_week_cancellable(
        &self,
        start: NaiveDate,
        cancel: &AtomicBool,
    ) -> ScheduleResult<Schedule> {
        let employees = self
            .roster
            .list_active_employees_by_positions(&Position::ALL)?;
        let schedule = self.plan_week(start, &employees, cancel)?;

        if cancel.load(Ordering::SeqCst) {
            info!(%start, "generation cancelled before persistence");
            return Err(ScheduleError::Cancelled);
        }

        let _guard = self.locks.lock(schedule.range, self.config.lock_timeout())?;
        if cancel.load(Ordering::SeqCst) {
            info!(%start, "generation cancelled while waiting for the week's dates");
            return Err(ScheduleError::Cancelled);
        }
        self.store
            .replace_range(schedule.range, schedule.assignments.clone())?;

        let kpi = ScheduleKpi::calculate(
            &schedule.assignments,
            schedule.range,
            &self.config.staffing,
        );
        info!(
            %start,
            assignments = schedule.assignment_count(),
            surplus = kpi.surplus,
            max_rest_days = kpi.max_rest_days(),
            "week persisted"
        );
        Ok(schedule)
    }

    /// Builds and solves the week for the given employees without
    /// touching the store.
    pub fn plan_week(
        &self,
        start: NaiveDate,
        employees: &[Employee],
        cancel: &AtomicBool,
    ) -> ScheduleResult<Schedule> {
        let range = DateRange::week(start)?;
        if employees.is_empty() {
            warn!(%start, "generation requested with an empty roster");
            return Err(ScheduleError::EmptyRoster);
        }
        validate_roster(employees).map_err(ScheduleError::InvalidInput)?;

        let shift_model = ShiftModelBuilder::new(employees, range, &self.config.staffing)
            .with_rest_cap(self.config.rest_cap)
            .build();
        info!(
            %start,
            employees = employees.len(),
            variables = shift_model.model().var_count(),
            constraints = shift_model.model().constraint_count(),
            solver = self.solver.name(),
            "solving week"
        );

        let solution = self.solve_with_deadline(&shift_model, cancel)?;
        debug!(
            status = ?solution.status,
            nodes = solution.nodes,
            elapsed_ms = solution.elapsed_ms,
            "solver finished"
        );

        match solution.status {
            SolveStatus::Optimal | SolveStatus::Feasible => {}
            SolveStatus::Infeasible => {
                warn!(%start, "no feasible roster");
                return Err(ScheduleError::InfeasibleSchedule { start });
            }
            SolveStatus::Unknown => {
                return Err(match solution.stop_reason {
                    Some(StopReason::Interrupted) if cancel.load(Ordering::SeqCst) => {
                        ScheduleError::Cancelled
                    }
                    _ => {
                        warn!(%start, nodes = solution.nodes, "solver budget exhausted");
                        ScheduleError::SchedulingTimeout {
                            budget_ms: self.config.solver.time_limit_ms,
                        }
                    }
                });
            }
        }

        let schedule = shift_model.decode(&solution)?;
        validate_schedule(&schedule, employees, &self.config.staffing, self.config.rest_cap)
            .map_err(|errors| {
                ScheduleError::InvalidSolution(
                    errors
                        .into_iter()
                        .map(|e| e.message)
                        .collect::<Vec<_>>()
                        .join("; "),
                )
            })?;
        Ok(schedule)
    }

    /// Runs the solver on a worker thread so a stuck backend cannot hang
    /// the caller.
    fn solve_with_deadline(
        &self,
        shift_model: &super::ShiftModel,
        cancel: &AtomicBool,
    ) -> ScheduleResult<CpSolution> {
        let interrupt = Arc::new(AtomicBool::new(false));
        let solver_config = self.config.solver.clone().with_interrupt(Arc::clone(&interrupt));
        let model = shift_model.model().clone();
        let solver = Arc::clone(&self.solver);
        let (tx, rx) = channel::bounded(1);

        thread::Builder::new()
            .name("u-shift-solve".into())
            .spawn(move || {
                // The receiver may be gone after a timeout; nothing to do then.
                let _ = tx.send(solver.solve(&model, &solver_config));
            })
            .map_err(|e| ScheduleError::InvalidSolution(format!("cannot start solver: {e}")))?;

        let deadline = Instant::now() + self.config.solve_deadline();
        loop {
            if cancel.load(Ordering::SeqCst) {
                interrupt.store(true, Ordering::SeqCst);
                info!("generation cancelled during solve");
                return Err(ScheduleError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                interrupt.store(true, Ordering::SeqCst);
                warn!(
                    budget_ms = self.config.solver.time_limit_ms,
                    "solver missed its deadline, abandoning"
                );
                return Err(ScheduleError::SchedulingTimeout {
                    budget_ms: self.config.solver.time_limit_ms,
                });
            }
            match rx.recv_timeout((deadline - now).min(CANCEL_POLL)) {
                Ok(solution) => return Ok(solution),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ScheduleError::InvalidSolution(
                        "solver exited without a verdict".into(),
                    ))
                }
            }
        }
    }
}
