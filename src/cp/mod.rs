//! Boolean constraint model and solver contract.
//!
//! A [`CpModel`] is a set of boolean decision variables plus cardinality
//! constraints over sums of those variables (`= 1`, `≥ k`, `≤ k`). Any
//! backend implementing [`CpSolver`] can solve it; [`BacktrackingSolver`]
//! is the built-in one.
//!
//! # Statuses
//! A pure satisfaction model has no objective, so a backend reports
//! `Feasible` when it finds an assignment. `Optimal` is accepted from
//! backends that report it for objective-free models.
//!
//! # Reference
//! - Rossi, van Beek, Walsh (2006), "Handbook of Constraint Programming", Ch. 3
//! - Sinz (2005), "Towards an Optimal CNF Encoding of Boolean Cardinality Constraints"

mod search;

pub use search::BacktrackingSolver;

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(usize);

impl BoolVar {
    /// Position of this variable in the model (and in solution values).
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A cardinality constraint over a set of boolean variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpConstraint {
    /// Exactly one variable is true.
    ExactlyOne { vars: Vec<BoolVar> },
    /// At least `bound` variables are true.
    AtLeast { vars: Vec<BoolVar>, bound: u32 },
    /// At most `bound` variables are true.
    AtMost { vars: Vec<BoolVar>, bound: u32 },
}

impl CpConstraint {
    /// Variables the constraint ranges over.
    pub fn vars(&self) -> &[BoolVar] {
        match self {
            CpConstraint::ExactlyOne { vars }
            | CpConstraint::AtLeast { vars, .. }
            | CpConstraint::AtMost { vars, .. } => vars,
        }
    }

    /// `(min, max)` number of true variables allowed.
    pub fn bounds(&self) -> (u32, u32) {
        let len = self.vars().len() as u32;
        match self {
            CpConstraint::ExactlyOne { .. } => (1, 1),
            CpConstraint::AtLeast { bound, .. } => (*bound, len.max(*bound)),
            CpConstraint::AtMost { bound, .. } => (0, *bound),
        }
    }

    /// Whether a full valuation satisfies this constraint.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        let count = self
            .vars()
            .iter()
            .filter(|v| values.get(v.index()).copied().unwrap_or(false))
            .count() as u32;
        let (min, max) = self.bounds();
        count >= min && count <= max
    }
}

/// A boolean satisfaction model.
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    var_names: Vec<String>,
    constraints: Vec<CpConstraint>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_names: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Model name (for logging).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a boolean decision variable.
    pub fn add_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.var_names.push(name.into());
        BoolVar(self.var_names.len() - 1)
    }

    /// Requires exactly one of `vars` to be true.
    pub fn add_exactly_one(&mut self, vars: Vec<BoolVar>) {
        self.constraints.push(CpConstraint::ExactlyOne { vars });
    }

    /// Requires `sum(vars) >= bound`.
    ///
    /// With fewer than `bound` variables the model is infeasible.
    pub fn add_linear_at_least(&mut self, vars: Vec<BoolVar>, bound: u32) {
        self.constraints.push(CpConstraint::AtLeast { vars, bound });
    }

    /// Requires `sum(vars) <= bound`.
    pub fn add_linear_at_most(&mut self, vars: Vec<BoolVar>, bound: u32) {
        self.constraints.push(CpConstraint::AtMost { vars, bound });
    }

    /// Number of decision variables.
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// All constraints, in insertion order.
    pub fn constraints(&self) -> &[CpConstraint] {
        &self.constraints
    }

    /// Name given to a variable.
    pub fn var_name(&self, var: BoolVar) -> Option<&str> {
        self.var_names.get(var.0).map(String::as_str)
    }

    /// Whether a full valuation satisfies every constraint.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        values.len() == self.var_count() && self.constraints.iter().all(|c| c.is_satisfied(values))
    }
}

/// Solver budget and search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget (ms).
    pub time_limit_ms: u64,
    /// Search-node budget.
    pub max_nodes: u64,
    /// Seed for randomized value ordering.
    pub seed: u64,
    /// Raised by the caller to stop the search early.
    #[serde(skip)]
    pub interrupt: Option<Arc<AtomicBool>>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            max_nodes: 5_000_000,
            seed: 0x5eed,
            interrupt: None,
        }
    }
}

impl SolverConfig {
    /// Sets the wall-clock budget.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the search-node budget.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Attaches an interrupt flag.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Whether the interrupt flag is raised.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }
}

/// Verdict of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    /// No verdict within budget.
    Unknown,
}

/// Why a search stopped without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TimeLimit,
    NodeLimit,
    Interrupted,
}

/// Result of a solve.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Verdict.
    pub status: SolveStatus,
    /// One value per variable; meaningful only when a solution was found.
    pub values: Vec<bool>,
    /// Set when `status` is `Unknown`.
    pub stop_reason: Option<StopReason>,
    /// Search nodes explored.
    pub nodes: u64,
    /// Wall-clock time spent (ms).
    pub elapsed_ms: u64,
}

impl CpSolution {
    /// Whether the status carries a valuation.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    /// Value of a variable (false if out of range).
    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.0).copied().unwrap_or(false)
    }
}

/// A backend able to decide a [`CpModel`].
pub trait CpSolver: Send + Sync + Debug {
    /// Backend name (for logging).
    fn name(&self) -> &'static str;

    /// Solves the model within the configured budget.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_building() {
        let mut m = CpModel::new("t");
        let a = m.add_bool_var("a");
        let b = m.add_bool_var("b");
        m.add_exactly_one(vec![a, b]);
        m.add_linear_at_least(vec![a], 1);
        m.add_linear_at_most(vec![b], 0);

        assert_eq!(m.var_count(), 2);
        assert_eq!(m.constraint_count(), 3);
        assert_eq!(m.var_name(b), Some("b"));
        assert_eq!(b.index(), 1);
        assert!(m.is_satisfied_by(&[true, false]));
        assert!(!m.is_satisfied_by(&[false, true]));
        assert!(!m.is_satisfied_by(&[true]));
    }

    #[test]
    fn test_constraint_bounds() {
        let vars = vec![BoolVar(0), BoolVar(1), BoolVar(2)];
        assert_eq!(CpConstraint::ExactlyOne { vars: vars.clone() }.bounds(), (1, 1));
        assert_eq!(
            CpConstraint::AtLeast { vars: vars.clone(), bound: 2 }.bounds(),
            (2, 3)
        );
        assert_eq!(CpConstraint::AtMost { vars, bound: 1 }.bounds(), (0, 1));
        // unsatisfiable: bound above the variable count
        assert_eq!(
            CpConstraint::AtLeast { vars: vec![], bound: 1 }.bounds(),
            (1, 1)
        );
    }

    #[test]
    fn test_interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = SolverConfig::default().with_interrupt(flag.clone());
        assert!(!config.is_interrupted());
        flag.store(true, Ordering::Relaxed);
        assert!(config.is_interrupted());
        assert!(!SolverConfig::default().is_interrupted());
    }
}
