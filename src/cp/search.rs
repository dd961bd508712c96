//! Depth-first backtracking solver with cardinality propagation.
//!
//! # Algorithm
//! 1. Every constraint is a cardinality window `min ≤ Σ vars ≤ max`.
//! 2. After each assignment, constraints touching the variable are
//!    re-checked: a window that can no longer be met is a conflict; a
//!    window with `true == max` forces the remaining variables false, one
//!    with `true + free == min` forces them true.
//! 3. Branch on the first unassigned variable in model order, trying a
//!    seeded-random value first, and backtrack chronologically.
//!
//! The search is complete: `Infeasible` is only reported after the whole
//! tree is refuted. Budgets (nodes, wall clock, interrupt flag) turn an
//! unfinished search into `Unknown`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use super::{CpModel, CpSolution, CpSolver, SolveStatus, SolverConfig, StopReason};

/// Built-in complete backtracking solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingSolver;

impl BacktrackingSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BacktrackingSolver {
    fn name(&self) -> &'static str {
        "backtracking"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let mut search = Search::new(model, config);
        let status = search.run();

        let values = if matches!(status, SolveStatus::Feasible) {
            search.values.iter().map(|v| v.unwrap_or(false)).collect()
        } else {
            Vec::new()
        };

        CpSolution {
            status,
            values,
            stop_reason: search.stop,
            nodes: search.nodes,
            elapsed_ms: search.started.elapsed().as_millis() as u64,
        }
    }
}

/// Cardinality window over variable indices.
struct Card {
    vars: Vec<usize>,
    min: u32,
    max: u32,
}

/// A branching point: the variable, the trail length before it was set
/// and the value still to try.
struct Decision {
    var: usize,
    mark: usize,
    retry: Option<bool>,
}

fn var_after(stack: &[Decision]) -> usize {
    stack.last().map_or(0, |d| d.var + 1)
}

enum Outcome {
    Found,
    Exhausted,
    Stopped,
}

struct Search<'a> {
    config: &'a SolverConfig,
    cards: Vec<Card>,
    /// var → indices of constraints mentioning it
    occurs: Vec<Vec<usize>>,
    values: Vec<Option<bool>>,
    n_true: Vec<u32>,
    n_false: Vec<u32>,
    trail: Vec<usize>,
    rng: StdRng,
    nodes: u64,
    started: Instant,
    stop: Option<StopReason>,
}

impl<'a> Search<'a> {
    fn new(model: &CpModel, config: &'a SolverConfig) -> Self {
        let n = model.var_count();
        let mut occurs = vec![Vec::new(); n];
        let cards: Vec<Card> = model
            .constraints()
            .iter()
            .enumerate()
            .map(|(ci, c)| {
                let (min, max) = c.bounds();
                let vars: Vec<usize> = c.vars().iter().map(|v| v.index()).collect();
                for &v in &vars {
                    occurs[v].push(ci);
                }
                Card { vars, min, max }
            })
            .collect();

        Self {
            config,
            n_true: vec![0; cards.len()],
            n_false: vec![0; cards.len()],
            cards,
            occurs,
            values: vec![None; n],
            trail: Vec::with_capacity(n),
            rng: StdRng::seed_from_u64(config.seed),
            nodes: 0,
            started: Instant::now(),
            stop: None,
        }
    }

    fn run(&mut self) -> SolveStatus {
        let all: Vec<usize> = (0..self.cards.len()).collect();
        if !self.propagate(all) {
            return SolveStatus::Infeasible;
        }
        match self.descend() {
            Outcome::Found => SolveStatus::Feasible,
            Outcome::Exhausted => SolveStatus::Infeasible,
            Outcome::Stopped => SolveStatus::Unknown,
        }
    }

    /// Depth-first search over an explicit decision stack, so depth is
    /// bounded by memory rather than the thread's stack.
    fn descend(&mut self) -> Outcome {
        let mut stack: Vec<Decision> = Vec::new();
        let mut from = 0;

        loop {
            let Some(var) = (from..self.values.len()).find(|&v| self.values[v].is_none()) else {
                return Outcome::Found;
            };

            self.nodes += 1;
            if let Some(reason) = self.over_budget() {
                self.stop = Some(reason);
                return Outcome::Stopped;
            }

            let first = self.rng.random_bool(0.5);
            stack.push(Decision {
                var,
                mark: self.trail.len(),
                retry: Some(!first),
            });
            let mut consistent = self.try_value(var, first);

            while !consistent {
                let Some(top) = stack.last_mut() else {
                    return Outcome::Exhausted;
                };
                self.undo(top.mark);
                match top.retry.take() {
                    Some(value) => {
                        let var = top.var;
                        consistent = self.try_value(var, value);
                    }
                    None => {
                        stack.pop();
                    }
                }
            }

            from = var_after(&stack);
        }
    }

    /// Assigns and propagates. Leaves the trail dirty on conflict.
    fn try_value(&mut self, var: usize, value: bool) -> bool {
        self.assign(var, value);
        let touched = self.occurs[var].clone();
        self.propagate(touched)
    }

    fn over_budget(&self) -> Option<StopReason> {
        if self.config.is_interrupted() {
            Some(StopReason::Interrupted)
        } else if self.nodes > self.config.max_nodes {
            Some(StopReason::NodeLimit)
        } else if self.started.elapsed().as_millis() as u64 >= self.config.time_limit_ms {
            Some(StopReason::TimeLimit)
        } else {
            None
        }
    }

    fn assign(&mut self, var: usize, value: bool) {
        self.values[var] = Some(value);
        self.trail.push(var);
        for &c in &self.occurs[var] {
            if value {
                self.n_true[c] += 1;
            } else {
                self.n_false[c] += 1;
            }
        }
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(var) = self.trail.pop() else { break };
            if let Some(value) = self.values[var].take() {
                for &c in &self.occurs[var] {
                    if value {
                        self.n_true[c] -= 1;
                    } else {
                        self.n_false[c] -= 1;
                    }
                }
            }
        }
    }

    /// Runs propagation to a fixpoint. Returns `false` on conflict.
    fn propagate(&mut self, mut queue: Vec<usize>) -> bool {
        while let Some(c) = queue.pop() {
            let card = &self.cards[c];
            let len = card.vars.len() as u32;
            let t = self.n_true[c];
            let free = len - t - self.n_false[c];

            if t > card.max || t + free < card.min {
                return false;
            }
            if free == 0 {
                continue;
            }
            let forced = if t == card.max {
                false
            } else if t + free == card.min {
                true
            } else {
                continue;
            };

            for i in 0..self.cards[c].vars.len() {
                let v = self.cards[c].vars[i];
                if self.values[v].is_none() {
                    self.assign(v, forced);
                    queue.extend(self.occurs[v].iter().copied().filter(|&o| o != c));
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::BoolVar;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn solve(model: &CpModel) -> CpSolution {
        BacktrackingSolver::new().solve(model, &SolverConfig::default())
    }

    /// n items each pick exactly one of k colours, each colour used ≥ `min`.
    fn colouring(n: usize, k: usize, min: u32) -> (CpModel, Vec<Vec<BoolVar>>) {
        let mut m = CpModel::new("colouring");
        let grid: Vec<Vec<BoolVar>> = (0..n)
            .map(|i| (0..k).map(|j| m.add_bool_var(format!("x{i}_{j}"))).collect())
            .collect();
        for row in &grid {
            m.add_exactly_one(row.clone());
        }
        for j in 0..k {
            m.add_linear_at_least(grid.iter().map(|row| row[j]).collect(), min);
        }
        (m, grid)
    }

    #[test]
    fn test_trivial_feasible() {
        let mut m = CpModel::new("t");
        let a = m.add_bool_var("a");
        let b = m.add_bool_var("b");
        m.add_exactly_one(vec![a, b]);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Feasible);
        assert!(sol.is_solution_found());
        assert!(m.is_satisfied_by(&sol.values));
    }

    #[test]
    fn test_empty_model() {
        let sol = solve(&CpModel::new("empty"));
        assert_eq!(sol.status, SolveStatus::Feasible);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_at_least_over_nothing_is_infeasible() {
        let mut m = CpModel::new("t");
        m.add_bool_var("a");
        m.add_linear_at_least(vec![], 1);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Infeasible);
        assert!(sol.values.is_empty());
    }

    #[test]
    fn test_colouring_feasible() {
        let (m, _) = colouring(6, 3, 2);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Feasible);
        assert!(m.is_satisfied_by(&sol.values));
    }

    #[test]
    fn test_colouring_infeasible_needs_search() {
        // 5 items cannot give 3 colours two uses each
        let (m, _) = colouring(5, 3, 2);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_at_most_forces_false() {
        let mut m = CpModel::new("t");
        let xs: Vec<BoolVar> = (0..4).map(|i| m.add_bool_var(format!("x{i}"))).collect();
        m.add_linear_at_most(xs.clone(), 1);
        m.add_linear_at_least(vec![xs[2]], 1);
        let sol = solve(&m);
        assert_eq!(sol.status, SolveStatus::Feasible);
        assert_eq!(sol.values, vec![false, false, true, false]);
    }

    #[test]
    fn test_seed_is_deterministic() {
        let (m, _) = colouring(8, 4, 1);
        let config = SolverConfig::default().with_seed(7);
        let a = BacktrackingSolver.solve(&m, &config);
        let b = BacktrackingSolver.solve(&m, &config);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_node_limit_gives_unknown() {
        let (m, _) = colouring(9, 3, 4); // infeasible, refutation needs many nodes
        let config = SolverConfig::default().with_max_nodes(3);
        let sol = BacktrackingSolver.solve(&m, &config);
        assert_eq!(sol.status, SolveStatus::Unknown);
        assert_eq!(sol.stop_reason, Some(StopReason::NodeLimit));
    }

    #[test]
    fn test_deep_search_on_small_stack() {
        // 25k decisions deep, solved on a thread with a 256 KiB stack
        let mut m = CpModel::new("pairs");
        for i in 0..25_000 {
            let a = m.add_bool_var(format!("a{i}"));
            let b = m.add_bool_var(format!("b{i}"));
            m.add_exactly_one(vec![a, b]);
        }
        let sol = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let sol = BacktrackingSolver.solve(&m, &SolverConfig::default());
                assert!(m.is_satisfied_by(&sol.values));
                sol
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(sol.status, SolveStatus::Feasible);
        assert_eq!(sol.nodes, 25_000);
    }

    #[test]
    fn test_verdicts_stable_across_seeds() {
        let (feasible, _) = colouring(7, 3, 2);
        let (infeasible, _) = colouring(5, 3, 2);
        for seed in 0..16 {
            let config = SolverConfig::default().with_seed(seed);
            let sol = BacktrackingSolver.solve(&feasible, &config);
            assert_eq!(sol.status, SolveStatus::Feasible);
            assert!(feasible.is_satisfied_by(&sol.values));
            let sol = BacktrackingSolver.solve(&infeasible, &config);
            assert_eq!(sol.status, SolveStatus::Infeasible);
        }
    }

    #[test]
    fn test_interrupt_gives_unknown() {
        let (m, _) = colouring(6, 3, 2);
        let flag = Arc::new(AtomicBool::new(true));
        let config = SolverConfig::default().with_interrupt(flag);
        let sol = BacktrackingSolver.solve(&m, &config);
        assert_eq!(sol.status, SolveStatus::Unknown);
        assert_eq!(sol.stop_reason, Some(StopReason::Interrupted));
    }
}
