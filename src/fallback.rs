//! # Heuristic Fallback
//!
//! A trivial optimizer that supports every problem type. The factory registers
//! it for every type before any specialized solver, so callers always get some
//! usable answer.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::debug;

use crate::error::{OptimizerError, OptionExt, Result};
use crate::optimizer::{guard_solve, Optimizer};
use crate::problem::{OptimizationProblem, ProblemType, CAPACITY, DEMAND, DISTANCE};
use crate::result::{OptimizationResult, Solution, SolverStatus};
use crate::rng::RandomNumberGenerator;

/// Solves anything, badly.
///
/// QAP gets a random permutation, routing a nearest-neighbour order from node 0,
/// allocation an equal split of capacity, and every other type the identity
/// ordering. The objective is never computed.
#[derive(Debug, Clone)]
pub struct HeuristicFallback {
    seed: Option<u64>,
    rng: RandomNumberGenerator,
}

impl HeuristicFallback {
    pub fn new() -> Self {
        Self::with_seed(None)
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        Self {
            seed,
            rng: RandomNumberGenerator::from_optional_seed(seed),
        }
    }

    fn heuristic(&mut self, problem: &OptimizationProblem) -> Result<(Solution, &'static str)> {
        let n = problem
            .dimension()
            .ok_or_else_opt(|| OptimizerError::Validation("problem has no dimension".to_string()))?;

        let picked = match problem.problem_type {
            ProblemType::QuadraticAssignment => {
                (Solution::Permutation(self.rng.permutation(n)), "random_permutation")
            }
            ProblemType::WorkflowRouting => {
                let distance = problem.get(DISTANCE).ok_or_else_opt(|| {
                    OptimizerError::Validation("missing 'distance' data".to_string())
                })?;
                (Solution::Permutation(nearest_neighbour_order(distance)), "greedy_route")
            }
            ProblemType::ResourceAllocation => {
                let demand = problem.get(DEMAND).ok_or_else_opt(|| {
                    OptimizerError::Validation("missing 'demand' data".to_string())
                })?;
                let total: f64 = match problem.get(CAPACITY) {
                    Some(capacity) => capacity.values().iter().sum(),
                    None => demand.values().iter().sum(),
                };
                (Solution::Allocation(vec![total / n as f64; n]), "equal_split")
            }
            ProblemType::NetworkTopology
            | ProblemType::AdversarialRobust
            | ProblemType::MultiObjective => {
                (Solution::Permutation((0..n).collect()), "identity")
            }
        };
        Ok(picked)
    }
}

impl Default for HeuristicFallback {
    fn default() -> Self {
        Self::new()
    }
}

/// Visits every node once, always moving to the closest unvisited node.
fn nearest_neighbour_order(distance: &crate::problem::Matrix) -> Vec<usize> {
    let n = distance.rows();
    if n == 0 {
        return Vec::new();
    }
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0;
    visited[0] = true;
    order.push(0);

    while order.len() < n {
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by(|&a, &b| distance.get(current, a).total_cmp(&distance.get(current, b)));
        let Some(next) = next else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }
    order
}

impl Optimizer for HeuristicFallback {
    fn name(&self) -> &'static str {
        "heuristic_fallback"
    }

    /// Resets the random stream so repeated solves with a seed are reproducible.
    fn initialize(&mut self) -> Result<()> {
        if self.seed.is_some() {
            self.rng = RandomNumberGenerator::from_optional_seed(self.seed);
        }
        Ok(())
    }

    fn problem_types(&self) -> BTreeSet<ProblemType> {
        ProblemType::ALL.into_iter().collect()
    }

    fn solve(&mut self, problem: &OptimizationProblem) -> OptimizationResult {
        let start = Instant::now();
        let name = self.name();
        guard_solve(name, start, || {
            self.validate_problem(problem).into_result()?;
            let (solution, strategy) = self.heuristic(problem)?;
            debug!(problem_type = %problem.problem_type, strategy, "fallback heuristic applied");

            let mut result = OptimizationResult::new(SolverStatus::Fallback)
                .with_metadata("solver", name)
                .with_metadata("strategy", strategy);
            result.solution = Some(solution);
            result.iterations = 1;
            result.computation_time = start.elapsed();
            Ok(result)
        })
    }
}
