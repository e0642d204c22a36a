use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{OptimizerError, Result};
use crate::optimizer::{guard_solve, Optimizer};
use crate::problem::{OptimizationProblem, ProblemType};
use crate::result::{OptimizationResult, Solution, SolverStatus};
use crate::rng::RandomNumberGenerator;

use super::{
    Algorithm, Deadline, GeneticAlgorithm, QapConfig, QapInstance, SearchOutcome,
    SimulatedAnnealing,
};

/// The specialized solver for quadratic assignment problems.
///
/// Runs the configured search strategy, then scores one independent random
/// permutation as a baseline and reports the percentage improvement over it.
///
/// # Examples
///
/// ```
/// use qapopt::optimizer::Optimizer;
/// use qapopt::problem::{Matrix, OptimizationProblem};
/// use qapopt::qap::{QapConfig, QapSolver};
/// use qapopt::result::SolverStatus;
///
/// let distance = Matrix::from_rows(vec![
///     vec![0.0, 1.0, 2.0],
///     vec![1.0, 0.0, 1.0],
///     vec![2.0, 1.0, 0.0],
/// ]).unwrap();
/// let flow = Matrix::from_rows(vec![
///     vec![0.0, 5.0, 2.0],
///     vec![5.0, 0.0, 3.0],
///     vec![2.0, 3.0, 0.0],
/// ]).unwrap();
///
/// let config = QapConfig::builder().max_iterations(500).seed(1).build();
/// let mut solver = QapSolver::new(config).unwrap();
/// let result = solver.solve(&OptimizationProblem::qap(distance, flow));
///
/// assert_eq!(result.status, SolverStatus::Success);
/// assert!(result.solution.unwrap().is_valid_permutation(3));
/// ```
#[derive(Debug, Clone)]
pub struct QapSolver {
    config: QapConfig,
}

impl QapSolver {
    /// Creates a solver, rejecting out-of-range parameters.
    pub fn new(config: QapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QapConfig {
        &self.config
    }

    fn search(
        &self,
        instance: &QapInstance,
        rng: &mut RandomNumberGenerator,
        deadline: &Deadline,
    ) -> Result<SearchOutcome> {
        let config = &self.config;
        match config.algorithm {
            Algorithm::SimulatedAnnealing => {
                let sa = SimulatedAnnealing::new(
                    config.max_iterations,
                    config.temperature_init,
                    config.cooling_rate,
                    config.min_temperature,
                )?;
                Ok(sa.run(instance, rng, deadline))
            }
            Algorithm::Genetic => {
                let ga = GeneticAlgorithm::new(
                    config.max_iterations,
                    config.max_population,
                    config.mutation_rate,
                    config.tournament_size,
                )?;
                ga.run(instance, rng, deadline)
            }
        }
    }

    fn run(&self, problem: &OptimizationProblem, start: Instant) -> Result<OptimizationResult> {
        self.validate_problem(problem).into_result()?;
        let instance = QapInstance::from_problem(problem)?;
        let n = instance.n();
        let deadline = Deadline::new(start, self.config.timeout);
        let mut rng = RandomNumberGenerator::from_optional_seed(self.config.seed);

        debug!(
            n,
            algorithm = %self.config.algorithm,
            max_iterations = self.config.max_iterations,
            "starting qap search"
        );
        let outcome = self.search(&instance, &mut rng, &deadline)?;

        let baseline = instance.objective(&rng.permutation(n));
        if !outcome.best_objective.is_finite() || !baseline.is_finite() {
            return Err(OptimizerError::Algorithm(format!(
                "objective overflowed (best {}, baseline {})",
                outcome.best_objective, baseline
            )));
        }
        // Relative to the magnitude so negative costs keep the sign of the gain.
        let improvement = if baseline != 0.0 {
            (baseline - outcome.best_objective) / baseline.abs() * 100.0
        } else {
            0.0
        };

        let status = if outcome.timed_out || deadline.expired() {
            SolverStatus::Timeout
        } else {
            SolverStatus::Success
        };

        let mut result = OptimizationResult::new(status)
            .with_metadata("solver", self.name())
            .with_metadata("algorithm", self.config.algorithm.as_str())
            .with_metadata("n", n)
            .with_metadata("complexity", self.estimate_complexity(problem).as_str())
            .with_metadata("baseline_objective", baseline)
            .with_metadata("gpu_requested", self.config.enable_gpu)
            .with_metadata("gpu_used", false);
        if let Some(seed) = self.config.seed {
            result = result.with_metadata("seed", seed);
        }
        result.metadata.extend(outcome.metadata);
        result.solution = Some(Solution::Permutation(outcome.best));
        result.objective_value = Some(outcome.best_objective);
        result.iterations = outcome.iterations;
        result.improvement_over_baseline = improvement;
        result.computation_time = start.elapsed();

        info!(
            n,
            status = %result.status,
            objective = outcome.best_objective,
            baseline,
            improvement,
            iterations = result.iterations,
            "qap search finished"
        );
        Ok(result)
    }
}

impl Optimizer for QapSolver {
    fn name(&self) -> &'static str {
        "qap_solver"
    }

    fn problem_types(&self) -> BTreeSet<ProblemType> {
        BTreeSet::from([ProblemType::QuadraticAssignment])
    }

    fn solve(&mut self, problem: &OptimizationProblem) -> OptimizationResult {
        let start = Instant::now();
        guard_solve(self.name(), start, || self.run(problem, start))
    }
}
