//! # Optimizer Contract
//!
//! The `Optimizer` trait is the capability every solver implements, and
//! `OptimizerKind` is the closed set of implementations this crate can build.
//! The factory stores kinds in its registry and turns them into boxed
//! optimizers on demand.
//!
//! ## Implementing the Trait
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use qapopt::optimizer::Optimizer;
//! use qapopt::problem::{OptimizationProblem, ProblemType};
//! use qapopt::result::{OptimizationResult, SolverStatus};
//!
//! #[derive(Debug)]
//! struct Identity;
//!
//! impl Optimizer for Identity {
//!     fn name(&self) -> &'static str {
//!         "identity"
//!     }
//!
//!     fn problem_types(&self) -> BTreeSet<ProblemType> {
//!         BTreeSet::from([ProblemType::NetworkTopology])
//!     }
//!
//!     fn solve(&mut self, problem: &OptimizationProblem) -> OptimizationResult {
//!         let validation = self.validate_problem(problem);
//!         if !validation.valid {
//!             return OptimizationResult::failed(validation.error.unwrap_or_default(), Default::default());
//!         }
//!         OptimizationResult::new(SolverStatus::Success)
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{error, warn};

use crate::error::{OptimizerError, Result};
use crate::fallback::HeuristicFallback;
use crate::problem::{OptimizationProblem, ProblemType, Validation};
use crate::qap::QapConfig;
use crate::result::OptimizationResult;

/// Rough size class of a problem. Informational only.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Complexity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Complexity {
    pub fn from_dimension(n: usize) -> Self {
        match n {
            0..=10 => Complexity::Low,
            11..=30 => Complexity::Medium,
            31..=100 => Complexity::High,
            _ => Complexity::VeryHigh,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::VeryHigh => "very_high",
        }
    }
}

/// Direction of the objective. Lower is better for every solver in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// The contract every solver implements.
///
/// `solve` is the only side-effecting operation. Implementations must be
/// deterministic for a fixed seed and must never panic or return early with an
/// error: failures are reported as a [`SolverStatus::Failed`] result.
///
/// [`SolverStatus::Failed`]: crate::result::SolverStatus::Failed
pub trait Optimizer: Debug + Send {
    /// A short stable name used in logs and result metadata.
    fn name(&self) -> &'static str;

    /// Prepares the optimizer. Idempotent.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// The problem types this optimizer can solve.
    fn problem_types(&self) -> BTreeSet<ProblemType>;

    fn sense(&self) -> ObjectiveSense {
        ObjectiveSense::Minimize
    }

    fn estimate_complexity(&self, problem: &OptimizationProblem) -> Complexity {
        Complexity::from_dimension(problem.dimension().unwrap_or(0))
    }

    /// Checks type membership, then the structural invariants of the problem.
    fn validate_problem(&self, problem: &OptimizationProblem) -> Validation {
        if !self.problem_types().contains(&problem.problem_type) {
            return Validation::invalid(format!(
                "{} does not support {} problems",
                self.name(),
                problem.problem_type
            ));
        }
        problem.validate()
    }

    fn solve(&mut self, problem: &OptimizationProblem) -> OptimizationResult;
}

/// The closed set of optimizer implementations the factory can register.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptimizerKind {
    HeuristicFallback,
    QapSolver,
}

impl OptimizerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizerKind::HeuristicFallback => "heuristic_fallback",
            OptimizerKind::QapSolver => "qap_solver",
        }
    }

    /// Whether this implementation was compiled into the crate.
    pub fn is_available(self) -> bool {
        match self {
            OptimizerKind::HeuristicFallback => true,
            OptimizerKind::QapSolver => cfg!(feature = "qap"),
        }
    }

    /// Builds a fresh optimizer of this kind from `config`.
    ///
    /// # Errors
    ///
    /// Returns a construction error if the kind is not compiled in, or if the
    /// configuration is rejected by the solver.
    pub fn construct(self, config: &QapConfig) -> Result<Box<dyn Optimizer>> {
        match self {
            OptimizerKind::HeuristicFallback => {
                Ok(Box::new(HeuristicFallback::with_seed(config.seed)))
            }
            #[cfg(feature = "qap")]
            OptimizerKind::QapSolver => crate::qap::QapSolver::new(config.clone())
                .map(|solver| Box::new(solver) as Box<dyn Optimizer>)
                .map_err(|e| OptimizerError::Construction(format!("qap_solver: {}", e))),
            #[cfg(not(feature = "qap"))]
            OptimizerKind::QapSolver => Err(OptimizerError::Construction(
                "qap_solver is not compiled into this build".to_string(),
            )),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs `body`, converting a returned error or a panic into a failed result.
///
/// `start` is the instant solving began and is used for `computation_time`.
pub fn guard_solve<F>(solver: &str, start: Instant, body: F) -> OptimizationResult
where
    F: FnOnce() -> Result<OptimizationResult>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(solver, error = %err, "solve failed");
            OptimizationResult::failed(err, start.elapsed()).with_metadata("solver", solver)
        }
        Err(payload) => {
            let err = OptimizerError::Algorithm(panic_message(payload.as_ref()));
            error!(solver, error = %err, "solver panicked");
            OptimizationResult::failed(err, start.elapsed()).with_metadata("solver", solver)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::SolverStatus;
    use std::time::Instant;

    #[test]
    fn test_complexity_buckets() {
        assert_eq!(Complexity::from_dimension(5), Complexity::Low);
        assert_eq!(Complexity::from_dimension(12), Complexity::Medium);
        assert_eq!(Complexity::from_dimension(64), Complexity::High);
        assert_eq!(Complexity::from_dimension(256), Complexity::VeryHigh);
    }

    #[test]
    fn test_guard_solve_converts_errors() {
        let result = guard_solve("test", Instant::now(), || {
            Err(OptimizerError::Algorithm("boom".to_string()))
        });
        assert_eq!(result.status, SolverStatus::Failed);
        assert_eq!(result.error(), Some("Algorithm error: boom"));
    }

    #[test]
    fn test_guard_solve_converts_panics() {
        let result = guard_solve("test", Instant::now(), || -> Result<OptimizationResult> {
            panic!("index out of range")
        });
        assert_eq!(result.status, SolverStatus::Failed);
        assert!(result.error().unwrap().contains("index out of range"));
    }

    #[test]
    fn test_guard_solve_passes_results_through() {
        let result = guard_solve("test", Instant::now(), || {
            Ok(OptimizationResult::new(SolverStatus::Success))
        });
        assert_eq!(result.status, SolverStatus::Success);
    }

    #[test]
    fn test_fallback_kind_always_constructs() {
        assert!(OptimizerKind::HeuristicFallback.is_available());
        let optimizer = OptimizerKind::HeuristicFallback
            .construct(&QapConfig::default())
            .unwrap();
        assert_eq!(optimizer.name(), "heuristic_fallback");
    }
}
