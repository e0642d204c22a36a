pub mod benchmark;
pub mod error;
pub mod factory;
pub mod fallback;
pub mod optimizer;
pub mod problem;
pub mod qap;
pub mod result;
pub mod rng;

// Re-export commonly used types for convenience
pub use error::{OptimizerError, OptionExt, Result, ResultExt};
pub use factory::{FactoryConfig, FeatureFlags, OptimizerFactory};
pub use optimizer::{Optimizer, OptimizerKind};
pub use problem::{Matrix, OptimizationProblem, ProblemType};
pub use result::{OptimizationResult, Solution, SolverStatus};
