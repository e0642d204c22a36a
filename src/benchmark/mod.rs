//! # Benchmark Harness
//!
//! Runs an optimizer over named QAPLIB-style instances and reports optimality
//! gaps against the published optima.
//!
//! Instance data is read from `<data_dir>/<name>.dat` when a data directory is
//! configured and the file exists. Otherwise a reproducible synthetic instance
//! of the catalogued size is generated from the instance name. Synthetic
//! instances do not share the published optimum, so their gaps are only
//! comparable between runs, not against the literature.
//!
//! ## Example
//!
//! ```rust
//! use qapopt::benchmark::BenchmarkHarness;
//! use qapopt::fallback::HeuristicFallback;
//!
//! let harness = BenchmarkHarness::new();
//! let mut optimizer = HeuristicFallback::with_seed(Some(1));
//! let report = harness.run_benchmark(&mut optimizer, &["nug5", "nug12"]);
//!
//! assert_eq!(report.summary.total, 2);
//! assert_eq!(report.summary.failed, 0);
//! ```

mod catalog;
mod loader;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{OptimizerError, Result};
use crate::optimizer::Optimizer;
use crate::problem::OptimizationProblem;
use crate::result::SolverStatus;

pub use catalog::{catalog, instance_names, lookup, CatalogEntry};
pub use loader::{load_qaplib, parse_qaplib, seed_from_name, synthetic};

/// A benchmark instance ready to solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkInstance {
    pub name: String,
    pub n: usize,
    pub known_optimal: Option<f64>,
    pub problem: OptimizationProblem,
    /// Whether the data was generated rather than loaded from disk.
    pub synthetic: bool,
}

/// Result of solving one instance.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOutcome {
    pub name: String,
    pub n: usize,
    pub status: SolverStatus,
    pub objective_value: Option<f64>,
    pub known_optimal: Option<f64>,
    pub gap: Option<f64>,
    pub improvement_over_baseline: f64,
    pub computation_time: Duration,
    pub error: Option<String>,
}

impl InstanceOutcome {
    fn failed(name: &str, error: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            n: 0,
            status: SolverStatus::Failed,
            objective_value: None,
            known_optimal: None,
            gap: None,
            improvement_over_baseline: 0.0,
            computation_time: Duration::ZERO,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate statistics over a benchmark run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BenchmarkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub mean_gap: Option<f64>,
    pub best_gap: Option<f64>,
    pub worst_gap: Option<f64>,
    pub mean_improvement: Option<f64>,
    pub total_time: Duration,
}

impl BenchmarkSummary {
    fn from_outcomes(outcomes: &[InstanceOutcome], total_time: Duration) -> Self {
        let succeeded: Vec<&InstanceOutcome> =
            outcomes.iter().filter(|o| o.status.is_usable()).collect();
        let gaps: Vec<f64> = succeeded.iter().filter_map(|o| o.gap).collect();
        let improvements: Vec<f64> = succeeded
            .iter()
            .map(|o| o.improvement_over_baseline)
            .collect();

        Self {
            total: outcomes.len(),
            succeeded: succeeded.len(),
            failed: outcomes.len() - succeeded.len(),
            mean_gap: mean(&gaps),
            best_gap: gaps.iter().copied().reduce(f64::min),
            worst_gap: gaps.iter().copied().reduce(f64::max),
            mean_improvement: mean(&improvements),
            total_time,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Everything a benchmark run produced.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub solver: String,
    pub outcomes: Vec<InstanceOutcome>,
    pub summary: BenchmarkSummary,
}

/// Loads benchmark instances and runs optimizers over them.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkHarness {
    data_dir: Option<PathBuf>,
}

impl BenchmarkHarness {
    /// A harness that always generates synthetic instances.
    pub fn new() -> Self {
        Self::default()
    }

    /// A harness that prefers `<dir>/<name>.dat` files.
    pub fn with_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Loads or generates the named catalog instance.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::UnknownInstance`] for names outside the
    /// catalog, and a parse error if an instance file exists but is malformed
    /// or does not match the catalogued size.
    pub fn get_instance(&self, name: &str) -> Result<BenchmarkInstance> {
        let entry = lookup(name).ok_or_else(|| OptimizerError::UnknownInstance(name.to_string()))?;

        let file = self
            .data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.dat", name)))
            .filter(|path| path.is_file());

        let (distance, flow, synthetic_data) = match file {
            Some(path) => {
                let (distance, flow) = load_qaplib(&path)?;
                if distance.rows() != entry.n {
                    return Err(OptimizerError::Parse(format!(
                        "{} has dimension {}, expected {}",
                        path.display(),
                        distance.rows(),
                        entry.n
                    )));
                }
                debug!(instance = name, path = %path.display(), "loaded instance file");
                (distance, flow, false)
            }
            None => {
                if let Some(dir) = &self.data_dir {
                    warn!(
                        instance = name,
                        dir = %dir.display(),
                        "instance file not found; generating synthetic data"
                    );
                }
                let (distance, flow) = synthetic(name, entry.n);
                (distance, flow, true)
            }
        };

        let problem = OptimizationProblem::qap(distance, flow)
            .with_metadata("instance", name)
            .with_metadata("synthetic", synthetic_data);

        Ok(BenchmarkInstance {
            name: name.to_string(),
            n: entry.n,
            known_optimal: entry.known_optimal,
            problem,
            synthetic: synthetic_data,
        })
    }

    /// Solves every named instance once with `optimizer`.
    ///
    /// Instances that cannot be loaded, or whose solve fails, are recorded as
    /// failed outcomes and the run continues.
    pub fn run_benchmark(&self, optimizer: &mut dyn Optimizer, names: &[&str]) -> BenchmarkReport {
        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(names.len());

        info!(solver = optimizer.name(), instances = names.len(), "benchmark started");
        for name in names {
            let instance = match self.get_instance(name) {
                Ok(instance) => instance,
                Err(err) => {
                    warn!(instance = *name, error = %err, "skipping benchmark instance");
                    outcomes.push(InstanceOutcome::failed(name, err));
                    continue;
                }
            };

            let mut result = optimizer.solve(&instance.problem);
            if let Some(optimal) = instance.known_optimal {
                result = result.with_gap(optimal);
            }
            debug!(
                instance = *name,
                status = %result.status,
                objective = ?result.objective_value,
                gap = ?result.optimality_gap,
                "benchmark instance solved"
            );

            outcomes.push(InstanceOutcome {
                name: instance.name,
                n: instance.n,
                status: result.status,
                objective_value: result.objective_value,
                known_optimal: instance.known_optimal,
                gap: result.optimality_gap,
                improvement_over_baseline: result.improvement_over_baseline,
                computation_time: result.computation_time,
                error: result.error().map(str::to_string),
            });
        }

        let summary = BenchmarkSummary::from_outcomes(&outcomes, started.elapsed());
        info!(
            solver = optimizer.name(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            mean_gap = ?summary.mean_gap,
            total_time_ms = summary.total_time.as_secs_f64() * 1000.0,
            "benchmark finished"
        );

        BenchmarkReport {
            solver: optimizer.name().to_string(),
            outcomes,
            summary,
        }
    }

    /// Runs every catalogued instance.
    pub fn run_all(&self, optimizer: &mut dyn Optimizer) -> BenchmarkReport {
        self.run_benchmark(optimizer, &instance_names())
    }
}
