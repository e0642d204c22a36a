//! # Optimizer Factory
//!
//! The factory maps every problem type to the optimizer that should solve it.
//! Every type starts out on the heuristic fallback; each enabled solver family
//! then replaces the entries it serves, provided its implementation is
//! available in this build. Nothing here ever fails hard: an unavailable
//! family keeps the fallback, and a solver that cannot be constructed is
//! replaced by the fallback at lookup time.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use qapopt::factory::{FactoryConfig, OptimizerFactory, ENABLE_QAP_SPECIALIZED};
//! use qapopt::optimizer::OptimizerKind;
//! use qapopt::problem::ProblemType;
//!
//! let factory = OptimizerFactory::new(FactoryConfig::default());
//! assert_eq!(
//!     factory.registry()[&ProblemType::QuadraticAssignment],
//!     OptimizerKind::HeuristicFallback
//! );
//!
//! factory.update_feature_flags(&HashMap::from([(ENABLE_QAP_SPECIALIZED.to_string(), true)]));
//! assert_eq!(
//!     factory.registry()[&ProblemType::QuadraticAssignment],
//!     OptimizerKind::QapSolver
//! );
//! ```

mod flags;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{OptimizerError, Result};
use crate::fallback::HeuristicFallback;
use crate::optimizer::{ObjectiveSense, Optimizer, OptimizerKind};
use crate::problem::{OptimizationProblem, ProblemType};
use crate::qap::QapConfig;
use crate::result::OptimizationResult;

pub use flags::{
    FeatureFlags, SolverFamily, ENABLE_ALL_SPECIALIZED, ENABLE_GPU, ENABLE_QAP_SPECIALIZED,
    FORCE_HEURISTIC,
};

/// Problem type to optimizer kind.
pub type Registry = BTreeMap<ProblemType, OptimizerKind>;

/// Factory-level configuration, injected at construction.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    pub flags: FeatureFlags,
    /// Timeout applied when neither the caller nor the solver config sets one.
    pub default_timeout: Option<Duration>,
    /// Parameters handed to the QAP solver.
    pub qap: QapConfig,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            flags: FeatureFlags::default(),
            default_timeout: Some(Duration::from_secs(300)),
            qap: QapConfig::default(),
        }
    }
}

impl FactoryConfig {
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_qap(mut self, qap: QapConfig) -> Self {
        self.qap = qap;
        self
    }

    /// Builds a configuration from a flag map and solver parameters.
    ///
    /// `params` is read by [`QapConfig::from_params`]; a `default_timeout_secs`
    /// entry sets the factory-level timeout.
    pub fn from_maps(flags: &HashMap<String, bool>, params: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self {
            flags: FeatureFlags::from_map(flags),
            qap: QapConfig::from_params(params)?,
            ..Self::default()
        };
        if let Some(raw) = params.get("default_timeout_secs") {
            let secs: f64 = raw.trim().parse().map_err(|e| {
                OptimizerError::Configuration(format!("invalid value for default_timeout_secs: {}", e))
            })?;
            config.default_timeout = Some(Duration::try_from_secs_f64(secs).map_err(|e| {
                OptimizerError::Configuration(format!("invalid default_timeout_secs: {}", e))
            })?);
        }
        Ok(config)
    }
}

#[derive(Debug)]
struct FactoryState {
    flags: FeatureFlags,
    registry: Registry,
}

/// Resolves problem types to optimizers according to feature flags.
///
/// The factory is `Send + Sync`: lookups read an immutable snapshot of the
/// registry, and flag updates swap in a freshly resolved one.
#[derive(Debug)]
pub struct OptimizerFactory {
    config: FactoryConfig,
    capabilities: BTreeSet<OptimizerKind>,
    state: RwLock<Arc<FactoryState>>,
}

impl OptimizerFactory {
    pub fn new(config: FactoryConfig) -> Self {
        let capabilities = probe_capabilities();
        let registry = resolve(&config.flags, &capabilities);
        let state = FactoryState {
            flags: config.flags.clone(),
            registry,
        };
        info!(
            capabilities = ?capabilities,
            "optimizer factory ready"
        );
        Self {
            config,
            capabilities,
            state: RwLock::new(Arc::new(state)),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Optimizer kinds that were found constructible at startup.
    pub fn capabilities(&self) -> &BTreeSet<OptimizerKind> {
        &self.capabilities
    }

    fn snapshot(&self) -> Arc<FactoryState> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// The current feature flags.
    pub fn flags(&self) -> FeatureFlags {
        self.snapshot().flags.clone()
    }

    /// The current problem type to optimizer kind mapping.
    pub fn registry(&self) -> Registry {
        self.snapshot().registry.clone()
    }

    /// The kind registered for `problem_type`.
    pub fn optimizer_for(&self, problem_type: ProblemType) -> OptimizerKind {
        self.snapshot()
            .registry
            .get(&problem_type)
            .copied()
            .unwrap_or(OptimizerKind::HeuristicFallback)
    }

    /// Applies flag changes and re-resolves the registry.
    ///
    /// Resolution depends only on the flags and the startup capabilities, so
    /// applying no changes leaves the registry untouched, and a specialized
    /// entry is only demoted by a flag that disables it.
    pub fn update_feature_flags(&self, changes: &HashMap<String, bool>) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut flags = guard.flags.clone();
        flags.apply(changes);
        let registry = resolve(&flags, &self.capabilities);
        if registry != guard.registry {
            info!(registry = ?registry, "optimizer registry updated");
        }
        *guard = Arc::new(FactoryState { flags, registry });
    }

    /// Creates an optimizer for `problem`.
    ///
    /// `enable_gpu` and `timeout` fall back to the factory flags and
    /// configuration when `None`. If the registered optimizer cannot be built
    /// or initialized, the heuristic fallback is returned instead.
    pub fn create_optimizer(
        &self,
        problem: &OptimizationProblem,
        enable_gpu: Option<bool>,
        timeout: Option<Duration>,
    ) -> Box<dyn Optimizer> {
        let state = self.snapshot();
        let kind = state
            .registry
            .get(&problem.problem_type)
            .copied()
            .unwrap_or(OptimizerKind::HeuristicFallback);

        let mut config = self.config.qap.clone();
        config.enable_gpu = enable_gpu.unwrap_or(state.flags.enable_gpu);
        config.timeout = timeout.or(config.timeout).or(self.config.default_timeout);

        let built = kind.construct(&config).and_then(|mut optimizer| {
            optimizer.initialize()?;
            Ok(optimizer)
        });
        match built {
            Ok(optimizer) => {
                debug!(problem_type = %problem.problem_type, optimizer = %kind, "optimizer created");
                optimizer
            }
            Err(err) => {
                warn!(
                    problem_type = %problem.problem_type,
                    optimizer = %kind,
                    error = %err,
                    "optimizer construction failed; using heuristic fallback"
                );
                Box::new(HeuristicFallback::with_seed(config.seed))
            }
        }
    }

    /// Creates the registered optimizer and solves `problem` with it.
    pub fn solve(&self, problem: &OptimizationProblem) -> OptimizationResult {
        let mut optimizer = self.create_optimizer(problem, None, None);
        let result = optimizer.solve(problem);
        result.log_summary(optimizer.name());
        result
    }
}

impl Default for OptimizerFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::default())
    }
}

/// Builds each available kind once with default parameters and keeps the ones
/// that construct and minimize.
fn probe_capabilities() -> BTreeSet<OptimizerKind> {
    let probe_config = QapConfig::default();
    [OptimizerKind::HeuristicFallback, OptimizerKind::QapSolver]
        .into_iter()
        .filter(|kind| {
            if !kind.is_available() {
                debug!(optimizer = %kind, "optimizer not compiled in");
                return false;
            }
            match kind.construct(&probe_config) {
                Ok(optimizer) if optimizer.sense() == ObjectiveSense::Minimize => true,
                Ok(_) => {
                    warn!(optimizer = %kind, "optimizer does not minimize; not registering");
                    false
                }
                Err(err) => {
                    warn!(optimizer = %kind, error = %err, "optimizer probe failed");
                    false
                }
            }
        })
        .collect()
}

fn resolve(flags: &FeatureFlags, capabilities: &BTreeSet<OptimizerKind>) -> Registry {
    let mut registry: Registry = ProblemType::ALL
        .into_iter()
        .map(|problem_type| (problem_type, OptimizerKind::HeuristicFallback))
        .collect();

    if flags.force_heuristic {
        debug!("force_heuristic set; every problem type uses the heuristic fallback");
        return registry;
    }

    for family in SolverFamily::ALL {
        if !flags.is_enabled(family) {
            continue;
        }
        match family.implementation().filter(|kind| capabilities.contains(kind)) {
            Some(kind) => {
                for problem_type in family.problem_types() {
                    registry.insert(*problem_type, kind);
                }
            }
            None => {
                warn!(family = %family, "specialized solver unavailable; keeping heuristic fallback");
            }
        }
    }
    registry
}
