use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::warn;

use crate::optimizer::OptimizerKind;
use crate::problem::ProblemType;

/// Flag enabling the specialized QAP solver.
pub const ENABLE_QAP_SPECIALIZED: &str = "enable_qap_specialized";
/// Flag enabling every specialized solver family at once.
pub const ENABLE_ALL_SPECIALIZED: &str = "enable_all_specialized";
/// Flag forcing the heuristic fallback for every problem type.
pub const FORCE_HEURISTIC: &str = "force_heuristic";
/// Flag requesting GPU acceleration by default.
pub const ENABLE_GPU: &str = "enable_gpu";

/// A family of specialized solvers switched on and off by one flag.
///
/// Only the QAP family is implemented in this crate; the others are provided by
/// external crates and resolve as unavailable here.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SolverFamily {
    Qap,
    Routing,
    Allocation,
    Topology,
    Adversarial,
    MultiObjective,
    MetaLearning,
}

impl SolverFamily {
    pub const ALL: [SolverFamily; 7] = [
        SolverFamily::Qap,
        SolverFamily::Routing,
        SolverFamily::Allocation,
        SolverFamily::Topology,
        SolverFamily::Adversarial,
        SolverFamily::MultiObjective,
        SolverFamily::MetaLearning,
    ];

    pub fn flag_name(self) -> &'static str {
        match self {
            SolverFamily::Qap => ENABLE_QAP_SPECIALIZED,
            SolverFamily::Routing => "enable_routing_specialized",
            SolverFamily::Allocation => "enable_allocation_specialized",
            SolverFamily::Topology => "enable_topology_specialized",
            SolverFamily::Adversarial => "enable_adversarial_specialized",
            SolverFamily::MultiObjective => "enable_multi_objective_specialized",
            SolverFamily::MetaLearning => "enable_meta_learning",
        }
    }

    /// The problem types a solver of this family takes over.
    pub fn problem_types(self) -> &'static [ProblemType] {
        match self {
            SolverFamily::Qap => &[ProblemType::QuadraticAssignment],
            SolverFamily::Routing => &[ProblemType::WorkflowRouting],
            SolverFamily::Allocation => &[ProblemType::ResourceAllocation],
            SolverFamily::Topology => &[ProblemType::NetworkTopology],
            SolverFamily::Adversarial => &[ProblemType::AdversarialRobust],
            SolverFamily::MultiObjective => &[ProblemType::MultiObjective],
            SolverFamily::MetaLearning => &ProblemType::ALL,
        }
    }

    /// The in-crate implementation of this family, if there is one.
    pub fn implementation(self) -> Option<OptimizerKind> {
        match self {
            SolverFamily::Qap => Some(OptimizerKind::QapSolver),
            _ => None,
        }
    }

    fn from_flag_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.flag_name() == name)
    }
}

impl fmt::Display for SolverFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// The boolean switches controlling which solvers the factory registers.
///
/// Everything is off by default, so a fresh factory serves the heuristic
/// fallback for every problem type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    specialized: BTreeSet<SolverFamily>,
    pub enable_all_specialized: bool,
    pub force_heuristic: bool,
    pub enable_gpu: bool,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags with every specialized family switched on.
    pub fn all_specialized() -> Self {
        Self {
            enable_all_specialized: true,
            ..Self::default()
        }
    }

    /// Builds flags from a name/value map. Unknown names are logged and ignored.
    pub fn from_map(values: &HashMap<String, bool>) -> Self {
        let mut flags = Self::default();
        flags.apply(values);
        flags
    }

    pub fn with_family(mut self, family: SolverFamily, enabled: bool) -> Self {
        self.set_family(family, enabled);
        self
    }

    pub fn set_family(&mut self, family: SolverFamily, enabled: bool) {
        if enabled {
            self.specialized.insert(family);
        } else {
            self.specialized.remove(&family);
        }
    }

    /// Sets one flag by name. Returns `false` if the name is not a known flag.
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        match name {
            ENABLE_ALL_SPECIALIZED => self.enable_all_specialized = value,
            FORCE_HEURISTIC => self.force_heuristic = value,
            ENABLE_GPU => self.enable_gpu = value,
            other => match SolverFamily::from_flag_name(other) {
                Some(family) => self.set_family(family, value),
                None => return false,
            },
        }
        true
    }

    /// Applies every entry of `changes`; returns the names that were not recognised.
    pub fn apply(&mut self, changes: &HashMap<String, bool>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (name, &value) in changes {
            if !self.set(name, value) {
                warn!(flag = %name, "ignoring unknown feature flag");
                unknown.push(name.clone());
            }
        }
        unknown
    }

    /// Whether `family` should be resolved to its specialized solver.
    pub fn is_enabled(&self, family: SolverFamily) -> bool {
        !self.force_heuristic && (self.enable_all_specialized || self.specialized.contains(&family))
    }

    /// Reads a flag by name.
    pub fn get(&self, name: &str) -> Option<bool> {
        match name {
            ENABLE_ALL_SPECIALIZED => Some(self.enable_all_specialized),
            FORCE_HEURISTIC => Some(self.force_heuristic),
            ENABLE_GPU => Some(self.enable_gpu),
            other => SolverFamily::from_flag_name(other).map(|f| self.specialized.contains(&f)),
        }
    }
}
