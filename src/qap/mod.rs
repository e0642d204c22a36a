//! # Quadratic Assignment
//!
//! The QAP solver and its building blocks: the validated instance with its
//! objective, permutation operators, tournament selection, and the two search
//! strategies (simulated annealing and a genetic algorithm).
//!
//! The search strategies and [`QapSolver`] are only compiled with the `qap`
//! cargo feature (on by default). Configuration and instance types are always
//! available so the factory and benchmark harness can be built without it.

mod config;
mod instance;
pub mod permutation;

#[cfg(feature = "qap")]
mod annealing;
#[cfg(feature = "qap")]
mod genetic;
#[cfg(feature = "qap")]
mod selection;
#[cfg(feature = "qap")]
mod solver;

use std::time::{Duration, Instant};

use crate::result::Metadata;

pub use config::{Algorithm, QapConfig, QapConfigBuilder};
pub use instance::QapInstance;

#[cfg(feature = "qap")]
pub use annealing::SimulatedAnnealing;
#[cfg(feature = "qap")]
pub use genetic::GeneticAlgorithm;
#[cfg(feature = "qap")]
pub use selection::TournamentSelection;
#[cfg(feature = "qap")]
pub use solver::QapSolver;

/// Cooperative wall-clock budget, polled by the search loops.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    timeout: Option<Duration>,
}

impl Deadline {
    pub fn new(start: Instant, timeout: Option<Duration>) -> Self {
        Self { start, timeout }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self::new(Instant::now(), None)
    }

    pub fn expired(&self) -> bool {
        self.timeout
            .is_some_and(|timeout| self.start.elapsed() >= timeout)
    }
}

/// What a search strategy hands back to the solver.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best permutation seen.
    pub best: Vec<usize>,
    /// Objective of `best`.
    pub best_objective: f64,
    /// Annealing steps or completed generations.
    pub iterations: usize,
    /// Whether the deadline cut the search short.
    pub timed_out: bool,
    /// Strategy-specific statistics.
    pub metadata: Metadata,
}
