//! # Optimization Results
//!
//! Every call to [`Optimizer::solve`](crate::optimizer::Optimizer::solve) yields an
//! [`OptimizationResult`], even when solving failed. Callers gate trust in
//! `solution` and `objective_value` on [`SolverStatus::is_usable`].

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Terminal status of a solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// The solver ran to completion.
    Success,
    /// The time budget was exceeded; the best solution found so far is attached.
    Timeout,
    /// The problem was invalid or the solver failed; see `metadata["error"]`.
    Failed,
    /// The heuristic fallback stood in for an unavailable or failed solver.
    Fallback,
}

impl SolverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Success => "success",
            SolverStatus::Timeout => "timeout",
            SolverStatus::Failed => "failed",
            SolverStatus::Fallback => "fallback",
        }
    }

    /// Whether the attached solution can be trusted.
    pub fn is_usable(self) -> bool {
        !matches!(self, SolverStatus::Failed)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata value attached to problems and results.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(v) => Some(*v),
            MetaValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Flag(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Flag(v) => write!(f, "{}", v),
            MetaValue::Integer(v) => write!(f, "{}", v),
            MetaValue::Float(v) => write!(f, "{}", v),
            MetaValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Flag(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<usize> for MetaValue {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| MetaValue::Text(value.to_string()), MetaValue::Integer)
    }
}

/// Values beyond `i64::MAX` are kept exactly as text.
impl From<u64> for MetaValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| MetaValue::Text(value.to_string()), MetaValue::Integer)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

/// Free-form key/value annotations.
pub type Metadata = BTreeMap<String, MetaValue>;

/// The shape of a solution, which depends on the problem type.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// Index = slot, value = unit. Used by QAP, routing orders and topologies.
    Permutation(Vec<usize>),
    /// Amount assigned to each consumer.
    Allocation(Vec<f64>),
}

impl Solution {
    pub fn as_permutation(&self) -> Option<&[usize]> {
        match self {
            Solution::Permutation(p) => Some(p),
            Solution::Allocation(_) => None,
        }
    }

    /// Whether this is a permutation of exactly `0..n`.
    pub fn is_valid_permutation(&self, n: usize) -> bool {
        self.as_permutation()
            .is_some_and(|p| is_permutation(p, n))
    }
}

/// Checks that `values` contains every index of `0..n` exactly once.
pub fn is_permutation(values: &[usize], n: usize) -> bool {
    if values.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &v in values {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Structured outcome of a solve.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub status: SolverStatus,
    pub solution: Option<Solution>,
    pub objective_value: Option<f64>,
    pub metadata: Metadata,
    pub computation_time: Duration,
    pub iterations: usize,
    pub optimality_gap: Option<f64>,
    pub improvement_over_baseline: f64,
}

impl OptimizationResult {
    pub fn new(status: SolverStatus) -> Self {
        Self {
            status,
            solution: None,
            objective_value: None,
            metadata: Metadata::new(),
            computation_time: Duration::ZERO,
            iterations: 0,
            optimality_gap: None,
            improvement_over_baseline: 0.0,
        }
    }

    /// A failed result carrying `error` under `metadata["error"]`.
    pub fn failed(error: impl fmt::Display, computation_time: Duration) -> Self {
        let mut result = Self::new(SolverStatus::Failed);
        result.computation_time = computation_time;
        result
            .metadata
            .insert("error".to_string(), MetaValue::Text(error.to_string()));
        result
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the error recorded on a failed result.
    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(MetaValue::as_str)
    }

    pub fn permutation(&self) -> Option<&[usize]> {
        self.solution.as_ref().and_then(Solution::as_permutation)
    }

    /// Percentage distance of the achieved objective from `known_optimal`.
    ///
    /// `None` when no objective was computed or the optimum is zero.
    pub fn gap_to(&self, known_optimal: f64) -> Option<f64> {
        let achieved = self.objective_value?;
        if known_optimal == 0.0 || !known_optimal.is_finite() {
            return None;
        }
        Some((achieved - known_optimal) / known_optimal * 100.0)
    }

    /// Records the optimality gap against `known_optimal`.
    pub fn with_gap(mut self, known_optimal: f64) -> Self {
        self.optimality_gap = self.gap_to(known_optimal);
        self
    }

    /// Emits the flat record of this result at info level.
    pub fn log_summary(&self, solver: &str) {
        tracing::info!(
            solver,
            status = %self.status,
            objective_value = ?self.objective_value,
            computation_time_ms = self.computation_time.as_secs_f64() * 1000.0,
            iterations = self.iterations,
            optimality_gap = ?self.optimality_gap,
            improvement_over_baseline = self.improvement_over_baseline,
            "optimization finished"
        );
    }
}
