//! # Problem Model
//!
//! Value types describing a problem instance handed to an optimizer, and the
//! pure structural validation every optimizer runs before solving.
//!
//! ## Example
//!
//! ```rust
//! use qapopt::problem::{Matrix, OptimizationProblem, ProblemType};
//!
//! let distance = Matrix::from_rows(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
//! let flow = Matrix::from_rows(vec![vec![0.0, 3.0], vec![3.0, 0.0]]).unwrap();
//!
//! let problem = OptimizationProblem::qap(distance, flow);
//! assert_eq!(problem.problem_type, ProblemType::QuadraticAssignment);
//! assert!(problem.validate().valid);
//! assert_eq!(problem.dimension(), Some(2));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{OptimizerError, Result};
use crate::result::{MetaValue, Metadata};

/// Data key of the QAP / routing distance matrix.
pub const DISTANCE: &str = "distance";
/// Data key of the QAP flow matrix.
pub const FLOW: &str = "flow";
/// Data key of the resource allocation demand vector.
pub const DEMAND: &str = "demand";
/// Data key of the resource allocation capacity vector.
pub const CAPACITY: &str = "capacity";
/// Data key of the network topology adjacency matrix.
pub const ADJACENCY: &str = "adjacency";

/// The kind of optimization problem. Determines the required data keys and
/// which optimizers are eligible to solve it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProblemType {
    QuadraticAssignment,
    WorkflowRouting,
    ResourceAllocation,
    NetworkTopology,
    AdversarialRobust,
    MultiObjective,
}

impl ProblemType {
    /// Every problem type, in registry order.
    pub const ALL: [ProblemType; 6] = [
        ProblemType::QuadraticAssignment,
        ProblemType::WorkflowRouting,
        ProblemType::ResourceAllocation,
        ProblemType::NetworkTopology,
        ProblemType::AdversarialRobust,
        ProblemType::MultiObjective,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProblemType::QuadraticAssignment => "qap",
            ProblemType::WorkflowRouting => "workflow_routing",
            ProblemType::ResourceAllocation => "resource_allocation",
            ProblemType::NetworkTopology => "network_topology",
            ProblemType::AdversarialRobust => "adversarial_robust",
            ProblemType::MultiObjective => "multi_objective",
        }
    }

    /// Data keys that must be present for a problem of this type.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            ProblemType::QuadraticAssignment => &[DISTANCE, FLOW],
            ProblemType::WorkflowRouting => &[DISTANCE],
            ProblemType::ResourceAllocation => &[DEMAND],
            ProblemType::NetworkTopology => &[ADJACENCY],
            ProblemType::AdversarialRobust | ProblemType::MultiObjective => &[],
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProblemType {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        ProblemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OptimizerError::Configuration(format!("unknown problem type '{}'", s)))
    }
}

/// A dense row-major matrix of `f64` values.
///
/// Vectors are represented as a single row.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Matrix {
    /// Creates a matrix from row-major `values`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `values.len() != rows * cols` or the
    /// shape overflows `usize`.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            OptimizerError::Validation(format!("a {}x{} matrix is too large", rows, cols))
        })?;
        if values.len() != len {
            return Err(OptimizerError::Validation(format!(
                "expected {} values for a {}x{} matrix, got {}",
                len,
                rows,
                cols,
                values.len()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// Creates a matrix from nested rows. Ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(n_rows * n_cols);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(OptimizerError::Validation(format!(
                    "row {} has {} columns, expected {}",
                    idx,
                    row.len(),
                    n_cols
                )));
            }
            values.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            values,
        })
    }

    /// Creates a square `n x n` matrix from row-major `values`.
    pub fn square(n: usize, values: Vec<f64>) -> Result<Self> {
        Self::new(n, n, values)
    }

    /// Creates a single-row vector.
    pub fn vector(values: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            values,
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}

/// Outcome of structural validation: `(valid, error)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }

    /// Converts into a `Result`, mapping an invalid outcome to `OptimizerError::Validation`.
    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(message) if !self.valid => Err(OptimizerError::Validation(message)),
            _ if !self.valid => Err(OptimizerError::Validation("invalid problem".to_string())),
            _ => Ok(()),
        }
    }
}

/// A problem instance: its type, a keyed bag of arrays, and optional extras.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationProblem {
    pub problem_type: ProblemType,
    pub data: BTreeMap<String, Matrix>,
    pub constraints: Option<BTreeMap<String, f64>>,
    pub objectives: Option<Vec<String>>,
    pub metadata: Metadata,
}

impl OptimizationProblem {
    pub fn new(problem_type: ProblemType) -> Self {
        Self {
            problem_type,
            data: BTreeMap::new(),
            constraints: None,
            objectives: None,
            metadata: Metadata::new(),
        }
    }

    /// Builds a quadratic assignment problem from its distance and flow matrices.
    pub fn qap(distance: Matrix, flow: Matrix) -> Self {
        Self::new(ProblemType::QuadraticAssignment)
            .with_data(DISTANCE, distance)
            .with_data(FLOW, flow)
    }

    pub fn with_data(mut self, key: impl Into<String>, matrix: Matrix) -> Self {
        self.data.insert(key.into(), matrix);
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: f64) -> Self {
        self.constraints
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objectives
            .get_or_insert_with(Vec::new)
            .push(objective.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Matrix> {
        self.data.get(key)
    }

    /// Returns the primary dimension `n` of the problem, if it has one.
    ///
    /// For QAP this is the side of the distance matrix; for resource allocation
    /// the number of demand entries.
    pub fn dimension(&self) -> Option<usize> {
        match self.problem_type {
            ProblemType::QuadraticAssignment | ProblemType::WorkflowRouting => {
                self.get(DISTANCE).map(Matrix::rows)
            }
            ProblemType::ResourceAllocation => self.get(DEMAND).map(|m| m.values().len()),
            ProblemType::NetworkTopology => self.get(ADJACENCY).map(Matrix::rows),
            ProblemType::AdversarialRobust | ProblemType::MultiObjective => {
                self.data.values().next().map(|m| m.rows().max(m.cols()))
            }
        }
    }

    /// Checks the structural invariants for the problem's type.
    ///
    /// This is a pure function; it never panics on malformed input.
    pub fn validate(&self) -> Validation {
        for key in self.problem_type.required_keys() {
            if !self.data.contains_key(*key) {
                return Validation::invalid(format!(
                    "{} problem is missing required '{}' data",
                    self.problem_type, key
                ));
            }
        }

        match self.problem_type {
            ProblemType::QuadraticAssignment => self.validate_qap(),
            ProblemType::WorkflowRouting => self.validate_square(DISTANCE),
            ProblemType::NetworkTopology => self.validate_square(ADJACENCY),
            ProblemType::ResourceAllocation => self.validate_allocation(),
            ProblemType::AdversarialRobust | ProblemType::MultiObjective => {
                self.validate_generic()
            }
        }
    }

    fn validate_qap(&self) -> Validation {
        let (Some(distance), Some(flow)) = (self.get(DISTANCE), self.get(FLOW)) else {
            return Validation::invalid("QAP requires distance and flow matrices");
        };
        validate_qap_matrices(distance, flow)
    }

    fn validate_square(&self, key: &str) -> Validation {
        let Some(matrix) = self.get(key) else {
            return Validation::invalid(format!("missing '{}' data", key));
        };
        if !matrix.is_square() || matrix.is_empty() {
            return Validation::invalid(format!(
                "'{}' must be a non-empty square matrix, got {}x{}",
                key,
                matrix.rows(),
                matrix.cols()
            ));
        }
        if !matrix.is_finite() {
            return Validation::invalid(format!("'{}' contains non-finite values", key));
        }
        Validation::ok()
    }

    fn validate_allocation(&self) -> Validation {
        let Some(demand) = self.get(DEMAND) else {
            return Validation::invalid("missing 'demand' data");
        };
        if demand.is_empty() {
            return Validation::invalid("'demand' must not be empty");
        }
        let non_negative = |m: &Matrix| m.values().iter().all(|v| v.is_finite() && *v >= 0.0);
        if !non_negative(demand) {
            return Validation::invalid("'demand' must contain finite non-negative values");
        }
        if let Some(capacity) = self.get(CAPACITY) {
            if !non_negative(capacity) {
                return Validation::invalid("'capacity' must contain finite non-negative values");
            }
        }
        Validation::ok()
    }

    fn validate_generic(&self) -> Validation {
        if self.data.is_empty() {
            return Validation::invalid(format!("{} problem has no data", self.problem_type));
        }
        for (key, matrix) in &self.data {
            if matrix.is_empty() {
                return Validation::invalid(format!("'{}' must not be empty", key));
            }
            if !matrix.is_finite() {
                return Validation::invalid(format!("'{}' contains non-finite values", key));
            }
        }
        Validation::ok()
    }
}

/// Checks a QAP distance/flow pair: both square, equally sized, non-empty and finite.
pub fn validate_qap_matrices(distance: &Matrix, flow: &Matrix) -> Validation {
    if !distance.is_square() {
        return Validation::invalid(format!(
            "distance matrix must be square, got {}x{}",
            distance.rows(),
            distance.cols()
        ));
    }
    if !flow.is_square() {
        return Validation::invalid(format!(
            "flow matrix must be square, got {}x{}",
            flow.rows(),
            flow.cols()
        ));
    }
    if distance.rows() != flow.rows() {
        return Validation::invalid(format!(
            "distance ({n}x{n}) and flow ({m}x{m}) dimensions differ",
            n = distance.rows(),
            m = flow.rows()
        ));
    }
    if distance.is_empty() {
        return Validation::invalid("QAP instance must have at least one facility");
    }
    if !distance.is_finite() || !flow.is_finite() {
        return Validation::invalid("QAP matrices contain non-finite values");
    }
    Validation::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(n: usize) -> Matrix {
        Matrix::square(n, (0..n * n).map(|v| v as f64).collect()).unwrap()
    }

    #[test]
    fn test_matrix_rejects_wrong_length() {
        assert!(Matrix::new(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_matrix_shape_overflow_is_an_error() {
        let huge = 1usize << (usize::BITS / 2 + 1);
        assert!(matches!(
            Matrix::new(huge, huge, Vec::new()),
            Err(OptimizerError::Validation(_))
        ));
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let result = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(OptimizerError::Validation(_))));
    }

    #[test]
    fn test_matrix_access() {
        let m = square(3);
        assert_eq!(m.get(1, 2), 5.0);
        assert_eq!(m.row(2), &[6.0, 7.0, 8.0]);
        assert_eq!(m.dim(), (3, 3));
    }

    #[test]
    fn test_valid_qap() {
        let problem = OptimizationProblem::qap(square(4), square(4));
        assert_eq!(problem.validate(), Validation::ok());
    }

    #[test]
    fn test_mismatched_qap_dimensions() {
        let problem = OptimizationProblem::qap(square(5), square(4));
        let validation = problem.validate();
        assert!(!validation.valid);
        assert!(validation.error.unwrap().contains("dimensions differ"));
    }

    #[test]
    fn test_non_square_qap() {
        let distance = Matrix::new(2, 3, vec![0.0; 6]).unwrap();
        let problem = OptimizationProblem::qap(distance, square(2));
        assert!(!problem.validate().valid);
    }

    #[test]
    fn test_missing_flow() {
        let problem =
            OptimizationProblem::new(ProblemType::QuadraticAssignment).with_data(DISTANCE, square(3));
        let validation = problem.validate();
        assert!(!validation.valid);
        assert!(validation.error.unwrap().contains("'flow'"));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let mut flow = square(2);
        flow.set(0, 1, f64::NAN);
        let problem = OptimizationProblem::qap(square(2), flow);
        assert!(!problem.validate().valid);
    }

    #[test]
    fn test_empty_qap_rejected() {
        let problem = OptimizationProblem::qap(Matrix::zeros(0, 0), Matrix::zeros(0, 0));
        assert!(!problem.validate().valid);
    }

    #[test]
    fn test_allocation_validation() {
        let ok = OptimizationProblem::new(ProblemType::ResourceAllocation)
            .with_data(DEMAND, Matrix::vector(vec![1.0, 2.0]));
        assert!(ok.validate().valid);
        assert_eq!(ok.dimension(), Some(2));

        let negative = OptimizationProblem::new(ProblemType::ResourceAllocation)
            .with_data(DEMAND, Matrix::vector(vec![1.0, -2.0]));
        assert!(!negative.validate().valid);
    }

    #[test]
    fn test_generic_requires_data() {
        let empty = OptimizationProblem::new(ProblemType::MultiObjective);
        assert!(!empty.validate().valid);
        let with_data = empty.with_data("weights", Matrix::vector(vec![0.5, 0.5]));
        assert!(with_data.validate().valid);
    }

    #[test]
    fn test_into_result() {
        assert!(Validation::ok().into_result().is_ok());
        let err = Validation::invalid("nope").into_result().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: nope");
    }

    #[test]
    fn test_problem_type_round_trip_names() {
        for problem_type in ProblemType::ALL {
            let parsed: ProblemType = problem_type.as_str().parse().unwrap();
            assert_eq!(parsed, problem_type);
        }
        assert!("tsp".parse::<ProblemType>().is_err());
    }

    #[test]
    fn test_builders() {
        let problem = OptimizationProblem::new(ProblemType::WorkflowRouting)
            .with_data(DISTANCE, square(3))
            .with_constraint("max_hops", 4.0)
            .with_objective("latency")
            .with_metadata("source", "unit-test");
        assert_eq!(problem.constraints.as_ref().unwrap()["max_hops"], 4.0);
        assert_eq!(problem.objectives.as_ref().unwrap(), &vec!["latency".to_string()]);
        assert_eq!(problem.dimension(), Some(3));
        assert!(problem.validate().valid);
    }
}
