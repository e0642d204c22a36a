use crate::error::{OptimizerError, OptionExt, Result};
use crate::problem::{
    validate_qap_matrices, Matrix, OptimizationProblem, ProblemType, DISTANCE, FLOW,
};

/// A validated QAP instance: `n x n` distance and flow matrices.
///
/// The cost of an assignment `p` (slot `i` holds unit `p[i]`) is
/// `sum_i sum_j distance[i][j] * flow[p[i]][p[j]]`. Lower is better.
#[derive(Debug, Clone, PartialEq)]
pub struct QapInstance {
    n: usize,
    distance: Matrix,
    flow: Matrix,
}

impl QapInstance {
    /// Creates an instance, checking that both matrices are square and equally sized.
    pub fn new(distance: Matrix, flow: Matrix) -> Result<Self> {
        validate_qap_matrices(&distance, &flow).into_result()?;
        Ok(Self {
            n: distance.rows(),
            distance,
            flow,
        })
    }

    /// Extracts and validates the QAP matrices of `problem`.
    pub fn from_problem(problem: &OptimizationProblem) -> Result<Self> {
        if problem.problem_type != ProblemType::QuadraticAssignment {
            return Err(OptimizerError::Validation(format!(
                "expected a qap problem, got {}",
                problem.problem_type
            )));
        }
        let distance = problem
            .get(DISTANCE)
            .ok_or_else_opt(|| OptimizerError::Validation("missing 'distance' data".to_string()))?;
        let flow = problem
            .get(FLOW)
            .ok_or_else_opt(|| OptimizerError::Validation("missing 'flow' data".to_string()))?;
        validate_qap_matrices(distance, flow).into_result()?;
        Ok(Self {
            n: distance.rows(),
            distance: distance.clone(),
            flow: flow.clone(),
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn distance(&self) -> &Matrix {
        &self.distance
    }

    pub fn flow(&self) -> &Matrix {
        &self.flow
    }

    /// Full O(n^2) evaluation of `perm`.
    pub fn objective(&self, perm: &[usize]) -> f64 {
        debug_assert_eq!(perm.len(), self.n);
        let mut total = 0.0;
        for i in 0..self.n {
            let d_row = self.distance.row(i);
            let f_row = self.flow.row(perm[i]);
            for j in 0..self.n {
                total += d_row[j] * f_row[perm[j]];
            }
        }
        total
    }

    /// Change in cost if slots `r` and `s` of `perm` exchanged their units.
    ///
    /// Runs in O(n) and holds for asymmetric matrices.
    pub fn swap_delta(&self, perm: &[usize], r: usize, s: usize) -> f64 {
        if r == s {
            return 0.0;
        }
        let d = &self.distance;
        let f = &self.flow;
        let (pr, ps) = (perm[r], perm[s]);

        let mut delta = d.get(r, r) * (f.get(ps, ps) - f.get(pr, pr))
            + d.get(r, s) * (f.get(ps, pr) - f.get(pr, ps))
            + d.get(s, r) * (f.get(pr, ps) - f.get(ps, pr))
            + d.get(s, s) * (f.get(pr, pr) - f.get(ps, ps));

        for (k, &pk) in perm.iter().enumerate() {
            if k == r || k == s {
                continue;
            }
            delta += d.get(k, r) * (f.get(pk, ps) - f.get(pk, pr))
                + d.get(k, s) * (f.get(pk, pr) - f.get(pk, ps))
                + d.get(r, k) * (f.get(ps, pk) - f.get(pr, pk))
                + d.get(s, k) * (f.get(pr, pk) - f.get(ps, pk));
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomNumberGenerator;

    fn random_instance(n: usize, seed: u64, symmetric: bool) -> QapInstance {
        let mut rng = RandomNumberGenerator::from_seed(seed);
        let mut distance = Matrix::zeros(n, n);
        let mut flow = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                if symmetric && j < i {
                    distance.set(i, j, distance.get(j, i));
                    flow.set(i, j, flow.get(j, i));
                } else {
                    distance.set(i, j, rng.int_in(0, 10) as f64);
                    flow.set(i, j, rng.int_in(0, 10) as f64);
                }
            }
        }
        QapInstance::new(distance, flow).unwrap()
    }

    #[test]
    fn test_objective_small_instance() {
        let distance = Matrix::from_rows(vec![vec![0.0, 2.0], vec![2.0, 0.0]]).unwrap();
        let flow = Matrix::from_rows(vec![vec![0.0, 3.0], vec![3.0, 0.0]]).unwrap();
        let instance = QapInstance::new(distance, flow).unwrap();
        assert_eq!(instance.objective(&[0, 1]), 12.0);
        assert_eq!(instance.objective(&[1, 0]), 12.0);
    }

    #[test]
    fn test_swap_delta_matches_full_evaluation() {
        for (seed, symmetric) in [(1, true), (2, false), (3, false)] {
            let instance = random_instance(9, seed, symmetric);
            let mut rng = RandomNumberGenerator::from_seed(seed + 100);
            let mut perm = rng.permutation(9);
            for _ in 0..50 {
                let (r, s) = rng.distinct_pair(9);
                let before = instance.objective(&perm);
                let delta = instance.swap_delta(&perm, r, s);
                perm.swap(r, s);
                let after = instance.objective(&perm);
                assert!((after - before - delta).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_swap_delta_same_slot() {
        let instance = random_instance(4, 5, true);
        assert_eq!(instance.swap_delta(&[0, 1, 2, 3], 2, 2), 0.0);
    }

    #[test]
    fn test_rejects_mismatched_matrices() {
        let result = QapInstance::new(Matrix::zeros(5, 5), Matrix::zeros(4, 4));
        assert!(matches!(result, Err(OptimizerError::Validation(_))));
    }

    #[test]
    fn test_from_problem_rejects_other_types() {
        let problem = OptimizationProblem::new(ProblemType::WorkflowRouting)
            .with_data(DISTANCE, Matrix::zeros(2, 2));
        assert!(QapInstance::from_problem(&problem).is_err());
    }

    #[test]
    fn test_from_problem_keeps_matrices() {
        let distance = Matrix::from_rows(vec![vec![0.0, 4.0], vec![1.0, 0.0]]).unwrap();
        let flow = Matrix::from_rows(vec![vec![0.0, 2.0], vec![7.0, 0.0]]).unwrap();
        let problem = OptimizationProblem::qap(distance.clone(), flow.clone());

        let instance = QapInstance::from_problem(&problem).unwrap();
        assert_eq!(instance.n(), 2);
        assert_eq!(instance.distance(), &distance);
        assert_eq!(instance.flow(), &flow);
        assert_eq!(instance.objective(&[0, 1]), 4.0 * 2.0 + 1.0 * 7.0);
    }
}
