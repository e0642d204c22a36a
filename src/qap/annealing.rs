use tracing::trace;

use crate::error::{OptimizerError, Result};
use crate::result::Metadata;
use crate::rng::RandomNumberGenerator;

use super::instance::QapInstance;
use super::{Deadline, SearchOutcome};

/// Simulated annealing over swap moves.
///
/// Starts from a random permutation and, each iteration, proposes swapping two
/// random slots. Improving or equal moves are always taken; worsening moves are
/// taken with probability `exp(-delta / T)`. The temperature is multiplied by the
/// cooling rate after every iteration. The best permutation seen is tracked apart
/// from the current one, which may be worse.
#[derive(Debug, Clone)]
pub struct SimulatedAnnealing {
    max_iterations: usize,
    initial_temperature: f64,
    cooling_rate: f64,
    min_temperature: f64,
}

impl SimulatedAnnealing {
    /// Creates a new simulated annealing run with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `max_iterations` is 0
    /// - `initial_temperature` is not positive
    /// - `cooling_rate` is not strictly between 0 and 1
    pub fn new(
        max_iterations: usize,
        initial_temperature: f64,
        cooling_rate: f64,
        min_temperature: f64,
    ) -> Result<Self> {
        if max_iterations == 0 {
            return Err(OptimizerError::Configuration(
                "Maximum iterations must be greater than 0".to_string(),
            ));
        }
        if initial_temperature <= 0.0 {
            return Err(OptimizerError::Configuration(
                "Initial temperature must be positive".to_string(),
            ));
        }
        if !(cooling_rate > 0.0 && cooling_rate < 1.0) {
            return Err(OptimizerError::Configuration(
                "Cooling rate must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        Ok(Self {
            max_iterations,
            initial_temperature,
            cooling_rate,
            min_temperature: min_temperature.max(0.0),
        })
    }

    pub fn run(
        &self,
        instance: &QapInstance,
        rng: &mut RandomNumberGenerator,
        deadline: &Deadline,
    ) -> SearchOutcome {
        let n = instance.n();
        let mut current = rng.permutation(n);
        let mut current_cost = instance.objective(&current);
        let mut best = current.clone();
        let mut best_cost = current_cost;

        let mut temperature = self.initial_temperature;
        let mut iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut timed_out = false;

        while n >= 2 && iterations < self.max_iterations && temperature >= self.min_temperature {
            if deadline.expired() {
                timed_out = true;
                break;
            }

            let (r, s) = rng.distinct_pair(n);
            let delta = instance.swap_delta(&current, r, s);
            let accept = delta <= 0.0 || rng.unit() < (-delta / temperature).exp();

            if accept {
                current.swap(r, s);
                current_cost += delta;
                accepted_moves += 1;
                if delta < 0.0 {
                    improving_moves += 1;
                }
                if current_cost < best_cost {
                    best.clone_from(&current);
                    best_cost = current_cost;
                    trace!(iteration = iterations, best_cost, "new best");
                }
            }

            temperature *= self.cooling_rate;
            iterations += 1;
        }

        // Re-evaluate to shed rounding drift from the incremental deltas.
        let best_objective = instance.objective(&best);

        let mut metadata = Metadata::new();
        metadata.insert("accepted_moves".to_string(), accepted_moves.into());
        metadata.insert("improving_moves".to_string(), improving_moves.into());
        metadata.insert("final_temperature".to_string(), temperature.into());

        SearchOutcome {
            best,
            best_objective,
            iterations,
            timed_out,
            metadata,
        }
    }
}
