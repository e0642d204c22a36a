use tracing::trace;

use crate::error::{OptimizerError, Result};
use crate::result::Metadata;
use crate::rng::RandomNumberGenerator;

use super::instance::QapInstance;
use super::permutation::{order_crossover, swap_mutation};
use super::selection::TournamentSelection;
use super::{Deadline, SearchOutcome};

/// Generational genetic algorithm on permutations.
///
/// Each generation evaluates the raw objective of every individual, then
/// replaces the whole population with children bred from tournament winners
/// by order crossover, each mutated by a swap with probability `mutation_rate`.
/// The best individual of every generation is remembered.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm {
    max_iterations: usize,
    max_population: usize,
    mutation_rate: f64,
    selection: TournamentSelection,
}

impl GeneticAlgorithm {
    /// # Errors
    ///
    /// Returns an error if `max_iterations` is 0, `max_population` is below 2,
    /// `mutation_rate` is outside `[0, 1]`, or `tournament_size` is 0.
    pub fn new(
        max_iterations: usize,
        max_population: usize,
        mutation_rate: f64,
        tournament_size: usize,
    ) -> Result<Self> {
        if max_iterations == 0 {
            return Err(OptimizerError::Configuration(
                "Maximum iterations must be greater than 0".to_string(),
            ));
        }
        if max_population < 2 {
            return Err(OptimizerError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&mutation_rate) {
            return Err(OptimizerError::Configuration(
                "Mutation rate must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(Self {
            max_iterations,
            max_population,
            mutation_rate,
            selection: TournamentSelection::new(tournament_size)?.with_lower_is_better(),
        })
    }

    /// Population size used for an instance of `n` facilities: `min(max_population, 2n)`.
    pub fn population_size(&self, n: usize) -> usize {
        self.max_population.min(2 * n).max(2)
    }

    /// Number of generations run for a given population size.
    pub fn generations(&self, population_size: usize) -> usize {
        (self.max_iterations / population_size).max(1)
    }

    pub fn run(
        &self,
        instance: &QapInstance,
        rng: &mut RandomNumberGenerator,
        deadline: &Deadline,
    ) -> Result<SearchOutcome> {
        let n = instance.n();
        let population_size = self.population_size(n);
        let generations = self.generations(population_size);

        let mut population: Vec<Vec<usize>> =
            (0..population_size).map(|_| rng.permutation(n)).collect();
        let mut best = population[0].clone();
        let mut best_cost = f64::INFINITY;
        let mut evaluations = 0usize;
        let mut completed = 0usize;
        let mut timed_out = false;

        for generation in 0..generations {
            if deadline.expired() {
                timed_out = true;
                break;
            }

            let objectives: Vec<f64> = population.iter().map(|p| instance.objective(p)).collect();
            evaluations += objectives.len();

            for (individual, &cost) in population.iter().zip(&objectives) {
                if cost < best_cost {
                    best.clone_from(individual);
                    best_cost = cost;
                    trace!(generation, best_cost, "new best");
                }
            }

            let mut offspring = Vec::with_capacity(population_size);
            while offspring.len() < population_size {
                let a = self.selection.run_tournament(&objectives, rng)?;
                let b = self.selection.run_tournament(&objectives, rng)?;
                let mut child = order_crossover(&population[a], &population[b], rng);
                if rng.unit() < self.mutation_rate {
                    swap_mutation(&mut child, rng);
                }
                offspring.push(child);
            }
            population = offspring;
            completed += 1;
        }

        if !best_cost.is_finite() {
            // Timed out before the first evaluation.
            best_cost = instance.objective(&best);
            evaluations += 1;
        }

        let mut metadata = Metadata::new();
        metadata.insert("population_size".to_string(), population_size.into());
        metadata.insert("generations".to_string(), completed.into());
        metadata.insert("evaluations".to_string(), evaluations.into());

        Ok(SearchOutcome {
            best,
            best_objective: best_cost,
            iterations: completed,
            timed_out,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Matrix;
    use crate::result::is_permutation;
    use std::time::{Duration, Instant};

    fn grid_instance(n: usize) -> QapInstance {
        let mut distance = Matrix::zeros(n, n);
        let mut flow = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                distance.set(i, j, ((i % 3).abs_diff(j % 3) + (i / 3).abs_diff(j / 3)) as f64);
                flow.set(i, j, if i == j { 0.0 } else { ((i + 2 * j) % 6) as f64 });
            }
        }
        QapInstance::new(distance, flow).unwrap()
    }

    #[test]
    fn test_population_sizing() {
        let ga = GeneticAlgorithm::new(1000, 50, 0.1, 3).unwrap();
        assert_eq!(ga.population_size(5), 10);
        assert_eq!(ga.population_size(40), 50);
        assert_eq!(ga.population_size(1), 2);
        assert_eq!(ga.generations(10), 100);
        assert_eq!(GeneticAlgorithm::new(5, 50, 0.1, 3).unwrap().generations(10), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(GeneticAlgorithm::new(0, 50, 0.1, 3).is_err());
        assert!(GeneticAlgorithm::new(10, 1, 0.1, 3).is_err());
        assert!(GeneticAlgorithm::new(10, 50, 1.5, 3).is_err());
        assert!(GeneticAlgorithm::new(10, 50, 0.1, 0).is_err());
    }

    #[test]
    fn test_run_produces_permutation_and_counts_generations() {
        let ga = GeneticAlgorithm::new(1200, 50, 0.1, 3).unwrap();
        let instance = grid_instance(9);
        let mut rng = RandomNumberGenerator::from_seed(5);
        let outcome = ga.run(&instance, &mut rng, &Deadline::unbounded()).unwrap();

        assert!(is_permutation(&outcome.best, 9));
        assert_eq!(outcome.iterations, 1200 / 18);
        assert_eq!(outcome.best_objective, instance.objective(&outcome.best));
        assert_eq!(outcome.metadata["population_size"].as_f64(), Some(18.0));
    }

    #[test]
    fn test_best_never_worse_than_first_generation() {
        let instance = grid_instance(9);
        let ga = GeneticAlgorithm::new(18, 50, 0.1, 3).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(77);
        let one_generation = ga.run(&instance, &mut rng, &Deadline::unbounded()).unwrap();

        let ga = GeneticAlgorithm::new(3600, 50, 0.1, 3).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(77);
        let many = ga.run(&instance, &mut rng, &Deadline::unbounded()).unwrap();

        // Same seed means the same initial population is evaluated first.
        assert!(many.best_objective <= one_generation.best_objective);
    }

    #[test]
    fn test_expired_deadline_still_returns_evaluated_permutation() {
        let instance = grid_instance(6);
        let ga = GeneticAlgorithm::new(1000, 50, 0.1, 3).unwrap();
        let mut rng = RandomNumberGenerator::from_seed(1);
        let deadline = Deadline::new(Instant::now(), Some(Duration::ZERO));
        let outcome = ga.run(&instance, &mut rng, &deadline).unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.iterations, 0);
        assert!(is_permutation(&outcome.best, 6));
        assert_eq!(outcome.best_objective, instance.objective(&outcome.best));
    }
}
