use crate::error::{OptimizerError, Result};
use crate::rng::RandomNumberGenerator;

/// Tournament selection.
///
/// Draws `tournament_size` contestants uniformly with replacement and returns the
/// best of them. Smaller tournaments explore more; larger ones exploit more.
///
/// # Examples
///
/// ```
/// use qapopt::qap::TournamentSelection;
/// use qapopt::rng::RandomNumberGenerator;
///
/// let selection = TournamentSelection::new(3).unwrap().with_lower_is_better();
/// let objectives = vec![40.0, 12.0, 33.0, 90.0];
/// let mut rng = RandomNumberGenerator::from_seed(1);
///
/// let winner = selection.run_tournament(&objectives, &mut rng).unwrap();
/// assert!(winner < objectives.len());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    tournament_size: usize,
    higher_is_better: bool,
}

impl TournamentSelection {
    /// Creates a new tournament with the given size. Higher fitness wins by default.
    ///
    /// # Errors
    ///
    /// Returns an error if `tournament_size` is 0.
    pub fn new(tournament_size: usize) -> Result<Self> {
        if tournament_size < 1 {
            return Err(OptimizerError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            tournament_size,
            higher_is_better: true,
        })
    }

    pub fn with_lower_is_better(mut self) -> Self {
        self.higher_is_better = false;
        self
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Runs a single tournament and returns the index of the winner.
    ///
    /// # Errors
    ///
    /// Returns an error if `fitness` is empty.
    pub fn run_tournament(&self, fitness: &[f64], rng: &mut RandomNumberGenerator) -> Result<usize> {
        if fitness.is_empty() {
            return Err(OptimizerError::Algorithm(
                "Cannot run a tournament on an empty population".to_string(),
            ));
        }

        let mut best_idx = rng.index(fitness.len());
        for _ in 1..self.tournament_size {
            let idx = rng.index(fitness.len());
            let is_better = if self.higher_is_better {
                fitness[idx] > fitness[best_idx]
            } else {
                fitness[idx] < fitness[best_idx]
            };
            if is_better {
                best_idx = idx;
            }
        }
        Ok(best_idx)
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self {
            tournament_size: 3,
            higher_is_better: true,
        }
    }
}
