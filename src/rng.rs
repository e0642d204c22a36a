//! # RandomNumberGenerator
//!
//! The `RandomNumberGenerator` struct wraps the `rand` crate's `StdRng` and exposes
//! the handful of draws the solvers need: unit floats for acceptance tests,
//! indices for swaps and tournaments, and shuffled permutations.
//!
//! Every solver owns its own generator. Seeding it with [`RandomNumberGenerator::from_seed`]
//! makes a whole solve reproducible.
//!
//! ## Example
//!
//! ```rust
//! use qapopt::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let perm = rng.permutation(5);
//!
//! let mut sorted = perm.clone();
//! sorted.sort_unstable();
//! assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
//! ```

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

/// A wrapper around the `rand` crate's `StdRng`.
#[derive(Clone, Debug)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new `RandomNumberGenerator` instance seeded from the system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new `RandomNumberGenerator` instance with a specific seed.
    ///
    /// This is useful for reproducible solves, tests and benchmarks.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from `seed` when present, otherwise from entropy.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::new(),
        }
    }

    /// Returns a float drawn uniformly from `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Returns an index drawn uniformly from `0..bound`.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero.
    pub fn index(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    /// Returns two distinct indices from `0..bound`.
    ///
    /// `bound` must be at least 2.
    pub fn distinct_pair(&mut self, bound: usize) -> (usize, usize) {
        let first = self.index(bound);
        // Draw from the remaining bound - 1 slots and skip over `first`.
        let mut second = self.index(bound - 1);
        if second >= first {
            second += 1;
        }
        (first, second)
    }

    /// Returns a uniformly random permutation of `0..n`.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut values: Vec<usize> = (0..n).collect();
        values.shuffle(&mut self.rng);
        values
    }

    /// Returns an integer drawn uniformly from `low..high`.
    pub fn int_in(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..high)
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_in_range() {
        let mut rng = RandomNumberGenerator::new();
        for _ in 0..100 {
            let value = rng.unit();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_distinct_pair_never_collides() {
        let mut rng = RandomNumberGenerator::from_seed(3);
        for _ in 0..1000 {
            let (a, b) = rng.distinct_pair(4);
            assert_ne!(a, b);
            assert!(a < 4 && b < 4);
        }
    }

    #[test]
    fn test_distinct_pair_with_two_slots() {
        let mut rng = RandomNumberGenerator::from_seed(9);
        for _ in 0..50 {
            let (a, b) = rng.distinct_pair(2);
            assert_eq!(a + b, 1);
        }
    }

    #[test]
    fn test_permutation_is_valid() {
        let mut rng = RandomNumberGenerator::new();
        let mut perm = rng.permutation(12);
        perm.sort_unstable();
        assert_eq!(perm, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_permutation() {
        let mut rng = RandomNumberGenerator::new();
        assert!(rng.permutation(0).is_empty());
    }

    #[test]
    fn test_clone() {
        let mut rng1 = RandomNumberGenerator::from_seed(42);
        let mut rng2 = rng1.clone();

        // Both RNGs should generate the same sequence after cloning
        assert_eq!(rng1.permutation(10), rng2.permutation(10));
        assert_eq!(rng1.unit(), rng2.unit());
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = RandomNumberGenerator::from_seed(11);
        let mut b = RandomNumberGenerator::from_optional_seed(Some(11));
        let xs: Vec<usize> = (0..20).map(|_| a.index(100)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.index(100)).collect();
        assert_eq!(xs, ys);
    }
}
