//! # Permutation Operators
//!
//! Crossover and mutation on assignment permutations (index = slot, value = unit).
//! Every operator here maps valid permutations to valid permutations.

use crate::rng::RandomNumberGenerator;

/// Order crossover (OX).
///
/// Copies the slice `[start, end)` from `parent_a` into the child at the same
/// positions, then fills the remaining slots left to right with the values of
/// `parent_b` in their relative order, skipping values already placed.
///
/// # Panics
///
/// Panics if the parents differ in length or the slice bounds are out of range.
pub fn order_crossover_with_slice(
    parent_a: &[usize],
    parent_b: &[usize],
    start: usize,
    end: usize,
) -> Vec<usize> {
    let n = parent_a.len();
    assert_eq!(n, parent_b.len(), "parents must have equal length");
    assert!(start <= end && end <= n, "invalid crossover slice");

    let mut child = vec![usize::MAX; n];
    let mut placed = vec![false; n];
    for i in start..end {
        child[i] = parent_a[i];
        placed[parent_a[i]] = true;
    }

    let mut donor = parent_b.iter().copied().filter(|&v| !placed[v]);
    for (i, slot) in child.iter_mut().enumerate() {
        if (start..end).contains(&i) {
            continue;
        }
        if let Some(value) = donor.next() {
            *slot = value;
        }
    }
    child
}

/// Order crossover with a random non-empty slice.
pub fn order_crossover(
    parent_a: &[usize],
    parent_b: &[usize],
    rng: &mut RandomNumberGenerator,
) -> Vec<usize> {
    let n = parent_a.len();
    if n < 2 {
        return parent_a.to_vec();
    }
    let mut start = rng.index(n);
    let mut end = rng.index(n);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    order_crossover_with_slice(parent_a, parent_b, start, end + 1)
}

/// Exchanges two distinct random positions. No-op below two elements.
pub fn swap_mutation(perm: &mut [usize], rng: &mut RandomNumberGenerator) {
    if perm.len() < 2 {
        return;
    }
    let (a, b) = rng.distinct_pair(perm.len());
    perm.swap(a, b);
}
