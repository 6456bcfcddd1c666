// imports
use crate::error::{SpaceError, SpaceResult};
use crate::vector::{SparseVector, VectorMut};

use std::collections::HashSet;
use rand::Rng;
use serde::{Serialize, Deserialize};


/// A fixed length vector over {-1, 0, +1} with a handful of non-zero entries.
///
/// The positive and negative positions are kept sorted so lookups are a binary search.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexVector {
    length: usize,
    positive: Vec<usize>,
    negative: Vec<usize>
}

impl IndexVector {

    pub fn new(length: usize, mut positive: Vec<usize>, mut negative: Vec<usize>) -> SpaceResult<IndexVector> {

        positive.sort_unstable();
        negative.sort_unstable();

        if let Some(index) = positive.iter().chain(negative.iter()).find(|i| **i >= length) {
            return Err(SpaceError::OutOfRange { index: *index, len: length });
        }
        if positive.windows(2).any(|w| w[0] == w[1]) || negative.windows(2).any(|w| w[0] == w[1])
            || positive.iter().any(|i| negative.binary_search(i).is_ok()) {
            return Err(SpaceError::configuration("an index vector position can only be set once"));
        }

        Ok(Self { length, positive, negative })
    }

    // callers guarantee sorted, disjoint, in range positions
    pub(crate) fn from_sorted(length: usize, positive: Vec<usize>, negative: Vec<usize>) -> IndexVector {
        debug_assert!(positive.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(negative.windows(2).all(|w| w[0] < w[1]));
        Self { length, positive, negative }
    }

    /// Draws a random index vector with `non_zero_count` entries, give or take `variance`.
    ///
    /// Each picked position is equally likely to be +1 or -1.
    pub fn random<R: Rng>(length: usize, non_zero_count: usize, variance: usize, rng: &mut R) -> IndexVector {

        // the number of bits to set moves up or down by at most `variance`
        let mut to_set = non_zero_count as i64;
        if variance > 0 {
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            to_set += (rng.gen::<f64>() * variance as f64 * sign) as i64;
        }
        let to_set = to_set.clamp(1, length as i64) as usize;

        let mut picked: HashSet<usize> = HashSet::with_capacity(to_set);
        let mut positive = Vec::with_capacity(to_set);
        let mut negative = Vec::with_capacity(to_set);
        while picked.len() < to_set {
            let index = rng.gen_range(0..length);
            if !picked.insert(index) { continue }
            if rng.gen_bool(0.5) {
                positive.push(index);
            } else {
                negative.push(index);
            }
        }

        positive.sort_unstable();
        negative.sort_unstable();
        Self::from_sorted(length, positive, negative)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn non_zero_count(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn positive(&self) -> &[usize] {
        &self.positive
    }

    pub fn negative(&self) -> &[usize] {
        &self.negative
    }

    pub fn get(&self, index: usize) -> i8 {
        if self.positive.binary_search(&index).is_ok() {
            1
        } else if self.negative.binary_search(&index).is_ok() {
            -1
        } else {
            0
        }
    }

    /// Iterates the non-zero entries as (index, ±1) pairs, positives first.
    pub fn entries(&self) -> impl Iterator<Item = (usize, i8)> + '_ {
        self.positive.iter().map(|i| (*i, 1))
        .chain(self.negative.iter().map(|i| (*i, -1)))
    }

    pub fn to_sparse(&self) -> SparseVector {
        let mut v = SparseVector::new(self.length);
        for (i, x) in self.entries() {
            v.set(i, x as f64);
        }
        v
    }

}
