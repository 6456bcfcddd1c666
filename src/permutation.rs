//! Invertible permutations of index vectors.
//!
//! A permutation is applied a signed number of times: positive exponents move
//! forward, negative ones apply the inverse, so `permute(permute(v, n), -n) == v`.
//! Context words are permuted by their signed distance to the focus word,
//! which makes "two words to the left" and "two words to the right" differ.

use crate::error::{check_length, SpaceError, SpaceResult};
use crate::index_vector::IndexVector;

use std::fmt::{Debug, Display};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Serialize, Deserialize};


pub trait PermutationFunction: Debug + Send + Sync {

    /// Length of the vectors this function permutes.
    fn length(&self) -> usize;

    /// Applies the permutation `exponent` times, its inverse when `exponent` is negative.
    fn permute(&self, v: &IndexVector, exponent: i32) -> SpaceResult<IndexVector>;

    fn name(&self) -> String;
}


/// One fixed cycle over all `length` positions, visited in a seeded random order.
///
/// Since the whole permutation is a single cycle, any power of it is found in
/// constant time per position and applying it `length` times is the identity.
#[derive(Clone, Debug)]
pub struct CyclicPermutation {
    // order[k] is the k-th position along the cycle
    order: Vec<usize>,
    // place[order[k]] == k
    place: Vec<usize>
}

impl CyclicPermutation {

    pub fn new(length: usize, seed: u64) -> SpaceResult<CyclicPermutation> {
        let mut order: Vec<usize> = (0..length).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        Self::from_order(order)
    }

    /// The plain rotation `i -> i + 1 (mod length)`.
    pub fn rotation(length: usize) -> SpaceResult<CyclicPermutation> {
        Self::from_order((0..length).collect())
    }

    fn from_order(order: Vec<usize>) -> SpaceResult<CyclicPermutation> {
        if order.is_empty() {
            return Err(SpaceError::configuration("cannot permute vectors of length 0"));
        }
        let mut place = vec![0; order.len()];
        for (k, i) in order.iter().enumerate() {
            place[*i] = k;
        }
        Ok(Self { order, place })
    }

    /// Where position `index` lands after `exponent` applications.
    pub fn position(&self, index: usize, exponent: i32) -> usize {
        let len = self.order.len() as i64;
        let step = (self.place[index] as i64 + exponent as i64).rem_euclid(len);
        self.order[step as usize]
    }

    fn move_all(&self, indices: &[usize], exponent: i32) -> Vec<usize> {
        let mut moved: Vec<usize> = indices.iter().map(|i| self.position(*i, exponent)).collect();
        moved.sort_unstable();
        moved
    }

}

impl PermutationFunction for CyclicPermutation {

    fn length(&self) -> usize {
        self.order.len()
    }

    fn permute(&self, v: &IndexVector, exponent: i32) -> SpaceResult<IndexVector> {
        check_length(self.length(), v.length())?;
        if exponent == 0 {
            return Ok(v.clone())
        }
        Ok(IndexVector::from_sorted(v.length(), self.move_all(v.positive(), exponent), self.move_all(v.negative(), exponent)))
    }

    fn name(&self) -> String {
        "CyclicPermutation".to_string()
    }
}


/// Shares one permutation between every distance inside a window.
///
/// The exponent is divided by `window` (truncating toward zero) before it is
/// handed to the inner cyclic permutation.
#[derive(Clone, Debug)]
pub struct WindowedPermutation {
    inner: CyclicPermutation,
    // exponents are i32, a wider window could never be reached
    window: i32
}

impl WindowedPermutation {

    pub fn new(inner: CyclicPermutation, window: usize) -> SpaceResult<WindowedPermutation> {
        let window = i32::try_from(window).ok().filter(|w| *w > 0).ok_or_else(|| {
            SpaceError::configuration(format!("permutation window must be between 1 and {}, got {}", i32::MAX, window))
        })?;
        Ok(Self { inner, window })
    }

}

impl PermutationFunction for WindowedPermutation {

    fn length(&self) -> usize {
        self.inner.length()
    }

    fn permute(&self, v: &IndexVector, exponent: i32) -> SpaceResult<IndexVector> {
        self.inner.permute(v, exponent / self.window)
    }

    fn name(&self) -> String {
        format!("WindowedPermutation{}", self.window)
    }
}


/// The permutation functions that can be picked from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PermutationKind {
    #[default]
    Cyclic,
    Rotation,
    Windowed { window: usize },
}

impl PermutationKind {

    pub fn build(&self, length: usize, seed: u64) -> SpaceResult<Box<dyn PermutationFunction>> {
        let function: Box<dyn PermutationFunction> = match self {
            PermutationKind::Cyclic => Box::new(CyclicPermutation::new(length, seed)?),
            PermutationKind::Rotation => Box::new(CyclicPermutation::rotation(length)?),
            PermutationKind::Windowed { window } => {
                Box::new(WindowedPermutation::new(CyclicPermutation::new(length, seed)?, *window)?)
            }
        };
        Ok(function)
    }

}

impl Display for PermutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermutationKind::Cyclic => write!(f, "cyclic"),
            PermutationKind::Rotation => write!(f, "rotation"),
            PermutationKind::Windowed { window } => write!(f, "windowed({})", window),
        }
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn vector(length: usize, seed: u64) -> IndexVector {
        IndexVector::random(length, 4, 0, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn forward_and_back_is_identity() {
        let function = CyclicPermutation::new(32, 1).unwrap();
        let v = vector(32, 2);
        let forward = function.permute(&v, 1).unwrap();
        let backward = function.permute(&v, -1).unwrap();

        assert_eq!(function.permute(&forward, -1).unwrap(), v);
        assert_ne!(forward, v);
        assert_ne!(backward, v);
        assert_ne!(forward, backward);
        assert_eq!(function.permute(&forward, 1).unwrap(), function.permute(&v, 2).unwrap());
        assert_eq!(function.permute(&v, 0).unwrap(), v);
    }

    #[test]
    fn length_applications_is_identity() {
        let function = CyclicPermutation::new(32, 9).unwrap();
        for i in 0..32 {
            for step in 1..32 {
                assert_ne!(function.position(i, step), i, "position {} came back after {} steps", i, step);
            }
            assert_eq!(function.position(i, 32), i);
        }

        for kind in [PermutationKind::Cyclic, PermutationKind::Rotation] {
            let function = kind.build(32, 9).unwrap();
            let v = vector(32, 4);
            let mut current = v.clone();
            for _ in 0..32 {
                current = function.permute(&current, 1).unwrap();
            }
            assert_eq!(current, v, "{} is not periodic", kind);
            assert_eq!(function.permute(&v, 32).unwrap(), v);
            assert_eq!(function.permute(&v, -32).unwrap(), v);
        }
    }

    #[test]
    fn rotation_shifts_positions() {
        let function = CyclicPermutation::rotation(8).unwrap();
        let v = IndexVector::new(8, vec![0, 7], vec![3]).unwrap();
        let moved = function.permute(&v, 2).unwrap();
        assert_eq!(moved.positive(), &[1, 2]);
        assert_eq!(moved.negative(), &[5]);
        let moved = function.permute(&v, -1).unwrap();
        assert_eq!(moved.positive(), &[6, 7]);
        assert_eq!(moved.negative(), &[2]);
    }

    #[test]
    fn windowed_groups_distances() {
        let function = PermutationKind::Windowed { window: 3 }.build(64, 5).unwrap();
        let v = vector(64, 6);
        assert_eq!(function.permute(&v, 2).unwrap(), v);
        assert_eq!(function.permute(&v, 3).unwrap(), function.permute(&v, 5).unwrap());
        assert_ne!(function.permute(&v, 3).unwrap(), v);
        let there = function.permute(&v, 6).unwrap();
        assert_eq!(function.permute(&there, -6).unwrap(), v);
        assert!(PermutationKind::Windowed { window: 0 }.build(64, 5).is_err());
    }

    #[test]
    fn oversized_window_is_rejected() {
        let kind = PermutationKind::Windowed { window: 1usize << 32 };
        assert!(matches!(kind.build(64, 0), Err(SpaceError::Configuration { .. })));
        assert!(PermutationKind::Windowed { window: i32::MAX as usize + 1 }.build(64, 0).is_err());

        let widest = PermutationKind::Windowed { window: i32::MAX as usize }.build(64, 0).unwrap();
        let v = vector(64, 1);
        assert_eq!(widest.permute(&v, i32::MAX - 1).unwrap(), v);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let function = CyclicPermutation::new(16, 0).unwrap();
        assert!(matches!(function.permute(&vector(32, 0), 1), Err(SpaceError::DimensionMismatch { expected: 16, actual: 32 })));
        assert!(CyclicPermutation::new(0, 0).is_err());
    }

    #[test]
    fn same_seed_same_permutation() {
        let v = vector(128, 3);
        let a = CyclicPermutation::new(128, 42).unwrap();
        let b = CyclicPermutation::new(128, 42).unwrap();
        assert_eq!(a.permute(&v, 7).unwrap(), b.permute(&v, 7).unwrap());
    }

    #[test]
    fn kind_from_json() {
        let kind: PermutationKind = serde_json::from_str(r#"{"type": "windowed", "window": 5}"#).unwrap();
        assert_eq!(kind, PermutationKind::Windowed { window: 5 });
        let kind: PermutationKind = serde_json::from_str(r#"{"type": "cyclic"}"#).unwrap();
        assert_eq!(kind, PermutationKind::Cyclic);
    }

    proptest! {
        #[test]
        fn permutation_laws(seed in any::<u64>(), vec_seed in any::<u64>(), a in -200i32..200, b in -200i32..200) {
            let function = CyclicPermutation::new(64, seed).unwrap();
            let v = vector(64, vec_seed);

            let va = function.permute(&v, a).unwrap();
            prop_assert_eq!(function.permute(&va, b).unwrap(), function.permute(&v, a + b).unwrap());
            prop_assert_eq!(function.permute(&va, -a).unwrap(), v.clone());
            prop_assert_eq!(va.non_zero_count(), v.non_zero_count());
        }
    }
}
