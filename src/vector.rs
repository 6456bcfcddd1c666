// imports
use crate::error::{check_length, SpaceResult};
use crate::index_vector::IndexVector;

use std::collections::BTreeMap;
use ndarray::Array1;
use serde::{Serialize, Deserialize};


/// Read access shared by sparse vectors and their scaled views.
pub trait Vector {

    fn len(&self) -> usize;

    fn get(&self, index: usize) -> f64;

    /// Positions with an explicitly stored value, in increasing order.
    fn non_zero_indices(&self) -> Vec<usize>;

    fn magnitude(&self) -> f64 {
        self.non_zero_indices().iter().map(|i| self.get(*i).powi(2)).sum::<f64>().sqrt()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_dense(&self) -> Array1<f64> {
        let mut dense = Array1::zeros(self.len());
        for i in self.non_zero_indices() {
            dense[i] = self.get(i);
        }
        dense
    }
}

/// Write access shared by sparse vectors and their scaled views.
pub trait VectorMut: Vector {

    fn set(&mut self, index: usize, value: f64);

    /// Adds `delta` at `index` and returns the new value.
    fn add(&mut self, index: usize, delta: f64) -> f64;
}


/// A vector storing only its non-zero entries, ordered by index.
///
/// Storage grows with the number of non-zeros, never with `len`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    length: usize,
    entries: BTreeMap<usize, f64>
}

impl SparseVector {

    pub fn new(length: usize) -> SparseVector {
        Self { length, entries: BTreeMap::new() }
    }

    pub fn from_dense(values: &[f64]) -> SparseVector {
        let mut v = SparseVector::new(values.len());
        for (i, x) in values.iter().enumerate() {
            v.set(i, *x);
        }
        v
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(i, x)| (*i, *x))
    }

    fn check_index(&self, index: usize) {
        assert!(index < self.length, "index {} out of bounds for vector of length {}", index, self.length);
    }

    pub fn dot<V: Vector + ?Sized>(&self, other: &V) -> SpaceResult<f64> {
        check_length(self.length, other.len())?;
        Ok(self.iter().map(|(i, x)| x * other.get(i)).sum())
    }

    /// Cosine of the angle between both vectors, 0 when either one is all zeros.
    pub fn cosine_similarity<V: Vector + ?Sized>(&self, other: &V) -> SpaceResult<f64> {
        let dot = self.dot(other)?;
        let norms = self.magnitude() * other.magnitude();
        if norms == 0.0 {
            return Ok(0.0)
        }
        Ok(dot / norms)
    }

    pub fn add_vector<V: Vector + ?Sized>(&mut self, other: &V) -> SpaceResult<()> {
        check_length(self.length, other.len())?;
        for i in other.non_zero_indices() {
            self.add(i, other.get(i));
        }
        Ok(())
    }

    pub fn add_index_vector(&mut self, v: &IndexVector) -> SpaceResult<()> {
        check_length(self.length, v.length())?;
        for (i, x) in v.entries() {
            self.add(i, x as f64);
        }
        Ok(())
    }

    pub fn scale_in_place(&mut self, factor: f64) {
        if factor == 0.0 {
            self.entries.clear();
            return
        }
        self.entries.values_mut().for_each(|x| *x *= factor);
    }

}

impl Vector for SparseVector {

    fn len(&self) -> usize {
        self.length
    }

    fn get(&self, index: usize) -> f64 {
        self.check_index(index);
        self.entries.get(&index).copied().unwrap_or(0.0)
    }

    fn non_zero_indices(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    fn magnitude(&self) -> f64 {
        self.entries.values().map(|x| x * x).sum::<f64>().sqrt()
    }
}

impl VectorMut for SparseVector {

    fn set(&mut self, index: usize, value: f64) {
        self.check_index(index);
        if value == 0.0 {
            self.entries.remove(&index);
        } else {
            self.entries.insert(index, value);
        }
    }

    fn add(&mut self, index: usize, delta: f64) -> f64 {
        let value = self.get(index) + delta;
        self.set(index, value);
        value
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn zero_frees_the_slot() {
        let mut v = SparseVector::new(10);
        v.set(3, 2.0);
        assert_eq!(v.nnz(), 1);
        assert_eq!(v.add(3, -2.0), 0.0);
        assert_eq!(v.nnz(), 0);
        v.set(4, 0.0);
        assert_eq!(v.nnz(), 0);
    }

    #[test]
    fn from_dense_keeps_non_zeros() {
        let v = SparseVector::from_dense(&[1.0, 2.0, 0.0, 4.0, 0.0, 6.0, 0.0, 8.0, 0.0, 0.0]);
        assert_eq!(v.len(), 10);
        assert_eq!(v.nnz(), 5);
        assert_eq!(v.non_zero_indices(), vec![0, 1, 3, 5, 7]);
        assert_eq!(v.get(5), 6.0);
        assert_eq!(v.get(6), 0.0);
        assert_eq!(v.to_dense().to_vec(), vec![1.0, 2.0, 0.0, 4.0, 0.0, 6.0, 0.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn dot_and_cosine() {
        let a = SparseVector::from_dense(&[1.0, 0.0, 2.0]);
        let b = SparseVector::from_dense(&[2.0, 5.0, 1.0]);
        assert_eq!(a.dot(&b).unwrap(), 4.0);
        assert!((a.cosine_similarity(&a).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(a.cosine_similarity(&SparseVector::new(3)).unwrap(), 0.0);
        assert!(a.dot(&SparseVector::new(4)).is_err());
    }

    #[test]
    fn add_index_vector_accumulates_signs() {
        let iv = IndexVector::new(6, vec![1, 4], vec![2]).unwrap();
        let mut v = SparseVector::new(6);
        v.add_index_vector(&iv).unwrap();
        v.add_index_vector(&iv).unwrap();
        assert_eq!(v.get(1), 2.0);
        assert_eq!(v.get(2), -2.0);
        assert_eq!(v.get(0), 0.0);
        assert!(v.add_index_vector(&IndexVector::new(5, vec![], vec![]).unwrap()).is_err());
    }

    #[test]
    fn magnitude_and_scaling() {
        let mut v = SparseVector::from_dense(&[3.0, 0.0, 4.0]);
        assert_eq!(v.magnitude(), 5.0);
        v.scale_in_place(2.0);
        assert_eq!(v.get(2), 8.0);
        v.scale_in_place(0.0);
        assert_eq!(v.nnz(), 0);
    }

    #[test]
    #[should_panic]
    fn get_out_of_bounds_panics() {
        SparseVector::new(3).get(3);
    }
}
