// imports
use crate::basis::BasisMapping;
use crate::error::{SpaceError, SpaceResult};
use crate::matrix::{RowScaledSparseMatrix, SparseMatrix};
use crate::vector::{SparseVector, Vector};

use std::fmt::Debug;
use std::hash::Hash;


/// The finished vectors of a run, one matrix row per target key.
#[derive(Debug)]
pub struct SemanticSpace<K: Hash + Eq + Clone> {
    name: String,
    basis: BasisMapping<K>,
    matrix: SparseMatrix
}

impl<K: Hash + Eq + Clone + Debug> SemanticSpace<K> {

    /// `basis` must give row `d` of `matrix` to the key with dimension `d`; it is frozen here.
    pub fn new(name: String, basis: BasisMapping<K>, matrix: SparseMatrix) -> SemanticSpace<K> {
        basis.set_read_only(true);
        Self { name, basis, matrix }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vector_length(&self) -> usize {
        self.matrix.columns()
    }

    pub fn vector(&self, key: &K) -> Option<&SparseVector> {
        let row = self.basis.dimension_of(key)?;
        self.matrix.row_vector(row).ok()
    }

    /// Every key of the space, in row order.
    pub fn words(&self) -> Vec<K> {
        self.basis.keys()
    }

    pub fn basis(&self) -> &BasisMapping<K> {
        &self.basis
    }

    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    /// The matrix with every row scaled to sum to one, without copying it.
    pub fn row_normalized(&self) -> SpaceResult<RowScaledSparseMatrix<&SparseMatrix>> {
        RowScaledSparseMatrix::row_normalized(&self.matrix)
    }

    fn known_vector(&self, key: &K) -> SpaceResult<&SparseVector> {
        self.vector(key).ok_or_else(|| SpaceError::UnknownKey { key: format!("{:?}", key) })
    }

    /// The `k` keys closest to `key` by cosine similarity, most similar first.
    pub fn most_similar(&self, key: &K, k: usize) -> SpaceResult<Vec<(K, f64)>> {
        let vector = self.known_vector(key)?;
        self.ranked(vector, k, &[key])
    }

    /// The `k` keys closest to an arbitrary vector, most similar first.
    pub fn most_similar_to<V: Vector + ?Sized>(&self, vector: &V, k: usize) -> SpaceResult<Vec<(K, f64)>> {
        self.ranked(vector, k, &[])
    }

    /// a is to b as c is to ? answered with the keys closest to b - a + c
    pub fn analogy(&self, inputs: [&K; 3], k: usize) -> SpaceResult<Vec<(K, f64)>> {
        let [a, b, c] = inputs;
        let mut analogy = self.known_vector(b)?.clone();
        let mut negated = self.known_vector(a)?.clone();
        negated.scale_in_place(-1.0);
        analogy.add_vector(&negated)?;
        analogy.add_vector(self.known_vector(c)?)?;
        self.ranked(&analogy, k, &inputs)
    }

    fn ranked<V: Vector + ?Sized>(&self, vector: &V, k: usize, excluded: &[&K]) -> SpaceResult<Vec<(K, f64)>> {

        let keys = self.basis.keys();
        let mut scores = Vec::with_capacity(keys.len());
        for (row, key) in keys.into_iter().enumerate() {
            if excluded.contains(&&key) {
                continue
            }
            let score = self.matrix.row_vector(row)?.cosine_similarity(vector)?;
            scores.push((key, score));
        }

        // sort by most similar in descending order, ties keep row order
        scores.sort_by(|(_, s), (_, t)| t.total_cmp(s));
        scores.truncate(k);
        Ok(scores)
    }

}
