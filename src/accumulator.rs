// imports
use crate::basis::BasisMapping;
use crate::config::{Config, SpaceParams};
use crate::error::SpaceResult;
use crate::index_vector::IndexVector;
use crate::matrix::SparseMatrix;
use crate::permutation::PermutationFunction;
use crate::space::SemanticSpace;
use crate::store::IndexVectorStore;
use crate::vector::SparseVector;

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use dashmap::DashMap;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info};


/// `context` seen `distance` positions away from `target`, negative meaning before it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation<K> {
    pub target: K,
    pub context: K,
    pub distance: i32
}

impl<K> Observation<K> {
    pub fn new(target: K, context: K, distance: i32) -> Observation<K> {
        Self { target, context, distance }
    }
}


/// Builds a semantic vector per target key by summing the index vectors of its contexts.
///
/// Sums commute, so the result does not depend on the order observations
/// arrive in. Each target vector sits behind its own lock: documents can be
/// processed in parallel, contending only when they touch the same target.
pub struct RandomIndexing<K: Hash + Eq> {
    params: SpaceParams,
    index_vectors: IndexVectorStore<K>,
    permutation: Box<dyn PermutationFunction>,
    targets: BasisMapping<K>,
    semantics: DashMap<K, Arc<Mutex<SparseVector>>>,
    semantic_filter: HashSet<K>,
    pool: ThreadPool
}

impl<K> RandomIndexing<K>
where
    K: Hash + Eq + Clone + Debug + Serialize + Send + Sync
{

    pub fn new(params: SpaceParams) -> SpaceResult<RandomIndexing<K>> {
        params.validate()?;
        let index_vectors = IndexVectorStore::new(params.vector_length, params.non_zero_count, params.variance, params.seed)?;
        let permutation = params.permutation.build(params.vector_length, params.seed)?;
        let pool = ThreadPoolBuilder::new().num_threads(params.num_threads).build()?;

        Ok(Self {
            params,
            index_vectors,
            permutation,
            targets: BasisMapping::new(),
            semantics: DashMap::new(),
            semantic_filter: HashSet::new(),
            pool
        })
    }

    pub fn from_config(config: &Config) -> SpaceResult<RandomIndexing<K>> {
        RandomIndexing::new(config.get_params())
    }

    pub fn params(&self) -> &SpaceParams {
        &self.params
    }

    /// Restricts which focus words get a semantic vector; empty keeps them all.
    ///
    /// Filtered words still take up their position in the window.
    pub fn set_semantic_filter(&mut self, keys: HashSet<K>) {
        self.semantic_filter = keys;
    }

    fn semantic_vector(&self, target: &K) -> Arc<Mutex<SparseVector>> {
        if let Some(v) = self.semantics.get(target) {
            return Arc::clone(v.value())
        }
        self.targets.dimension_of(target);
        let length = self.params.vector_length;
        let entry = self.semantics.entry(target.clone())
        .or_insert_with(|| Arc::new(Mutex::new(SparseVector::new(length))));
        Arc::clone(entry.value())
    }

    /// The index vector of `context` moved by `distance` permutations.
    fn context_vector(&self, context: &K, distance: i32) -> SpaceResult<Arc<IndexVector>> {
        let v = self.index_vectors.vector_for(context)?;
        if distance == 0 {
            return Ok(v)
        }
        Ok(Arc::new(self.permutation.permute(&v, distance)?))
    }

    /// Sums the context vectors into the vector of `target` under a single lock.
    fn accumulate<'a, I>(&self, target: &K, contexts: I) -> SpaceResult<()>
    where
        I: IntoIterator<Item = (&'a K, i32)>,
        K: 'a
    {
        // permutations are computed before taking the lock
        let vectors = contexts.into_iter()
        .map(|(context, distance)| self.context_vector(context, distance))
        .collect::<SpaceResult<Vec<_>>>()?;

        let semantic = self.semantic_vector(target);
        let mut semantic = semantic.lock().unwrap_or_else(|e| e.into_inner());
        for v in vectors {
            semantic.add_index_vector(&v)?;
        }
        Ok(())
    }

    /// Adds `context`, permuted `distance` times, to the vector of `target`.
    pub fn observe(&self, target: &K, context: &K, distance: i32) -> SpaceResult<()> {
        self.accumulate(target, [(context, distance)])
    }

    /// Observes everything in parallel on the worker pool.
    pub fn observe_all(&self, observations: &[Observation<K>]) -> SpaceResult<()> {
        self.pool.install(|| {
            observations.par_iter().try_for_each(|o| self.observe(&o.target, &o.context, o.distance))
        })
    }

    /// Slides a window of `window_size` tokens on each side over the document.
    ///
    /// Each token in the window is added to the focus token, permuted by its
    /// signed offset when permutations are on.
    pub fn process_document(&self, tokens: &[K]) -> SpaceResult<()> {

        let window = self.params.window_size;
        let use_permutations = self.params.use_permutations;

        for (i, focus) in tokens.iter().enumerate() {

            if !self.semantic_filter.is_empty() && !self.semantic_filter.contains(focus) {
                continue
            }

            let start = i.saturating_sub(window);
            let end = i.saturating_add(window).saturating_add(1).min(tokens.len());
            let contexts = (start..end).filter(|j| *j != i).map(|j| {
                // |j - i| <= window_size, which validation keeps within i32
                let offset = if j > i { (j - i) as i32 } else { -((i - j) as i32) };
                (&tokens[j], if use_permutations { offset } else { 0 })
            });
            self.accumulate(focus, contexts)?;
        }

        debug!(tokens = tokens.len(), "processed document");
        Ok(())
    }

    /// Processes documents in parallel on the worker pool.
    pub fn process_documents(&self, documents: &[Vec<K>]) -> SpaceResult<()> {
        self.pool.install(|| {
            documents.par_iter().try_for_each(|document| self.process_document(document))
        })?;
        info!(documents = documents.len(), targets = self.len(), "processed documents");
        Ok(())
    }

    /// A copy of the current vector of `key`.
    pub fn vector(&self, key: &K) -> Option<SparseVector> {
        let semantic = self.semantics.get(key)?;
        let vector = semantic.value().lock().unwrap_or_else(|e| e.into_inner()).clone();
        Some(vector)
    }

    /// Targets with a vector, in the order they were first seen.
    pub fn keys(&self) -> Vec<K> {
        self.targets.keys()
    }

    pub fn len(&self) -> usize {
        self.semantics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semantics.is_empty()
    }

    pub fn vector_length(&self) -> usize {
        self.params.vector_length
    }

    pub fn index_vectors(&self) -> &IndexVectorStore<K> {
        &self.index_vectors
    }

    pub fn export_index_vectors(&self) -> HashMap<K, IndexVector> {
        self.index_vectors.export_mapping()
    }

    pub fn import_index_vectors(&mut self, mapping: HashMap<K, IndexVector>) -> SpaceResult<()> {
        self.index_vectors.import_mapping(mapping)
    }

    pub fn space_name(&self) -> String {
        let permutations = if self.params.use_permutations {
            self.permutation.name()
        } else {
            "noPermutations".to_string()
        };
        format!("random-indexing-{}v-{}w-{}", self.params.vector_length, self.params.window_size, permutations)
    }

    /// Ends the run and hands the vectors over as a read only space.
    ///
    /// Row `d` of the space matrix is the target whose dimension is `d`.
    pub fn into_space(self) -> SpaceResult<SemanticSpace<K>> {

        let name = self.space_name();
        let keys = self.targets.keys();
        let mut rows = Vec::with_capacity(keys.len());
        for key in &keys {
            let row = match self.semantics.remove(key) {
                Some((_, semantic)) => match Arc::try_unwrap(semantic) {
                    Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
                    Err(shared) => {
                        let guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                        guard.clone()
                    }
                },
                None => SparseVector::new(self.params.vector_length)
            };
            rows.push(row);
        }

        let matrix = SparseMatrix::from_rows(rows, self.params.vector_length)?;
        info!(name = %name, targets = matrix.rows(), "finished semantic space");
        Ok(SemanticSpace::new(name, self.targets, matrix))
    }

}

impl<K: Hash + Eq> Debug for RandomIndexing<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomIndexing")
        .field("params", &self.params)
        .field("permutation", &self.permutation)
        .field("targets", &self.semantics.len())
        .finish()
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::vector::Vector;

    fn params() -> SpaceParams {
        SpaceParams { vector_length: 256, non_zero_count: 6, use_permutations: true, seed: 3, num_threads: 2, ..SpaceParams::default() }
    }

    fn words(text: &str) -> Vec<String> {
        text.split(' ').map(|x| x.to_string()).collect()
    }

    fn expected(ri: &RandomIndexing<String>, contexts: &[(&str, i32)]) -> SparseVector {
        let mut sum = SparseVector::new(ri.vector_length());
        for (context, distance) in contexts {
            let v = ri.index_vectors().vector_for(&context.to_string()).unwrap();
            let v = if *distance == 0 { v.as_ref().clone() } else { ri.permutation.permute(&v, *distance).unwrap() };
            sum.add_index_vector(&v).unwrap();
        }
        sum
    }

    #[test]
    fn order_of_observations_does_not_matter() {
        let animal = "animal".to_string();
        let (dog, cat) = ("dog".to_string(), "cat".to_string());

        let first: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        first.observe(&animal, &dog, 1).unwrap();
        first.observe(&animal, &cat, -1).unwrap();

        let second: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        second.observe(&animal, &cat, -1).unwrap();
        second.observe(&animal, &dog, 1).unwrap();

        let want = expected(&first, &[("dog", 1), ("cat", -1)]);
        assert_eq!(first.vector(&animal).unwrap(), want);
        assert_eq!(second.vector(&animal).unwrap(), want);
        assert_ne!(want, expected(&first, &[("dog", -1), ("cat", 1)]));
    }

    #[test]
    fn parallel_observations_match_serial() {
        let observations: Vec<Observation<String>> = (0..400).map(|i| {
            Observation::new(format!("t{}", i % 7), format!("c{}", i % 13), (i % 5) as i32 - 2)
        }).collect();

        let serial: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        for o in &observations {
            serial.observe(&o.target, &o.context, o.distance).unwrap();
        }
        let parallel: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        parallel.observe_all(&observations).unwrap();

        assert_eq!(parallel.len(), 7);
        for i in 0..7 {
            let key = format!("t{}", i);
            assert_eq!(parallel.vector(&key), serial.vector(&key));
        }
    }

    #[test]
    fn window_uses_signed_offsets() {
        let ri: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        ri.process_document(&words("a b c d")).unwrap();

        assert_eq!(ri.keys(), words("a b c d"));
        assert_eq!(ri.vector(&"a".to_string()).unwrap(), expected(&ri, &[("b", 1), ("c", 2)]));
        assert_eq!(ri.vector(&"c".to_string()).unwrap(), expected(&ri, &[("a", -2), ("b", -1), ("d", 1)]));
        assert_eq!(ri.vector(&"d".to_string()).unwrap(), expected(&ri, &[("b", -2), ("c", -1)]));
    }

    #[test]
    fn without_permutations_contexts_are_added_as_is() {
        let ri: RandomIndexing<String> = RandomIndexing::new(SpaceParams { use_permutations: false, ..params() }).unwrap();
        ri.process_document(&words("x y x")).unwrap();
        assert_eq!(ri.vector(&"y".to_string()).unwrap(), expected(&ri, &[("x", 0), ("x", 0)]));
        let x = ri.index_vectors().vector_for(&"x".to_string()).unwrap();
        assert_eq!(ri.vector(&"y".to_string()).unwrap().get(x.positive()[0]), 2.0);
        assert!(ri.space_name().ends_with("noPermutations"));
    }

    #[test]
    fn semantic_filter_keeps_positions() {
        let mut ri: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        ri.set_semantic_filter(["c".to_string()].into_iter().collect());
        ri.process_document(&words("a b c d e")).unwrap();
        assert_eq!(ri.keys(), vec!["c".to_string()]);
        assert_eq!(ri.vector(&"c".to_string()).unwrap(), expected(&ri, &[("a", -2), ("b", -1), ("d", 1), ("e", 2)]));
        assert!(ri.vector(&"a".to_string()).is_none());
    }

    #[test]
    fn documents_in_parallel_match_serial() {
        let documents: Vec<Vec<String>> = ["the cat sat on the mat", "the dog sat on the log", "a cat and a dog"]
        .iter().map(|d| words(d)).collect();

        let serial: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        for document in &documents {
            serial.process_document(document).unwrap();
        }
        let parallel: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        parallel.process_documents(&documents).unwrap();

        for key in serial.keys() {
            assert_eq!(parallel.vector(&key), serial.vector(&key), "{}", key);
        }
    }

    #[test]
    fn imported_index_vectors_are_reused() {
        let unpermuted = SpaceParams { use_permutations: false, ..params() };
        let first: RandomIndexing<String> = RandomIndexing::new(unpermuted.clone()).unwrap();
        first.process_document(&words("one two three")).unwrap();

        let mut second: RandomIndexing<String> = RandomIndexing::new(SpaceParams { seed: 99, ..unpermuted }).unwrap();
        second.import_index_vectors(first.export_index_vectors()).unwrap();
        second.process_document(&words("one two three")).unwrap();

        assert_eq!(first.export_index_vectors(), second.export_index_vectors());
        for key in first.keys() {
            assert_eq!(first.vector(&key), second.vector(&key));
        }
    }

    #[test]
    fn into_space_orders_rows_by_dimension() {
        let ri: RandomIndexing<String> = RandomIndexing::new(params()).unwrap();
        ri.process_document(&words("red green blue")).unwrap();
        let green = ri.vector(&"green".to_string()).unwrap();
        let name = ri.space_name();

        let space = ri.into_space().unwrap();
        assert_eq!(space.name(), name);
        assert_eq!(space.matrix().rows(), 3);
        assert_eq!(space.matrix().row_vector(1).unwrap(), &green);
        assert_eq!(space.vector(&"green".to_string()), Some(&green));
        assert!(space.vector(&"purple".to_string()).is_none());
    }

    #[test]
    fn bad_params_fail_fast() {
        assert!(RandomIndexing::<String>::new(SpaceParams { vector_length: 0, ..params() }).is_err());
        assert!(RandomIndexing::<String>::new(SpaceParams { window_size: 0, ..params() }).is_err());
        assert!(RandomIndexing::<String>::new(SpaceParams { window_size: usize::MAX, ..params() }).is_err());
    }

    #[test]
    fn widest_window_covers_the_document() {
        let ri: RandomIndexing<String> = RandomIndexing::new(SpaceParams { window_size: i32::MAX as usize, ..params() }).unwrap();
        ri.process_document(&words("a b c")).unwrap();
        assert_eq!(ri.vector(&"a".to_string()).unwrap(), expected(&ri, &[("b", 1), ("c", 2)]));
        assert_eq!(ri.vector(&"c".to_string()).unwrap(), expected(&ri, &[("a", -2), ("b", -1)]));
    }
}
