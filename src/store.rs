//! The table of index vectors, one per key.
//!
//! A key's vector is drawn the first time it is asked for and kept for the
//! rest of the run. The draw is seeded from the configured seed and the key
//! itself, so the same key gets the same vector in any process. Runs that must
//! share their projections can also export the table and import it later.

// imports
use crate::error::{check_length, SpaceError, SpaceResult};
use crate::index_vector::IndexVector;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use dashmap::DashMap;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;


/// Seed of the generator drawing the vector of `key`.
fn key_seed<K: Serialize>(seed: u64, key: &K) -> SpaceResult<u64> {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(bincode::serialize(key)?);
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    Ok(u64::from_le_bytes(bytes))
}

#[derive(Debug)]
pub struct IndexVectorStore<K: Hash + Eq> {
    vectors: DashMap<K, Arc<IndexVector>>,
    length: usize,
    non_zero_count: usize,
    variance: usize,
    seed: u64
}

impl<K: Hash + Eq + Clone + Serialize> IndexVectorStore<K> {

    pub fn new(length: usize, non_zero_count: usize, variance: usize, seed: u64) -> SpaceResult<IndexVectorStore<K>> {
        if length == 0 {
            return Err(SpaceError::configuration("index vector length must be positive"));
        }
        if non_zero_count == 0 || non_zero_count > length {
            return Err(SpaceError::configuration(format!(
                "non zero count must be between 1 and the vector length {}, got {}", length, non_zero_count)));
        }
        Ok(Self { vectors: DashMap::new(), length, non_zero_count, variance, seed })
    }

    /// The vector of `key`, drawn on first request.
    ///
    /// Every later call hands back the same shared vector. Concurrent first
    /// requests draw it once; the shard stays locked until it is stored.
    pub fn vector_for(&self, key: &K) -> SpaceResult<Arc<IndexVector>> {
        if let Some(v) = self.vectors.get(key) {
            return Ok(Arc::clone(v.value()))
        }
        let entry = self.vectors.entry(key.clone()).or_try_insert_with(|| {
            let mut rng = StdRng::seed_from_u64(key_seed(self.seed, key)?);
            let v = IndexVector::random(self.length, self.non_zero_count, self.variance, &mut rng);
            Ok::<_, SpaceError>(Arc::new(v))
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// A copy of the whole key to vector table.
    pub fn export_mapping(&self) -> HashMap<K, IndexVector> {
        self.vectors.iter().map(|entry| (entry.key().clone(), entry.value().as_ref().clone())).collect()
    }

    /// Replaces the table with `mapping`.
    ///
    /// Keys of `mapping` get exactly their given vector from now on, other
    /// keys are drawn again on request. Nothing changes if a vector has the
    /// wrong length. Taking `&mut self` keeps lookups out until the new
    /// table is in place.
    pub fn import_mapping(&mut self, mapping: HashMap<K, IndexVector>) -> SpaceResult<()> {
        for v in mapping.values() {
            check_length(self.length, v.length())?;
        }
        debug!(vectors = mapping.len(), "importing index vectors");
        self.vectors = mapping.into_iter().map(|(key, v)| (key, Arc::new(v))).collect();
        Ok(())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.vectors.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Length of every vector in the store.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn non_zero_count(&self) -> usize {
        self.non_zero_count
    }

}
