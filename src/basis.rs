//! Mapping of keys to dense dimensions, allocated in first-seen order.

use crate::error::{SpaceError, SpaceResult};

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Serialize, Deserialize};


/// The numeric form of "no dimension", as returned by [`BasisMapping::dimension_index`].
pub const UNKNOWN_DIMENSION: i64 = -1;

#[derive(Debug, Default)]
struct Dimensions<K> {
    key_to_index: HashMap<K, usize>,
    index_to_key: Vec<K>
}

/// Assigns each key a dimension in `0..num_dimensions()`.
///
/// Lookups take a shared lock; the first lookup of a key takes the write lock
/// and re-checks, so racing threads agree on a single dimension per key.
/// While read only, unknown keys get no dimension.
#[derive(Debug)]
pub struct BasisMapping<K> {
    dimensions: RwLock<Dimensions<K>>,
    read_only: AtomicBool
}

impl<K: Hash + Eq + Clone> Default for BasisMapping<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone> BasisMapping<K> {

    pub fn new() -> BasisMapping<K> {
        Self {
            dimensions: RwLock::new(Dimensions { key_to_index: HashMap::new(), index_to_key: Vec::new() }),
            read_only: AtomicBool::new(false)
        }
    }

    /// Rebuilds a mapping where `keys[d]` owns dimension `d`.
    pub fn from_keys(keys: Vec<K>) -> SpaceResult<BasisMapping<K>> {
        let mut key_to_index = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if key_to_index.insert(key.clone(), i).is_some() {
                return Err(SpaceError::configuration(format!("key for dimension {} appears twice", i)));
            }
        }
        Ok(Self {
            dimensions: RwLock::new(Dimensions { key_to_index, index_to_key: keys }),
            read_only: AtomicBool::new(false)
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Dimensions<K>> {
        // a poisoned lock still holds a consistent table, entries are only ever appended
        self.dimensions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Dimensions<K>> {
        self.dimensions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The dimension of `key`, allocating the next free one for an unseen key.
    ///
    /// Returns `None` for an unseen key while the mapping is read only.
    pub fn dimension_of(&self, key: &K) -> Option<usize> {
        if let Some(index) = self.read().key_to_index.get(key) {
            return Some(*index)
        }
        if self.is_read_only() {
            return None
        }

        let mut dimensions = self.write();
        // another writer may have won the race while we waited
        if let Some(index) = dimensions.key_to_index.get(key) {
            return Some(*index)
        }
        // or the mapping was frozen meanwhile
        if self.is_read_only() {
            return None
        }
        let index = dimensions.index_to_key.len();
        dimensions.key_to_index.insert(key.clone(), index);
        dimensions.index_to_key.push(key.clone());
        Some(index)
    }

    /// Like [`dimension_of`](Self::dimension_of), with [`UNKNOWN_DIMENSION`] for "no dimension".
    pub fn dimension_index(&self, key: &K) -> i64 {
        self.dimension_of(key).map(|i| i as i64).unwrap_or(UNKNOWN_DIMENSION)
    }

    /// The key owning dimension `dimension`.
    pub fn dimension_description(&self, dimension: usize) -> SpaceResult<K> {
        let dimensions = self.read();
        dimensions.index_to_key.get(dimension).cloned()
        .ok_or(SpaceError::OutOfRange { index: dimension, len: dimensions.index_to_key.len() })
    }

    pub fn num_dimensions(&self) -> usize {
        self.read().index_to_key.len()
    }

    /// Every mapped key, in dimension order.
    pub fn keys(&self) -> Vec<K> {
        self.read().index_to_key.clone()
    }

    /// Toggles allocation; a freeze waits for allocations already in progress.
    pub fn set_read_only(&self, read_only: bool) {
        let _dimensions = self.write();
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

}

impl<K: Hash + Eq + Clone + Serialize> Serialize for BasisMapping<K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
            self.read().index_to_key.serialize(serializer)
    }
}

impl<'de, K: Hash + Eq + Clone + Deserialize<'de>> Deserialize<'de> for BasisMapping<K> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de> {
            let keys = Vec::<K>::deserialize(deserializer)?;
            BasisMapping::from_keys(keys).map_err(serde::de::Error::custom)
    }
}
