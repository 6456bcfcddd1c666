
mod accumulator;
mod basis;
mod clustering;
mod config;
mod error;
mod index_vector;
mod matrix;
mod permutation;
mod scaled;
mod space;
mod store;
mod vector;

pub use accumulator::{Observation, RandomIndexing};
pub use basis::{BasisMapping, UNKNOWN_DIMENSION};
pub use clustering::{Assignments, Clustering, ClusteringKind, KMeans, LinkClustering};
pub use config::{files_handling, Config, SpaceParams};
pub use error::{SpaceError, SpaceResult};
pub use index_vector::IndexVector;
pub use matrix::{RowScaledSparseMatrix, SparseMatrix};
pub use permutation::{CyclicPermutation, PermutationFunction, PermutationKind, WindowedPermutation};
pub use scaled::ScaledSparseVector;
pub use space::SemanticSpace;
pub use store::IndexVectorStore;
pub use vector::{SparseVector, Vector, VectorMut};
