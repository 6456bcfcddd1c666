// imports
use crate::error::{check_length, SpaceError, SpaceResult};
use crate::vector::{SparseVector, Vector};

use std::fmt::Debug;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use ndarray_stats::QuantileExt;
use rand::{rngs::StdRng, seq::index::sample, SeedableRng};
use serde::{Serialize, Deserialize};
use tracing::info;


/// The cluster id of every clustered point, in input order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignments {
    ids: Vec<usize>,
    num_clusters: usize
}

impl Assignments {

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Points of each cluster, by cluster id.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.num_clusters];
        for (point, id) in self.ids.iter().enumerate() {
            clusters[*id].push(point);
        }
        clusters
    }

}

/// A strategy partitioning vectors into clusters.
pub trait Clustering: Debug + Send {

    /// Partitions `points`, choosing the number of clusters itself.
    fn cluster(&mut self, points: &[SparseVector], dimensionality: usize) -> SpaceResult<&Assignments>;

    /// Partitions `points` into exactly `k` clusters.
    fn cluster_k(&mut self, points: &[SparseVector], dimensionality: usize, k: usize) -> SpaceResult<&Assignments>;

    /// Assignments of the last call to `cluster` or `cluster_k`.
    fn assignments(&self) -> SpaceResult<&Assignments>;
}


fn dense_points(points: &[SparseVector], dimensionality: usize) -> SpaceResult<Array2<f64>> {
    let mut dense = Array2::zeros((points.len(), dimensionality));
    for (r, point) in points.iter().enumerate() {
        check_length(dimensionality, point.len())?;
        for (c, x) in point.iter() {
            dense[[r, c]] = x;
        }
    }
    Ok(dense)
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    (&a - &b).mapv(|x| x * x).sum()
}


/// Lloyd's k-means over the dense form of the points.
///
/// Starting centroids are distinct points picked with a seeded generator.
#[derive(Clone, Debug)]
pub struct KMeans {
    seed: u64,
    max_iterations: usize,
    assignments: Option<Assignments>
}

impl KMeans {

    pub fn new(seed: u64, max_iterations: usize) -> KMeans {
        Self { seed, max_iterations, assignments: None }
    }

    fn nearest(centroids: &Array2<f64>, point: ArrayView1<f64>) -> SpaceResult<usize> {
        let distances: Array1<f64> = centroids.axis_iter(Axis(0)).map(|c| squared_distance(c, point)).collect();
        distances.argmin().map_err(|e| SpaceError::configuration(format!("cannot compare distances: {}", e)))
    }

    fn run(&self, points: &Array2<f64>, k: usize) -> SpaceResult<Vec<usize>> {
        let n = points.dim().0;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let picked = sample(&mut rng, n, k).into_vec();
        let mut centroids = points.select(Axis(0), &picked);

        let mut ids = vec![usize::MAX; n];
        for _iteration in 0..self.max_iterations.max(1) {

            let mut changed = false;
            for (i, point) in points.axis_iter(Axis(0)).enumerate() {
                let id = KMeans::nearest(&centroids, point)?;
                if ids[i] != id {
                    ids[i] = id;
                    changed = true;
                }
            }
            if !changed { break }

            // empty clusters keep their previous centroid
            for (c, mut centroid) in centroids.axis_iter_mut(Axis(0)).enumerate() {
                let members: Vec<usize> = (0..n).filter(|i| ids[*i] == c).collect();
                if let Some(mean) = points.select(Axis(0), &members).mean_axis(Axis(0)) {
                    centroid.assign(&mean);
                }
            }
        }
        Ok(ids)
    }

}

impl Clustering for KMeans {

    fn cluster(&mut self, points: &[SparseVector], dimensionality: usize) -> SpaceResult<&Assignments> {
        // rule of thumb k = sqrt(n / 2)
        let k = ((points.len() as f64 / 2.0).sqrt().ceil() as usize).clamp(1, points.len().max(1));
        self.cluster_k(points, dimensionality, k)
    }

    fn cluster_k(&mut self, points: &[SparseVector], dimensionality: usize, k: usize) -> SpaceResult<&Assignments> {
        let dense = dense_points(points, dimensionality)?;
        if points.is_empty() {
            return Ok(self.assignments.insert(Assignments { ids: Vec::new(), num_clusters: 0 }))
        }
        if k == 0 || k > points.len() {
            return Err(SpaceError::configuration(format!("cannot make {} clusters out of {} points", k, points.len())));
        }

        let ids = self.run(&dense, k)?;
        info!(points = points.len(), clusters = k, "k-means finished");
        Ok(self.assignments.insert(Assignments { ids, num_clusters: k }))
    }

    fn assignments(&self) -> SpaceResult<&Assignments> {
        self.assignments.as_ref().ok_or(SpaceError::NotClustered)
    }
}


/// Single link clustering: points whose cosine similarity reaches `threshold` share a cluster.
///
/// The number of clusters follows from the threshold, so there is no fixed-k mode.
#[derive(Clone, Debug)]
pub struct LinkClustering {
    threshold: f64,
    assignments: Option<Assignments>
}

impl LinkClustering {

    pub fn new(threshold: f64) -> LinkClustering {
        Self { threshold, assignments: None }
    }

}

fn find(parents: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parents[root] != root {
        root = parents[root];
    }
    // path compression
    let mut node = i;
    while parents[node] != root {
        let next = parents[node];
        parents[node] = root;
        node = next;
    }
    root
}

impl Clustering for LinkClustering {

    fn cluster(&mut self, points: &[SparseVector], dimensionality: usize) -> SpaceResult<&Assignments> {
        for point in points {
            check_length(dimensionality, point.len())?;
        }

        let n = points.len();
        let mut parents: Vec<usize> = (0..n).collect();
        for i in 0..n {
            for j in i+1..n {
                if points[i].cosine_similarity(&points[j])? >= self.threshold {
                    let (a, b) = (find(&mut parents, i), find(&mut parents, j));
                    parents[b] = a;
                }
            }
        }

        // number the clusters in order of their first point
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut ids = Vec::with_capacity(n);
        let mut num_clusters = 0;
        for i in 0..n {
            let root = find(&mut parents, i);
            let id = *labels[root].get_or_insert_with(|| {
                num_clusters += 1;
                num_clusters - 1
            });
            ids.push(id);
        }

        info!(points = n, clusters = num_clusters, "link clustering finished");
        Ok(self.assignments.insert(Assignments { ids, num_clusters }))
    }

    fn cluster_k(&mut self, _points: &[SparseVector], _dimensionality: usize, _k: usize) -> SpaceResult<&Assignments> {
        Err(SpaceError::unsupported("link clustering has no fixed number of clusters"))
    }

    fn assignments(&self) -> SpaceResult<&Assignments> {
        self.assignments.as_ref().ok_or(SpaceError::NotClustered)
    }
}


/// The clustering algorithms that can be picked from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusteringKind {
    KMeans { seed: u64, max_iterations: usize },
    Link { threshold: f64 },
}

impl ClusteringKind {

    pub fn build(&self) -> Box<dyn Clustering> {
        match self {
            ClusteringKind::KMeans { seed, max_iterations } => Box::new(KMeans::new(*seed, *max_iterations)),
            ClusteringKind::Link { threshold } => Box::new(LinkClustering::new(*threshold)),
        }
    }

}
