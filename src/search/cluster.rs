//! K-Means grouping of recipes for discovery.
//!
//! Lloyd's algorithm with k-means++ seeding over the dense form of the TF-IDF
//! vectors. Seeded, so the same corpus always yields the same labels.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use crate::recipe::Recipe;
use crate::search::tfidf::SparseVector;

pub const MAX_CLUSTERS: usize = 5;
pub const MIN_RECIPES_FOR_CLUSTERING: usize = 3;
const RANDOM_SEED: u64 = 42;
const N_INIT: usize = 10;
const MAX_ITER: usize = 300;
const TOLERANCE: f64 = 1e-4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Not enough recipes for clustering (have {have}, need {need})")]
    InsufficientData { have: usize, need: usize },
    #[error("Not enough recipes for clustering: vector space unavailable")]
    VectorsUnavailable,
}

#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    seed: u64,
}

/// Result of one fit: a label per input row and the within-cluster sum of squares.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub inertia: f64,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            seed: RANDOM_SEED,
        }
    }

    /// Best of several seeded restarts, by inertia. Requires
    /// `1 <= n_clusters <= data.len()`.
    pub fn fit(&self, data: &[Vec<f64>]) -> KMeansFit {
        debug_assert!(self.n_clusters >= 1 && self.n_clusters <= data.len());
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansFit> = None;
        for _ in 0..N_INIT {
            let run = self.fit_once(data, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.unwrap_or_else(|| KMeansFit {
            labels: Vec::new(),
            inertia: 0.0,
        })
    }

    fn fit_once(&self, data: &[Vec<f64>], rng: &mut StdRng) -> KMeansFit {
        let k = self.n_clusters;
        let mut centroids = init_plus_plus(data, k, rng);
        let mut labels = vec![0; data.len()];

        for _ in 0..MAX_ITER {
            let previous = labels.clone();
            for (i, point) in data.iter().enumerate() {
                labels[i] = nearest(point, &centroids).0;
            }
            fill_empty_clusters(data, &mut labels, &mut centroids, k);

            let updated = compute_centroids(data, &labels, k);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;

            if labels == previous || shift <= TOLERANCE {
                break;
            }
        }

        let inertia = data
            .iter()
            .zip(&labels)
            .map(|(point, &label)| squared_distance(point, &centroids[label]))
            .sum();
        KMeansFit { labels, inertia }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut chosen: Vec<usize> = vec![rng.gen_range(0..data.len())];
    while chosen.len() < k {
        let centroids: Vec<Vec<f64>> = chosen.iter().map(|&i| data[i].clone()).collect();
        let weights: Vec<f64> = data
            .iter()
            .enumerate()
            .map(|(i, p)| if chosen.contains(&i) { 0.0 } else { nearest(p, &centroids).1 })
            .collect();
        let total: f64 = weights.iter().sum();

        let next = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = None;
            for (i, w) in weights.iter().enumerate() {
                if *w <= 0.0 {
                    continue;
                }
                pick = Some(i);
                if target < *w {
                    break;
                }
                target -= w;
            }
            pick
        } else {
            None
        };

        // Duplicate points leave no distance mass; pick any unused row.
        let next = next.unwrap_or_else(|| {
            let unused: Vec<usize> = (0..data.len()).filter(|i| !chosen.contains(i)).collect();
            unused[rng.gen_range(0..unused.len())]
        });
        chosen.push(next);
    }
    chosen.into_iter().map(|i| data[i].clone()).collect()
}

/// Moves the worst-fitting point of a multi-member cluster into every empty
/// cluster, so all `k` ids end up in use.
fn fill_empty_clusters(
    data: &[Vec<f64>],
    labels: &mut [usize],
    centroids: &mut [Vec<f64>],
    k: usize,
) {
    loop {
        let mut counts = vec![0usize; k];
        for &label in labels.iter() {
            counts[label] += 1;
        }
        let Some(empty) = counts.iter().position(|&c| c == 0) else {
            return;
        };
        let donor = (0..data.len())
            .filter(|&i| counts[labels[i]] > 1)
            .max_by(|&a, &b| {
                let da = squared_distance(&data[a], &centroids[labels[a]]);
                let db = squared_distance(&data[b], &centroids[labels[b]]);
                da.total_cmp(&db).then(b.cmp(&a))
            });
        let Some(donor) = donor else {
            return;
        };
        labels[donor] = empty;
        centroids[empty] = data[donor].clone();
    }
}

fn compute_centroids(data: &[Vec<f64>], labels: &[usize], k: usize) -> Vec<Vec<f64>> {
    let dim = data.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; dim]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (s, x) in sums[label].iter_mut().zip(point) {
            *s += x;
        }
    }
    for (sum, count) in sums.iter_mut().zip(&counts) {
        if *count > 0 {
            for s in sum.iter_mut() {
                *s /= *count as f64;
            }
        }
    }
    sums
}

/// Cluster label per corpus index, computed once at startup.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl ClusterIndex {
    /// `k = min(5, corpus size)`; refuses corpora smaller than three recipes.
    pub fn build(vectors: &[SparseVector], dimension: usize) -> Result<Self, ClusterError> {
        if vectors.len() < MIN_RECIPES_FOR_CLUSTERING {
            return Err(ClusterError::InsufficientData {
                have: vectors.len(),
                need: MIN_RECIPES_FOR_CLUSTERING,
            });
        }
        let n_clusters = MAX_CLUSTERS.min(vectors.len());
        let dense: Vec<Vec<f64>> = vectors.iter().map(|v| v.to_dense(dimension)).collect();
        let fit = KMeans::new(n_clusters).fit(&dense);
        info!(n_clusters, "Recipes clustered");
        Ok(Self {
            labels: fit.labels,
            n_clusters,
        })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Groups `corpus` by label. `corpus` must be the slice the index was
    /// built from; positions beyond the labelled range are skipped.
    pub fn group(&self, corpus: &[Recipe]) -> BTreeMap<usize, Vec<Recipe>> {
        let mut clusters: BTreeMap<usize, Vec<Recipe>> = BTreeMap::new();
        for (recipe, &label) in corpus.iter().zip(&self.labels) {
            clusters.entry(label).or_default().push(recipe.clone());
        }
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tfidf::TfidfVectorizer;

    #[test]
    fn test_kmeans_separates_obvious_groups() {
        let data = vec![
            vec![1.0, 0.0],
            vec![0.9, 0.1],
            vec![0.0, 1.0],
            vec![0.1, 0.9],
        ];
        let fit = KMeans::new(2).fit(&data);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[2], fit.labels[3]);
        assert_ne!(fit.labels[0], fit.labels[2]);
    }

    #[test]
    fn test_kmeans_keeps_every_cluster_populated_with_duplicates() {
        let data = vec![vec![1.0, 0.0]; 6];
        let fit = KMeans::new(4).fit(&data);
        for c in 0..4 {
            assert!(fit.labels.contains(&c), "cluster {} is empty", c);
        }
    }

    #[test]
    fn test_kmeans_is_reproducible() {
        let data: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![(i % 4) as f64, (i / 4) as f64 * 0.5])
            .collect();
        let a = KMeans::new(3).fit(&data);
        let b = KMeans::new(3).fit(&data);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_cluster_index_requires_three_recipes() {
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&["rice", "beans"]).unwrap();
        let err = ClusterIndex::build(&vectors, vectorizer.dimension()).unwrap_err();
        assert_eq!(err, ClusterError::InsufficientData { have: 2, need: 3 });
    }

    #[test]
    fn test_cluster_index_covers_every_recipe_once() {
        let docs = [
            "chicken rice", "chicken curry", "tofu broccoli", "tofu noodles", "beef stew",
            "beef tacos", "pasta tomato",
        ];
        let (vectorizer, vectors) = TfidfVectorizer::fit_transform(&docs).unwrap();
        let index = ClusterIndex::build(&vectors, vectorizer.dimension()).unwrap();
        assert_eq!(index.n_clusters(), 5);
        assert_eq!(index.labels().len(), docs.len());
        for c in 0..5 {
            assert!(index.labels().contains(&c));
        }
        assert!(index.labels().iter().all(|&l| l < 5));
    }
}
