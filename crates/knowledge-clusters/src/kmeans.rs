//! K-means over embedding vectors with cosine distance.
//!
//! Seeding follows k-means++: the first centroid is picked uniformly,
//! each further centroid with probability proportional to its squared
//! distance from the nearest existing centroid. Distance is
//! `1 - cosine_similarity`.

use rand::rngs::StdRng;
use rand::Rng;

/// Output of a k-means run.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster index per input vector
    pub assignments: Vec<usize>,
    /// Final centroids, one per cluster
    pub centroids: Vec<Vec<f32>>,
    /// Iterations until membership stabilized
    pub iterations: usize,
}

/// Cosine similarity between two vectors of equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Pick initial centroids with k-means++ seeding.
fn seed_centroids(vectors: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    centroids.push(vectors[rng.random_range(0..vectors.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f64> = vectors
            .iter()
            .map(|v| {
                let nearest = centroids
                    .iter()
                    .map(|c| distance(v, c))
                    .fold(f32::INFINITY, f32::min);
                (nearest as f64).powi(2)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            // All points coincide with existing centroids.
            centroids.push(vectors[rng.random_range(0..vectors.len())].clone());
            continue;
        }

        let mut target = rng.random::<f64>() * total;
        let mut chosen = vectors.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            target -= w;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centroids.push(vectors[chosen].clone());
    }
    centroids
}

fn nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = distance(vector, centroid);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

fn mean(vectors: &[&Vec<f32>], dimension: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; dimension];
    for v in vectors {
        for (acc, x) in out.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }
    let n = vectors.len() as f32;
    for acc in &mut out {
        *acc /= n;
    }
    out
}

/// Run k-means until membership is unchanged or `max_iterations` passes.
///
/// `vectors` must be non-empty, all of one dimension, with `k` in
/// `1..=vectors.len()`.
pub fn kmeans(
    vectors: &[Vec<f32>],
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> KMeansResult {
    debug_assert!(!vectors.is_empty());
    debug_assert!(k >= 1 && k <= vectors.len());

    let dimension = vectors[0].len();
    let mut centroids = seed_centroids(vectors, k, rng);
    let mut assignments: Vec<usize> = vectors
        .iter()
        .map(|v| nearest_centroid(v, &centroids))
        .collect();

    let mut iterations = 0;
    while iterations < max_iterations {
        iterations += 1;

        // Update step: each centroid moves to the mean of its members;
        // an emptied cluster keeps its previous centroid.
        for cluster in 0..k {
            let members: Vec<&Vec<f32>> = vectors
                .iter()
                .zip(&assignments)
                .filter(|(_, a)| **a == cluster)
                .map(|(v, _)| v)
                .collect();
            if !members.is_empty() {
                centroids[cluster] = mean(&members, dimension);
            }
        }

        let next: Vec<usize> = vectors
            .iter()
            .map(|v| nearest_centroid(v, &centroids))
            .collect();
        if next == assignments {
            break;
        }
        assignments = next;
    }

    KMeansResult {
        assignments,
        centroids,
        iterations,
    }
}
