//! K-means Partitioner
//!
//! Lloyd iterations over the normalized training matrix with k-means++
//! seeding. All randomness comes from a `ChaCha8Rng` seeded from the config,
//! so a fit is reproducible for a given dataset and seed.

use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::{DEFAULT_MAX_ITERATIONS, DEFAULT_N_INIT, DEFAULT_SEED};

/// Number of clusters used by the wastage model
pub const N_CLUSTERS: usize = 2;

/// K-means parameters
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Number of seeded restarts; the lowest inertia run wins
    pub n_init: usize,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: N_CLUSTERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            n_init: DEFAULT_N_INIT,
            seed: DEFAULT_SEED,
        }
    }
}

/// Result of one k-means fit
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// `(k, n_features)` centroid matrix
    pub centroids: Array2<f64>,
    /// Cluster id per input row, in row order
    pub labels: Vec<usize>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations of the winning run
    pub iterations: usize,
    /// False when the iteration cap was hit before assignments settled
    pub converged: bool,
}

/// Squared Euclidean distance
fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Distances from `point` to every centroid, divided by one common scale
/// (the largest coordinate gap). Ordering and ratios survive inputs whose
/// true distances would overflow. An infinite gap leaves every centroid
/// equally far.
pub fn scaled_distances(centroids: &Array2<f64>, point: ArrayView1<f64>) -> (f64, Vec<f64>) {
    let k = centroids.nrows();
    let mut scale = 0.0f64;
    for centroid in centroids.rows() {
        for (x, y) in centroid.iter().zip(point.iter()) {
            scale = scale.max((x - y).abs());
        }
    }

    if !scale.is_finite() {
        return (f64::INFINITY, vec![1.0; k]);
    }
    if scale == 0.0 {
        return (0.0, vec![0.0; k]);
    }

    let relative = centroids
        .rows()
        .into_iter()
        .map(|c| {
            c.iter()
                .zip(point.iter())
                .map(|(x, y)| {
                    let r = (x - y) / scale;
                    r * r
                })
                .sum::<f64>()
                .sqrt()
        })
        .collect();
    (scale, relative)
}

/// Index of the smallest distance. Ties resolve to the lower index.
pub fn nearest_index(distances: &[f64]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;

    for (i, &dist) in distances.iter().enumerate() {
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }

    best_idx
}

/// Index of the nearest centroid. Ties resolve to the lower index.
pub fn nearest_centroid(centroids: &Array2<f64>, point: ArrayView1<f64>) -> usize {
    nearest_index(&scaled_distances(centroids, point).1)
}

/// Fit k-means. Caller guarantees `data.nrows() >= config.k >= 1`.
pub fn fit(data: &Array2<f64>, config: &KMeansConfig) -> KMeansFit {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let runs = config.n_init.max(1);

    let mut best: Option<KMeansFit> = None;
    for run in 0..runs {
        let candidate = fit_once(data, config, &mut rng);
        log::debug!(
            "[K-means] run {} inertia={:.6} iterations={} converged={}",
            run,
            candidate.inertia,
            candidate.iterations,
            candidate.converged
        );

        let better = best
            .as_ref()
            .map_or(true, |current| candidate.inertia < current.inertia);
        if better {
            best = Some(candidate);
        }
    }

    // runs >= 1, so best is always populated
    best.unwrap_or_else(|| fit_once(data, config, &mut rng))
}

fn fit_once(data: &Array2<f64>, config: &KMeansConfig, rng: &mut ChaCha8Rng) -> KMeansFit {
    let k = config.k;
    let mut centroids = init_kmeans_pp(data, k, rng);
    let mut labels = assign(data, &centroids);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let updated = recompute_centroids(data, &mut labels, &centroids);
        let settled = updated == centroids;
        centroids = updated;

        let next = assign(data, &centroids);
        let stable = next == labels;
        labels = next;

        if stable || settled {
            converged = true;
            break;
        }
    }

    let inertia = labels
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_distance(data.row(i), centroids.row(c)))
        .sum();

    KMeansFit {
        centroids,
        labels,
        inertia,
        iterations,
        converged,
    }
}

/// k-means++ seeding: first centroid uniform, the rest sampled with
/// probability proportional to squared distance from the chosen set.
fn init_kmeans_pp(data: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = (0..n)
        .map(|i| squared_distance(data.row(i), data.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = n - 1;
            for (i, d) in closest.iter().enumerate() {
                acc += d;
                if acc > target {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // All points coincide with the chosen centroids
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (i, slot) in closest.iter_mut().enumerate() {
            let d = squared_distance(data.row(i), data.row(chosen));
            if d < *slot {
                *slot = d;
            }
        }
    }

    centroids
}

fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| nearest_centroid(centroids, row))
        .collect()
}

/// Mean of assigned points per cluster. An empty cluster takes over the
/// point farthest from its current centroid (from a cluster with >1 member).
fn recompute_centroids(
    data: &Array2<f64>,
    labels: &mut [usize],
    previous: &Array2<f64>,
) -> Array2<f64> {
    let k = previous.nrows();
    let mut counts = vec![0usize; k];
    for &c in labels.iter() {
        counts[c] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let mut far_idx = None;
        let mut far_dist = f64::NEG_INFINITY;
        for (i, &c) in labels.iter().enumerate() {
            if counts[c] <= 1 {
                continue;
            }
            let d = squared_distance(data.row(i), previous.row(c));
            if d > far_dist {
                far_dist = d;
                far_idx = Some(i);
            }
        }

        if let Some(i) = far_idx {
            log::debug!("[K-means] reseeding empty cluster {} with row {}", empty, i);
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
        }
    }

    let mut centroids = Array2::<f64>::zeros(previous.raw_dim());
    for (i, &c) in labels.iter().enumerate() {
        let mut row = centroids.row_mut(c);
        row += &data.row(i);
    }
    for (c, mut row) in centroids.rows_mut().into_iter().enumerate() {
        if counts[c] > 0 {
            row /= counts[c] as f64;
        } else {
            row.assign(&previous.row(c));
        }
    }

    centroids
}
