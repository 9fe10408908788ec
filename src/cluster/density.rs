// Density clustering over cosine distance.
//
// DBSCAN-family: a point is "core" when enough neighbors sit within the
// distance threshold; clusters grow outward from core points; everything
// unreachable stays noise. Clusters that end up below the minimum size are
// dissolved back into noise so every reported theme is statistically
// meaningful.
//
// Determinism: neighbor lists and expansion both run in ascending index
// order, so the output is a pure function of the input vector set. No
// randomized initialization, no iteration-order dependence.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::embedding::cosine_distance;

use super::Partition;

/// Fraction of the input used to derive the default minimum cluster size.
const MIN_CLUSTER_FRACTION: f64 = 0.04;

/// Tunable parameters for one clustering pass.
#[derive(Debug, Clone)]
pub struct DensityParams {
    /// Smallest group that counts as a cluster; smaller groups dissolve
    /// into noise.
    pub min_cluster_size: usize,
    /// Maximum cosine distance for two points to count as neighbors.
    pub max_distance: f64,
}

impl DensityParams {
    /// Derive parameters for an input of `n` vectors: minimum cluster size
    /// defaults to 4% of the input with a floor of 2.
    pub fn for_input(n: usize, min_cluster_size: Option<usize>, max_distance: f64) -> Self {
        let derived = ((n as f64 * MIN_CLUSTER_FRACTION).ceil() as usize).max(2);
        Self {
            min_cluster_size: min_cluster_size.unwrap_or(derived),
            max_distance,
        }
    }
}

/// Cluster the vector set into a partition of clusters plus noise.
///
/// Inputs of fewer than two vectors (or a min size larger than the input)
/// yield zero clusters with everything in noise — a valid outcome the
/// orchestrator reports as "no recurring patterns", not an error.
pub fn cluster(vectors: &[Vec<f64>], params: &DensityParams) -> Partition {
    let n = vectors.len();
    if n < 2 || params.min_cluster_size > n {
        return Partition::all_noise(n);
    }

    // A point must have this many in-range points (itself included) to
    // seed or extend a cluster.
    let min_samples = (params.min_cluster_size / 2).max(2);

    let neighbors = neighbor_lists(vectors, params.max_distance);

    const UNDEFINED: i64 = -2;
    const NOISE: i64 = -1;

    let mut label = vec![UNDEFINED; n];
    let mut next_cluster: i64 = 0;

    for i in 0..n {
        if label[i] != UNDEFINED {
            continue;
        }
        if neighbors[i].len() + 1 < min_samples {
            label[i] = NOISE;
            continue;
        }

        // Seed a new cluster and expand breadth-first.
        let cluster_id = next_cluster;
        next_cluster += 1;
        label[i] = cluster_id;

        let mut queue: VecDeque<usize> = neighbors[i].iter().copied().collect();
        while let Some(j) = queue.pop_front() {
            if label[j] == NOISE {
                // Border point: in range of a core point but not core
                // itself — claimed by the first cluster that reaches it.
                label[j] = cluster_id;
                continue;
            }
            if label[j] != UNDEFINED {
                continue;
            }
            label[j] = cluster_id;
            if neighbors[j].len() + 1 >= min_samples {
                queue.extend(neighbors[j].iter().copied());
            }
        }
    }

    // Collect clusters in creation order, dissolving undersized ones.
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut noise: Vec<usize> = Vec::new();

    for cluster_id in 0..next_cluster {
        let members: Vec<usize> = (0..n).filter(|&i| label[i] == cluster_id).collect();
        if members.len() >= params.min_cluster_size {
            clusters.push(members);
        } else {
            debug!(
                size = members.len(),
                min = params.min_cluster_size,
                "Dissolving undersized cluster into noise"
            );
            noise.extend(members);
        }
    }
    noise.extend((0..n).filter(|&i| label[i] == NOISE));
    noise.sort_unstable();

    info!(
        input = n,
        clusters = clusters.len(),
        noise = noise.len(),
        min_cluster_size = params.min_cluster_size,
        "Density clustering complete"
    );

    Partition { clusters, noise }
}

/// For each vector, the ascending-index list of other vectors within
/// `max_distance` cosine distance.
fn neighbor_lists(vectors: &[Vec<f64>], max_distance: f64) -> Vec<Vec<usize>> {
    let n = vectors.len();
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if cosine_distance(&vectors[i], &vectors[j]) <= max_distance {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
    }

    // j < i entries were pushed out of order; restore ascending order so
    // expansion stays deterministic.
    for list in &mut neighbors {
        list.sort_unstable();
    }

    neighbors
}
