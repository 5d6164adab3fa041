//! Density-based spatial clustering (DBSCAN) over raw positions.
//!
//! ## Algorithm
//! 1. Every point starts unclassified.
//! 2. Points are visited in input order; labelled points are skipped.
//! 3. A seed whose epsilon-neighbourhood (inclusive, `distance <= epsilon`,
//!    itself included) has fewer than `min_points` members becomes noise.
//! 4. Otherwise a new cluster grows breadth-first from the seed: noise
//!    points reached by the expansion join the cluster as border points,
//!    unclassified points join and, if they are core points themselves,
//!    push their own neighbourhood onto the frontier.
//!
//! Labels live in a vector indexed by input position, so points with
//! identical coordinates stay distinct entries.
//!
//! Neighbourhoods come from a linear scan for small inputs and from an
//! R-tree above [`ClusterConfig::index_threshold`]; both yield the same
//! neighbourhoods in the same order, so labels do not depend on the path.

use std::collections::VecDeque;

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rstar::RTree;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError, check_positive};
use crate::geometry::distance;
use crate::rtree::{IndexedPoint, build_rtree, indices_within};
use crate::{Cluster, ClusterLabel, ClusterResult, Point3};

/// Configuration for density clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Neighbourhood radius. Must be finite and > 0.
    /// Default: 0.5
    pub epsilon: f64,

    /// Minimum neighbourhood size (self included) for a core point. Must be >= 1.
    /// Default: 2
    pub min_points: usize,

    /// Inputs with at least this many points use the R-tree index.
    /// Default: 64
    pub index_threshold: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.5,
            min_points: 2,
            index_threshold: 64,
        }
    }
}

impl ClusterConfig {
    pub fn new(epsilon: f64, min_points: usize) -> Self {
        Self {
            epsilon,
            min_points,
            ..Self::default()
        }
    }

    /// Reject configurations the algorithm cannot interpret.
    pub fn validate(&self) -> Result<()> {
        check_positive("epsilon", self.epsilon)?;
        if self.min_points < 1 {
            return Err(TraceError::invalid(
                "min_points",
                self.min_points,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unclassified,
    Noise,
    Cluster(usize),
}

/// Epsilon-neighbourhood lookup strategy.
enum Neighborhoods<'a> {
    Linear { points: &'a [Point3], epsilon: f64 },
    #[cfg_attr(feature = "parallel", allow(dead_code))]
    Indexed {
        points: &'a [Point3],
        epsilon: f64,
        tree: RTree<IndexedPoint>,
    },
    #[cfg(feature = "parallel")]
    Precomputed(Vec<Vec<usize>>),
}

impl<'a> Neighborhoods<'a> {
    fn build(points: &'a [Point3], config: &ClusterConfig) -> Self {
        let epsilon = config.epsilon;
        if points.len() < config.index_threshold {
            return Neighborhoods::Linear { points, epsilon };
        }

        let tree = build_rtree(points);

        #[cfg(feature = "parallel")]
        let neighborhoods = Neighborhoods::Precomputed(
            points
                .par_iter()
                .map(|p| indices_within(&tree, p, epsilon))
                .collect(),
        );

        #[cfg(not(feature = "parallel"))]
        let neighborhoods = Neighborhoods::Indexed {
            points,
            epsilon,
            tree,
        };

        neighborhoods
    }

    /// Neighbour indices of point `idx` (itself included), ascending.
    fn of(&self, idx: usize) -> Vec<usize> {
        match self {
            Neighborhoods::Linear { points, epsilon } => {
                let center = &points[idx];
                points
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| distance(p, center) <= *epsilon)
                    .map(|(i, _)| i)
                    .collect()
            }
            Neighborhoods::Indexed {
                points,
                epsilon,
                tree,
            } => indices_within(tree, &points[idx], *epsilon),
            #[cfg(feature = "parallel")]
            Neighborhoods::Precomputed(all) => all[idx].clone(),
        }
    }
}

/// Cluster points by density.
///
/// Returns clusters in discovery order (ids 0, 1, 2, …) plus the noise set.
/// Every input point ends up in exactly one of them.
///
/// # Example
/// ```
/// use patroltrace::{Point3, cluster, ClusterConfig};
///
/// let points: Vec<Point3> = (0..5)
///     .map(|i| Point3::new(i as f64 * 0.1, 0.0, 0.0))
///     .chain((0..5).map(|i| Point3::new(10.0 + i as f64 * 0.1, 0.0, 0.0)))
///     .collect();
///
/// let result = cluster(&points, &ClusterConfig::new(0.5, 3)).unwrap();
/// assert_eq!(result.clusters.len(), 2);
/// assert!(result.noise.is_empty());
/// ```
pub fn cluster(points: &[Point3], config: &ClusterConfig) -> Result<ClusterResult> {
    config.validate()?;

    if points.is_empty() {
        return Ok(ClusterResult::default());
    }

    info!(
        "[Clustering] Running DBSCAN on {} points (epsilon={}, min_points={})",
        points.len(),
        config.epsilon,
        config.min_points
    );

    let neighborhoods = Neighborhoods::build(points, config);
    let mut labels = vec![Label::Unclassified; points.len()];
    let mut next_id = 0usize;

    for seed in 0..points.len() {
        if labels[seed] != Label::Unclassified {
            continue;
        }

        let seed_neighbors = neighborhoods.of(seed);
        if seed_neighbors.len() < config.min_points {
            // May still be claimed as a border point by a later cluster
            labels[seed] = Label::Noise;
            continue;
        }

        let cluster_id = next_id;
        next_id += 1;
        expand_cluster(
            seed,
            seed_neighbors,
            cluster_id,
            &neighborhoods,
            config.min_points,
            &mut labels,
        );
    }

    let result = collect_result(points, &labels, next_id);

    info!(
        "[Clustering] Found {} clusters, {} noise points",
        result.clusters.len(),
        result.noise.len()
    );

    Ok(result)
}

/// Grow cluster `cluster_id` breadth-first from a core seed.
fn expand_cluster(
    seed: usize,
    seed_neighbors: Vec<usize>,
    cluster_id: usize,
    neighborhoods: &Neighborhoods<'_>,
    min_points: usize,
    labels: &mut [Label],
) {
    labels[seed] = Label::Cluster(cluster_id);

    let mut queued = vec![false; labels.len()];
    let mut frontier: VecDeque<usize> = VecDeque::with_capacity(seed_neighbors.len());
    for n in seed_neighbors {
        if !queued[n] {
            queued[n] = true;
            frontier.push_back(n);
        }
    }

    while let Some(current) = frontier.pop_front() {
        match labels[current] {
            Label::Noise => {
                debug!(
                    "[Clustering] Point {} reclassified from noise into cluster {}",
                    current, cluster_id
                );
                labels[current] = Label::Cluster(cluster_id);
            }
            Label::Unclassified => {
                labels[current] = Label::Cluster(cluster_id);
                let neighbors = neighborhoods.of(current);
                if neighbors.len() >= min_points {
                    for n in neighbors {
                        if !queued[n] {
                            queued[n] = true;
                            frontier.push_back(n);
                        }
                    }
                }
            }
            // Already in this cluster (the seed) or claimed earlier by another one
            Label::Cluster(_) => {}
        }
    }
}

fn collect_result(points: &[Point3], labels: &[Label], cluster_count: usize) -> ClusterResult {
    let mut clusters: Vec<Cluster> = (0..cluster_count)
        .map(|id| Cluster {
            id,
            points: Vec::new(),
            indices: Vec::new(),
        })
        .collect();
    let mut noise = Vec::new();
    let mut noise_indices = Vec::new();
    let mut final_labels = Vec::with_capacity(labels.len());

    for (i, label) in labels.iter().enumerate() {
        match label {
            Label::Cluster(id) => {
                clusters[*id].points.push(points[i]);
                clusters[*id].indices.push(i);
                final_labels.push(ClusterLabel::Cluster(*id));
            }
            // Every point is visited as a seed, so nothing stays unclassified
            Label::Noise | Label::Unclassified => {
                noise.push(points[i]);
                noise_indices.push(i);
                final_labels.push(ClusterLabel::Noise);
            }
        }
    }

    ClusterResult {
        clusters,
        noise,
        noise_indices,
        labels: final_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_and_indexed_neighborhoods_agree() {
        let points: Vec<Point3> = (0..40)
            .map(|i| Point3::new((i % 7) as f64 * 0.3, (i / 7) as f64 * 0.3, 0.0))
            .collect();

        let linear = Neighborhoods::build(
            &points,
            &ClusterConfig {
                index_threshold: usize::MAX,
                ..ClusterConfig::new(0.3, 2)
            },
        );
        let indexed = Neighborhoods::build(
            &points,
            &ClusterConfig {
                index_threshold: 0,
                ..ClusterConfig::new(0.3, 2)
            },
        );

        for i in 0..points.len() {
            assert_eq!(linear.of(i), indexed.of(i), "neighbourhood {} differs", i);
        }
    }

    #[test]
    fn test_neighborhood_includes_self() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(100.0, 0.0, 0.0)];
        let n = Neighborhoods::build(&points, &ClusterConfig::new(1.0, 1));
        assert_eq!(n.of(0), vec![0]);
        assert_eq!(n.of(1), vec![1]);
    }
}
