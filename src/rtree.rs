//! R-tree indexed point types and neighbourhood queries.

use crate::geometry::distance;
use crate::Point3;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A 3D point with its input index for R-tree queries
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub idx: usize,
    pub pos: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        let dz = self.pos[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Bulk-load an R-tree over `points`, keeping each input index.
pub fn build_rtree(points: &[Point3]) -> RTree<IndexedPoint> {
    let indexed: Vec<IndexedPoint> = points
        .iter()
        .enumerate()
        .map(|(i, p)| IndexedPoint {
            idx: i,
            pos: p.to_array(),
        })
        .collect();
    RTree::bulk_load(indexed)
}

/// Indices of all points within `radius` of `center`, in ascending index order.
///
/// The tree is searched with a slightly padded radius and every candidate is
/// re-checked with the exact `distance <= radius` test, so the boundary
/// behaves exactly like a linear scan.
pub fn indices_within(tree: &RTree<IndexedPoint>, center: &Point3, radius: f64) -> Vec<usize> {
    let padded = radius * (1.0 + 1e-9) + f64::EPSILON;
    let query = center.to_array();
    let mut found: Vec<usize> = tree
        .locate_within_distance(query, padded * padded)
        .filter(|p| distance(&Point3::from(p.pos), center) <= radius)
        .map(|p| p.idx)
        .collect();
    found.sort_unstable();
    found
}
