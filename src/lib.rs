//! # Patrol Trace
//!
//! Movement-trace analysis for tracked entities.
//!
//! This library turns a time-ordered sequence of 3D positions into structured
//! movement knowledge:
//! - Density-based clustering of lingering positions (DBSCAN)
//! - Polyline simplification (Ramer–Douglas–Peucker, plain and angle-aware)
//! - Instantaneous and windowed-smoothed velocity estimation
//! - Patrol classification: loops, reversals, repeated cycles and
//!   sharp-turn segmentation
//!
//! Every operation is a pure function over an immutable snapshot of points.
//! The only stateful piece is [`SmoothedVelocity`], a caller-owned sliding
//! window reducer.
//!
//! ## Features
//!
//! - **`parallel`** - Parallel neighbourhood queries and rotation search with rayon
//! - **`synthetic`** - Deterministic synthetic trace generator
//! - **`cli`** - Debug command-line tool
//!
//! ## Quick Start
//!
//! ```rust
//! use patroltrace::{Point3, simplify_rdp, is_loop};
//!
//! let square = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(5.0, 0.0, 0.0),
//!     Point3::new(5.0, 5.0, 0.0),
//!     Point3::new(0.0, 5.0, 0.0),
//!     Point3::new(0.0, 0.0, 0.0),
//! ];
//!
//! let simplified = simplify_rdp(&square, 0.3).unwrap();
//! assert_eq!(simplified.points.len(), 5);
//! assert!(is_loop(&simplified.points, 0.1));
//! ```

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, TraceError};

// Shared vector math (distances, angles, segment similarity)
pub mod geometry;

// R-tree indexed points for neighbourhood queries
pub mod rtree;

// Velocity estimation (instantaneous and smoothed)
pub mod velocity;
pub use velocity::{SmoothedVelocity, instantaneous, smoothed};

// Density-based spatial clustering
pub mod clustering;
pub use clustering::{ClusterConfig, cluster};

// Polyline simplification
pub mod simplify;
pub use simplify::{SimplifyConfig, find_sharp_turns, simplify_angled, simplify_rdp};

// Patrol structure analysis
pub mod patrol;
pub use patrol::{
    CycleConfig, PatrolConfig, analyze_path, extract_cycle_greedy, find_sharp_rotations, is_loop,
    is_reverse, rotate_start, split_path_at_indices, trim_to_first_cycle, trim_to_full_loop,
};

// End-to-end analysis of one trace snapshot
pub mod analysis;
pub use analysis::{AnalysisConfig, TraceAnalysis, TraceSummary, analyze_trace};

// Caller-owned sampling-rate tracking
pub mod sample_rate;
pub use sample_rate::SampleTracker;

// Synthetic trace generator for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A position in flat Euclidean 3D space.
///
/// Equality and hashing use the exact coordinate values. `0.0` and `-0.0`
/// compare and hash equal; NaN coordinates never compare equal.
///
/// # Example
/// ```
/// use patroltrace::Point3;
/// let p = Point3::new(1.0, 2.0, 3.0);
/// assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The origin.
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new point.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinates as an array (R-tree query form).
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Eq for Point3 {}

impl Hash for Point3 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // +0.0 so that 0.0 and -0.0 hash alike, matching PartialEq
        for v in [self.x, self.y, self.z] {
            (v + 0.0).to_bits().hash(state);
        }
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(a: [f64; 3]) -> Self {
        Point3::new(a[0], a[1], a[2])
    }
}

/// A sampled position with its timestamp and optional heading.
///
/// Timestamps are milliseconds since an arbitrary epoch. Headings are in
/// degrees; deltas between headings are wrapped to (-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub position: Point3,
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl TimedPoint {
    /// Create a sample without heading.
    pub fn new(position: Point3, timestamp_ms: i64) -> Self {
        Self {
            position,
            timestamp_ms,
            heading: None,
        }
    }

    /// Create a sample with a heading in degrees.
    pub fn with_heading(position: Point3, timestamp_ms: i64, heading: f64) -> Self {
        Self {
            position,
            timestamp_ms,
            heading: Some(heading),
        }
    }
}

/// One continuous observation session of a single tracked entity.
///
/// The core never keeps a reference to a trace; every analysis call reads
/// the snapshot and returns fresh data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Name of the tracked entity
    #[serde(default)]
    pub name: String,
    /// Samples ordered by timestamp (duplicates allowed)
    pub points: Vec<TimedPoint>,
}

impl Trace {
    pub fn new(name: impl Into<String>, points: Vec<TimedPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Positions in sample order.
    pub fn positions(&self) -> Vec<Point3> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Headings in sample order, or `None` unless every sample carries one.
    pub fn headings(&self) -> Option<Vec<f64>> {
        self.points.iter().map(|p| p.heading).collect()
    }

    /// Wrapped heading change between consecutive samples.
    ///
    /// One entry per consecutive pair; `None` where either sample has no heading.
    pub fn heading_deltas(&self) -> Vec<Option<f64>> {
        self.points
            .windows(2)
            .map(|w| match (w[0].heading, w[1].heading) {
                (Some(a), Some(b)) => Some(geometry::delta_angle(a, b)),
                _ => None,
            })
            .collect()
    }

    /// Elapsed time between first and last sample (0 for fewer than 2 samples).
    pub fn duration_ms(&self) -> i64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => {
                last.timestamp_ms.saturating_sub(first.timestamp_ms).max(0)
            }
            _ => 0,
        }
    }
}

/// Velocity between two samples, or averaged over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    /// Per-axis velocity in units per second
    pub velocity: Point3,
    /// Magnitude of `velocity`
    pub speed: f64,
    /// Timestamp of the later sample used
    pub timestamp_ms: i64,
}

/// Label assigned to one input point by the clusterer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterLabel {
    /// Not density-reachable from any core point
    Noise,
    /// Member of the cluster with this id
    Cluster(usize),
}

impl ClusterLabel {
    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterLabel::Noise => None,
            ClusterLabel::Cluster(id) => Some(*id),
        }
    }

    pub fn is_noise(&self) -> bool {
        matches!(self, ClusterLabel::Noise)
    }
}

/// A density cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Sequential id in discovery order, starting at 0
    pub id: usize,
    /// Member positions in input order
    pub points: Vec<Point3>,
    /// Input indices of the members
    pub indices: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Arithmetic mean of the member positions.
    pub fn centroid(&self) -> Point3 {
        if self.points.is_empty() {
            return Point3::ZERO;
        }
        let sum = self
            .points
            .iter()
            .fold(Point3::ZERO, |acc, p| acc + *p);
        sum / self.points.len() as f64
    }
}

/// Result of clustering: labelled clusters plus the noise set.
///
/// Every input point appears exactly once, either in one cluster or in noise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub clusters: Vec<Cluster>,
    /// Noise positions in input order
    pub noise: Vec<Point3>,
    /// Input indices of the noise points
    pub noise_indices: Vec<usize>,
    /// Final label per input index
    pub labels: Vec<ClusterLabel>,
}

impl ClusterResult {
    /// Label of the input point at `index`.
    pub fn label_of(&self, index: usize) -> Option<ClusterLabel> {
        self.labels.get(index).copied()
    }

    /// Number of input points covered by the result.
    pub fn point_count(&self) -> usize {
        self.labels.len()
    }
}

/// A reduced polyline with its patrol classification.
///
/// Always contains the first and last input point when the input is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedPath {
    pub points: Vec<Point3>,
    pub is_loop: bool,
    pub is_reverse: bool,
}

impl SimplifiedPath {
    /// Wrap simplified points; classification starts unset.
    pub fn new(points: Vec<Point3>) -> Self {
        Self {
            points,
            is_loop: false,
            is_reverse: false,
        }
    }

    /// Set `is_loop` and `is_reverse`, each tested independently.
    pub fn classified(mut self, tolerance: f64) -> Self {
        self.is_loop = patrol::is_loop(&self.points, tolerance);
        self.is_reverse = patrol::is_reverse(&self.points, tolerance);
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A contiguous piece of a path, split at sharp-turn boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolSegment {
    /// Segment points (trimmed and rotated when a loop was found)
    pub points: Vec<Point3>,
    /// Index of the segment's first raw point in the analysed path
    pub start_index: usize,
    /// Number of raw points the segment was cut from
    pub raw_len: usize,
    pub is_loop: bool,
    pub is_reverse: bool,
}
