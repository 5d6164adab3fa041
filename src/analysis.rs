//! End-to-end analysis of one trace snapshot.
//!
//! ## Pipeline
//! 1. Summarise the trace (duration, path length, speeds)
//! 2. Instantaneous and smoothed velocities
//! 3. Density clustering of the raw positions
//! 4. Simplification, then loop/reverse classification of the simplified path
//! 5. Sharp-turn segmentation of the simplified path into patrol segments
//!
//! Velocity and clustering read the raw snapshot independently; patrol
//! analysis reads the simplified path. Nothing is retained between calls.

use log::info;
use serde::{Deserialize, Serialize};

use crate::clustering::{ClusterConfig, cluster};
use crate::error::Result;
use crate::geometry::path_length;
use crate::patrol::{PatrolConfig, analyze_path};
use crate::simplify::SimplifyConfig;
use crate::velocity::{DEFAULT_WINDOW_SIZE, SmoothedVelocity, instantaneous, smoothed};
use crate::{ClusterResult, PatrolSegment, SimplifiedPath, Trace, VelocitySample};

/// Configuration for [`analyze_trace`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub cluster: ClusterConfig,
    pub simplify: SimplifyConfig,
    pub patrol: PatrolConfig,
    /// Window for smoothed velocity.
    /// Default: 5
    #[serde(default = "default_velocity_window")]
    pub velocity_window: usize,
}

fn default_velocity_window() -> usize {
    DEFAULT_WINDOW_SIZE
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            simplify: SimplifyConfig::default(),
            patrol: PatrolConfig::default(),
            velocity_window: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.simplify.validate()?;
        self.patrol.validate()?;
        SmoothedVelocity::new(self.velocity_window).map(|_| ())
    }
}

/// Whole-trace statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub name: String,
    pub point_count: usize,
    pub duration_ms: i64,
    pub path_length: f64,
    /// Mean of the instantaneous speeds (0 when there are none)
    pub mean_speed: f64,
    pub max_speed: f64,
}

/// Everything derived from one trace snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceAnalysis {
    pub summary: TraceSummary,
    pub velocities: Vec<VelocitySample>,
    pub smoothed_velocities: Vec<VelocitySample>,
    pub clusters: ClusterResult,
    pub simplified: SimplifiedPath,
    pub segments: Vec<PatrolSegment>,
}

/// Run the full analysis pipeline over a trace snapshot.
///
/// Configuration is validated first; degenerate traces (empty, single
/// point) produce empty results rather than errors.
pub fn analyze_trace(trace: &Trace, config: &AnalysisConfig) -> Result<TraceAnalysis> {
    config.validate()?;

    info!(
        "[Analysis] Analysing '{}' with {} samples",
        trace.name,
        trace.len()
    );

    let positions = trace.positions();

    let velocities = instantaneous(&trace.points);
    let smoothed_velocities = smoothed(&trace.points, config.velocity_window)?;

    let clusters = cluster(&positions, &config.cluster)?;

    let simplified = config
        .simplify
        .apply(&positions)?
        .classified(config.patrol.loop_tolerance);

    // Headings are per raw sample and do not line up with the simplified
    // points, so segmentation uses geometric sharp turns.
    let segments = analyze_path(&simplified.points, None, &config.patrol)?;

    let summary = summarize(trace, &velocities);

    info!(
        "[Analysis] '{}': {} clusters, {} -> {} points (loop={}, reverse={}), {} segments",
        trace.name,
        clusters.clusters.len(),
        positions.len(),
        simplified.len(),
        simplified.is_loop,
        simplified.is_reverse,
        segments.len()
    );

    Ok(TraceAnalysis {
        summary,
        velocities,
        smoothed_velocities,
        clusters,
        simplified,
        segments,
    })
}

/// Duration, length and speed statistics for a trace.
pub fn summarize(trace: &Trace, velocities: &[VelocitySample]) -> TraceSummary {
    let (mean_speed, max_speed) = if velocities.is_empty() {
        (0.0, 0.0)
    } else {
        let total: f64 = velocities.iter().map(|v| v.speed).sum();
        let max = velocities.iter().map(|v| v.speed).fold(0.0, f64::max);
        (total / velocities.len() as f64, max)
    };

    TraceSummary {
        name: trace.name.clone(),
        point_count: trace.len(),
        duration_ms: trace.duration_ms(),
        path_length: path_length(&trace.positions()),
        mean_speed,
        max_speed,
    }
}
