//! Patrol-path structural analysis.
//!
//! Classifies an ordered point sequence (usually a simplified path) as a
//! loop or a reversal, extracts one traversal of a repeating cycle, and
//! splits a path into segments at sharp heading changes.
//!
//! The trimming and extraction functions fall back to returning the input
//! unchanged when no pattern is found. Callers that need to tell "no
//! pattern" apart from "pattern equals input" use the `find_*` variants,
//! which return `Option`.

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceError, check_angle, check_non_negative};
use crate::geometry::{delta_angle, distance, heading_similarity, path_length, segment_similarity};
use crate::simplify::find_sharp_turns;
use crate::{PatrolSegment, Point3};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for segment-level patrol analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolConfig {
    /// Heading change (degrees) between consecutive samples that starts a new segment.
    /// Default: 150.0
    pub rotation_threshold_deg: f64,

    /// Maximum start/end (loop) or mirrored-point (reverse) distance.
    /// Default: 1.0
    pub loop_tolerance: f64,

    /// Points to skip before a return to the start counts as loop closure.
    /// Default: 3
    pub min_loop_length: usize,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            rotation_threshold_deg: 150.0,
            loop_tolerance: 1.0,
            min_loop_length: 3,
        }
    }
}

impl PatrolConfig {
    pub fn validate(&self) -> Result<()> {
        check_angle("rotation_threshold_deg", self.rotation_threshold_deg, 360.0)?;
        check_non_negative("loop_tolerance", self.loop_tolerance)
    }
}

/// Configuration for greedy cycle extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Consecutive direction segments compared per window.
    /// Default: 5
    pub window_size: usize,

    /// Mean window similarity a repeat must exceed.
    /// Default: 0.92
    pub similarity_threshold: f64,

    /// Share of heading similarity in the blended score (when headings are given).
    /// Default: 0.1
    pub rotation_weight: f64,

    /// Per-step similarity that keeps a matched run growing.
    /// Default: 0.85
    pub extend_threshold: f64,

    /// Segments shorter than this are ignored as jitter.
    /// Default: 0.1
    pub min_segment_length: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            similarity_threshold: 0.92,
            rotation_weight: 0.1,
            extend_threshold: 0.85,
            min_segment_length: 0.1,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_size < 1 {
            return Err(TraceError::invalid(
                "window_size",
                self.window_size,
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.rotation_weight) {
            return Err(TraceError::invalid(
                "rotation_weight",
                self.rotation_weight,
                "must lie in [0, 1]",
            ));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(TraceError::invalid(
                "similarity_threshold",
                self.similarity_threshold,
                "must be finite",
            ));
        }
        if !self.extend_threshold.is_finite() {
            return Err(TraceError::invalid(
                "extend_threshold",
                self.extend_threshold,
                "must be finite",
            ));
        }
        check_non_negative("min_segment_length", self.min_segment_length)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// True iff the path ends within `tolerance` of where it started.
///
/// # Example
/// ```
/// use patroltrace::{Point3, is_loop};
/// let p0 = Point3::new(0.0, 0.0, 0.0);
/// let path = [p0, Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0), p0];
/// assert!(is_loop(&path, 0.0));
/// ```
pub fn is_loop(points: &[Point3], tolerance: f64) -> bool {
    if points.len() < 2 {
        return false;
    }
    distance(&points[0], &points[points.len() - 1]) <= tolerance
}

/// True iff the path is a palindrome within `tolerance` (out and back).
///
/// Every point must lie within `tolerance` of its mirror `len - 1 - i`.
pub fn is_reverse(points: &[Point3], tolerance: f64) -> bool {
    if points.len() < 2 {
        return false;
    }
    let n = points.len();
    (0..n / 2).all(|i| distance(&points[i], &points[n - 1 - i]) <= tolerance)
}

// ============================================================================
// Loop trimming
// ============================================================================

/// Index of the first point at or after `min_loop_length` within `tolerance` of the start.
pub fn find_loop_closure(points: &[Point3], tolerance: f64, min_loop_length: usize) -> Option<usize> {
    let start = points.first()?;
    (min_loop_length.max(1)..points.len()).find(|&i| distance(&points[i], start) <= tolerance)
}

/// Cut the path at its first return to the start and close it explicitly.
///
/// The result is the prefix up to the closure point followed by the first
/// point again. Without a closure the input is returned unchanged.
pub fn trim_to_full_loop(points: &[Point3], tolerance: f64, min_loop_length: usize) -> Vec<Point3> {
    match find_loop_closure(points, tolerance, min_loop_length) {
        Some(end) => {
            let mut trimmed = points[..=end].to_vec();
            trimmed.push(points[0]);
            trimmed
        }
        None => points.to_vec(),
    }
}

/// Closure index for [`trim_to_first_cycle`].
///
/// Looks for local minima of the distance to the start (strictly below both
/// neighbours) inside `[min_loop_length, len - min_loop_length)` and picks the
/// deepest one, provided it lies within `tolerance`.
pub fn find_first_cycle_closure(
    points: &[Point3],
    tolerance: f64,
    min_loop_length: usize,
) -> Option<usize> {
    let n = points.len();
    if n < 3 || n < 2 * min_loop_length {
        return None;
    }

    let start = points[0];
    let dist: Vec<f64> = points.iter().map(|p| distance(p, &start)).collect();

    let lo = min_loop_length.max(1);
    let hi = (n - min_loop_length).min(n - 1);

    let mut best: Option<(usize, f64)> = None;
    for i in lo..hi {
        let is_local_min = dist[i] < dist[i - 1] && dist[i] < dist[i + 1];
        if !is_local_min || dist[i] > tolerance {
            continue;
        }
        if best.map_or(true, |(_, d)| dist[i] < d) {
            best = Some((i, dist[i]));
        }
    }

    best.map(|(i, _)| i)
}

/// Cut the path at the deepest return toward its start.
///
/// Stricter than [`trim_to_full_loop`]: the closure point must be a local
/// minimum of distance-to-start away from both ends. Returns the prefix up
/// to and including the closure point, or the input unchanged.
pub fn trim_to_first_cycle(
    points: &[Point3],
    tolerance: f64,
    min_loop_length: usize,
) -> Vec<Point3> {
    match find_first_cycle_closure(points, tolerance, min_loop_length) {
        Some(end) => points[..=end].to_vec(),
        None => points.to_vec(),
    }
}

/// Length of the open path visiting the ring starting at `start`.
fn rotated_length(ring: &[Point3], start: usize) -> f64 {
    let n = ring.len();
    (0..n - 1)
        .map(|k| distance(&ring[(start + k) % n], &ring[(start + k + 1) % n]))
        .sum()
}

/// Canonical start for a loop.
///
/// Tries every cyclic rotation and keeps the one whose consecutive-point
/// distances sum lowest (ties go to the earliest start). A path whose last
/// point repeats its first is treated as a closed ring and stays closed;
/// repeated closing points collapse into one.
pub fn rotate_start(points: &[Point3]) -> Vec<Point3> {
    let closed = points.len() > 2 && points[0] == points[points.len() - 1];
    let mut ring = points;
    // A loop trimmed exactly on its start can carry several closing copies
    while closed && ring.len() > 1 && ring[ring.len() - 1] == ring[0] {
        ring = &ring[..ring.len() - 1];
    }
    if ring.len() < 2 {
        return points.to_vec();
    }

    #[cfg(feature = "parallel")]
    let best = (0..ring.len())
        .into_par_iter()
        .map(|s| (s, rotated_length(ring, s)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map_or(0, |(s, _)| s);

    #[cfg(not(feature = "parallel"))]
    let best = (0..ring.len())
        .map(|s| (s, rotated_length(ring, s)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map_or(0, |(s, _)| s);

    let mut rotated: Vec<Point3> = ring[best..].iter().chain(&ring[..best]).copied().collect();
    if closed {
        rotated.push(rotated[0]);
    }
    rotated
}

// ============================================================================
// Cycle extraction
// ============================================================================

/// A repeated run found by [`find_repeating_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleMatch {
    /// First point of the first traversal
    pub start: usize,
    /// First point of the repeat
    pub repeat_start: usize,
    /// Last point of the extracted traversal
    pub end: usize,
}

/// Scores pairs of direction segments, optionally blended with headings.
struct SegmentScorer<'a> {
    directions: Vec<Point3>,
    rotations: Option<&'a [f64]>,
    config: &'a CycleConfig,
}

impl SegmentScorer<'_> {
    fn score(&self, a: usize, b: usize) -> f64 {
        let da = &self.directions[a];
        let db = &self.directions[b];
        let min_len = self.config.min_segment_length;
        let seg = if da.length() < min_len || db.length() < min_len {
            0.0
        } else {
            segment_similarity(da, db)
        };

        match self.rotations {
            Some(r) => {
                let w = self.config.rotation_weight;
                (1.0 - w) * seg + w * heading_similarity(r[a], r[b])
            }
            None => seg,
        }
    }

    fn window_mean(&self, a: usize, b: usize, len: usize) -> f64 {
        (0..len).map(|k| self.score(a + k, b + k)).sum::<f64>() / len as f64
    }
}

/// Locate the first repeated run of direction segments.
///
/// Two non-overlapping windows of `window_size` segments match when their
/// mean similarity exceeds `similarity_threshold`. The first match (earliest
/// start, then earliest repeat) is extended while per-step similarity stays
/// above `extend_threshold`, up to one full period. Headings blend into the
/// score only when their count equals the point count.
pub fn find_repeating_cycle(
    points: &[Point3],
    rotations: Option<&[f64]>,
    config: &CycleConfig,
) -> Result<Option<CycleMatch>> {
    config.validate()?;

    let w = config.window_size;
    let segment_count = points.len().saturating_sub(1);
    if segment_count < 2 * w {
        return Ok(None);
    }

    let scorer = SegmentScorer {
        directions: points.windows(2).map(|p| p[1] - p[0]).collect(),
        rotations: rotations.filter(|r| r.len() == points.len()),
        config,
    };

    for i in 0..=(segment_count - 2 * w) {
        for j in (i + w)..=(segment_count - w) {
            if scorer.window_mean(i, j, w) <= config.similarity_threshold {
                continue;
            }

            let period = j - i;
            let mut run = w;
            while run < period
                && j + run < segment_count
                && scorer.score(i + run, j + run) > config.extend_threshold
            {
                run += 1;
            }

            debug!(
                "[Patrol] Cycle match: windows at {} and {}, run of {} segments",
                i, j, run
            );

            return Ok(Some(CycleMatch {
                start: i,
                repeat_start: j,
                end: i + run,
            }));
        }
    }

    Ok(None)
}

/// Extract one traversal of a repeating patrol.
///
/// Returns the points from the start of the first matched window through
/// the end of the extended run; the input unchanged when nothing repeats.
pub fn extract_cycle_greedy(
    points: &[Point3],
    rotations: Option<&[f64]>,
    config: &CycleConfig,
) -> Result<Vec<Point3>> {
    Ok(match find_repeating_cycle(points, rotations, config)? {
        Some(m) => points[m.start..=m.end].to_vec(),
        None => points.to_vec(),
    })
}

// ============================================================================
// Segmentation
// ============================================================================

/// Indices where the heading jumps by at least `threshold_deg` from the previous sample.
pub fn find_sharp_rotations(rotations: &[f64], threshold_deg: f64) -> Vec<usize> {
    (1..rotations.len())
        .filter(|&i| delta_angle(rotations[i - 1], rotations[i]).abs() >= threshold_deg)
        .collect()
}

/// Split a path into contiguous pieces starting at each split index.
///
/// Indices not strictly greater than the current start, or past the end,
/// are skipped.
pub fn split_path_at_indices(points: &[Point3], split_indices: &[usize]) -> Vec<Vec<Point3>> {
    split_ranges(points.len(), split_indices)
        .into_iter()
        .map(|(start, end)| points[start..end].to_vec())
        .collect()
}

/// Half-open ranges produced by [`split_path_at_indices`].
fn split_ranges(len: usize, split_indices: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::with_capacity(split_indices.len() + 1);
    let mut start = 0;
    for &idx in split_indices {
        if idx <= start || idx >= len {
            continue;
        }
        ranges.push((start, idx));
        start = idx;
    }
    if start < len {
        ranges.push((start, len));
    }
    ranges
}

/// Segment a path at sharp turns and classify each segment.
///
/// Split points come from heading jumps when `rotations` matches the point
/// count, otherwise from geometric sharp turns. Each segment is trimmed to
/// its first loop closure; closed loops get a canonical start. Loop and
/// reverse flags are computed independently per segment.
pub fn analyze_path(
    points: &[Point3],
    rotations: Option<&[f64]>,
    config: &PatrolConfig,
) -> Result<Vec<PatrolSegment>> {
    config.validate()?;

    let split_indices = match rotations.filter(|r| r.len() == points.len()) {
        Some(r) => find_sharp_rotations(r, config.rotation_threshold_deg),
        None => find_sharp_turns(points, config.rotation_threshold_deg.min(180.0)),
    };
    debug!("[Patrol] Splitting at {:?}", split_indices);

    let segments: Vec<PatrolSegment> = split_ranges(points.len(), &split_indices)
        .into_iter()
        .map(|(start, end)| {
            let raw = &points[start..end];
            let trimmed = trim_to_full_loop(raw, config.loop_tolerance, config.min_loop_length);
            let looped = is_loop(&trimmed, config.loop_tolerance);
            let points = if looped { rotate_start(&trimmed) } else { trimmed };
            PatrolSegment {
                is_loop: looped,
                is_reverse: is_reverse(&points, config.loop_tolerance),
                points,
                start_index: start,
                raw_len: end - start,
            }
        })
        .collect();

    info!(
        "[Patrol] {} points split into {} segments ({} loops, {} reversals), path length {:.2}",
        points.len(),
        segments.len(),
        segments.iter().filter(|s| s.is_loop).count(),
        segments.iter().filter(|s| s.is_reverse).count(),
        path_length(points)
    );

    Ok(segments)
}
