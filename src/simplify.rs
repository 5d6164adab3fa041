//! Polyline simplification (Ramer–Douglas–Peucker).
//!
//! Two strategies share one span splitter:
//! - [`simplify_rdp`]: classic RDP. A span collapses to its start point when
//!   no interior point deviates more than `epsilon` from the chord.
//! - [`simplify_angled`]: the same, but interior sharp turns (reversals,
//!   hairpins) are split on even when they sit within `epsilon`, so the
//!   turnaround points of a patrol survive simplification.
//!
//! Both always keep the first and last input point.

use std::collections::BTreeSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, check_angle, check_non_negative};
use crate::geometry::{perpendicular_distance, turn_angle};
use crate::{Point3, SimplifiedPath};

/// Configuration for path simplification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyConfig {
    /// Maximum perpendicular deviation before a span is split.
    /// Default: 0.5
    pub epsilon: f64,

    /// Turn angle (degrees, 0 = straight on) above which a vertex is kept
    /// by the angle-aware simplifier. Default: 150.0
    pub sharp_angle_threshold_deg: f64,

    /// Use the angle-aware simplifier. Default: false
    pub preserve_sharp_turns: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.5,
            sharp_angle_threshold_deg: 150.0,
            preserve_sharp_turns: false,
        }
    }
}

impl SimplifyConfig {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("epsilon", self.epsilon)?;
        check_angle(
            "sharp_angle_threshold_deg",
            self.sharp_angle_threshold_deg,
            180.0,
        )
    }

    /// Simplify with the strategy this config selects.
    pub fn apply(&self, points: &[Point3]) -> Result<SimplifiedPath> {
        if self.preserve_sharp_turns {
            simplify_angled(points, self.epsilon, self.sharp_angle_threshold_deg)
        } else {
            simplify_rdp(points, self.epsilon)
        }
    }
}

/// Classic Ramer–Douglas–Peucker simplification.
///
/// Inputs with fewer than 3 points are returned unchanged. On equal maximum
/// distances the first point wins.
///
/// # Example
/// ```
/// use patroltrace::{Point3, simplify_rdp};
///
/// let line: Vec<Point3> = (0..10).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
/// let simplified = simplify_rdp(&line, 0.1).unwrap();
/// assert_eq!(simplified.points, vec![line[0], line[9]]);
/// ```
pub fn simplify_rdp(points: &[Point3], epsilon: f64) -> Result<SimplifiedPath> {
    check_non_negative("epsilon", epsilon)?;

    if points.len() < 3 {
        return Ok(SimplifiedPath::new(points.to_vec()));
    }

    let kept = split_spans(points, epsilon, &BTreeSet::new());
    let mut simplified: Vec<Point3> = kept.into_iter().map(|i| points[i]).collect();
    simplified.push(points[points.len() - 1]);

    debug!(
        "[Simplify] RDP reduced {} points to {}",
        points.len(),
        simplified.len()
    );

    Ok(SimplifiedPath::new(simplified))
}

/// Angle-aware Ramer–Douglas–Peucker simplification.
///
/// Interior vertices whose turn angle exceeds `sharp_angle_threshold_deg`
/// are always kept. Consecutive duplicate points are dropped from the
/// output; the last input point is appended unless it repeats the point
/// before it.
pub fn simplify_angled(
    points: &[Point3],
    epsilon: f64,
    sharp_angle_threshold_deg: f64,
) -> Result<SimplifiedPath> {
    check_non_negative("epsilon", epsilon)?;
    check_angle(
        "sharp_angle_threshold_deg",
        sharp_angle_threshold_deg,
        180.0,
    )?;

    if points.len() < 3 {
        return Ok(SimplifiedPath::new(points.to_vec()));
    }

    let mut must_keep: BTreeSet<usize> = find_sharp_turns(points, sharp_angle_threshold_deg)
        .into_iter()
        .collect();
    debug!("[Simplify] Sharp turns at {:?}", must_keep);
    must_keep.insert(0);
    must_keep.insert(points.len() - 1);

    let kept = split_spans(points, epsilon, &must_keep);

    let mut simplified: Vec<Point3> = Vec::with_capacity(kept.len() + 1);
    for point in kept
        .into_iter()
        .map(|i| points[i])
        .chain(std::iter::once(points[points.len() - 1]))
    {
        if simplified.last() != Some(&point) {
            simplified.push(point);
        }
    }

    info!(
        "[Simplify] Angled RDP reduced {} points to {} ({} sharp turns)",
        points.len(),
        simplified.len(),
        must_keep.len().saturating_sub(2)
    );

    Ok(SimplifiedPath::new(simplified))
}

/// Interior indices whose turn angle is strictly above `threshold_deg`.
///
/// Vertices with a (near) zero-length incident segment have no defined
/// turn and are skipped.
pub fn find_sharp_turns(points: &[Point3], threshold_deg: f64) -> Vec<usize> {
    if points.len() < 3 {
        return Vec::new();
    }

    (1..points.len() - 1)
        .filter(|&i| {
            turn_angle(&points[i - 1], &points[i], &points[i + 1])
                .is_some_and(|angle| angle > threshold_deg)
        })
        .collect()
}

/// Run the RDP splitter over the whole input.
///
/// Returns the start index of every span that was not split further, in
/// path order. The caller appends the final point. Spans are processed with
/// an explicit stack (right half pushed first) so the output order matches
/// the recursive formulation without its recursion depth.
fn split_spans(points: &[Point3], epsilon: f64, must_keep: &BTreeSet<usize>) -> Vec<usize> {
    let mut kept = Vec::new();
    let mut stack: Vec<(usize, usize)> = vec![(0, points.len() - 1)];

    while let Some((start, end)) = stack.pop() {
        match split_point(points, start, end, epsilon, must_keep) {
            Some(index) => {
                stack.push((index, end));
                stack.push((start, index));
            }
            None => kept.push(start),
        }
    }

    kept
}

/// Where to split the span `start..=end`, if anywhere.
///
/// The farthest interior point from the chord is chosen when it lies beyond
/// `epsilon`. Otherwise the first interior must-keep index forces a split.
fn split_point(
    points: &[Point3],
    start: usize,
    end: usize,
    epsilon: f64,
    must_keep: &BTreeSet<usize>,
) -> Option<usize> {
    if end <= start + 1 {
        return None;
    }

    let mut max_distance = 0.0;
    let mut index = None;
    for i in (start + 1)..end {
        let dist = perpendicular_distance(&points[i], &points[start], &points[end]);
        if dist > max_distance {
            max_distance = dist;
            index = Some(i);
        }
    }

    if max_distance > epsilon {
        return index;
    }
    if let Some(i) = index.filter(|i| must_keep.contains(i)) {
        return Some(i);
    }
    must_keep.range((start + 1)..end).next().copied()
}
