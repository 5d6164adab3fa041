//! Shared vector math for every analysis stage.
//!
//! All functions are pure. Zero-length vectors never cause a division:
//! perpendicular distance degrades to point distance, and angle or
//! similarity queries on degenerate segments return `None` or a neutral
//! value.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::Point3;

/// Segments shorter than this have no usable direction.
pub const MIN_DIRECTION_LENGTH: f64 = 1e-6;

/// Weight of direction cosine in [`segment_similarity`].
pub const DIRECTION_WEIGHT: f64 = 0.8;

/// Weight of length ratio in [`segment_similarity`].
pub const LENGTH_WEIGHT: f64 = 0.2;

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point3 {
    type Output = Point3;

    fn div(self, rhs: f64) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Point3 {
    type Output = Point3;

    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

impl Point3 {
    pub fn dot(&self, other: &Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(&self) -> Option<Point3> {
        let len = self.length();
        if len < MIN_DIRECTION_LENGTH {
            None
        } else {
            Some(*self / len)
        }
    }
}

/// Euclidean distance between two points.
pub fn distance(a: &Point3, b: &Point3) -> f64 {
    (*a - *b).length()
}

/// Squared Euclidean distance (no square root).
pub fn distance_squared(a: &Point3, b: &Point3) -> f64 {
    (*a - *b).length_squared()
}

/// Distance from `point` to the infinite line through `line_start` and `line_end`.
///
/// When the two line points coincide the line has no direction and the
/// result is the plain distance to `line_start`.
pub fn perpendicular_distance(point: &Point3, line_start: &Point3, line_end: &Point3) -> f64 {
    let line = *line_end - *line_start;
    let len_sq = line.length_squared();
    if line_start == line_end || len_sq == 0.0 {
        return distance(point, line_start);
    }

    let t = (*point - *line_start).dot(&line) / len_sq;
    let projection = *line_start + line * t;
    distance(point, &projection)
}

/// Shortest signed angular difference from `current` to `target` in degrees.
///
/// The result lies in (-180, 180].
pub fn delta_angle(current: f64, target: f64) -> f64 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Turn angle in degrees at `vertex` between the incoming and outgoing directions.
///
/// 0° means straight on, 180° a full reversal. Returns `None` when either
/// incident segment is too short to have a direction.
pub fn turn_angle(prev: &Point3, vertex: &Point3, next: &Point3) -> Option<f64> {
    let incoming = (*vertex - *prev).normalized()?;
    let outgoing = (*next - *vertex).normalized()?;
    let dot = incoming.dot(&outgoing).clamp(-1.0, 1.0);
    Some(dot.acos().to_degrees())
}

/// Similarity of two direction segments, roughly in [-1, 1].
///
/// Weighted blend of direction cosine ([`DIRECTION_WEIGHT`]) and length
/// ratio `min/max` ([`LENGTH_WEIGHT`]). Segments without a usable direction
/// carry no evidence and score 0.
pub fn segment_similarity(a: &Point3, b: &Point3) -> f64 {
    let len_a = a.length();
    let len_b = b.length();
    if len_a < MIN_DIRECTION_LENGTH || len_b < MIN_DIRECTION_LENGTH {
        return 0.0;
    }

    let cosine = (a.dot(b) / (len_a * len_b)).clamp(-1.0, 1.0);
    let length_ratio = len_a.min(len_b) / len_a.max(len_b);

    DIRECTION_WEIGHT * cosine + LENGTH_WEIGHT * length_ratio
}

/// Similarity of two headings in degrees: 1 when equal, 0 when opposite.
pub fn heading_similarity(a: f64, b: f64) -> f64 {
    1.0 - delta_angle(a, b).abs() / 180.0
}

/// Total length of a polyline.
pub fn path_length(points: &[Point3]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}
