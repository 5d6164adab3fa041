//! Velocity estimation over a position + timestamp series.
//!
//! - [`instantaneous`] gives one sample per consecutive pair.
//! - [`SmoothedVelocity`] is a caller-fed sliding window that averages the
//!   per-step velocities currently buffered.
//!
//! A non-positive time step (repeated or out-of-order timestamps) is
//! replaced by one second instead of dividing by zero.

use std::collections::VecDeque;

use crate::error::{Result, TraceError};
use crate::{Point3, TimedPoint, VelocitySample};

/// Time step used when two samples are not strictly increasing in time.
pub const FALLBACK_ELAPSED_SECS: f64 = 1.0;

/// Default window for smoothed velocity.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Elapsed seconds between two samples, with the non-positive fallback applied.
fn elapsed_secs(from: &TimedPoint, to: &TimedPoint) -> f64 {
    let secs = (to.timestamp_ms as f64 - from.timestamp_ms as f64) / 1000.0;
    if secs <= 0.0 {
        FALLBACK_ELAPSED_SECS
    } else {
        secs
    }
}

/// Velocity vector between two consecutive samples.
fn step_velocity(from: &TimedPoint, to: &TimedPoint) -> Point3 {
    (to.position - from.position) / elapsed_secs(from, to)
}

fn sample(velocity: Point3, timestamp_ms: i64) -> VelocitySample {
    VelocitySample {
        velocity,
        speed: velocity.length(),
        timestamp_ms,
    }
}

/// Per-step velocities: N points give N-1 samples, empty for fewer than 2.
///
/// # Example
/// ```
/// use patroltrace::{Point3, TimedPoint, instantaneous};
///
/// let points = vec![
///     TimedPoint::new(Point3::new(0.0, 0.0, 0.0), 0),
///     TimedPoint::new(Point3::new(10.0, 0.0, 0.0), 2000),
/// ];
/// let samples = instantaneous(&points);
/// assert_eq!(samples.len(), 1);
/// assert!((samples[0].speed - 5.0).abs() < 1e-9);
/// ```
pub fn instantaneous(points: &[TimedPoint]) -> Vec<VelocitySample> {
    points
        .windows(2)
        .map(|w| sample(step_velocity(&w[0], &w[1]), w[1].timestamp_ms))
        .collect()
}

/// Sliding-window velocity smoother.
///
/// Holds at most `window_size` samples (FIFO). Each [`push`](Self::push)
/// returns the mean of the per-step velocities across the buffered samples,
/// or `None` until two samples are buffered. Recomputation is O(window).
///
/// The window is plain owned state: feeding one instance from several
/// threads requires the caller to serialize access (`&mut self`).
#[derive(Debug, Clone)]
pub struct SmoothedVelocity {
    window_size: usize,
    window: VecDeque<TimedPoint>,
}

impl SmoothedVelocity {
    /// Create a smoother. `window_size` must be at least 2.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size < 2 {
            return Err(TraceError::invalid(
                "window_size",
                window_size,
                "need at least two samples per window",
            ));
        }
        Ok(Self {
            window_size,
            window: VecDeque::with_capacity(window_size + 1),
        })
    }

    /// Feed the next sample.
    pub fn push(&mut self, point: TimedPoint) -> Option<VelocitySample> {
        self.window.push_back(point);
        if self.window.len() > self.window_size {
            self.window.pop_front();
        }
        if self.window.len() < 2 {
            return None;
        }

        let steps = self.window.len() - 1;
        let sum = self
            .window
            .iter()
            .zip(self.window.iter().skip(1))
            .fold(Point3::ZERO, |acc, (a, b)| acc + step_velocity(a, b));

        Some(sample(sum / steps as f64, point.timestamp_ms))
    }

    /// Drop all buffered samples.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for SmoothedVelocity {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            window: VecDeque::with_capacity(DEFAULT_WINDOW_SIZE + 1),
        }
    }
}

/// Run a fresh [`SmoothedVelocity`] over a whole series.
///
/// Yields one sample per input point after the first.
pub fn smoothed(points: &[TimedPoint], window_size: usize) -> Result<Vec<VelocitySample>> {
    let mut smoother = SmoothedVelocity::new(window_size)?;
    Ok(points.iter().filter_map(|p| smoother.push(*p)).collect())
}
