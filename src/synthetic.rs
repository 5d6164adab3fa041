//! Synthetic movement traces for testing and benchmarking.
//!
//! Generates traces with a known patrol structure (square loops, out-and-back
//! runs, lingering spots), providing ground truth for the clustering,
//! simplification and patrol analysis stages.
//!
//! Feature-gated behind `synthetic`; not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use patroltrace::synthetic::{PatrolPattern, SyntheticScenario};
//!
//! let scenario = SyntheticScenario {
//!     name: "guard".to_string(),
//!     pattern: PatrolPattern::SquareLoop {
//!         side: 5.0,
//!         points_per_side: 5,
//!         laps: 2,
//!     },
//!     noise_sigma: 0.0,
//!     sample_interval_ms: 100,
//!     seed: 42,
//! };
//!
//! let trace = scenario.generate();
//! assert_eq!(trace.len(), 41);
//! ```

use crate::{Point3, TimedPoint, Trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

// ============================================================================
// Types
// ============================================================================

/// Shape of the generated movement.
#[derive(Debug, Clone, PartialEq)]
pub enum PatrolPattern {
    /// Counter-clockwise square in the ground plane, starting at the origin.
    /// Ends with a closing sample back on the start.
    SquareLoop {
        side: f64,
        points_per_side: usize,
        laps: usize,
    },
    /// Straight out-and-back along the x axis.
    PingPong {
        length: f64,
        steps: usize,
        passes: usize,
    },
    /// Tight groups of samples around fixed spots, far apart from each other.
    Linger {
        spots: Vec<Point3>,
        points_per_spot: usize,
        spread: f64,
    },
}

/// Scenario configuration for generating a synthetic trace.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Name of the tracked entity.
    pub name: String,
    pub pattern: PatrolPattern,
    /// Gaussian position noise standard deviation (ground plane only).
    pub noise_sigma: f64,
    /// Time between consecutive samples.
    pub sample_interval_ms: i64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

// ============================================================================
// Path Generation
// ============================================================================

fn square_loop(side: f64, points_per_side: usize, laps: usize) -> Vec<Point3> {
    let per_side = points_per_side.max(1);
    let step = side / per_side as f64;
    let corners = [
        (Point3::new(0.0, 0.0, 0.0), Point3::new(step, 0.0, 0.0)),
        (Point3::new(side, 0.0, 0.0), Point3::new(0.0, step, 0.0)),
        (Point3::new(side, side, 0.0), Point3::new(-step, 0.0, 0.0)),
        (Point3::new(0.0, side, 0.0), Point3::new(0.0, -step, 0.0)),
    ];

    let mut points = Vec::with_capacity(per_side * 4 * laps + 1);
    for _ in 0..laps {
        for (corner, delta) in corners {
            points.extend((0..per_side).map(|k| corner + delta * k as f64));
        }
    }
    points.push(Point3::ZERO);
    points
}

fn ping_pong(length: f64, steps: usize, passes: usize) -> Vec<Point3> {
    let steps = steps.max(1);
    let step = length / steps as f64;
    let mut points = vec![Point3::ZERO];
    for pass in 0..passes {
        let outbound = pass % 2 == 0;
        for k in 1..=steps {
            let x = if outbound {
                k as f64 * step
            } else {
                length - k as f64 * step
            };
            points.push(Point3::new(x, 0.0, 0.0));
        }
    }
    points
}

fn linger(spots: &[Point3], points_per_spot: usize, spread: f64, rng: &mut StdRng) -> Vec<Point3> {
    spots
        .iter()
        .flat_map(|spot| {
            (0..points_per_spot)
                .map(|_| {
                    *spot
                        + Point3::new(
                            rng.gen_range(-spread..=spread),
                            rng.gen_range(-spread..=spread),
                            0.0,
                        )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Add Gaussian noise in the ground plane.
fn add_noise(points: &[Point3], sigma: f64, rng: &mut StdRng) -> Vec<Point3> {
    if sigma <= 0.0 {
        return points.to_vec();
    }

    points
        .iter()
        .map(|p| {
            // Box-Muller transform for Gaussian noise
            let u1: f64 = rng.gen_range(0.0001..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            let z1 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin();
            Point3::new(p.x + z0 * sigma, p.y + z1 * sigma, p.z)
        })
        .collect()
}

/// Heading in degrees of travel toward the next point (last repeats the previous).
fn headings(points: &[Point3]) -> Vec<f64> {
    let mut out: Vec<f64> = points
        .windows(2)
        .map(|w| {
            let d = w[1] - w[0];
            d.y.atan2(d.x).to_degrees()
        })
        .collect();
    if let Some(&last) = out.last() {
        out.push(last);
    } else if !points.is_empty() {
        out.push(0.0);
    }
    out
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl SyntheticScenario {
    /// Generate the trace described by this scenario.
    pub fn generate(&self) -> Trace {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let clean = match &self.pattern {
            PatrolPattern::SquareLoop {
                side,
                points_per_side,
                laps,
            } => square_loop(*side, *points_per_side, *laps),
            PatrolPattern::PingPong {
                length,
                steps,
                passes,
            } => ping_pong(*length, *steps, *passes),
            PatrolPattern::Linger {
                spots,
                points_per_spot,
                spread,
            } => linger(spots, *points_per_spot, *spread, &mut rng),
        };

        let headings = headings(&clean);
        let positions = add_noise(&clean, self.noise_sigma, &mut rng);

        let points = positions
            .into_iter()
            .zip(headings)
            .enumerate()
            .map(|(i, (p, h))| TimedPoint::with_heading(p, i as i64 * self.sample_interval_ms, h))
            .collect();

        Trace::new(self.name.clone(), points)
    }
}

// ============================================================================
// Predefined Scenarios
// ============================================================================

impl SyntheticScenario {
    /// One noiseless 5x5 square lap, 5 samples per side, 10 Hz.
    pub fn square_patrol() -> Self {
        Self {
            name: "square_patrol".to_string(),
            pattern: PatrolPattern::SquareLoop {
                side: 5.0,
                points_per_side: 5,
                laps: 1,
            },
            noise_sigma: 0.0,
            sample_interval_ms: 100,
            seed: 42,
        }
    }

    /// Out-and-back along 10 units, twice each way.
    pub fn ping_pong_patrol() -> Self {
        Self {
            name: "ping_pong_patrol".to_string(),
            pattern: PatrolPattern::PingPong {
                length: 10.0,
                steps: 10,
                passes: 2,
            },
            noise_sigma: 0.0,
            sample_interval_ms: 100,
            seed: 42,
        }
    }

    /// Three lingering spots, 20 samples each.
    pub fn lingering() -> Self {
        Self {
            name: "lingering".to_string(),
            pattern: PatrolPattern::Linger {
                spots: vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(20.0, 0.0, 0.0),
                    Point3::new(0.0, 20.0, 0.0),
                ],
                points_per_spot: 20,
                spread: 0.2,
            },
            noise_sigma: 0.0,
            sample_interval_ms: 200,
            seed: 7,
        }
    }

    /// Large noisy multi-lap loop for benchmarking.
    pub fn long_noisy_loop(laps: usize) -> Self {
        Self {
            name: "long_noisy_loop".to_string(),
            pattern: PatrolPattern::SquareLoop {
                side: 50.0,
                points_per_side: 50,
                laps,
            },
            noise_sigma: 0.05,
            sample_interval_ms: 100,
            seed: 1234,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_patrol_generation() {
        let trace = SyntheticScenario::square_patrol().generate();
        assert_eq!(trace.len(), 21);
        assert_eq!(trace.points[0].position, Point3::ZERO);
        assert_eq!(trace.points[20].position, Point3::ZERO);
        assert_eq!(trace.points[5].position, Point3::new(5.0, 0.0, 0.0));
        assert_eq!(trace.duration_ms(), 2000);
    }

    #[test]
    fn test_ping_pong_generation() {
        let trace = SyntheticScenario::ping_pong_patrol().generate();
        // start + 2 passes of 10 steps
        assert_eq!(trace.len(), 21);
        assert_eq!(trace.points[10].position, Point3::new(10.0, 0.0, 0.0));
        assert_eq!(trace.points[20].position, Point3::ZERO);
    }

    #[test]
    fn test_headings_follow_direction() {
        let trace = SyntheticScenario::square_patrol().generate();
        let headings = trace.headings().unwrap();
        assert_eq!(headings.len(), trace.len());
        assert!((headings[0] - 0.0).abs() < 1e-9);
        assert!((headings[5] - 90.0).abs() < 1e-9);
        assert!((headings[10] - 180.0).abs() < 1e-9);
        assert!((headings[15] + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_generation() {
        let scenario = SyntheticScenario::long_noisy_loop(2);
        let a = scenario.generate();
        let b = scenario.generate();
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_applied() {
        let trace = SyntheticScenario::long_noisy_loop(1).generate();
        let clean = square_loop(50.0, 50, 1);
        assert_eq!(trace.len(), clean.len());
        assert!(trace
            .points
            .iter()
            .zip(&clean)
            .any(|(t, c)| t.position != *c));
    }

    #[test]
    fn test_linger_stays_within_spread() {
        let trace = SyntheticScenario::lingering().generate();
        assert_eq!(trace.len(), 60);
        for p in &trace.points[..20] {
            assert!(p.position.x.abs() <= 0.2 && p.position.y.abs() <= 0.2);
        }
    }
}
