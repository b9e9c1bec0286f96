// Gravity Math - Planar vector and scalar helpers
// Distances, damping factors, speed clamping and random impulses

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

// =============================================================================
// 2D VECTOR
// =============================================================================

/// Planar displacement, velocity or acceleration value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        euclidean_distance(self.x, self.y)
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
        }
    }

    pub fn add(&self, other: &Vector) -> Vector {
        Vector {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Squared distance of a point from the origin.
///
/// Callers compare the result against squared thresholds (`100.0 * 100.0`),
/// so this deliberately never takes the square root.
pub fn radius_squared_from_center(x: f64, y: f64) -> f64 {
    x * x + y * y
}

/// Vector pointing from `(x1, y1)` toward `(x2, y2)`
pub fn relative_position(x1: f64, y1: f64, x2: f64, y2: f64) -> Vector {
    Vector::new(x2 - x1, y2 - y1)
}

/// Euclidean norm of `(dx, dy)`
pub fn euclidean_distance(dx: f64, dy: f64) -> f64 {
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance between two points
pub fn distance_between(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let v = relative_position(x1, y1, x2, y2);
    euclidean_distance(v.x, v.y)
}

/// Position damping coefficient, growing linearly with distance from the origin
pub fn position_damping(x: f64, y: f64, base_damping: f64) -> f64 {
    base_damping * (1.0 + euclidean_distance(x, y))
}

pub fn speed(vx: f64, vy: f64) -> f64 {
    euclidean_distance(vx, vy)
}

pub fn acceleration_magnitude(ax: f64, ay: f64) -> f64 {
    euclidean_distance(ax, ay)
}

/// Rescales `(vx, vy)` so its magnitude lies in `[vmin, vmax]`.
///
/// A velocity of exactly zero has no direction and is returned unchanged.
pub fn clamp_speed(vx: f64, vy: f64, vmin: f64, vmax: f64) -> Vector {
    let s = speed(vx, vy);

    if s == 0.0 {
        return Vector::new(vx, vy);
    }

    if s < vmin {
        return Vector::new(vx, vy).scale(vmin / s);
    }

    if s > vmax {
        return Vector::new(vx, vy).scale(vmax / s);
    }

    Vector::new(vx, vy)
}

// =============================================================================
// RANDOM SOURCE
// =============================================================================

/// Random helpers backed by an owned, seedable generator
#[derive(Debug, Clone)]
pub struct GravityMath {
    rng: StdRng,
}

impl GravityMath {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform angle in `[0, 2π)`
    pub fn random_angle(&mut self) -> f64 {
        self.rng.gen::<f64>() * TAU
    }

    /// Uniform value in `[min, max)`; yields `min` when the range is empty
    pub fn random_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.rng.gen::<f64>() * (max - min)
    }

    /// Uniform unit-interval sample
    pub fn random_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform integer in `[low, high)`
    pub fn random_int(&mut self, low: i32, high: i32) -> i32 {
        self.rng.gen_range(low..high)
    }

    /// Velocity with a random direction and a magnitude drawn from `[min_strength, max_strength)`
    pub fn random_impulse(&mut self, min_strength: f64, max_strength: f64) -> Vector {
        let angle = self.random_angle();
        let strength = self.random_range(min_strength, max_strength);

        Vector::new(strength * angle.cos(), strength * angle.sin())
    }
}

impl Default for GravityMath {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
