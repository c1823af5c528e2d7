//! Flocking simulation engine: a toroidal continuous space, Reynolds boids
//! and a seeded random-activation scheduler composed into a [`Model`].

pub mod agent;
pub mod config;
pub mod error;
pub mod model;
pub mod rng;
pub mod schedule;
pub mod space;

pub use agent::{Agent, AgentId, AgentSet, Boid, BoidParams, Plan, Stationary, Steering};
pub use boid_shared::{AgentKind, AgentSnapshot, FlockSettings, Heading, Position};
pub use config::validate_settings;
pub use error::SimError;
pub use model::{Model, Placement};
pub use schedule::RandomActivation;
pub use space::ContinuousSpace;

/// A 2D vector used for position and velocity
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Unit vector in the same direction, or `None` when the vector has no
    /// usable direction (zero length or non-finite components).
    pub fn try_normalize(&self) -> Option<Self> {
        let mag = self.magnitude();
        if mag > 0.0 && mag.is_finite() {
            let unit = *self / mag;
            unit.is_finite().then_some(unit)
        } else {
            None
        }
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Neg for Vector2D {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl core::ops::Mul<f64> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f64> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl From<Vector2D> for Position {
    fn from(v: Vector2D) -> Self {
        Position::new(v.x, v.y)
    }
}

impl From<Position> for Vector2D {
    fn from(p: Position) -> Self {
        Vector2D::new(p.x, p.y)
    }
}

impl From<Vector2D> for Heading {
    fn from(v: Vector2D) -> Self {
        Heading::new(v.x, v.y)
    }
}
