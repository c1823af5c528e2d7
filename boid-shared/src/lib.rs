#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

/// A point in simulation space coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance, ignoring any wrap-around of the space
    pub fn distance_to(&self, other: &Position) -> f64 {
        libm::hypot(self.x - other.x, self.y - other.y)
    }
}

/// Direction of travel of an agent (a unit vector for moving boids)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Heading {
    pub dx: f64,
    pub dy: f64,
}

impl Heading {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Angle in radians measured from the +x axis, as a renderer would rotate a sprite
    pub fn angle(&self) -> f64 {
        libm::atan2(self.dy, self.dx)
    }
}

/// The behavior an agent follows each tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Flocks with its neighbors
    Boid,
    /// Occupies a fixed spot and never moves
    Stationary,
}

/// Read-only view of one agent handed to rendering layers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub id: usize,
    pub kind: AgentKind,
    pub position: Position,
    pub heading: Heading,
}

/// Flock simulation configuration
///
/// Every field has a default so a settings file only needs to name what it
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlockSettings {
    pub population: usize,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
    pub vision: f64,
    pub separation: f64,
    pub cohere: f64,
    pub separate: f64,
    #[serde(rename = "match")]
    pub match_factor: f64,
    /// `None` draws a fresh seed when the model is built
    pub seed: Option<u64>,
    pub torus: bool,
}

impl Default for FlockSettings {
    fn default() -> Self {
        Self {
            population: 100,
            width: 100.0,
            height: 100.0,
            speed: 1.0,
            vision: 10.0,
            separation: 2.0,
            cohere: 0.025,
            separate: 0.25,
            match_factor: 0.04,
            seed: None,
            torus: true,
        }
    }
}

#[cfg(feature = "std")]
impl FlockSettings {
    /// Parse settings from JSON, filling omitted fields with defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
