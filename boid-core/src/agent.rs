use std::collections::BTreeMap;
use std::fmt;

use boid_shared::{AgentKind, FlockSettings};

use crate::error::SimError;
use crate::space::ContinuousSpace;
use crate::Vector2D;

/// Heading used when an agent has no usable direction at all.
pub const DEFAULT_HEADING: Vector2D = Vector2D { x: 1.0, y: 0.0 };

/// Stable identifier of an agent for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Agents keyed by id; iteration order is id order.
pub type AgentSet = BTreeMap<AgentId, Agent>;

/// Per-boid movement and weighting parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoidParams {
    pub speed: f64,
    pub vision: f64,
    pub separation: f64,
    pub cohere_factor: f64,
    pub separate_factor: f64,
    pub match_factor: f64,
}

impl Default for BoidParams {
    fn default() -> Self {
        Self::from(&FlockSettings::default())
    }
}

impl From<&FlockSettings> for BoidParams {
    fn from(settings: &FlockSettings) -> Self {
        Self {
            speed: settings.speed,
            vision: settings.vision,
            separation: settings.separation,
            cohere_factor: settings.cohere,
            separate_factor: settings.separate,
            match_factor: settings.match_factor,
        }
    }
}

/// The three flocking drives computed from one neighborhood
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    /// Mean heading towards the neighbors
    pub cohere: Vector2D,
    /// Push away from neighbors closer than the separation distance
    pub separate: Vector2D,
    /// Mean velocity of the neighbors
    pub align: Vector2D,
}

impl Steering {
    /// Weighted sum of the drives, halved as in the classic flocker update.
    pub fn combined(&self, params: &BoidParams) -> Vector2D {
        (self.cohere * params.cohere_factor
            + self.separate * params.separate_factor
            + self.align * params.match_factor)
            / 2.0
    }
}

/// What an agent decided during the planning half of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    pub id: AgentId,
    pub velocity: Vector2D,
    /// Unwrapped target point; `None` for agents that stay put
    pub destination: Option<Vector2D>,
}

/// A single flocking agent
///
/// Its position lives in the [`ContinuousSpace`]; the boid only carries its
/// kinematics and weights.
#[derive(Debug, Clone)]
pub struct Boid {
    id: AgentId,
    velocity: Vector2D,
    params: BoidParams,
}

impl Boid {
    pub fn new(id: AgentId, velocity: Vector2D, params: BoidParams) -> Self {
        Self {
            id,
            velocity,
            params,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn velocity(&self) -> Vector2D {
        self.velocity
    }

    pub fn params(&self) -> &BoidParams {
        &self.params
    }

    /// Cohesion, separation and alignment for a boid standing at `position`.
    pub fn steering(&self, position: Vector2D, space: &ContinuousSpace, agents: &AgentSet) -> Steering {
        let neighbors = space.get_neighbors(position, self.params.vision, Some(self.id));
        let mut steering = Steering::default();
        let mut count = 0usize;

        for id in neighbors {
            let (Some(other), Some(agent)) = (space.position(id), agents.get(&id)) else {
                log::warn!("boid {} ignores neighbor {}: not a scheduled agent", self.id, id);
                continue;
            };
            let heading = space.get_heading(position, other);
            steering.cohere += heading;
            if heading.magnitude() < self.params.separation {
                steering.separate -= heading;
            }
            steering.align += agent.velocity();
            count += 1;
        }

        if count > 0 {
            steering.cohere = steering.cohere / count as f64;
            steering.align = steering.align / count as f64;
        }
        steering
    }

    /// Read the neighborhood and decide the next velocity and destination.
    pub fn plan(&self, space: &ContinuousSpace, agents: &AgentSet) -> Result<Plan, SimError> {
        let position = space
            .position(self.id)
            .ok_or(SimError::UnknownAgent { id: self.id })?;
        let steering = self.steering(position, space, agents);
        let velocity = self.resolve_velocity(self.velocity + steering.combined(&self.params));

        Ok(Plan {
            id: self.id,
            velocity,
            destination: Some(position + velocity * self.params.speed),
        })
    }

    fn resolve_velocity(&self, candidate: Vector2D) -> Vector2D {
        match unit_velocity(self.id, candidate) {
            Ok(velocity) => velocity,
            Err(err) => {
                let fallback = self.velocity.try_normalize().unwrap_or(DEFAULT_HEADING);
                log::debug!("{}; holding heading ({:.3}, {:.3})", err, fallback.x, fallback.y);
                fallback
            }
        }
    }
}

fn unit_velocity(id: AgentId, velocity: Vector2D) -> Result<Vector2D, SimError> {
    velocity
        .try_normalize()
        .ok_or(SimError::DegenerateVelocity { agent: id })
}

/// An agent that occupies a point and never moves
///
/// Boids see it as a neighbor with zero velocity.
#[derive(Debug, Clone)]
pub struct Stationary {
    id: AgentId,
}

impl Stationary {
    pub fn new(id: AgentId) -> Self {
        Self { id }
    }
}

/// Every kind of agent the scheduler can activate
#[derive(Debug, Clone)]
pub enum Agent {
    Boid(Boid),
    Stationary(Stationary),
}

impl Agent {
    pub fn id(&self) -> AgentId {
        match self {
            Agent::Boid(boid) => boid.id,
            Agent::Stationary(marker) => marker.id,
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            Agent::Boid(_) => AgentKind::Boid,
            Agent::Stationary(_) => AgentKind::Stationary,
        }
    }

    pub fn velocity(&self) -> Vector2D {
        match self {
            Agent::Boid(boid) => boid.velocity,
            Agent::Stationary(_) => Vector2D::zero(),
        }
    }

    /// Planning half of an activation. Must not observe other plans.
    pub fn plan(&self, space: &ContinuousSpace, agents: &AgentSet) -> Result<Plan, SimError> {
        match self {
            Agent::Boid(boid) => boid.plan(space, agents),
            Agent::Stationary(marker) => Ok(Plan {
                id: marker.id,
                velocity: Vector2D::zero(),
                destination: None,
            }),
        }
    }

    /// Commit half of an activation; the space is updated by the caller.
    pub fn apply(&mut self, plan: &Plan) {
        if let Agent::Boid(boid) = self {
            boid.velocity = plan.velocity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space_with(points: &[(usize, f64, f64)]) -> ContinuousSpace {
        let mut space = ContinuousSpace::new(10.0, 10.0, true).unwrap();
        for &(id, x, y) in points {
            space.place_agent(AgentId(id), Vector2D::new(x, y)).unwrap();
        }
        space
    }

    fn boid(id: usize, vx: f64, vy: f64) -> Agent {
        Agent::Boid(Boid::new(AgentId(id), Vector2D::new(vx, vy), BoidParams::default()))
    }

    fn set(agents: Vec<Agent>) -> AgentSet {
        agents.into_iter().map(|a| (a.id(), a)).collect()
    }

    #[test]
    fn test_default_params() {
        let params = BoidParams::default();
        assert_eq!(params.speed, 1.0);
        assert_eq!(params.vision, 10.0);
        assert_eq!(params.separation, 2.0);
        assert_eq!(params.cohere_factor, 0.025);
        assert_eq!(params.separate_factor, 0.25);
        assert_eq!(params.match_factor, 0.04);
    }

    #[test]
    fn test_lone_boid_has_no_steering() {
        let space = space_with(&[(0, 5.0, 5.0)]);
        let agents = set(vec![boid(0, 0.6, 0.8)]);
        let Agent::Boid(b) = &agents[&AgentId(0)] else {
            unreachable!()
        };
        let steering = b.steering(Vector2D::new(5.0, 5.0), &space, &agents);
        assert_eq!(steering, Steering::default());

        let plan = b.plan(&space, &agents).unwrap();
        assert!((plan.velocity.x - 0.6).abs() < 1e-12);
        assert!((plan.velocity.y - 0.8).abs() < 1e-12);
        let destination = plan.destination.unwrap();
        assert!((destination.x - 5.6).abs() < 1e-12);
        assert!((destination.y - 5.8).abs() < 1e-12);
    }

    #[test]
    fn test_close_pair_separates() {
        let space = space_with(&[(0, 0.0, 0.0), (1, 1.0, 0.0)]);
        let agents = set(vec![boid(0, 0.0, 1.0), boid(1, 0.0, 1.0)]);

        let steer = |id: usize, pos: Vector2D| match &agents[&AgentId(id)] {
            Agent::Boid(b) => b.steering(pos, &space, &agents),
            Agent::Stationary(_) => unreachable!(),
        };
        let left = steer(0, Vector2D::new(0.0, 0.0));
        let right = steer(1, Vector2D::new(1.0, 0.0));

        assert_eq!(left.separate, Vector2D::new(-1.0, 0.0));
        assert_eq!(right.separate, Vector2D::new(1.0, 0.0));
        assert_eq!(left.cohere, Vector2D::new(1.0, 0.0));
        assert_eq!(left.align, Vector2D::new(0.0, 1.0));
    }

    #[test]
    fn test_separation_is_strict() {
        let space = space_with(&[(0, 0.0, 0.0), (1, 2.0, 0.0)]);
        let agents = set(vec![boid(0, 1.0, 0.0), boid(1, 1.0, 0.0)]);
        let Agent::Boid(b) = &agents[&AgentId(0)] else {
            unreachable!()
        };
        let steering = b.steering(Vector2D::new(0.0, 0.0), &space, &agents);
        assert_eq!(steering.separate, Vector2D::zero());
        assert_eq!(steering.cohere, Vector2D::new(2.0, 0.0));
    }

    #[test]
    fn test_steering_wraps_across_edge() {
        let space = space_with(&[(0, 0.5, 5.0), (1, 9.5, 5.0)]);
        let agents = set(vec![boid(0, 0.0, 1.0), boid(1, 0.0, 1.0)]);
        let Agent::Boid(b) = &agents[&AgentId(0)] else {
            unreachable!()
        };
        let steering = b.steering(Vector2D::new(0.5, 5.0), &space, &agents);
        assert_eq!(steering.cohere, Vector2D::new(-1.0, 0.0));
        assert_eq!(steering.separate, Vector2D::new(1.0, 0.0));
    }

    #[test]
    fn test_combined_weights() {
        let steering = Steering {
            cohere: Vector2D::new(4.0, 0.0),
            separate: Vector2D::new(0.0, 2.0),
            align: Vector2D::new(1.0, 1.0),
        };
        let combined = steering.combined(&BoidParams::default());
        assert!((combined.x - (4.0 * 0.025 + 0.04) / 2.0).abs() < 1e-12);
        assert!((combined.y - (2.0 * 0.25 + 0.04) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_velocity_falls_back_to_default_heading() {
        let space = space_with(&[(0, 5.0, 5.0)]);
        let agents = set(vec![boid(0, 0.0, 0.0)]);
        let plan = agents[&AgentId(0)].plan(&space, &agents).unwrap();
        assert_eq!(plan.velocity, DEFAULT_HEADING);
        assert_eq!(plan.destination, Some(Vector2D::new(6.0, 5.0)));
    }

    #[test]
    fn test_cancelling_update_keeps_previous_heading() {
        let b = Boid::new(AgentId(0), Vector2D::new(0.0, 2.0), BoidParams::default());
        assert_eq!(b.resolve_velocity(Vector2D::zero()), Vector2D::new(0.0, 1.0));
    }

    #[test]
    fn test_stationary_never_moves() {
        let space = space_with(&[(0, 5.0, 5.0), (1, 5.5, 5.0)]);
        let mut agents = set(vec![
            Agent::Stationary(Stationary::new(AgentId(0))),
            boid(1, 1.0, 0.0),
        ]);
        let plan = agents[&AgentId(0)].plan(&space, &agents).unwrap();
        assert_eq!(plan.destination, None);
        assert_eq!(agents[&AgentId(0)].kind(), AgentKind::Stationary);

        if let Some(agent) = agents.get_mut(&AgentId(0)) {
            agent.apply(&plan);
        }
        assert_eq!(agents[&AgentId(0)].velocity(), Vector2D::zero());
    }

    #[test]
    fn test_stationary_neighbor_dilutes_alignment() {
        let space = space_with(&[(0, 5.0, 5.0), (1, 6.0, 5.0), (2, 4.0, 5.0)]);
        let agents = set(vec![
            boid(0, 1.0, 0.0),
            boid(1, 0.0, 1.0),
            Agent::Stationary(Stationary::new(AgentId(2))),
        ]);
        let Agent::Boid(b) = &agents[&AgentId(0)] else {
            unreachable!()
        };
        let steering = b.steering(Vector2D::new(5.0, 5.0), &space, &agents);
        assert_eq!(steering.align, Vector2D::new(0.0, 0.5));
        assert_eq!(steering.cohere, Vector2D::zero());
    }

    #[test]
    fn test_unplaced_boid_cannot_plan() {
        let space = space_with(&[]);
        let agents = set(vec![boid(4, 1.0, 0.0)]);
        assert_eq!(
            agents[&AgentId(4)].plan(&space, &agents),
            Err(SimError::UnknownAgent { id: AgentId(4) })
        );
    }

    #[test]
    fn test_positions_without_agents_are_ignored() {
        // id 7 sits in the space but was never scheduled
        let space = space_with(&[(0, 5.0, 5.0), (1, 6.0, 5.0), (7, 5.0, 6.0)]);
        let agents = set(vec![boid(0, 1.0, 0.0), boid(1, 0.0, 1.0)]);
        let Agent::Boid(b) = &agents[&AgentId(0)] else {
            unreachable!()
        };
        let steering = b.steering(Vector2D::new(5.0, 5.0), &space, &agents);
        assert_eq!(steering.cohere, Vector2D::new(1.0, 0.0));
        assert_eq!(steering.align, Vector2D::new(0.0, 1.0));
        assert_eq!(steering.separate, Vector2D::new(-1.0, 0.0));
    }
}
