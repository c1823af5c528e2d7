use boid_shared::{AgentSnapshot, FlockSettings};
use rand::Rng;

use crate::agent::{Agent, AgentId, Boid, BoidParams, Stationary};
use crate::config::validate_settings;
use crate::error::SimError;
use crate::rng::create_rng;
use crate::schedule::RandomActivation;
use crate::space::ContinuousSpace;
use crate::Vector2D;

/// Initial state of one agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Boid { position: Vector2D, velocity: Vector2D },
    Stationary { position: Vector2D },
}

impl Placement {
    pub fn boid(position: Vector2D, velocity: Vector2D) -> Self {
        Placement::Boid { position, velocity }
    }

    pub fn stationary(position: Vector2D) -> Self {
        Placement::Stationary { position }
    }

    fn position(&self) -> Vector2D {
        match *self {
            Placement::Boid { position, .. } | Placement::Stationary { position } => position,
        }
    }
}

/// A flock in a continuous space, advanced one tick at a time.
#[derive(Debug, Clone)]
pub struct Model {
    settings: FlockSettings,
    seed: u64,
    space: ContinuousSpace,
    schedule: RandomActivation,
}

impl Model {
    /// Build a model of `settings.population` boids at random positions with
    /// random headings.
    pub fn new(settings: FlockSettings) -> Result<Self, SimError> {
        validate_settings(&settings)?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut rng = create_rng(seed);

        let placements: Vec<Placement> = (0..settings.population)
            .map(|_| {
                let position = Vector2D::new(
                    rng.gen_range(0.0..settings.width),
                    rng.gen_range(0.0..settings.height),
                );
                Placement::boid(position, random_velocity(&mut rng))
            })
            .collect();

        Self::build(settings, seed, placements)
    }

    /// Build a model from explicit initial placements. The population is the
    /// number of placements; agent ids follow their order.
    pub fn with_placements(
        mut settings: FlockSettings,
        placements: Vec<Placement>,
    ) -> Result<Self, SimError> {
        settings.population = placements.len();
        validate_settings(&settings)?;
        let seed = settings.seed.unwrap_or_else(rand::random);
        Self::build(settings, seed, placements)
    }

    fn build(
        mut settings: FlockSettings,
        seed: u64,
        placements: Vec<Placement>,
    ) -> Result<Self, SimError> {
        settings.seed = Some(seed);
        let mut space = ContinuousSpace::new(settings.width, settings.height, settings.torus)?
            .with_bucket_size(settings.vision)?;
        let mut schedule = RandomActivation::new(seed);
        let params = BoidParams::from(&settings);

        for (index, placement) in placements.into_iter().enumerate() {
            let id = AgentId(index);
            space.place_agent(id, placement.position())?;
            let agent = match placement {
                Placement::Boid { velocity, .. } => Agent::Boid(Boid::new(id, velocity, params)),
                Placement::Stationary { .. } => Agent::Stationary(Stationary::new(id)),
            };
            schedule.add(agent);
        }

        log::info!(
            "flock ready: {} agents in {}x{} (torus: {}, seed: {})",
            schedule.len(),
            settings.width,
            settings.height,
            settings.torus,
            seed
        );

        Ok(Self {
            settings,
            seed,
            space,
            schedule,
        })
    }

    /// Advance one tick. Never fails in a wrapping space; otherwise a boid
    /// leaving the bounds aborts the tick with nothing changed.
    pub fn step(&mut self) -> Result<(), SimError> {
        if let Err(err) = self.schedule.step(&mut self.space) {
            log::warn!("tick {} aborted: {}", self.schedule.steps() + 1, err);
            return Err(err);
        }
        log::debug!(
            "tick {} done, polarization {:.3}",
            self.schedule.steps(),
            self.polarization()
        );
        Ok(())
    }

    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Owned view of every agent, in id order.
    pub fn agents(&self) -> Vec<AgentSnapshot> {
        self.schedule
            .agents()
            .values()
            .filter_map(|agent| {
                let position = self.space.position(agent.id());
                // every scheduled agent is placed in `build`, and ticks only move agents
                debug_assert!(position.is_some(), "agent {} has no position", agent.id());
                Some(AgentSnapshot {
                    id: agent.id().0,
                    kind: agent.kind(),
                    position: position?.into(),
                    heading: agent.velocity().into(),
                })
            })
            .collect()
    }

    /// Length of the mean boid velocity: 1.0 when every boid flies the same
    /// way, near 0.0 for a disordered flock.
    pub fn polarization(&self) -> f64 {
        let mut sum = Vector2D::zero();
        let mut count = 0usize;
        for agent in self.schedule.agents().values() {
            if let Agent::Boid(boid) = agent {
                sum += boid.velocity().try_normalize().unwrap_or_default();
                count += 1;
            }
        }
        if count == 0 {
            0.0
        } else {
            (sum / count as f64).magnitude()
        }
    }

    pub fn steps(&self) -> u64 {
        self.schedule.steps()
    }

    /// Seed actually used, also when the settings left it open.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Settings with the seed filled in, enough to replay this run.
    pub fn settings(&self) -> &FlockSettings {
        &self.settings
    }

    pub fn space(&self) -> &ContinuousSpace {
        &self.space
    }

    pub fn schedule(&self) -> &RandomActivation {
        &self.schedule
    }
}

/// Velocity with both components in `[-1, 1)`, never the zero vector.
fn random_velocity<R: Rng>(rng: &mut R) -> Vector2D {
    loop {
        let velocity = Vector2D::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        if velocity.try_normalize().is_some() {
            return velocity;
        }
    }
}
