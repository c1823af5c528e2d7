use rand::seq::SliceRandom;
use rand_chacha::ChaCha12Rng;

use crate::agent::{Agent, AgentId, AgentSet};
use crate::error::SimError;
use crate::rng::derive_schedule_rng;
use crate::space::ContinuousSpace;

/// Activates every agent once per tick in a fresh random order.
///
/// A tick runs in two passes. The planning pass visits agents in the shuffled
/// order and lets each read the space and the other agents as they were at
/// the start of the tick. The commit pass then validates every destination
/// and only afterwards writes velocities and moves, in the same order. A tick
/// that fails leaves both the agents and the space untouched.
#[derive(Debug, Clone)]
pub struct RandomActivation {
    agents: AgentSet,
    rng: ChaCha12Rng,
    steps: u64,
    last_order: Vec<AgentId>,
}

impl RandomActivation {
    pub fn new(seed: u64) -> Self {
        Self {
            agents: AgentSet::new(),
            rng: derive_schedule_rng(seed),
            steps: 0,
            last_order: Vec::new(),
        }
    }

    /// Register an agent, replacing any agent with the same id.
    ///
    /// Takes effect from the next tick.
    pub fn add(&mut self, agent: Agent) -> Option<Agent> {
        self.agents.insert(agent.id(), agent)
    }

    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Completed ticks.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Activation order of the last completed tick; empty before the first.
    pub fn last_order(&self) -> &[AgentId] {
        &self.last_order
    }

    pub fn step(&mut self, space: &mut ContinuousSpace) -> Result<(), SimError> {
        let mut order: Vec<AgentId> = self.agents.keys().copied().collect();
        order.shuffle(&mut self.rng);

        let mut plans = Vec::with_capacity(order.len());
        for id in &order {
            if let Some(agent) = self.agents.get(id) {
                plans.push(agent.plan(space, &self.agents)?);
            }
        }

        let mut moves = Vec::with_capacity(plans.len());
        for plan in &plans {
            if let Some(destination) = plan.destination {
                moves.push((plan.id, space.admit(destination)?));
            }
        }

        for (id, position) in moves {
            space.move_agent(id, position)?;
        }
        for plan in &plans {
            if let Some(agent) = self.agents.get_mut(&plan.id) {
                agent.apply(plan);
            }
        }

        self.steps += 1;
        self.last_order = order;
        log::trace!("tick {} activated {} agents", self.steps, plans.len());
        Ok(())
    }
}
