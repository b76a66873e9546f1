use std::borrow::Cow;

use glam::Vec2;

use crate::{Agent, AvoidanceOptions, SimulatorError, EPSILON};

/// Owns a set of agents and advances them in lock-step.
#[derive(Clone, Default, Debug)]
pub struct Simulator {
  agents: Vec<Agent>,
  agent_parameters: Vec<AgentParameters>,
}

/// The per-agent steering parameters.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentParameters {
  /// Where the agent is trying to get to.
  pub goal_point: Vec2,
  /// The largest speed the agent will ever move at.
  pub max_speed: f32,
  /// How long in the future should collisions be considered between agents.
  pub time_horizon: f32,
}

/// The speeds involved in a single step, used to detect when the simulation
/// has come to rest.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StepSummary {
  /// The largest speed of any agent before the step.
  pub max_previous_speed: f32,
  /// The largest speed of any agent after the step.
  pub max_next_speed: f32,
}

impl StepSummary {
  /// Whether every agent was (and still is) at rest.
  pub fn is_settled(&self) -> bool {
    self.max_previous_speed <= EPSILON && self.max_next_speed <= EPSILON
  }
}

impl Simulator {
  pub fn new() -> Simulator {
    Self { agents: Vec::new(), agent_parameters: Vec::new() }
  }

  /// Adds an agent to the simulation, returning its index.
  pub fn add_agent(
    &mut self,
    agent: Agent,
    agent_parameters: AgentParameters,
  ) -> Result<usize, SimulatorError> {
    validate_agent(&agent)?;
    validate_agent_parameters(&agent_parameters)?;

    log::debug!(
      "adding agent {} at {} heading to {}",
      self.agents.len(),
      agent.position,
      agent_parameters.goal_point
    );
    self.agents.push(agent);
    self.agent_parameters.push(agent_parameters);
    Ok(self.agents.len() - 1)
  }

  /// Adds an agent at `position` whose initial velocity heads straight for its
  /// goal at its max speed. Returns the agent's index.
  pub fn spawn_agent(
    &mut self,
    position: Vec2,
    radius: f32,
    agent_parameters: AgentParameters,
  ) -> Result<usize, SimulatorError> {
    let velocity = (agent_parameters.goal_point - position).normalize_or_zero()
      * agent_parameters.max_speed;
    self.add_agent(Agent { position, velocity, radius }, agent_parameters)
  }

  pub fn remove_agent(&mut self, agent_index: usize) {
    self.agents.remove(agent_index);
    self.agent_parameters.remove(agent_index);
  }

  pub fn get_agent(&self, agent_index: usize) -> &Agent {
    &self.agents[agent_index]
  }

  pub fn agents(&self) -> &[Agent] {
    &self.agents
  }

  pub fn get_agent_count(&self) -> usize {
    self.agents.len()
  }

  pub fn get_agent_parameters(&self, agent_index: usize) -> &AgentParameters {
    &self.agent_parameters[agent_index]
  }

  /// Changes where an agent is heading.
  pub fn set_goal_point(
    &mut self,
    agent_index: usize,
    goal_point: Vec2,
  ) -> Result<(), SimulatorError> {
    if !goal_point.is_finite() {
      return Err(SimulatorError::NonFinite {
        field: "goal point",
        value: goal_point,
      });
    }
    let agent_count = self.agent_parameters.len();
    let parameters = self
      .agent_parameters
      .get_mut(agent_index)
      .ok_or(SimulatorError::NoSuchAgent { index: agent_index, agent_count })?;
    parameters.goal_point = goal_point;
    Ok(())
  }

  /// Computes the velocity every agent will take during the next step. Only
  /// the current state is read, so every agent sees the same snapshot of its
  /// neighbours. The result is indexed the same as the agents.
  pub fn compute_next_velocities(&self, time_step: f32) -> Vec<Vec2> {
    assert!(time_step > 0.0, "time_step must be positive, was {}", time_step);

    self
      .agents
      .iter()
      .zip(self.agent_parameters.iter())
      .enumerate()
      .map(|(index, (agent, parameters))| {
        let neighbours = self
          .agents
          .iter()
          .enumerate()
          .filter(|&(other_index, _)| other_index != index)
          .map(|(_, other)| Cow::Borrowed(other))
          .collect::<Vec<_>>();

        let preferred_velocity = agent.compute_preferred_velocity(
          parameters.goal_point,
          parameters.max_speed,
          time_step,
        );

        agent.compute_avoiding_velocity(
          &neighbours,
          preferred_velocity,
          parameters.max_speed,
          &AvoidanceOptions { time_horizon: parameters.time_horizon },
        )
      })
      .collect()
  }

  /// Applies `next_velocities` (from [`Simulator::compute_next_velocities`])
  /// to every agent and moves them for `time_step`.
  pub fn commit(&mut self, next_velocities: &[Vec2], time_step: f32) {
    assert_eq!(
      next_velocities.len(),
      self.agents.len(),
      "expected one velocity per agent"
    );

    for (agent, &next_velocity) in self.agents.iter_mut().zip(next_velocities)
    {
      agent.velocity = next_velocity;
      agent.position += next_velocity * time_step;
    }
  }

  /// Advances the simulation by `time_step`.
  pub fn step(&mut self, time_step: f32) -> StepSummary {
    let next_velocities = self.compute_next_velocities(time_step);

    let summary = StepSummary {
      max_previous_speed: max_speed(self.agents.iter().map(|a| a.velocity)),
      max_next_speed: max_speed(next_velocities.iter().copied()),
    };
    log::trace!("step of {}s: {:?}", time_step, summary);

    self.commit(&next_velocities, time_step);
    summary
  }

  /// Steps the simulation until every agent has come to rest, or `max_steps`
  /// steps have passed. Returns the number of steps taken.
  pub fn run_until_settled(
    &mut self,
    time_step: f32,
    max_steps: usize,
  ) -> usize {
    for step in 1..=max_steps {
      if self.step(time_step).is_settled() {
        log::debug!("settled after {} steps", step);
        return step;
      }
    }
    max_steps
  }
}

fn max_speed(velocities: impl Iterator<Item = Vec2>) -> f32 {
  velocities.map(Vec2::length).fold(0.0, f32::max)
}

fn validate_agent(agent: &Agent) -> Result<(), SimulatorError> {
  if !agent.position.is_finite() {
    return Err(SimulatorError::NonFinite {
      field: "position",
      value: agent.position,
    });
  }
  if !agent.velocity.is_finite() {
    return Err(SimulatorError::NonFinite {
      field: "velocity",
      value: agent.velocity,
    });
  }
  if !(agent.radius.is_finite() && agent.radius > 0.0) {
    return Err(SimulatorError::InvalidRadius(agent.radius));
  }
  Ok(())
}

fn validate_agent_parameters(
  parameters: &AgentParameters,
) -> Result<(), SimulatorError> {
  if !parameters.goal_point.is_finite() {
    return Err(SimulatorError::NonFinite {
      field: "goal point",
      value: parameters.goal_point,
    });
  }
  if !(parameters.max_speed.is_finite() && parameters.max_speed > 0.0) {
    return Err(SimulatorError::InvalidMaxSpeed(parameters.max_speed));
  }
  if !(parameters.time_horizon.is_finite() && parameters.time_horizon > 0.0) {
    return Err(SimulatorError::InvalidTimeHorizon(parameters.time_horizon));
  }
  Ok(())
}

#[cfg(test)]
#[path = "simulator_test.rs"]
mod test;
