use glam::Vec2;
use thiserror::Error;

/// Invalid input when setting up a simulation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulatorError {
  #[error("agent radius must be positive and finite, was {0}")]
  InvalidRadius(f32),
  #[error("max speed must be positive and finite, was {0}")]
  InvalidMaxSpeed(f32),
  #[error("time horizon must be positive and finite, was {0}")]
  InvalidTimeHorizon(f32),
  #[error("agent {field} must be finite, was {value}")]
  NonFinite { field: &'static str, value: Vec2 },
  #[error("no agent at index {index}, there are {agent_count} agents")]
  NoSuchAgent { index: usize, agent_count: usize },
}
