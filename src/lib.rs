#![doc = include_str!("../README.md")]
// The contents of this file were primarily ported from Agent.cc from RVO2 with
// significant alterations. As per the Apache-2.0 license, the original
// copyright notice has been included, excluding those notices that do not
// pertain to the derivate work:
//
// Agent.cc
// RVO2 Library
//
// SPDX-FileCopyrightText: 2008 University of North Carolina at Chapel Hill
//
// The authors may be contacted via:
//
// Jur van den Berg, Stephen J. Guy, Jamie Snape, Ming C. Lin, Dinesh Manocha
// Dept. of Computer Science
// 201 S. Columbia St.
// Frederick P. Brooks, Jr. Computer Science Bldg.
// Chapel Hill, N.C. 27599-3175
// United States of America
//
// <https://gamma.cs.unc.edu/RVO2/>
mod common;
#[cfg(feature = "debug")]
pub mod debug;
mod error;
mod linear_programming;
mod simulator;
mod velocity_obstacle;

use std::borrow::Cow;

pub use common::{LineRestriction, EPSILON};
pub use error::SimulatorError;
pub use glam::Vec2;
pub use linear_programming::{solve_linear_program, HalfPlane, Solution};
pub use simulator::{AgentParameters, Simulator, StepSummary};
pub use velocity_obstacle::{BoundaryProjection, Tangents, VelocityObstacle};

/// A single agent in the simulation.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
  /// The position of the agent.
  pub position: Vec2,
  /// The current velocity of the agent.
  pub velocity: Vec2,

  /// The radius of the agent. Agents will use this to avoid bumping into each
  /// other.
  pub radius: f32,
}

/// Parameters for computing the avoidance vector.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvoidanceOptions {
  /// How long in the future should collisions be considered between agents.
  /// Must be positive.
  pub time_horizon: f32,
}

impl Agent {
  /// Computes the velocity that heads straight for `goal_point`. The speed is
  /// `max_speed`, unless the goal is reachable within `time_step`, in which
  /// case the agent slows down to land on the goal instead of overshooting.
  pub fn compute_preferred_velocity(
    &self,
    goal_point: Vec2,
    max_speed: f32,
    time_step: f32,
  ) -> Vec2 {
    let to_goal = goal_point - self.position;
    let distance = to_goal.length();
    if distance == 0.0 {
      return Vec2::ZERO;
    }

    to_goal / distance * max_speed.min(distance / time_step)
  }

  /// Computes a velocity based off the agent's preferred velocity (usually the
  /// direction to its current goal/waypoint). This new velocity is intended to
  /// avoid running into the agent's `neighbours`. This is not always possible,
  /// but agents will attempt to resolve any collisions in a reasonable fashion.
  /// The `max_speed` is the maximum magnitude of the returned velocity. Even if
  /// the `preferred_velocity` is larger than `max_speed`, the resulting vector
  /// will be at most `max_speed` in length.
  ///
  /// `neighbours` are considered in order. When not every neighbour can be
  /// avoided, the result depends on that order.
  pub fn compute_avoiding_velocity(
    &self,
    neighbours: &[Cow<'_, Agent>],
    preferred_velocity: Vec2,
    max_speed: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> Vec2 {
    self
      .solve(
        neighbours,
        &[],
        preferred_velocity,
        max_speed,
        avoidance_options,
      )
      .1
      .value
  }

  /// Same as [`Agent::compute_avoiding_velocity`], but the resulting velocity
  /// must also satisfy `extra_constraints`. These are considered after all the
  /// half-planes for `neighbours`.
  pub fn compute_avoiding_velocity_with_constraints(
    &self,
    neighbours: &[Cow<'_, Agent>],
    extra_constraints: &[HalfPlane],
    preferred_velocity: Vec2,
    max_speed: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> Vec2 {
    self
      .solve(
        neighbours,
        extra_constraints,
        preferred_velocity,
        max_speed,
        avoidance_options,
      )
      .1
      .value
  }

  /// Same as [`Agent::compute_avoiding_velocity`], but also returns the
  /// half-planes used to compute the velocity.
  #[cfg(feature = "debug")]
  pub fn compute_avoiding_velocity_with_debug(
    &self,
    neighbours: &[Cow<'_, Agent>],
    preferred_velocity: Vec2,
    max_speed: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> (Vec2, debug::DebugData) {
    let (constraints, solution) = self.solve(
      neighbours,
      &[],
      preferred_velocity,
      max_speed,
      avoidance_options,
    );

    let debug_data = match solution.index_of_failed_half_plane {
      None => debug::DebugData::Satisfied { constraints },
      Some(index_of_failed_half_plane) => {
        debug::DebugData::Fallback { constraints, index_of_failed_half_plane }
      }
    };
    (solution.value, debug_data)
  }

  fn solve(
    &self,
    neighbours: &[Cow<'_, Agent>],
    extra_constraints: &[HalfPlane],
    preferred_velocity: Vec2,
    max_speed: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> (Vec<HalfPlane>, Solution) {
    assert!(
      avoidance_options.time_horizon > 0.0,
      "time_horizon must be positive, was {}",
      avoidance_options.time_horizon
    );

    let constraints = neighbours
      .iter()
      .map(|neighbour| {
        self.get_half_plane_for_neighbour(
          neighbour,
          avoidance_options.time_horizon,
        )
      })
      .chain(extra_constraints.iter().copied())
      .collect::<Vec<HalfPlane>>();

    let solution =
      solve_linear_program(&constraints, max_speed, preferred_velocity);
    (constraints, solution)
  }

  /// Creates a half-plane to describe the valid velocities that should not
  /// collide with `neighbour` within `time_horizon`, assuming `neighbour` takes
  /// on the other half of the avoidance.
  fn get_half_plane_for_neighbour(
    &self,
    neighbour: &Agent,
    time_horizon: f32,
  ) -> HalfPlane {
    let velocity_obstacle = VelocityObstacle::new(
      neighbour.position - self.position,
      self.radius + neighbour.radius,
      time_horizon,
    );

    let relative_agent_velocity = self.velocity - neighbour.velocity;
    let projection =
      velocity_obstacle.project_to_boundary(relative_agent_velocity);

    // As in the paper, `u` is the vector from the relative velocity to the
    // nearest point on the velocity obstacle boundary. It can be vanishingly
    // small, so the direction of the half-plane comes from the projection
    // normal instead.
    let u = projection.point - relative_agent_velocity;

    HalfPlane { point: self.velocity + u * 0.5, normal: projection.normal }
  }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
