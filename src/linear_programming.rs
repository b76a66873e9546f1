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

use glam::Vec2;

use crate::common::{LineRestriction, EPSILON};

/// A half-plane to act as a constraint on the linear program. This is
/// represented as a point on the boundary and the normal of the boundary. The
/// valid values `v` satisfy `(v - point).dot(normal) >= 0`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HalfPlane {
  pub point: Vec2,
  /// Must always have length = 1
  pub normal: Vec2,
}

impl HalfPlane {
  /// The direction of the boundary line. The boundary is parametrized as
  /// `point + t * direction()`.
  pub fn direction(&self) -> Vec2 {
    self.normal.perp()
  }

  /// How far `value` is on the valid side of the half-plane. Negative values
  /// mean `value` violates the half-plane.
  pub fn signed_distance(&self, value: Vec2) -> f32 {
    (value - self.point).dot(self.normal)
  }

  /// Whether `value` satisfies the half-plane.
  pub fn contains(&self, value: Vec2) -> bool {
    self.signed_distance(value) >= 0.0
  }

  /// Determines which values of `t` keep `line_point + t * line_direction`
  /// inside this half-plane.
  pub fn restrict_line(
    &self,
    line_point: Vec2,
    line_direction: Vec2,
  ) -> LineRestriction {
    // Solving `(line_point + t * line_direction - point).dot(normal) = 0`
    // for `t` gives `t = numerator / denominator`.
    let numerator = self.normal.dot(self.point - line_point);
    let denominator = self.normal.dot(line_direction);

    if denominator.abs() < EPSILON {
      // The line is nearly parallel to the boundary, so either the whole line
      // is valid or none of it is.
      return if numerator <= 0.0 {
        LineRestriction::Unrestricted
      } else {
        LineRestriction::Infeasible
      };
    }

    let t = numerator / denominator;
    // Moving along `line_direction` goes deeper into the valid side when the
    // line direction agrees with the normal.
    if denominator > 0.0 {
      LineRestriction::AtLeast(t)
    } else {
      LineRestriction::AtMost(t)
    }
  }
}

/// The result of solving the full linear program.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Solution {
  /// The chosen value. This is always within the radius of the program.
  pub value: Vec2,
  /// The first half-plane that made the program infeasible. If set, `value`
  /// is the least-penetrating value rather than a value satisfying every
  /// half-plane.
  pub index_of_failed_half_plane: Option<usize>,
}

/// Solves the linear program defined as finding the value closest to
/// `preferred_value` under the constraints that the value has a length less
/// than `radius`, and is inside all half-planes defined by `constraints`. If
/// satisfying all constraints is infeasible, the value which penetrates the
/// constraints the least is returned instead.
///
/// `constraints` are processed in order, so the result of an infeasible
/// program depends on that order.
pub fn solve_linear_program(
  constraints: &[HalfPlane],
  radius: f32,
  preferred_value: Vec2,
) -> Solution {
  match solve_linear_program_2d(
    constraints,
    radius,
    &OptimalValue::Point(preferred_value),
  ) {
    LinearProgram2DResult::Feasible(value) => {
      Solution { value, index_of_failed_half_plane: None }
    }
    LinearProgram2DResult::Infeasible {
      index_of_failed_half_plane,
      partial_value,
    } => {
      log::debug!(
        "half-plane {} of {} is infeasible, minimizing penetration instead",
        index_of_failed_half_plane,
        constraints.len()
      );
      Solution {
        value: solve_least_penetrating_program(
          constraints,
          radius,
          index_of_failed_half_plane,
          partial_value,
        ),
        index_of_failed_half_plane: Some(index_of_failed_half_plane),
      }
    }
  }
}

/// The definition of the optimal value ignoring all constraints.
#[derive(Clone, Copy, Debug)]
enum OptimalValue {
  /// The best value of the linear program should be the one nearest to this
  /// point (that satisfies the constraints).
  Point(Vec2),
  /// The best value of the linear program should be the one furthest in this
  /// direction (that satisfies the constraints). This must be a unit vector.
  Direction(Vec2),
}

/// Solves the linear program restricted to the boundary of `line`, and within
/// the circle defined by `radius`. In addition, all `constraints` are used to
/// further restrict the resulting value. The best value is defined by
/// `optimal_value`.
fn solve_linear_program_along_line(
  line: &HalfPlane,
  radius: f32,
  constraints: &[HalfPlane],
  optimal_value: &OptimalValue,
) -> Result<Vec2, ()> {
  let line_direction = line.direction();

  // Parametrize the boundary from its point closest to the origin. `line.point`
  // can be very far away (e.g. where two nearly parallel boundaries meet), and
  // expanding `|point + t * direction|^2` around it loses too much precision.
  let line_base =
    line.point - line.point.dot(line_direction) * line_direction;

  // Find the intersecting "times" of the boundary of `line` and the circle
  // with `radius`. `line_base` is perpendicular to the unit `line_direction`,
  // so `|line_base + t * direction|^2 = radius^2` simplifies to the following.
  let discriminant = radius * radius - line_base.length_squared();

  if discriminant < 0.0 {
    // `line` does not intersect the circle with `radius`, so the linear program
    // is infeasible.
    return Err(());
  }

  let discriminant = discriminant.sqrt();
  let mut t_left = -discriminant;
  let mut t_right = discriminant;

  for constraint in constraints {
    match constraint.restrict_line(line_base, line_direction) {
      LineRestriction::Unrestricted => continue,
      // `line` is parallel to and on the invalid side of `constraint`.
      LineRestriction::Infeasible => return Err(()),
      LineRestriction::AtLeast(t) => t_left = t_left.max(t),
      LineRestriction::AtMost(t) => t_right = t_right.min(t),
    }

    if t_left > t_right {
      // All values have been invalidated by performing the last cut, so the
      // problem is infeasible.
      return Err(());
    }
  }

  let t = match optimal_value {
    &OptimalValue::Direction(direction) => {
      // The most extreme value in that direction is always one of the ends.
      if direction.dot(line_direction) > 0.0 {
        t_right
      } else {
        t_left
      }
    }
    &OptimalValue::Point(point) => {
      // Project to the line unconstrained, then clamp to the valid range.
      line_direction.dot(point - line_base).clamp(t_left, t_right)
    }
  };

  Ok(line_base + t * line_direction)
}

/// The result of the 2D linear program.
#[derive(PartialEq, Debug)]
enum LinearProgram2DResult {
  /// The linear program was feasible and holds the optimal value.
  Feasible(Vec2),
  /// The linear program was infeasible.
  Infeasible {
    /// The index of the half-plane which caused the linear program to be
    /// invalid.
    index_of_failed_half_plane: usize,
    /// The value at the time that the linear program was determined to be
    /// invalid. The value is "partial" in the sense that it is partially
    /// constrained by the half-planes prior to `index_of_failed_half_plane`.
    partial_value: Vec2,
  },
}

/// Solves the 2D linear program, restricted to the circle defined by `radius`,
/// and under `constraints`. The best value is defined by `optimal_value`.
fn solve_linear_program_2d(
  constraints: &[HalfPlane],
  radius: f32,
  optimal_value: &OptimalValue,
) -> LinearProgram2DResult {
  let mut best_value = match optimal_value {
    // If optimizing by a direction, the best value is just on the circle in
    // that direction.
    &OptimalValue::Direction(direction) => direction * radius,
    // If using a point and the point is outside the circle, clamp it back to
    // the circle.
    &OptimalValue::Point(point) if point.length_squared() > radius * radius => {
      point.normalize_or_zero() * radius
    }
    // If using a point and the point is inside the circle, use it as is.
    &OptimalValue::Point(point) => point,
  };

  for (index, constraint) in constraints.iter().enumerate() {
    if constraint.contains(best_value) {
      // The current best value is already valid, so keep it as is.
      continue;
    }

    // Since the current `best_value` violates `constraint`, the new best value
    // must reside somewhere on the boundary of `constraint`.
    match solve_linear_program_along_line(
      constraint,
      radius,
      &constraints[0..index],
      optimal_value,
    ) {
      Ok(new_value) => best_value = new_value,
      Err(()) => {
        return LinearProgram2DResult::Infeasible {
          index_of_failed_half_plane: index,
          partial_value: best_value,
        }
      }
    }
  }

  warn_on_violated_constraints(constraints, radius, best_value);
  log::trace!(
    "solved {} half-planes with value {}",
    constraints.len(),
    best_value
  );
  LinearProgram2DResult::Feasible(best_value)
}

/// Reports any constraint that `value` violates by more than floating point
/// error, returning the number of violated constraints. This should never
/// happen for a feasible program.
fn warn_on_violated_constraints(
  constraints: &[HalfPlane],
  radius: f32,
  value: Vec2,
) -> usize {
  let tolerance = EPSILON * radius.max(1.0);
  let mut violations = 0;
  for (index, constraint) in constraints.iter().enumerate() {
    let signed_distance = constraint.signed_distance(value);
    if signed_distance < -tolerance {
      log::warn!(
        "solved value {} violates half-plane {} ({:?}) by {}",
        value,
        index,
        constraint,
        -signed_distance
      );
      violations += 1;
    }
  }
  violations
}

/// Minimizes the penetration into the constraints after the 2D linear program
/// was determined to be infeasible. This effectively finds the first valid
/// value when moving all half-planes back at the same speed. `radius` limits
/// the magnitude of the resulting value. `index_of_failed_half_plane` and
/// `partial_value` are the results from the infeasible 2D program, where
/// `partial_value` is assumed to satisfy all
/// `constraints[0..index_of_failed_half_plane]`.
fn solve_least_penetrating_program(
  constraints: &[HalfPlane],
  radius: f32,
  index_of_failed_half_plane: usize,
  partial_value: Vec2,
) -> Vec2 {
  // All constraints before `index_of_failed_half_plane` are satisfied, so the
  // deepest penetration so far is 0.
  let mut penetration = 0.0;
  let mut best_value = partial_value;

  for (index, constraint) in
    constraints.iter().enumerate().skip(index_of_failed_half_plane)
  {
    if -constraint.signed_distance(best_value) <= penetration {
      // `best_value` does not penetrate this constraint any more than the
      // others, so move on.
      continue;
    }

    let constraint_direction = constraint.direction();

    // Build a new problem whose half-planes keep every previous constraint
    // penetrated no more than `constraint`. Each boundary passes through the
    // point where both constraints are violated equally.
    let mut penetration_constraints = Vec::with_capacity(index);
    for previous_constraint in &constraints[0..index] {
      let normal = previous_constraint.normal - constraint.normal;
      if normal.length() < EPSILON {
        // The constraints face the same way, so minimizing the penetration of
        // `constraint` minimizes `previous_constraint` as well.
        continue;
      }

      let point = match previous_constraint
        .restrict_line(constraint.point, constraint_direction)
      {
        // The boundaries are parallel and `constraint` never enters
        // `previous_constraint`. Halfway between them both are violated the
        // same amount.
        LineRestriction::Infeasible => {
          (constraint.point + previous_constraint.point) * 0.5
        }
        // The boundaries are parallel and every value on the boundary of
        // `constraint` satisfies `previous_constraint`, so there is nothing to
        // balance.
        LineRestriction::Unrestricted => continue,
        LineRestriction::AtLeast(t) | LineRestriction::AtMost(t) => {
          constraint.point + t * constraint_direction
        }
      };

      penetration_constraints
        .push(HalfPlane { point, normal: normal.normalize() });
    }

    // The optimal value is the furthest value in the direction of the valid
    // side of `constraint`. Failing to solve this is only possible due to
    // floating point error, in which case the current `best_value` is kept.
    match solve_linear_program_2d(
      &penetration_constraints,
      radius,
      &OptimalValue::Direction(constraint.normal),
    ) {
      LinearProgram2DResult::Feasible(value) => best_value = value,
      LinearProgram2DResult::Infeasible { index_of_failed_half_plane, .. } => {
        log::debug!(
          "penetration program for half-plane {} failed at {}, keeping {}",
          index,
          index_of_failed_half_plane,
          best_value
        );
      }
    }

    penetration = -constraint.signed_distance(best_value);
  }

  // Each penetration program rounds independently, so the chain of them can
  // drift a hair past the circle.
  best_value.clamp_length_max(radius)
}

#[cfg(test)]
#[path = "linear_programming_test.rs"]
mod test;
