use glam::Vec2;

/// The single tolerance used by all geometric degeneracy checks. This is a
/// length, so checks must compare lengths (or dot products of unit vectors)
/// against it, never squared lengths. Checks on raw velocities scale this by
/// the magnitude involved instead.
pub const EPSILON: f32 = 0.00001;

/// Rotates `vector` counter-clockwise by `angle` radians.
pub fn rotate(vector: Vec2, angle: f32) -> Vec2 {
  Vec2::from_angle(angle).rotate(vector)
}

/// How a half-plane restricts the values of `t` along the line
/// `line_point + t * line_direction`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LineRestriction {
  /// Every `t` is valid. The line is parallel to the boundary and inside the
  /// half-plane.
  Unrestricted,
  /// No `t` is valid. The line is parallel to the boundary and outside the
  /// half-plane.
  Infeasible,
  /// Only values greater than or equal to this `t` are valid.
  AtLeast(f32),
  /// Only values less than or equal to this `t` are valid.
  AtMost(f32),
}

#[cfg(test)]
#[path = "common_test.rs"]
mod test;
