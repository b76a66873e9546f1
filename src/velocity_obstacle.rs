use glam::Vec2;

use crate::common::{rotate, EPSILON};

/// The velocity obstacle of a neighbour: the relative velocities that would
/// cause a collision within the time horizon. This is a cut-off circle plus
/// the "shadow" cone between the origin and the circle, bounded by the two
/// tangent lines through the origin.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct VelocityObstacle {
  /// The center of the cut-off circle (the relative position scaled by the
  /// inverse time horizon).
  pub center: Vec2,
  /// The radius of the cut-off circle (the sum of radii scaled by the inverse
  /// time horizon).
  pub radius: f32,
  /// The tangent lines bounding the shadow. `None` when the circle already
  /// contains the origin (the agents overlap), in which case the velocity
  /// obstacle is just the circle.
  pub tangents: Option<Tangents>,
}

/// The two tangent lines from the origin to the cut-off circle.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tangents {
  /// The unit direction of the tangent rotated counter-clockwise from the
  /// circle center.
  pub counter_clockwise: Vec2,
  /// The unit direction of the tangent rotated clockwise from the circle
  /// center.
  pub clockwise: Vec2,
  /// The distance from the origin to either tangent point. Satisfies
  /// `distance^2 = center.length_squared() - radius^2`.
  pub distance: f32,
}

/// The closest point on the boundary of a velocity obstacle.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct BoundaryProjection {
  pub point: Vec2,
  /// The unit normal of the boundary at `point`, pointing out of the velocity
  /// obstacle.
  pub normal: Vec2,
}

impl VelocityObstacle {
  /// Builds the velocity obstacle that a neighbour at `relative_position`
  /// (neighbour position minus agent position) induces, where `sum_radius` is
  /// the sum of both agents' radii.
  pub fn new(
    relative_position: Vec2,
    sum_radius: f32,
    time_horizon: f32,
  ) -> Self {
    let center = relative_position / time_horizon;
    let radius = sum_radius / time_horizon;

    // Exactly zero is fine here: the tangents just collapse onto the center
    // direction.
    let tangent_distance_squared = center.length_squared() - radius * radius;
    if tangent_distance_squared < 0.0 {
      return Self { center, radius, tangents: None };
    }

    let center_distance = center.length();
    let center_direction = center / center_distance;
    // The angle between the center and either tangent. Clamped since rounding
    // can push the ratio just past 1.
    let angle = (radius / center_distance).min(1.0).asin();

    Self {
      center,
      radius,
      tangents: Some(Tangents {
        counter_clockwise: rotate(center_direction, angle),
        clockwise: rotate(center_direction, -angle),
        distance: tangent_distance_squared.sqrt(),
      }),
    }
  }

  /// Finds the point on the boundary of the velocity obstacle nearest to
  /// `relative_velocity` (agent velocity minus neighbour velocity).
  pub fn project_to_boundary(
    &self,
    relative_velocity: Vec2,
  ) -> BoundaryProjection {
    if let Some(tangents) = &self.tangents {
      let counter_clockwise = self.project_to_tangent(
        tangents.counter_clockwise,
        tangents.distance,
        relative_velocity,
      );
      let clockwise = self.project_to_tangent(
        tangents.clockwise,
        tangents.distance,
        relative_velocity,
      );

      let projection = match (counter_clockwise, clockwise) {
        (Some(counter_clockwise), Some(clockwise)) => {
          if counter_clockwise.point.distance_squared(relative_velocity)
            < clockwise.point.distance_squared(relative_velocity)
          {
            Some(counter_clockwise)
          } else {
            Some(clockwise)
          }
        }
        (projection @ Some(_), None) | (None, projection @ Some(_)) => {
          projection
        }
        (None, None) => None,
      };

      if let Some(projection) = projection {
        return projection;
      }
    }

    self.project_to_circle(relative_velocity)
  }

  /// Projects `relative_velocity` onto the tangent line along
  /// `tangent_direction`. Only projections past the tangent point are on the
  /// boundary, otherwise the nearest boundary is the cut-off circle.
  fn project_to_tangent(
    &self,
    tangent_direction: Vec2,
    tangent_distance: f32,
    relative_velocity: Vec2,
  ) -> Option<BoundaryProjection> {
    let t = relative_velocity.dot(tangent_direction);
    if t < tangent_distance {
      return None;
    }

    // The radius through the tangent point is perpendicular to the tangent.
    let tangent_point = tangent_direction * tangent_distance;
    Some(BoundaryProjection {
      point: tangent_direction * t,
      normal: (tangent_point - self.center).normalize(),
    })
  }

  /// Projects `relative_velocity` radially onto the cut-off circle.
  fn project_to_circle(&self, relative_velocity: Vec2) -> BoundaryProjection {
    let mut offset = relative_velocity - self.center;
    if offset.length() < EPSILON {
      // Any direction works from the center, so act as if the relative
      // velocity were zero.
      offset = -self.center;
      if offset.length() < EPSILON {
        offset = Vec2::new(0.0, -1.0);
      }
    }

    let normal = offset.normalize();
    BoundaryProjection { point: self.center + normal * self.radius, normal }
  }
}

#[cfg(test)]
#[path = "velocity_obstacle_test.rs"]
mod test;
