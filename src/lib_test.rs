use super::*;

macro_rules! assert_vec2_near {
  ($a: expr, $b: expr) => {{
    let a = $a;
    let b = $b;

    assert!(
      a.distance_squared(b) < 1e-5,
      "\n  left: {}\n right: {}",
      a,
      b
    );
  }};
}

mod get_half_plane_for_neighbour_tests {
  use glam::Vec2;

  use super::{Agent, HalfPlane, VelocityObstacle};

  macro_rules! assert_half_plane_eq {
    ($a: expr, $b: expr) => {{
      let a: HalfPlane = $a;
      let b: HalfPlane = $b;

      assert!(
        a.point.distance_squared(b.point) < 1e-5,
        "\n  left: {:?}\n right: {:?}",
        a,
        b
      );
      assert!(
        a.normal.distance_squared(b.normal) < 1e-5,
        "\n  left: {:?}\n right: {:?}",
        a,
        b
      );
    }};
  }

  #[test]
  fn velocity_projects_on_cutoff_circle() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::new(1.0, 0.0),
      radius: 1.0,
    };
    let neighbour = Agent {
      position: Vec2::new(10.0, 0.0),
      velocity: Vec2::new(-1.0, 0.0),
      radius: 1.0,
    };

    // The cut-off circle is centered at (5, 0) with radius 1, and the relative
    // velocity (2, 0) is nearest to (4, 0). Half of that change is the agent's.
    assert_half_plane_eq!(
      agent.get_half_plane_for_neighbour(&neighbour, /* time_horizon= */ 2.0),
      HalfPlane { point: Vec2::new(2.0, 0.0), normal: Vec2::new(-1.0, 0.0) }
    );
  }

  #[test]
  fn velocity_projects_to_shadow() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::new(10.0, 3.0),
      radius: 1.0,
    };
    let neighbour = Agent {
      position: Vec2::new(10.0, 0.0),
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    let tangent = VelocityObstacle::new(Vec2::new(10.0, 0.0), 2.0, 1.0)
      .tangents
      .unwrap()
      .counter_clockwise;
    let projected_velocity = tangent * agent.velocity.dot(tangent);

    assert_half_plane_eq!(
      agent.get_half_plane_for_neighbour(&neighbour, /* time_horizon= */ 1.0),
      HalfPlane {
        point: agent.velocity + (projected_velocity - agent.velocity) * 0.5,
        normal: tangent.perp(),
      }
    );
  }

  #[test]
  fn overlapping_agents_push_apart() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::ZERO,
      radius: 1.0,
    };
    let neighbour = Agent {
      position: Vec2::new(1.0, 0.0),
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    assert_half_plane_eq!(
      agent.get_half_plane_for_neighbour(&neighbour, /* time_horizon= */ 1.0),
      HalfPlane { point: Vec2::new(-0.5, 0.0), normal: Vec2::new(-1.0, 0.0) }
    );
  }

  #[test]
  fn half_planes_are_reciprocal() {
    let agent_a = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::new(1.0, 0.0),
      radius: 1.0,
    };
    let agent_b = Agent {
      position: Vec2::new(10.0, 0.0),
      velocity: Vec2::new(-1.0, 0.0),
      radius: 1.0,
    };

    for time_horizon in [1.0, 2.0, 4.0, 8.0] {
      let a_to_b = agent_a.get_half_plane_for_neighbour(&agent_b, time_horizon);
      let b_to_a = agent_b.get_half_plane_for_neighbour(&agent_a, time_horizon);

      // The velocities are symmetric around zero, so the half-planes should be
      // too.
      let midpoint = (agent_a.velocity + agent_b.velocity) * 0.5;
      assert!(
        (a_to_b.point - midpoint).distance(midpoint - b_to_a.point) < 1e-4,
        "{:?} and {:?} are not symmetric",
        a_to_b,
        b_to_a
      );
      assert!(
        a_to_b.normal.distance(-b_to_a.normal) < 1e-5,
        "{:?} and {:?} are not symmetric",
        a_to_b,
        b_to_a
      );
    }
  }
}

mod compute_preferred_velocity_tests {
  use glam::Vec2;

  use super::Agent;

  #[test]
  fn far_goal_uses_max_speed() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    assert_vec2_near!(
      agent.compute_preferred_velocity(Vec2::new(30.0, 40.0), 2.0, 0.1),
      Vec2::new(1.2, 1.6)
    );
  }

  #[test]
  fn near_goal_slows_down() {
    let agent = Agent {
      position: Vec2::new(1.0, 1.0),
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    // The goal is 0.1 away, so it can be reached in one step at speed 1.
    assert_vec2_near!(
      agent.compute_preferred_velocity(Vec2::new(1.0, 1.1), 2.0, 0.1),
      Vec2::new(0.0, 1.0)
    );
  }

  #[test]
  fn at_goal_is_zero() {
    let agent = Agent {
      position: Vec2::new(1.0, 1.0),
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    assert_eq!(
      agent.compute_preferred_velocity(Vec2::new(1.0, 1.0), 2.0, 0.1),
      Vec2::ZERO
    );
  }
}

mod compute_avoiding_velocity_tests {
  use super::*;

  #[test]
  fn unobstructed_preferred_velocity_is_unchanged() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::new(1.0, 0.0),
      radius: 1.0,
    };
    let neighbours = [
      Cow::Owned(Agent {
        position: Vec2::new(0.0, 50.0),
        velocity: Vec2::ZERO,
        radius: 1.0,
      }),
      Cow::Owned(Agent {
        position: Vec2::new(-40.0, -10.0),
        velocity: Vec2::new(-1.0, 0.0),
        radius: 1.0,
      }),
    ];

    assert_eq!(
      agent.compute_avoiding_velocity(
        &neighbours,
        /* preferred_velocity= */ Vec2::new(1.0, 0.0),
        /* max_speed= */ 2.0,
        &AvoidanceOptions { time_horizon: 1.0 },
      ),
      Vec2::new(1.0, 0.0)
    );
  }

  #[test]
  fn moves_apart_if_directly_on_top_of_each_other() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::ZERO,
      radius: 0.5,
    };

    let avoiding_velocity = agent.compute_avoiding_velocity(
      &[Cow::Owned(agent.clone())],
      /* preferred_velocity= */ Vec2::ZERO,
      /* max_speed= */ 2.0,
      &AvoidanceOptions { time_horizon: 1.0 },
    );

    assert!(avoiding_velocity.is_finite());
    assert_ne!(avoiding_velocity, Vec2::ZERO);
  }

  #[test]
  fn head_on_agents_do_not_collide_within_time_horizon() {
    let time_horizon = 2.0;
    let max_speed = 2.0;

    let agent_a = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::new(2.0, 0.0),
      radius: 1.0,
    };
    let agent_b = Agent {
      position: Vec2::new(5.0, 0.0),
      velocity: Vec2::new(-2.0, 0.0),
      radius: 1.0,
    };
    let avoidance_options = AvoidanceOptions { time_horizon };

    let velocity_a = agent_a.compute_avoiding_velocity(
      &[Cow::Borrowed(&agent_b)],
      Vec2::new(2.0, 0.0),
      max_speed,
      &avoidance_options,
    );
    let velocity_b = agent_b.compute_avoiding_velocity(
      &[Cow::Borrowed(&agent_a)],
      Vec2::new(-2.0, 0.0),
      max_speed,
      &avoidance_options,
    );

    assert!(velocity_a.length() <= max_speed + 1e-4);
    assert!(velocity_b.length() <= max_speed + 1e-4);

    // Find the closest approach of the agents over the time horizon.
    let relative_position = agent_b.position - agent_a.position;
    let relative_velocity = velocity_a - velocity_b;
    let closest_time = (relative_position.dot(relative_velocity)
      / relative_velocity.length_squared())
    .clamp(0.0, time_horizon);
    let closest_distance =
      (relative_position - relative_velocity * closest_time).length();

    assert!(
      closest_distance >= agent_a.radius + agent_b.radius - 1e-3,
      "agents came within {} of each other",
      closest_distance
    );
  }

  #[test]
  fn extra_constraints_are_respected() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::ZERO,
      radius: 1.0,
    };

    let velocity = agent.compute_avoiding_velocity_with_constraints(
      &[],
      // Only allow velocities with y <= -0.5.
      &[HalfPlane {
        point: Vec2::new(0.0, -0.5),
        normal: Vec2::new(0.0, -1.0),
      }],
      /* preferred_velocity= */ Vec2::new(1.0, 0.0),
      /* max_speed= */ 2.0,
      &AvoidanceOptions { time_horizon: 1.0 },
    );

    assert_vec2_near!(velocity, Vec2::new(1.0, -0.5));
  }

  #[test]
  fn result_does_not_depend_on_neighbour_copies() {
    let agent = Agent {
      position: Vec2::new(30.0, 50.0),
      velocity: Vec2::new(-10.0, 12.0),
      radius: 8.0,
    };
    let neighbours = vec![
      Agent {
        position: Vec2::new(10.0, 60.0),
        velocity: Vec2::new(8.0, 18.0),
        radius: 8.0,
      },
      Agent {
        position: Vec2::new(-10.0, 50.0),
        velocity: Vec2::new(16.0, 11.0),
        radius: 8.0,
      },
      Agent {
        position: Vec2::new(25.0, 68.0),
        velocity: Vec2::new(0.0, -20.0),
        radius: 8.0,
      },
    ];
    let avoidance_options = AvoidanceOptions { time_horizon: 1.0 / 60.0 };

    let borrowed = neighbours.iter().map(Cow::Borrowed).collect::<Vec<_>>();
    let owned =
      neighbours.clone().into_iter().map(Cow::Owned).collect::<Vec<_>>();

    let preferred_velocity = Vec2::new(-7.0, 8.0);
    let from_borrowed = agent.compute_avoiding_velocity(
      &borrowed,
      preferred_velocity,
      20.0,
      &avoidance_options,
    );
    let from_owned = agent.compute_avoiding_velocity(
      &owned,
      preferred_velocity,
      20.0,
      &avoidance_options,
    );

    assert_eq!(from_borrowed.to_array(), from_owned.to_array());
    assert!(from_borrowed.length() <= 20.0 + 1e-3);
  }

  #[cfg(feature = "debug")]
  #[test]
  fn debug_data_reports_constraints() {
    let agent = Agent {
      position: Vec2::ZERO,
      velocity: Vec2::ZERO,
      radius: 0.5,
    };

    let (velocity, debug_data) = agent.compute_avoiding_velocity_with_debug(
      &[Cow::Owned(Agent {
        position: Vec2::new(3.0, 0.0),
        velocity: Vec2::ZERO,
        radius: 0.5,
      })],
      /* preferred_velocity= */ Vec2::new(1.0, 0.0),
      /* max_speed= */ 1.0,
      &AvoidanceOptions { time_horizon: 1.0 },
    );

    assert_vec2_near!(velocity, Vec2::new(1.0, 0.0));
    match debug_data {
      debug::DebugData::Satisfied { constraints } => {
        assert_eq!(constraints.len(), 1)
      }
      other => panic!("expected satisfied debug data, got {:?}", other),
    }
  }
}

#[cfg(feature = "serde")]
mod serde_tests {
  use super::*;

  #[test]
  fn agent_round_trips_through_json() {
    let agent = Agent {
      position: Vec2::new(1.5, -2.0),
      velocity: Vec2::new(0.25, 4.0),
      radius: 0.5,
    };

    let json = serde_json::to_string(&agent).unwrap();
    assert_eq!(
      json,
      r#"{"position":[1.5,-2.0],"velocity":[0.25,4.0],"radius":0.5}"#
    );
    assert_eq!(serde_json::from_str::<Agent>(&json).unwrap(), agent);
  }

  #[test]
  fn scenario_parameters_load_from_json() {
    let parameters: AgentParameters = serde_json::from_str(
      r#"{"goal_point":[-5.0,90.0],"max_speed":20.0,"time_horizon":2.0}"#,
    )
    .unwrap();
    assert_eq!(
      parameters,
      AgentParameters {
        goal_point: Vec2::new(-5.0, 90.0),
        max_speed: 20.0,
        time_horizon: 2.0,
      }
    );

    let options: AvoidanceOptions =
      serde_json::from_str(r#"{"time_horizon":0.5}"#).unwrap();
    assert_eq!(options, AvoidanceOptions { time_horizon: 0.5 });
  }

  #[test]
  fn half_plane_round_trips_through_json() {
    let half_plane =
      HalfPlane { point: Vec2::new(0.0, -0.5), normal: Vec2::new(0.0, -1.0) };

    let json = serde_json::to_string(&half_plane).unwrap();
    assert_eq!(
      serde_json::from_str::<HalfPlane>(&json).unwrap(),
      half_plane
    );
  }
}
