// Re-export HalfPlane so we can use it to provide debug data.
pub use crate::linear_programming::HalfPlane;

/// Internal data that is used to generate the final suggested velocity.
#[derive(Debug, Clone)]
pub enum DebugData {
  /// Every half-plane was satisfied.
  Satisfied {
    /// The constraints that needed to be satisfied.
    constraints: Vec<HalfPlane>,
  },
  /// The half-planes could not all be satisfied, so the algorithm fell back to
  /// the velocity that penetrates the half-planes the least.
  Fallback {
    /// The constraints that could not all be satisfied.
    constraints: Vec<HalfPlane>,
    /// The index in `constraints` of the first half-plane that made the
    /// problem infeasible.
    index_of_failed_half_plane: usize,
  },
}
