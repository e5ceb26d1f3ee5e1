//! Incremental constrained Delaunay triangulation in the plane.
//!
//! The triangulation is an index-keyed structure: points are referenced by
//! 1-based [`VertexId`]s, incidence lives in a directed-edge → opposite
//! vertex map, and the unbounded face is closed off by ghost triangles
//! sharing a single virtual vertex. Construction is incremental
//! Bowyer–Watson insertion over a jump-and-march point locator, with all
//! geometric decisions made by sign-exact predicates.
//!
//! ```
//! use rdelaunay::{triangulate, BuildOptions, Point};
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//!
//! let mut rng = SmallRng::seed_from_u64(42);
//! let points = vec![
//!   Point::new([0.0, 0.0]),
//!   Point::new([1.0, 0.0]),
//!   Point::new([1.0, 1.0]),
//!   Point::new([0.0, 1.0]),
//! ];
//! let tri = triangulate(points, &BuildOptions::default(), &mut rng).unwrap();
//! assert_eq!(tri.num_solid_triangles(), 2);
//! ```

pub mod algorithms;
pub mod data;
pub mod predicates;
mod topology;
mod triangulation;

pub use algorithms::locate::{default_num_samples, jump_and_march, LocateOptions};
pub use algorithms::triangulate::{triangulate, BuildOptions};
pub use data::{DirectedEdge, IndexEdge, Point, Tri, VertexId};
pub use triangulation::{RepresentativeCoordinates, Triangulation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
  /// Every input point is collinear; no triangle exists.
  DegenerateInput { reason: &'static str },
  /// The inserted point coincides with an existing vertex (strict mode).
  DuplicatePoint { vertex: VertexId, point: Point },
  /// A constrained-edge edit cannot be honoured.
  ConstraintViolation {
    edge: (VertexId, VertexId),
    reason: &'static str,
  },
  /// A topology edit broke the structural invariants. Indicates a
  /// library bug.
  InternalInvariantViolation { reason: &'static str },
  /// Point location exceeded its safety bound.
  WalkFailure { steps: usize, point: Point },
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Error::DegenerateInput { reason } => write!(f, "degenerate input: {}", reason),
      Error::DuplicatePoint { vertex, point } => write!(
        f,
        "point ({}, {}) duplicates vertex {:?}",
        point.x_coord(),
        point.y_coord(),
        vertex
      ),
      Error::ConstraintViolation { edge, reason } => {
        write!(f, "constraint ({:?}, {:?}): {}", edge.0, edge.1, reason)
      }
      Error::InternalInvariantViolation { reason } => {
        write!(f, "internal invariant violation: {}", reason)
      }
      Error::WalkFailure { steps, point } => write!(
        f,
        "point location gave up after {} steps looking for ({}, {})",
        steps,
        point.x_coord(),
        point.y_coord()
      ),
    }
  }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
