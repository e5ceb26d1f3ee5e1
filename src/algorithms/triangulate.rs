//! The top-level build driver: choose an insertion order, seed the first
//! triangle, insert the remaining points one at a time, then tidy up.

use std::collections::HashSet;

use claims::debug_assert_ok;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::algorithms::bowyer_watson::{add_point_bowyer_watson, InsertOptions, InsertOutcome};
use crate::algorithms::locate::{default_num_samples, LocateOptions};
use crate::data::{Point, VertexId};
use crate::predicates::orient;
use crate::triangulation::Triangulation;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// Shuffle the insertion order with the caller's rng.
  pub randomise: bool,
  /// Seed each walk at the previously inserted vertex rather than a
  /// random inserted one.
  pub try_last_inserted_point: bool,
  /// Drop the ghost envelope once the build finishes.
  pub delete_ghosts: bool,
  /// Drop emptied map slots once the build finishes.
  pub delete_empty_features: bool,
  /// Recompute the representative point from the final vertex set.
  pub recompute_representative_point: bool,
  /// Point indices to leave out of the build.
  pub skip_points: HashSet<VertexId>,
  /// Explicit insertion order; overrides `randomise` and `skip_points`.
  pub point_order: Option<Vec<VertexId>>,
  /// Edges (1-based point indices) forced into the triangulation.
  pub constrained_edges: Vec<(i32, i32)>,
  /// Cyclic boundary (1-based point indices) whose edges are promoted to
  /// boundary constraints.
  pub boundary_nodes: Option<Vec<i32>>,
  /// Override for the jump-and-march sample-size rule.
  pub num_sample_rule: Option<fn(usize) -> usize>,
  /// Signal `DuplicatePoint` instead of skipping repeated coordinates.
  pub strict: bool,
}

impl Default for BuildOptions {
  fn default() -> BuildOptions {
    BuildOptions {
      randomise: true,
      try_last_inserted_point: true,
      delete_ghosts: false,
      delete_empty_features: false,
      recompute_representative_point: true,
      skip_points: HashSet::new(),
      point_order: None,
      constrained_edges: Vec::new(),
      boundary_nodes: None,
      num_sample_rule: None,
      strict: false,
    }
  }
}

/// Builds the (constrained) Delaunay triangulation of `points`.
pub fn triangulate<R: Rng + ?Sized>(
  points: Vec<Point>,
  options: &BuildOptions,
  rng: &mut R,
) -> Result<Triangulation> {
  let mut tri = Triangulation::with_points(points);

  let order: Vec<VertexId> = match &options.point_order {
    Some(order) => order.clone(),
    None => {
      let mut order: Vec<VertexId> = tri
        .point_indices()
        .filter(|v| !options.skip_points.contains(v))
        .collect();
      if options.randomise {
        order.shuffle(rng);
      }
      order
    }
  };

  let (i0, i1, i2) = initial_triangle(&tri, &order)?;
  tri.add_triangle(i0, i1, i2, true);
  for &i in [i0, i1, i2].iter() {
    let p = tri.point(i);
    tri.update_representative_point(&p);
  }

  let sample_rule = options.num_sample_rule.unwrap_or(default_num_samples);
  let mut last = i2;
  for &r in order.iter() {
    if r == i0 || r == i1 || r == i2 {
      continue;
    }
    let seed = if options.try_last_inserted_point {
      last
    } else {
      sample_inserted(&tri, rng).unwrap_or(last)
    };
    let seeds = [seed];
    let opts = InsertOptions {
      locate: LocateOptions {
        try_points: &seeds,
        num_sample_rule: sample_rule,
        check_existence: tri.is_constrained(),
      },
      update_representative_point: true,
      strict: options.strict,
    };
    match add_point_bowyer_watson(&mut tri, r, &opts, rng)? {
      InsertOutcome::Inserted => last = r,
      InsertOutcome::Duplicate(_) => {}
    }
  }

  for &(a, b) in options.constrained_edges.iter() {
    tri.add_segment(VertexId(a), VertexId(b))?;
  }
  if let Some(nodes) = &options.boundary_nodes {
    let ids: Vec<VertexId> = nodes.iter().map(|&i| VertexId(i)).collect();
    for i in 0..ids.len() {
      let a = ids[i];
      let b = ids[(i + 1) % ids.len()];
      tri.insert_segment(a, b, false)?;
    }
    tri.set_boundary_nodes(ids);
  }

  tri.reconstruct_convex_hull();
  if options.recompute_representative_point {
    tri.compute_representative_points();
  }
  if options.delete_ghosts {
    tri.delete_ghost_triangles();
  }
  if options.delete_empty_features {
    tri.clear_empty_features();
  }
  debug!(
    "triangulated {} vertices into {} solid triangles ({} on the hull)",
    tri.num_solid_vertices(),
    tri.num_solid_triangles(),
    tri.convex_hull().len()
  );
  debug_assert_ok!(tri.validate());
  Ok(tri)
}

// The first positively-oriented triple in insertion order, reoriented if
// needed.
fn initial_triangle(
  tri: &Triangulation,
  order: &[VertexId],
) -> Result<(VertexId, VertexId, VertexId)> {
  if order.len() < 3 {
    return Err(Error::DegenerateInput {
      reason: "fewer than three points",
    });
  }
  let i0 = order[0];
  let p0 = tri.point(i0);
  let i1 = order[1..]
    .iter()
    .copied()
    .find(|&v| tri.point(v) != p0)
    .ok_or(Error::DegenerateInput {
      reason: "all points coincide",
    })?;
  let p1 = tri.point(i1);
  for &j in order.iter() {
    if j == i0 || j == i1 {
      continue;
    }
    match orient(&p0, &p1, &tri.point(j)) {
      1 => return Ok((i0, i1, j)),
      -1 => return Ok((i0, j, i1)),
      _ => {}
    }
  }
  Err(Error::DegenerateInput {
    reason: "all points are collinear",
  })
}

fn sample_inserted<R: Rng + ?Sized>(tri: &Triangulation, rng: &mut R) -> Option<VertexId> {
  let n = tri.num_points() as i32;
  for _ in 0..32 {
    let v = VertexId(rng.gen_range(1..=n));
    if tri.has_vertex(v) {
      return Some(v);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::Tri;
  use rand::rngs::SmallRng;
  use rand::SeedableRng;

  fn pt(x: f64, y: f64) -> Point {
    Point::new([x, y])
  }

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  #[test]
  fn single_triangle() {
    let mut rng = SmallRng::seed_from_u64(1);
    let tri = triangulate(
      vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0)],
      &BuildOptions::default(),
      &mut rng,
    )
    .unwrap();

    let solids: Vec<Tri> = tri.solid_triangles().collect();
    assert_eq!(solids, vec![Tri::new(v(1), v(2), v(3))]);
    assert_eq!(tri.ghost_triangles().count(), 3);
    assert!(tri.contains_triangle(v(2), v(1), VertexId::GHOST));
    assert!(tri.contains_triangle(v(3), v(2), VertexId::GHOST));
    assert!(tri.contains_triangle(v(1), v(3), VertexId::GHOST));

    let hull = tri.convex_hull().to_vec();
    let start = hull.iter().position(|&x| x == v(1)).unwrap();
    let rotated: Vec<VertexId> = (0..3).map(|i| hull[(start + i) % 3]).collect();
    assert_eq!(rotated, vec![v(1), v(2), v(3)]);
  }

  #[test]
  fn collinear_input_is_degenerate() {
    let mut rng = SmallRng::seed_from_u64(2);
    let err = triangulate(
      vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0), pt(3.0, 0.0)],
      &BuildOptions::default(),
      &mut rng,
    )
    .unwrap_err();
    assert_eq!(
      err,
      Error::DegenerateInput {
        reason: "all points are collinear"
      }
    );
  }

  #[test]
  fn explicit_point_order_and_skip() {
    let mut rng = SmallRng::seed_from_u64(3);
    let points = vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(1.0, 0.5)];
    let options = BuildOptions {
      randomise: false,
      skip_points: [v(4)].iter().copied().collect(),
      ..BuildOptions::default()
    };
    let tri = triangulate(points, &options, &mut rng).unwrap();
    assert_eq!(tri.num_solid_vertices(), 3);
    assert!(!tri.has_vertex(v(4)));
  }

  #[test]
  fn constrained_build() {
    let mut rng = SmallRng::seed_from_u64(4);
    let points = vec![pt(0.0, 0.0), pt(4.0, 0.0), pt(2.0, 3.0)];
    let options = BuildOptions {
      constrained_edges: vec![(1, 2)],
      ..BuildOptions::default()
    };
    // The edge already exists, so only the constraint record changes.
    let tri = triangulate(points, &options, &mut rng).unwrap();
    assert_eq!(tri.num_solid_triangles(), 1);
    assert!(tri.is_constrained_edge(v(1), v(2)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn delete_ghosts_option() {
    let mut rng = SmallRng::seed_from_u64(5);
    let options = BuildOptions {
      delete_ghosts: true,
      delete_empty_features: true,
      ..BuildOptions::default()
    };
    let tri = triangulate(
      vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0), pt(0.4, 0.4)],
      &options,
      &mut rng,
    )
    .unwrap();
    assert!(!tri.has_ghost_triangles());
    assert_eq!(tri.num_solid_triangles(), 3);
    assert_eq!(tri.convex_hull().len(), 3);
  }

  #[test]
  fn identical_seeds_build_identical_triangulations() {
    let points: Vec<Point> = (0..40)
      .map(|i| {
        let x = (i as f64 * 0.7311).fract();
        let y = (i as f64 * 0.2937).fract();
        pt(x, y)
      })
      .collect();
    let mut rng1 = SmallRng::seed_from_u64(99);
    let mut rng2 = SmallRng::seed_from_u64(99);
    let t1 = triangulate(points.clone(), &BuildOptions::default(), &mut rng1).unwrap();
    let t2 = triangulate(points, &BuildOptions::default(), &mut rng2).unwrap();
    let s1: std::collections::HashSet<Tri> = t1.triangles().collect();
    let s2: std::collections::HashSet<Tri> = t2.triangles().collect();
    assert_eq!(s1, s2);
  }
}
