//! Bowyer–Watson point insertion.
//!
//! The located triangle is deleted and the cavity of triangles whose
//! circumcircle contains the new point is dug out breadth-first; every
//! edge where digging stops becomes a wall, re-triangulated as a fan
//! around the new vertex. Ghost triangles take part uniformly: their
//! "circumcircle" is the oriented outer halfplane of their boundary edge,
//! which is what makes insertions outside the hull, on the hull, and on
//! constrained segments all come out of the same excavation loop.

use claims::debug_assert_ok;
use log::trace;
use rand::Rng;

use crate::algorithms::locate::{jump_and_march, LocateOptions};
use crate::data::{IndexEdge, Point, Tri, VertexId};
use crate::predicates::{
  incircle, point_position_on_line_segment, point_position_relative_to_line,
  point_position_relative_to_oriented_outer_halfplane, triangle_orientation, HalfplanePosition,
  LinePosition, Orientation, SegmentPosition, TrianglePosition,
};
use crate::triangulation::Triangulation;
use crate::{Error, Result};

#[derive(Clone, Copy)]
pub(crate) struct InsertOptions<'a> {
  pub locate: LocateOptions<'a>,
  pub update_representative_point: bool,
  /// Signal `DuplicatePoint` instead of silently ignoring a re-inserted
  /// coordinate.
  pub strict: bool,
}

impl Default for InsertOptions<'static> {
  fn default() -> InsertOptions<'static> {
    InsertOptions {
      locate: LocateOptions::default(),
      update_representative_point: true,
      strict: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
  Inserted,
  /// The point coincides with an existing vertex.
  Duplicate(VertexId),
}

/// Inserts the stored point `r` into the triangulation.
pub(crate) fn add_point_bowyer_watson<R: Rng + ?Sized>(
  tri: &mut Triangulation,
  r: VertexId,
  opts: &InsertOptions,
  rng: &mut R,
) -> Result<InsertOutcome> {
  // Insertion leans on the ghost envelope; restore it if a maintenance
  // call removed it.
  if !tri.has_ghost_triangles() {
    tri.add_ghost_triangles();
  }
  let q = tri.point(r);
  let v_tri = jump_and_march(tri, &q, &opts.locate, rng)?;
  let flag = tri.position_relative_to_triangle(v_tri, &q);

  for &v in v_tri.vertices().iter() {
    if v.is_solid() && tri.point(v) == q {
      if opts.strict {
        return Err(Error::DuplicatePoint { vertex: v, point: q });
      }
      return Ok(InsertOutcome::Duplicate(v));
    }
  }

  let support = if flag == TrianglePosition::On {
    supporting_edge(tri, v_tri, &q)
  } else {
    None
  };

  trace!("inserting {:?} into {:?} (flag {:?})", r, v_tri, flag);
  dig_cavities(tri, r, v_tri, &q, flag);

  if let Some((a, b)) = support {
    let constrained = tri.is_constrained_edge(a, b);
    let other = tri.get_adjacent(b, a);
    if other.is_ghost() {
      // r splits the boundary edge (a, b); swap its ghost for the pair
      // over (a, r) and (r, b).
      tri.delete_triangle(b, a, VertexId::GHOST, false, false);
      tri.add_triangle(r, a, VertexId::GHOST, false);
      tri.add_triangle(b, r, VertexId::GHOST, false);
    } else if constrained && other.is_solid() {
      // dig_cavity refuses to cross constrained edges, so the far side
      // of (a, b) is excavated separately.
      tri.delete_triangle(b, a, other, true, false);
      dig_cavity(tri, r, a, other, &q, flag);
      dig_cavity(tri, r, other, b, &q, flag);
    }
    if constrained {
      split_constraint(tri, a, b, r);
    }
  }

  if opts.update_representative_point {
    tri.update_representative_point(&q);
  }
  debug_assert_ok!(tri.validate());
  Ok(InsertOutcome::Inserted)
}

// The directed edge of `t` whose open segment passes through `q`.
fn supporting_edge(tri: &Triangulation, t: Tri, q: &Point) -> Option<(VertexId, VertexId)> {
  for &(a, b) in t.edges().iter() {
    if !a.is_solid() || !b.is_solid() {
      continue;
    }
    let pa = tri.point(a);
    let pb = tri.point(b);
    if point_position_relative_to_line(&pa, &pb, q) == LinePosition::Collinear
      && point_position_on_line_segment(&pa, &pb, q) == SegmentPosition::On
    {
      return Some((a, b));
    }
  }
  None
}

// Replaces the constraint (a, b) with (a, r) and (r, b): one semantic
// write per constraint set.
pub(crate) fn split_constraint(tri: &mut Triangulation, a: VertexId, b: VertexId, r: VertexId) {
  let e = IndexEdge::new(a, b);
  let user = tri.constraints().is_user(e);
  let con = tri.constraints_mut();
  con.delete_edge(e);
  if user {
    con.add_edge(IndexEdge::new(a, r));
    con.add_edge(IndexEdge::new(r, b));
  } else {
    con.promote_boundary(IndexEdge::new(a, r));
    con.promote_boundary(IndexEdge::new(r, b));
  }
  tri.split_boundary_node(a, b, r);
}

// Deletes the located triangle and digs outwards through its edges.
fn dig_cavities(tri: &mut Triangulation, r: VertexId, v_tri: Tri, q: &Point, flag: TrianglePosition) {
  let [a, b, c] = v_tri.vertices();
  tri.delete_triangle(a, b, c, true, false);
  dig_cavity(tri, r, a, b, q, flag);
  dig_cavity(tri, r, b, c, q, flag);
  dig_cavity(tri, r, c, a, q, flag);
}

// Excavates across the directed edge (i, j), whose cavity side is on its
// left. Runs on an explicit stack so the cavity size bounds the memory,
// not the call depth.
fn dig_cavity(
  tri: &mut Triangulation,
  r: VertexId,
  i0: VertexId,
  j0: VertexId,
  q: &Point,
  flag: TrianglePosition,
) {
  let mut stack = vec![(i0, j0)];
  while let Some((i, j)) = stack.pop() {
    let l = tri.get_adjacent(j, i);
    if l.is_empty() {
      // The triangle across was already excavated; (i, j) is interior to
      // the cavity.
      continue;
    }
    if !tri.is_constrained_edge(i, j) && l.is_solid() && circumcircle_contains(tri, j, i, l, q) {
      tri.delete_triangle(j, i, l, true, false);
      stack.push((i, l));
      stack.push((l, j));
    } else {
      // (i, j) is a wall of the cavity.
      if flag == TrianglePosition::On && i.is_solid() && j.is_solid() {
        let o = triangle_orientation(&tri.point(r), &tri.point(i), &tri.point(j));
        if o == Orientation::Degenerate {
          // r lies on (i, j) itself; the wall triangle would collapse.
          continue;
        }
      }
      tri.add_triangle(r, i, j, false);
    }
  }
}

// Does the circumcircle of the existing triangle (u, v, w) strictly
// contain q? For a ghost triangle the circumcircle degenerates to the
// oriented outer halfplane of its boundary edge.
fn circumcircle_contains(
  tri: &Triangulation,
  u: VertexId,
  v: VertexId,
  w: VertexId,
  q: &Point,
) -> bool {
  let t = Tri::new(u, v, w);
  if t.is_ghost() {
    let [a, b, _g] = t.vertices();
    point_position_relative_to_oriented_outer_halfplane(&tri.point(a), &tri.point(b), q)
      == HalfplanePosition::Inside
  } else {
    let [a, b, c] = t.vertices();
    incircle(&tri.point(a), &tri.point(b), &tri.point(c), q) == 1
  }
}

impl Triangulation {
  /// Appends `p` and inserts it. Returns the vertex key of `p` — the
  /// existing one if the coordinate is already present.
  pub fn add_point<R: Rng + ?Sized>(&mut self, p: Point, rng: &mut R) -> Result<VertexId> {
    let r = self.push_point(p);
    match add_point_bowyer_watson(self, r, &InsertOptions::default(), rng)? {
      InsertOutcome::Inserted => Ok(r),
      InsertOutcome::Duplicate(v) => Ok(v),
    }
  }

  /// Inserts the already-stored point with key `r`.
  pub fn add_point_by_index<R: Rng + ?Sized>(&mut self, r: VertexId, rng: &mut R) -> Result<()> {
    add_point_bowyer_watson(self, r, &InsertOptions::default(), rng)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::SmallRng;
  use rand::SeedableRng;

  fn pt(x: f64, y: f64) -> Point {
    Point::new([x, y])
  }

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  fn seed_triangle(points: Vec<Point>) -> Triangulation {
    let mut tri = Triangulation::with_points(points);
    tri.add_triangle(v(1), v(2), v(3), true);
    for i in 1..=3 {
      let p = tri.point(v(i));
      tri.update_representative_point(&p);
    }
    tri
  }

  #[test]
  fn interior_insertion_splits_into_three() {
    // The fourth point splits the outer triangle into three.
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(1.0, 0.5)]);
    let mut rng = SmallRng::seed_from_u64(7);
    tri.add_point_by_index(v(4), &mut rng).unwrap();

    assert_eq!(tri.num_solid_triangles(), 3);
    assert!(tri.contains_triangle(v(1), v(2), v(4)));
    assert!(tri.contains_triangle(v(2), v(3), v(4)));
    assert!(tri.contains_triangle(v(3), v(1), v(4)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn on_edge_insertion() {
    // The new point lies on the interior edge shared by two triangles.
    let mut tri = seed_triangle(vec![
      pt(0.0, 0.0),
      pt(2.0, 0.0),
      pt(1.0, 2.0),
      pt(1.0, -2.0),
      pt(1.0, 0.0),
    ]);
    let mut rng = SmallRng::seed_from_u64(11);
    tri.add_point_by_index(v(4), &mut rng).unwrap();
    assert!(tri.contains_edge(v(1), v(2)));
    tri.add_point_by_index(v(5), &mut rng).unwrap();

    // (1,2) was split by 5: it is gone, and 5 is joined to all four.
    assert!(!tri.contains_edge(v(1), v(2)));
    for other in [1, 2, 3, 4] {
      assert!(tri.contains_edge(v(5), v(other)));
    }
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn on_boundary_edge_insertion() {
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(1.0, 0.0)]);
    let mut rng = SmallRng::seed_from_u64(13);
    tri.add_point_by_index(v(4), &mut rng).unwrap();

    assert_eq!(tri.num_solid_triangles(), 2);
    assert!(tri.contains_triangle(v(1), v(4), v(3)));
    assert!(tri.contains_triangle(v(4), v(2), v(3)));
    // The boundary ghost over (1,2) was replaced by the pair over (1,4)
    // and (4,2).
    assert!(tri.contains_triangle(v(4), v(1), VertexId::GHOST));
    assert!(tri.contains_triangle(v(2), v(4), VertexId::GHOST));
    assert!(!tri.contains_triangle(v(2), v(1), VertexId::GHOST));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn outside_insertion_extends_hull() {
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(1.0, -2.0)]);
    let mut rng = SmallRng::seed_from_u64(17);
    tri.add_point_by_index(v(4), &mut rng).unwrap();

    assert_eq!(tri.num_solid_triangles(), 2);
    assert!(tri.contains_triangle(v(2), v(1), v(4)));
    // New hull edges (1,4) and (4,2) carry ghosts; (1,2) is now interior.
    assert!(tri.is_boundary_edge(v(1), v(4)));
    assert!(tri.is_boundary_edge(v(4), v(2)));
    assert!(!tri.is_boundary_edge(v(1), v(2)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn cocircular_insertion_is_consistent() {
    // The four corners of a square are cocircular; either diagonal is
    // a valid Delaunay answer.
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0), pt(0.0, 1.0)]);
    let mut rng = SmallRng::seed_from_u64(19);
    tri.add_point_by_index(v(4), &mut rng).unwrap();
    assert_eq!(tri.num_solid_triangles(), 2);
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn duplicate_point_is_ignored_by_default() {
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(2.0, 0.0)]);
    let mut rng = SmallRng::seed_from_u64(23);
    let outcome =
      add_point_bowyer_watson(&mut tri, v(4), &InsertOptions::default(), &mut rng).unwrap();
    assert_eq!(outcome, InsertOutcome::Duplicate(v(2)));
    assert_eq!(tri.num_solid_triangles(), 1);

    let strict = InsertOptions {
      strict: true,
      ..InsertOptions::default()
    };
    let err = add_point_bowyer_watson(&mut tri, v(4), &strict, &mut rng).unwrap_err();
    assert_eq!(
      err,
      Error::DuplicatePoint {
        vertex: v(2),
        point: pt(2.0, 0.0)
      }
    );
  }

  #[test]
  fn insertion_restores_missing_ghosts() {
    let mut tri = seed_triangle(vec![pt(0.0, 0.0), pt(2.0, 0.0), pt(1.0, 2.0), pt(1.0, 0.5)]);
    tri.delete_ghost_triangles();
    let mut rng = SmallRng::seed_from_u64(29);
    tri.add_point_by_index(v(4), &mut rng).unwrap();
    assert!(tri.has_ghost_triangles());
    assert!(tri.validate().is_ok());
  }
}
