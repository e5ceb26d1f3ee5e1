//! Constrained segment insertion and the vertex-level edit primitives:
//! `add_segment`, `split_edge`, `split_triangle`, `delete_point`.
//!
//! Segment insertion marches the corridor of triangles crossed by the new
//! segment, deletes them, and re-fills the two pseudo-polygon cavities
//! recursively, choosing each apex by the incircle test so the result is
//! constrained Delaunay without a legalisation pass.

use std::collections::{HashMap, HashSet, VecDeque};

use claims::debug_assert_ok;
use log::trace;

use crate::algorithms::bowyer_watson::split_constraint;
use crate::data::{IndexEdge, Tri, VertexId};
use crate::predicates::{
  incircle, orient, point_position_on_line_segment, point_position_relative_to_line,
  EdgeLegality, LinePosition, SegmentPosition, TrianglePosition,
};
use crate::triangulation::Triangulation;
use crate::{Error, Result};

enum FirstStep {
  /// The segment leaves the start vertex through the open edge
  /// `(left, right)`, named for their side of the segment.
  Crossing(VertexId, VertexId),
  /// A vertex sits on the open segment; the constraint splits there.
  ThroughVertex(VertexId),
}

impl Triangulation {
  /// Forces the edge `(u, v)` into the triangulation and records it as a
  /// user constraint.
  pub fn add_segment(&mut self, u: VertexId, v: VertexId) -> Result<()> {
    self.insert_segment(u, v, true)
  }

  pub(crate) fn insert_segment(&mut self, u: VertexId, v: VertexId, user: bool) -> Result<()> {
    if u == v || !u.is_solid() || !v.is_solid() || !self.has_vertex(u) || !self.has_vertex(v) {
      return Err(Error::ConstraintViolation {
        edge: (u, v),
        reason: "constraint endpoints must be distinct vertices of the triangulation",
      });
    }
    if self.contains_edge(u, v) {
      self.record_constraint(u, v, user);
      return Ok(());
    }
    match self.first_step(u, v)? {
      FirstStep::ThroughVertex(w) => {
        trace!("segment ({:?},{:?}) splits at {:?}", u, v, w);
        self.insert_segment(u, w, user)?;
        self.insert_segment(w, v, user)
      }
      FirstStep::Crossing(l, r) => self.cut_corridor(u, v, l, r, user),
    }
  }

  fn record_constraint(&mut self, u: VertexId, v: VertexId, user: bool) {
    let e = IndexEdge::new(u, v);
    if user {
      self.constraints_mut().add_edge(e);
    } else {
      self.constraints_mut().promote_boundary(e);
    }
  }

  // How the segment u→v leaves the star of u.
  fn first_step(&self, u: VertexId, v: VertexId) -> Result<FirstStep> {
    let pu = self.point(u);
    let pv = self.point(v);
    for n in self.neighbours(u) {
      if !n.is_solid() {
        continue;
      }
      let pn = self.point(n);
      if point_position_relative_to_line(&pu, &pv, &pn) == LinePosition::Collinear
        && point_position_on_line_segment(&pu, &pv, &pn) == SegmentPosition::On
      {
        return Ok(FirstStep::ThroughVertex(n));
      }
    }
    for (a, b) in self.edges_opposite(u) {
      if !a.is_solid() || !b.is_solid() {
        continue;
      }
      // The wedge of triangle (a, b, u) at u, strictly.
      if orient(&pu, &self.point(a), &pv) > 0 && orient(&pu, &self.point(b), &pv) < 0 {
        return Ok(FirstStep::Crossing(b, a));
      }
    }
    Err(Error::InternalInvariantViolation {
      reason: "no corridor leaves the constraint endpoint",
    })
  }

  // Marches the corridor of triangles crossed by the open segment u→v,
  // deletes it and refills both sides.
  fn cut_corridor(
    &mut self,
    u: VertexId,
    v: VertexId,
    first_left: VertexId,
    first_right: VertexId,
    user: bool,
  ) -> Result<()> {
    let pu = self.point(u);
    let pv = self.point(v);
    let mut left_chain = vec![first_left];
    let mut right_chain = vec![first_right];
    let mut cut: Vec<Tri> = vec![Tri::new(first_right, first_left, u)];
    let (mut l, mut r) = (first_left, first_right);
    loop {
      if self.is_constrained_edge(l, r) {
        return Err(Error::ConstraintViolation {
          edge: (u, v),
          reason: "segment crosses a constrained edge",
        });
      }
      let w = self.get_adjacent(l, r);
      if !w.is_solid() {
        return Err(Error::InternalInvariantViolation {
          reason: "constraint corridor ran off the triangulation",
        });
      }
      cut.push(Tri::new(l, r, w));
      if w == v {
        break;
      }
      let o = orient(&pu, &pv, &self.point(w));
      if o > 0 {
        left_chain.push(w);
        l = w;
      } else if o < 0 {
        right_chain.push(w);
        r = w;
      } else {
        // w sits on the open segment: close the corridor at w and carry
        // on from there.
        for t in cut {
          let [a, b, c] = t.vertices();
          self.delete_triangle(a, b, c, true, false);
        }
        self.fill_cavity(u, w, &left_chain);
        let rev: Vec<VertexId> = right_chain.iter().rev().copied().collect();
        self.fill_cavity(w, u, &rev);
        self.record_constraint(u, w, user);
        debug_assert_ok!(self.validate());
        return self.insert_segment(w, v, user);
      }
    }
    for t in cut {
      let [a, b, c] = t.vertices();
      self.delete_triangle(a, b, c, true, false);
    }
    self.fill_cavity(u, v, &left_chain);
    let rev: Vec<VertexId> = right_chain.iter().rev().copied().collect();
    self.fill_cavity(v, u, &rev);
    self.record_constraint(u, v, user);
    debug_assert_ok!(self.validate());
    Ok(())
  }

  // Fills the cavity left of a→b whose far boundary is `chain`, ordered
  // from a to b. The apex of the base triangle is the chain vertex whose
  // circumcircle with (a, b) holds no other chain vertex.
  fn fill_cavity(&mut self, a: VertexId, b: VertexId, chain: &[VertexId]) {
    if chain.is_empty() {
      return;
    }
    let mut k = 0;
    if chain.len() > 1 {
      let pa = self.point(a);
      let pb = self.point(b);
      for i in 1..chain.len() {
        if incircle(&pa, &pb, &self.point(chain[k]), &self.point(chain[i])) == 1 {
          k = i;
        }
      }
    }
    self.fill_cavity(a, chain[k], &chain[..k]);
    self.fill_cavity(chain[k], b, &chain[k + 1..]);
    self.add_triangle(a, b, chain[k], false);
  }

  /// Splits the edge `(u, v)` at the stored point `r`, which must lie on
  /// its open segment. Both incident triangles (ghosts included) are
  /// replaced; a constrained edge splits into two constrained halves.
  /// Leaves Delaunay restoration to the caller (`legalise_edge`).
  pub fn split_edge(&mut self, u: VertexId, v: VertexId, r: VertexId) -> Result<()> {
    if !self.contains_edge(u, v) {
      return Err(Error::ConstraintViolation {
        edge: (u, v),
        reason: "cannot split an edge that is not in the triangulation",
      });
    }
    let pu = self.point(u);
    let pv = self.point(v);
    let pr = self.point(r);
    if point_position_relative_to_line(&pu, &pv, &pr) != LinePosition::Collinear
      || point_position_on_line_segment(&pu, &pv, &pr) != SegmentPosition::On
    {
      return Err(Error::ConstraintViolation {
        edge: (u, v),
        reason: "split point does not lie on the open edge",
      });
    }
    for (a, b) in [(u, v), (v, u)].iter().copied() {
      let w = self.get_adjacent(a, b);
      if w.is_empty() {
        continue;
      }
      self.delete_triangle(a, b, w, true, false);
      self.add_triangle(a, r, w, false);
      self.add_triangle(r, b, w, false);
    }
    if self.is_constrained_edge(u, v) {
      split_constraint(self, u, v, r);
    }
    Ok(())
  }

  /// Splits the triangle `(u, v, w)` into three at the stored point `r`
  /// strictly inside it. Leaves Delaunay restoration to the caller.
  pub fn split_triangle(&mut self, u: VertexId, v: VertexId, w: VertexId, r: VertexId) -> Result<()> {
    let t = Tri::new(u, v, w);
    if !self.contains_triangle(u, v, w) || t.is_ghost() {
      return Err(Error::ConstraintViolation {
        edge: (u, v),
        reason: "cannot split a triangle that is not a solid triangle of the triangulation",
      });
    }
    let pr = self.point(r);
    if self.position_relative_to_triangle(t, &pr) != TrianglePosition::Inside {
      return Err(Error::ConstraintViolation {
        edge: (u, v),
        reason: "split point does not lie strictly inside the triangle",
      });
    }
    self.delete_triangle(u, v, w, true, false);
    self.add_triangle(r, u, v, false);
    self.add_triangle(r, v, w, false);
    self.add_triangle(r, w, u, false);
    Ok(())
  }

  /// Removes an interior, unconstrained vertex and re-triangulates its
  /// star polygon, restoring the Delaunay property.
  pub fn delete_point(&mut self, x: VertexId) -> Result<()> {
    if !x.is_solid() || !self.has_vertex(x) {
      return Err(Error::ConstraintViolation {
        edge: (x, x),
        reason: "not a vertex of the triangulation",
      });
    }
    if self.neighbours(x).any(|n| n.is_ghost()) {
      return Err(Error::ConstraintViolation {
        edge: (x, x),
        reason: "cannot delete a vertex on the boundary",
      });
    }
    if self.neighbours(x).any(|n| self.is_constrained_edge(x, n)) {
      return Err(Error::ConstraintViolation {
        edge: (x, x),
        reason: "cannot delete a vertex incident to a constrained edge",
      });
    }

    // The link of x, as a ccw cycle.
    let next: HashMap<VertexId, VertexId> = self.edges_opposite(x).collect();
    let mut ring = Vec::with_capacity(next.len());
    let start = *next.keys().next().ok_or(Error::InternalInvariantViolation {
      reason: "vertex with no incident triangles",
    })?;
    let mut cur = start;
    loop {
      ring.push(cur);
      cur = *next.get(&cur).ok_or(Error::InternalInvariantViolation {
        reason: "broken link cycle around deleted vertex",
      })?;
      if cur == start {
        break;
      }
      if ring.len() > next.len() {
        return Err(Error::InternalInvariantViolation {
          reason: "link around deleted vertex does not close",
        });
      }
    }

    for (&a, &b) in next.iter() {
      self.delete_triangle(a, b, x, true, false);
    }

    // Ear-clip the star polygon, then Lawson-flip the fresh diagonals.
    let mut diagonals: Vec<(VertexId, VertexId)> = Vec::new();
    while ring.len() > 3 {
      let n = ring.len();
      let mut clipped = false;
      for i in 0..n {
        let p = ring[(i + n - 1) % n];
        let c = ring[i];
        let nx = ring[(i + 1) % n];
        if orient(&self.point(p), &self.point(c), &self.point(nx)) <= 0 {
          continue;
        }
        let blocked = ring.iter().any(|&other| {
          other != p
            && other != c
            && other != nx
            && self.position_relative_to_triangle(Tri::new(p, c, nx), &self.point(other))
              != TrianglePosition::Outside
        });
        if blocked {
          continue;
        }
        self.add_triangle(p, c, nx, false);
        diagonals.push((p, nx));
        ring.remove(i);
        clipped = true;
        break;
      }
      if !clipped {
        return Err(Error::InternalInvariantViolation {
          reason: "no ear found while re-triangulating a star polygon",
        });
      }
    }
    self.add_triangle(ring[0], ring[1], ring[2], false);
    self.lawson_flip(diagonals)?;
    debug_assert_ok!(self.validate());
    Ok(())
  }

  // Flips the given cavity diagonals until all are legal. Edges outside
  // the set are never touched.
  fn lawson_flip(&mut self, diagonals: Vec<(VertexId, VertexId)>) -> Result<()> {
    let mut active: HashSet<IndexEdge> = diagonals
      .iter()
      .map(|&(a, b)| IndexEdge::new(a, b))
      .collect();
    let mut queue: VecDeque<(VertexId, VertexId)> = diagonals.into();
    let mut budget = 4 * (queue.len() + 2) * (queue.len() + 2) + 64;
    while let Some((a, b)) = queue.pop_front() {
      if budget == 0 {
        return Err(Error::InternalInvariantViolation {
          reason: "legalisation did not converge",
        });
      }
      budget -= 1;
      if !active.contains(&IndexEdge::new(a, b)) || !self.contains_edge(a, b) {
        continue;
      }
      if self.is_legal(a, b) == EdgeLegality::Legal {
        continue;
      }
      let p = self.get_adjacent(a, b);
      let q = self.get_adjacent(b, a);
      self.flip_edge(a, b)?;
      active.remove(&IndexEdge::new(a, b));
      active.insert(IndexEdge::new(p, q));
      queue.push_back((p, q));
      for e in [(a, q), (q, b), (b, p), (p, a)].iter() {
        if active.contains(&IndexEdge::new(e.0, e.1)) {
          queue.push_back(*e);
        }
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::Point;
  use rand::rngs::SmallRng;
  use rand::SeedableRng;

  fn pt(x: f64, y: f64) -> Point {
    Point::new([x, y])
  }

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  // Two triangles over a convex quad; (1,3) is the diagonal.
  fn quad() -> Triangulation {
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(2.0, -1.0),
      pt(3.0, 1.0),
      pt(1.0, 2.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.add_triangle(v(1), v(3), v(4), true);
    tri.compute_representative_points();
    tri
  }

  #[test]
  fn existing_edge_is_just_recorded() {
    // The segment is already an edge of the triangulation.
    let mut tri = quad();
    let before: HashSet<Tri> = tri.triangles().collect();
    tri.add_segment(v(1), v(3)).unwrap();
    let after: HashSet<Tri> = tri.triangles().collect();
    assert_eq!(before, after);
    assert!(tri.is_constrained_edge(v(1), v(3)));
    assert!(tri.constraints().is_user(IndexEdge::new(v(1), v(3))));
  }

  #[test]
  fn crossing_segment_swaps_the_diagonal() {
    let mut tri = quad();
    tri.add_segment(v(2), v(4)).unwrap();
    assert!(tri.contains_edge(v(2), v(4)));
    assert!(!tri.contains_edge(v(1), v(3)));
    assert!(tri.is_constrained_edge(v(2), v(4)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn crossing_a_constraint_is_refused() {
    let mut tri = quad();
    tri.add_segment(v(1), v(3)).unwrap();
    let err = tri.add_segment(v(2), v(4)).unwrap_err();
    match err {
      Error::ConstraintViolation { .. } => {}
      other => panic!("expected ConstraintViolation, got {:?}", other),
    }
    // The refused edit left the triangulation untouched.
    assert!(tri.contains_edge(v(1), v(3)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn segment_through_a_vertex_splits() {
    // 5 sits on the segment from 1 to 2 after both are inserted around it.
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(4.0, 0.0),
      pt(2.0, 2.0),
      pt(2.0, -2.0),
      pt(2.0, 0.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.compute_representative_points();
    let mut rng = SmallRng::seed_from_u64(5);
    tri.add_point_by_index(v(4), &mut rng).unwrap();
    tri.add_point_by_index(v(5), &mut rng).unwrap();

    tri.add_segment(v(1), v(2)).unwrap();
    assert!(tri.is_constrained_edge(v(1), v(5)));
    assert!(tri.is_constrained_edge(v(5), v(2)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn split_triangle_makes_a_fan() {
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(3.0, 0.0),
      pt(0.0, 3.0),
      pt(1.0, 1.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.split_triangle(v(1), v(2), v(3), v(4)).unwrap();
    assert_eq!(tri.num_solid_triangles(), 3);
    assert!(tri.contains_triangle(v(4), v(1), v(2)));
    assert!(tri.split_triangle(v(1), v(2), v(3), v(4)).is_err());
  }

  #[test]
  fn split_edge_splits_both_sides_and_the_constraint() {
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(2.0, 0.0),
      pt(1.0, 1.0),
      pt(1.0, -1.0),
      pt(1.0, 0.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.add_triangle(v(2), v(1), v(4), true);
    tri.add_edge(v(1), v(2));
    tri.split_edge(v(1), v(2), v(5)).unwrap();

    assert!(!tri.contains_edge(v(1), v(2)));
    assert!(tri.contains_triangle(v(1), v(5), v(3)));
    assert!(tri.contains_triangle(v(5), v(2), v(3)));
    assert!(tri.contains_triangle(v(5), v(1), v(4)));
    assert!(tri.contains_triangle(v(2), v(5), v(4)));
    assert!(tri.is_constrained_edge(v(1), v(5)));
    assert!(tri.is_constrained_edge(v(5), v(2)));
    assert!(!tri.is_constrained_edge(v(1), v(2)));
  }

  #[test]
  fn delete_point_restores_the_hole() {
    // A triangle with an interior point fanned out, then deleted again.
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(4.0, 0.0),
      pt(2.0, 3.0),
      pt(2.0, 1.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.compute_representative_points();
    let mut rng = SmallRng::seed_from_u64(9);
    tri.add_point_by_index(v(4), &mut rng).unwrap();
    assert_eq!(tri.num_solid_triangles(), 3);

    tri.delete_point(v(4)).unwrap();
    assert_eq!(tri.num_solid_triangles(), 1);
    assert!(tri.contains_triangle(v(1), v(2), v(3)));
    assert!(!tri.has_vertex(v(4)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn delete_point_refuses_boundary_vertices() {
    let mut tri = Triangulation::with_points(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0)]);
    tri.add_triangle(v(1), v(2), v(3), true);
    assert!(tri.delete_point(v(1)).is_err());
  }
}
