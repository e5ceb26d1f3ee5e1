use crate::data::{DirectedEdge, IndexEdge, Point, Tri, VertexId};
use crate::predicates::{
  point_position_relative_to_oriented_outer_halfplane, point_position_relative_to_triangle,
  triangle_orientation, HalfplanePosition, Orientation, TrianglePosition,
};
use crate::topology::{Constraints, Topology};
use crate::{Error, Result};

/// Running centroid of a region: a cheap interior seed for containment
/// tests, not a precise centroid.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepresentativeCoordinates {
  sum_x: f64,
  sum_y: f64,
  count: usize,
}

impl RepresentativeCoordinates {
  pub fn add_point(&mut self, p: &Point) {
    self.sum_x += p.x_coord();
    self.sum_y += p.y_coord();
    self.count += 1;
  }

  pub fn reset(&mut self) {
    *self = RepresentativeCoordinates::default();
  }

  pub fn point(&self) -> Option<Point> {
    if self.count == 0 {
      None
    } else {
      let n = self.count as f64;
      Some(Point::new([self.sum_x / n, self.sum_y / n]))
    }
  }
}

/// An incremental planar triangulation: point store, topological index,
/// constrained-edge sets, ghost bookkeeping.
///
/// Point slot 0 is a reserved sentinel; real points are indexed from 1.
#[derive(Debug, Clone)]
pub struct Triangulation {
  points: Vec<Point>,
  topology: Topology,
  constraints: Constraints,
  convex_hull: Vec<VertexId>,
  boundary_nodes: Vec<VertexId>,
  representative: Vec<RepresentativeCoordinates>,
}

impl Triangulation {
  pub fn with_points(points: Vec<Point>) -> Triangulation {
    let mut store = Vec::with_capacity(points.len() + 1);
    store.push(Point::default());
    store.extend(points);
    Triangulation {
      points: store,
      topology: Topology::new(),
      constraints: Constraints::default(),
      convex_hull: Vec::new(),
      boundary_nodes: Vec::new(),
      representative: vec![RepresentativeCoordinates::default()],
    }
  }

  //////////////////////////////////////////////////////////////////////////
  // Point store

  pub fn num_points(&self) -> usize {
    self.points.len() - 1
  }

  /// Coordinates of a solid vertex.
  pub fn point(&self, v: VertexId) -> Point {
    debug_assert!(v.is_solid());
    self.points[v.usize()]
  }

  /// Appends a point, returning its vertex key. Points are append-only
  /// during a build.
  pub fn push_point(&mut self, p: Point) -> VertexId {
    self.points.push(p);
    VertexId((self.points.len() - 1) as i32)
  }

  pub fn point_indices(&self) -> impl Iterator<Item = VertexId> {
    (1..self.points.len() as i32).map(VertexId)
  }

  //////////////////////////////////////////////////////////////////////////
  // Queries

  pub fn get_adjacent(&self, u: VertexId, v: VertexId) -> VertexId {
    self.topology.get_adjacent(u, v)
  }

  pub fn neighbours(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    self.topology.neighbours(v)
  }

  pub(crate) fn edges_opposite(&self, w: VertexId) -> impl Iterator<Item = DirectedEdge> + '_ {
    self.topology.edges_opposite(w)
  }

  pub fn contains_triangle(&self, u: VertexId, v: VertexId, w: VertexId) -> bool {
    self.topology.contains_triangle(Tri::new(u, v, w))
  }

  pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
    self.topology.contains_edge(u, v)
  }

  pub fn triangles(&self) -> impl Iterator<Item = Tri> + '_ {
    self.topology.triangles()
  }

  pub fn solid_triangles(&self) -> impl Iterator<Item = Tri> + '_ {
    self.topology.triangles().filter(|t| t.is_solid())
  }

  pub fn ghost_triangles(&self) -> impl Iterator<Item = Tri> + '_ {
    self.topology.triangles().filter(|t| t.is_ghost())
  }

  pub fn num_triangles(&self) -> usize {
    self.topology.num_triangles()
  }

  pub fn num_solid_triangles(&self) -> usize {
    self.solid_triangles().count()
  }

  pub fn has_ghost_triangles(&self) -> bool {
    self.ghost_triangles().next().is_some()
  }

  pub fn solid_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
    self.topology.vertices().filter(|v| v.is_solid())
  }

  pub fn num_solid_vertices(&self) -> usize {
    self.solid_vertices().count()
  }

  pub fn has_vertex(&self, v: VertexId) -> bool {
    self.topology.has_vertex(v)
  }

  /// Undirected edges between solid vertices, each reported once.
  pub fn solid_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self.solid_vertices().flat_map(move |u| {
      self
        .neighbours(u)
        .filter(move |&v| v.is_solid() && u < v)
        .map(move |v| IndexEdge::new(u, v))
    })
  }

  pub fn num_solid_edges(&self) -> usize {
    self.solid_edges().count()
  }

  /// Edges joining a solid vertex to the ghost, each reported once.
  pub fn ghost_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self
      .neighbours(VertexId::GHOST)
      .map(|v| IndexEdge::new(v, VertexId::GHOST))
  }

  /// Every vertex with at least one incident edge, the ghost included
  /// while the ghost envelope is present.
  pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
    self.topology.vertices()
  }

  /// A boundary edge `(u, v)` is one backed by the ghost triangle
  /// `(v, u, ghost)`.
  pub fn is_boundary_edge(&self, u: VertexId, v: VertexId) -> bool {
    self.get_adjacent(v, u).is_ghost()
  }

  pub fn is_constrained(&self) -> bool {
    !self.constraints.is_empty()
  }

  pub fn is_constrained_edge(&self, u: VertexId, v: VertexId) -> bool {
    self.constraints.contains(IndexEdge::new(u, v))
  }

  pub fn constrained_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self.constraints.user_edges()
  }

  pub fn all_constrained_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self.constraints.all_edges()
  }

  pub fn convex_hull(&self) -> &[VertexId] {
    &self.convex_hull
  }

  pub fn boundary_nodes(&self) -> &[VertexId] {
    &self.boundary_nodes
  }

  //////////////////////////////////////////////////////////////////////////
  // Atomic topology edits

  /// Registers the positively-oriented triangle `(u, v, w)`. With
  /// `update_ghost_edges`, the ghost envelope is refreshed around it: a
  /// ghost sitting where the new triangle lands is evicted, and any solid
  /// edge left with no triangle on its far side gets its ghost added.
  pub fn add_triangle(&mut self, u: VertexId, v: VertexId, w: VertexId, update_ghost_edges: bool) {
    let t = Tri::new(u, v, w);
    if self.topology.contains_triangle(t) {
      return;
    }
    if update_ghost_edges && t.is_solid() {
      for &(a, b) in t.edges().iter() {
        if self.get_adjacent(a, b).is_ghost() {
          self.topology.remove_triangle(Tri::new(a, b, VertexId::GHOST));
        }
      }
    }
    if !self.topology.insert_triangle(t) {
      return;
    }
    if update_ghost_edges {
      for &(a, b) in t.edges().iter() {
        if a.is_solid() && b.is_solid() && self.get_adjacent(b, a).is_empty() {
          self.topology.insert_triangle(Tri::new(b, a, VertexId::GHOST));
        }
      }
    }
  }

  /// Removes `(u, v, w)` if present. With `update_ghost_edges` (and
  /// without `protect_boundary`), ghost triangles over its boundary edges
  /// are removed too.
  pub fn delete_triangle(
    &mut self,
    u: VertexId,
    v: VertexId,
    w: VertexId,
    protect_boundary: bool,
    update_ghost_edges: bool,
  ) {
    let t = Tri::new(u, v, w);
    if !self.topology.remove_triangle(t) {
      return;
    }
    if update_ghost_edges && !protect_boundary {
      for &(a, b) in t.edges().iter() {
        if a.is_solid() && b.is_solid() && self.get_adjacent(b, a).is_ghost() {
          self
            .topology
            .remove_triangle(Tri::new(b, a, VertexId::GHOST));
        }
      }
    }
  }

  /// Records `(u, v)` as a user constraint. The raw set edit; the
  /// triangulation itself is not modified.
  pub fn add_edge(&mut self, u: VertexId, v: VertexId) {
    self.constraints.add_edge(IndexEdge::new(u, v));
  }

  pub fn delete_edge(&mut self, u: VertexId, v: VertexId) {
    self.constraints.delete_edge(IndexEdge::new(u, v));
  }

  pub(crate) fn constraints_mut(&mut self) -> &mut Constraints {
    &mut self.constraints
  }

  pub(crate) fn constraints(&self) -> &Constraints {
    &self.constraints
  }

  //////////////////////////////////////////////////////////////////////////
  // Ghost maintenance

  /// Rebuilds the ghost envelope from the solid boundary.
  pub fn add_ghost_triangles(&mut self) {
    let missing: Vec<DirectedEdge> = self
      .solid_triangles()
      .flat_map(|t| {
        let edges = t.edges();
        edges.to_vec()
      })
      .filter(|&(a, b)| self.get_adjacent(b, a).is_empty())
      .collect();
    for (a, b) in missing {
      // Solid on the left of (a, b), nothing on the right: boundary edge.
      self.topology.insert_triangle(Tri::new(b, a, VertexId::GHOST));
    }
  }

  pub fn delete_ghost_triangles(&mut self) {
    let ghosts: Vec<Tri> = self.ghost_triangles().collect();
    for t in ghosts {
      self.topology.remove_triangle(t);
    }
  }

  /// Reads the convex hull off the ghost fan. Leaves the stored hull
  /// untouched when no ghosts exist (after `delete_ghost_triangles`).
  pub fn reconstruct_convex_hull(&mut self) {
    let start = match self.ghost_triangles().next() {
      Some(t) => t,
      None => return,
    };
    let [a, b, _g] = start.vertices();
    // Standard form (a, b, ghost) covers the boundary edge (b, a).
    let mut hull = vec![b, a];
    let bound = self.num_triangles() + 1;
    for _ in 0..bound {
      let last = *hull.last().unwrap();
      let next = self.get_adjacent(last, VertexId::GHOST);
      debug_assert!(next.is_solid());
      if next == hull[0] || !next.is_solid() {
        break;
      }
      hull.push(next);
    }
    self.convex_hull = hull;
  }

  /// Promotes every convex-hull edge to a constrained (boundary) edge.
  pub fn lock_convex_hull(&mut self) {
    self.reconstruct_convex_hull();
    let hull = self.convex_hull.clone();
    for i in 0..hull.len() {
      let u = hull[i];
      let v = hull[(i + 1) % hull.len()];
      self.constraints.promote_boundary(IndexEdge::new(u, v));
    }
    self.boundary_nodes = hull;
  }

  /// Reverts `lock_convex_hull`, keeping user constraints.
  pub fn unlock_convex_hull(&mut self) {
    let nodes = std::mem::take(&mut self.boundary_nodes);
    for i in 0..nodes.len() {
      let u = nodes[i];
      let v = nodes[(i + 1) % nodes.len()];
      self.constraints.demote_boundary(IndexEdge::new(u, v));
    }
  }

  pub(crate) fn set_boundary_nodes(&mut self, nodes: Vec<VertexId>) {
    self.boundary_nodes = nodes;
  }

  /// Splices `r` between the boundary nodes `u` and `v` if they are
  /// cyclically adjacent in the record.
  pub(crate) fn split_boundary_node(&mut self, u: VertexId, v: VertexId, r: VertexId) {
    let n = self.boundary_nodes.len();
    for i in 0..n {
      let a = self.boundary_nodes[i];
      let b = self.boundary_nodes[(i + 1) % n];
      if (a, b) == (u, v) || (a, b) == (v, u) {
        self.boundary_nodes.insert(i + 1, r);
        return;
      }
    }
  }

  pub fn clear_empty_features(&mut self) {
    self.topology.clear_empty_features();
  }

  //////////////////////////////////////////////////////////////////////////
  // Representative points

  pub fn representative_point(&self) -> Option<Point> {
    self.representative[0].point()
  }

  pub(crate) fn update_representative_point(&mut self, p: &Point) {
    self.representative[0].add_point(p);
  }

  /// Recomputes the running centroids from the solid vertex set.
  pub fn compute_representative_points(&mut self) {
    let mut acc = RepresentativeCoordinates::default();
    let verts: Vec<VertexId> = self.solid_vertices().collect();
    for v in verts {
      acc.add_point(&self.point(v));
    }
    self.representative[0] = acc;
  }

  //////////////////////////////////////////////////////////////////////////
  // Positions against stored triangles

  /// The location flag of `p` against triangle `t`. For a ghost triangle
  /// the answer is `Outside` for points beyond its boundary edge and `On`
  /// for points on that edge (vertices included).
  pub fn position_relative_to_triangle(&self, t: Tri, p: &Point) -> TrianglePosition {
    let [a, b, c] = t.vertices();
    if t.is_solid() {
      point_position_relative_to_triangle(&self.point(a), &self.point(b), &self.point(c), p)
    } else {
      let pa = self.point(a);
      let pb = self.point(b);
      if *p == pa || *p == pb {
        return TrianglePosition::On;
      }
      match point_position_relative_to_oriented_outer_halfplane(&pa, &pb, p) {
        HalfplanePosition::On => TrianglePosition::On,
        _ => TrianglePosition::Outside,
      }
    }
  }

  //////////////////////////////////////////////////////////////////////////
  // Invariant validation

  /// Checks every structural and geometric invariant. Expensive; run in
  /// tests and behind debug assertions.
  pub fn validate(&self) -> Result<()> {
    self.validate_adjacency()?;
    self.validate_orientation()?;
    self.validate_delaunay()?;
    self.validate_ghost_envelope()?;
    self.validate_constraints()?;
    Ok(())
  }

  fn invariant(&self, ok: bool, reason: &'static str) -> Result<()> {
    if ok {
      Ok(())
    } else {
      Err(Error::InternalInvariantViolation { reason })
    }
  }

  // Triangle set, adjacent map, adjacent2vertex and graph all agree.
  fn validate_adjacency(&self) -> Result<()> {
    // Exactly three directed edges per triangle, and no stray entries.
    self.invariant(
      self.topology.num_directed_edges() == 3 * self.num_triangles(),
      "adjacent map size disagrees with the triangle set",
    )?;
    // Two triangles sharing a directed edge cannot both agree with the
    // single adjacent entry, so this also rules out duplicates.
    for t in self.triangles() {
      for &(a, b) in t.edges().iter() {
        let w = t.opposite(a, b).unwrap();
        self.invariant(
          self.get_adjacent(a, b) == w,
          "adjacent map disagrees with triangle set",
        )?;
        self.invariant(
          self.topology.edges_opposite(w).any(|e| e == (a, b)),
          "adjacent2vertex missing a triangle edge",
        )?;
        self.invariant(
          self.topology.neighbours(a).any(|n| n == b),
          "graph missing a triangle edge",
        )?;
      }
    }
    for v in self.topology.vertices() {
      for u in self.topology.neighbours(v) {
        self.invariant(
          self.contains_edge(u, v),
          "graph neighbour without a backing triangle",
        )?;
      }
    }
    for w in self.topology.vertices() {
      for (a, b) in self.topology.edges_opposite(w) {
        self.invariant(
          self.get_adjacent(a, b) == w,
          "adjacent2vertex disagrees with adjacent",
        )?;
      }
    }
    Ok(())
  }

  fn validate_orientation(&self) -> Result<()> {
    for t in self.solid_triangles() {
      let [a, b, c] = t.vertices();
      self.invariant(
        triangle_orientation(&self.point(a), &self.point(b), &self.point(c))
          == Orientation::PositivelyOriented,
        "solid triangle not positively oriented",
      )?;
    }
    Ok(())
  }

  // Every unconstrained interior edge is locally Delaunay.
  fn validate_delaunay(&self) -> Result<()> {
    use crate::predicates::incircle;
    for t in self.solid_triangles() {
      for &(u, v) in t.edges().iter() {
        if self.is_constrained_edge(u, v) {
          continue;
        }
        let w = self.get_adjacent(u, v);
        let x = self.get_adjacent(v, u);
        if !w.is_solid() || !x.is_solid() {
          continue;
        }
        self.invariant(
          incircle(
            &self.point(u),
            &self.point(v),
            &self.point(w),
            &self.point(x),
          ) != 1,
          "interior edge is not locally Delaunay",
        )?;
      }
    }
    Ok(())
  }

  // Each boundary edge carries exactly one ghost triangle.
  fn validate_ghost_envelope(&self) -> Result<()> {
    if !self.has_ghost_triangles() {
      return Ok(());
    }
    for t in self.ghost_triangles() {
      let [a, b, _g] = t.vertices();
      self.invariant(
        self.get_adjacent(b, a).is_solid(),
        "ghost triangle without a solid triangle behind its boundary edge",
      )?;
    }
    for t in self.solid_triangles() {
      for &(a, b) in t.edges().iter() {
        self.invariant(
          !self.get_adjacent(b, a).is_empty(),
          "solid boundary edge without its ghost triangle",
        )?;
      }
    }
    Ok(())
  }

  // Every constrained edge is an edge of some triangle.
  fn validate_constraints(&self) -> Result<()> {
    for e in self.constraints.all_edges() {
      self.invariant(
        self.contains_edge(e.min, e.max),
        "constrained edge missing from the triangulation",
      )?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pt(x: f64, y: f64) -> Point {
    Point::new([x, y])
  }

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  fn one_triangle() -> Triangulation {
    let mut tri = Triangulation::with_points(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0)]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri
  }

  #[test]
  fn ghost_edges_added_alongside() {
    let tri = one_triangle();
    assert_eq!(tri.num_solid_triangles(), 1);
    assert_eq!(tri.ghost_triangles().count(), 3);
    assert!(tri.contains_triangle(v(2), v(1), VertexId::GHOST));
    assert!(tri.contains_triangle(v(3), v(2), VertexId::GHOST));
    assert!(tri.contains_triangle(v(1), v(3), VertexId::GHOST));
    assert!(tri.is_boundary_edge(v(1), v(2)));
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn hull_reconstruction() {
    let mut tri = one_triangle();
    tri.reconstruct_convex_hull();
    let hull = tri.convex_hull().to_vec();
    assert_eq!(hull.len(), 3);
    // Cyclic order 1, 2, 3 starting anywhere.
    let start = hull.iter().position(|&x| x == v(1)).unwrap();
    let rotated: Vec<VertexId> = (0..3).map(|i| hull[(start + i) % 3]).collect();
    assert_eq!(rotated, vec![v(1), v(2), v(3)]);
  }

  #[test]
  fn ghost_deletion_and_restoration() {
    let mut tri = one_triangle();
    tri.delete_ghost_triangles();
    assert!(!tri.has_ghost_triangles());
    assert!(tri.validate().is_ok());
    tri.add_ghost_triangles();
    assert_eq!(tri.ghost_triangles().count(), 3);
    assert!(tri.validate().is_ok());
  }

  #[test]
  fn lock_and_unlock_hull() {
    let mut tri = one_triangle();
    tri.lock_convex_hull();
    assert!(tri.is_constrained_edge(v(1), v(2)));
    assert!(!tri.constraints().is_user(IndexEdge::new(v(1), v(2))));
    tri.unlock_convex_hull();
    assert!(!tri.is_constrained_edge(v(1), v(2)));
  }

  #[test]
  fn ghost_region_positions() {
    let tri = one_triangle();
    let ghost = Tri::new(v(2), v(1), VertexId::GHOST);
    assert_eq!(
      tri.position_relative_to_triangle(ghost, &pt(0.5, -1.0)),
      TrianglePosition::Outside
    );
    assert_eq!(
      tri.position_relative_to_triangle(ghost, &pt(0.5, 0.0)),
      TrianglePosition::On
    );
    let solid = Tri::new(v(1), v(2), v(3));
    assert_eq!(
      tri.position_relative_to_triangle(solid, &pt(0.25, 0.25)),
      TrianglePosition::Inside
    );
  }

  #[test]
  fn representative_runs_a_mean() {
    let mut tri = one_triangle();
    tri.compute_representative_points();
    let c = tri.representative_point().unwrap();
    assert!((c.x_coord() - 1.0 / 3.0).abs() < 1e-12);
    assert!((c.y_coord() - 1.0 / 3.0).abs() < 1e-12);
  }
}
