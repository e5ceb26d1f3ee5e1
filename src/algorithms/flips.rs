//! Edge flipping and Lawson legalisation. Bowyer–Watson insertion does not
//! need these, but constrained-segment edits and vertex deletion do.

use crate::data::VertexId;
use crate::predicates::{edge_legality, EdgeLegality};
use crate::triangulation::Triangulation;
use crate::{Error, Result};

impl Triangulation {
  /// Legality of the interior edge `(i, j)`: illegal iff the vertex
  /// opposite it lies strictly inside the circumcircle of the triangle on
  /// the other side. Constrained edges and edges touching the ghost are
  /// legal by fiat.
  pub fn is_legal(&self, i: VertexId, j: VertexId) -> EdgeLegality {
    if self.is_constrained_edge(i, j) {
      return EdgeLegality::Legal;
    }
    let k = self.get_adjacent(i, j);
    let l = self.get_adjacent(j, i);
    if !i.is_solid() || !j.is_solid() || !k.is_solid() || !l.is_solid() {
      return EdgeLegality::Legal;
    }
    edge_legality(&self.point(i), &self.point(j), &self.point(k), &self.point(l))
  }

  /// Replaces the two triangles over `(i, j)` with the two over the other
  /// diagonal of their quadrilateral.
  pub fn flip_edge(&mut self, i: VertexId, j: VertexId) -> Result<()> {
    let p = self.get_adjacent(i, j);
    let q = self.get_adjacent(j, i);
    if !p.is_solid() || !q.is_solid() {
      return Err(Error::ConstraintViolation {
        edge: (i, j),
        reason: "edge is not an interior edge of two solid triangles",
      });
    }
    self.delete_triangle(i, j, p, true, false);
    self.delete_triangle(j, i, q, true, false);
    self.add_triangle(i, q, p, false);
    self.add_triangle(j, p, q, false);
    Ok(())
  }

  /// Restores the Delaunay property around the newly inserted vertex `r`
  /// by flipping illegal edges outward from `(i, j)`.
  pub fn legalise_edge(&mut self, i: VertexId, j: VertexId, r: VertexId) -> Result<()> {
    let mut stack = vec![(i, j)];
    while let Some((i, j)) = stack.pop() {
      if self.get_adjacent(i, j) != r {
        // The fan around r moved on; this edge is no longer opposite it.
        continue;
      }
      if self.is_legal(i, j) == EdgeLegality::Legal {
        continue;
      }
      let e = self.get_adjacent(j, i);
      self.flip_edge(i, j)?;
      stack.push((i, e));
      stack.push((e, j));
    }
    Ok(())
  }
}
