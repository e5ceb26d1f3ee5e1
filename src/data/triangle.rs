use super::edge::{DirectedEdge, VertexId};

/// A positively-oriented triangle of vertex keys. Equal under cyclic shift;
/// the reverse orientation is a different triangle.
///
/// Stored in a canonical rotation so that cyclic shifts hash identically:
/// ghost triangles keep the ghost vertex last (their standard form), solid
/// triangles lead with their smallest vertex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tri([VertexId; 3]);

impl Tri {
  pub fn new(u: VertexId, v: VertexId, w: VertexId) -> Tri {
    Tri(rotate_to_standard_form([u, v, w]))
  }

  pub fn vertices(self) -> [VertexId; 3] {
    self.0
  }

  /// Exactly one vertex is the ghost.
  pub fn is_ghost(self) -> bool {
    let [u, v, w] = self.0;
    u.is_ghost() || v.is_ghost() || w.is_ghost()
  }

  pub fn is_solid(self) -> bool {
    !self.is_ghost()
  }

  pub fn contains(self, v: VertexId) -> bool {
    self.0.contains(&v)
  }

  /// The three directed edges, in rotation order.
  pub fn edges(self) -> [DirectedEdge; 3] {
    let [u, v, w] = self.0;
    [(u, v), (v, w), (w, u)]
  }

  /// The vertex opposite the directed edge `(u, v)`, if `(u, v)` is an
  /// edge of this triangle.
  pub fn opposite(self, u: VertexId, v: VertexId) -> Option<VertexId> {
    let [a, b, c] = self.0;
    if (a, b) == (u, v) {
      Some(c)
    } else if (b, c) == (u, v) {
      Some(a)
    } else if (c, a) == (u, v) {
      Some(b)
    } else {
      None
    }
  }
}

/// Canonical rotation: ghost last for ghost triangles, minimum first for
/// solid triangles.
fn rotate_to_standard_form(vs: [VertexId; 3]) -> [VertexId; 3] {
  let [u, v, w] = vs;
  if u.is_ghost() {
    [v, w, u]
  } else if v.is_ghost() {
    [w, u, v]
  } else if w.is_ghost() {
    [u, v, w]
  } else if u <= v && u <= w {
    [u, v, w]
  } else if v <= w {
    [v, w, u]
  } else {
    [w, u, v]
  }
}

impl std::fmt::Debug for Tri {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let [u, v, w] = self.0;
    f.write_fmt(format_args!("({:?},{:?},{:?})", u, v, w))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  #[test]
  fn cyclic_shifts_are_equal() {
    assert_eq!(Tri::new(v(1), v(2), v(3)), Tri::new(v(2), v(3), v(1)));
    assert_eq!(Tri::new(v(1), v(2), v(3)), Tri::new(v(3), v(1), v(2)));
    assert_ne!(Tri::new(v(1), v(2), v(3)), Tri::new(v(3), v(2), v(1)));
  }

  #[test]
  fn ghost_rotates_last() {
    let t = Tri::new(VertexId::GHOST, v(4), v(9));
    assert_eq!(t.vertices(), [v(4), v(9), VertexId::GHOST]);
    assert!(t.is_ghost());
    assert_eq!(t, Tri::new(v(9), VertexId::GHOST, v(4)));
  }

  #[test]
  fn opposite_vertex() {
    let t = Tri::new(v(2), v(5), v(7));
    assert_eq!(t.opposite(v(2), v(5)), Some(v(7)));
    assert_eq!(t.opposite(v(5), v(7)), Some(v(2)));
    assert_eq!(t.opposite(v(5), v(2)), None);
  }
}
