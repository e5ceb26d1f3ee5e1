/// A vertex key. Positive values index real points; `GHOST` is the single
/// virtual vertex shared by every unbounded face and `EMPTY` is the
/// absent-adjacency sentinel (also the reserved, unused point slot 0).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId(pub i32);

impl VertexId {
  pub const EMPTY: VertexId = VertexId(0);
  pub const GHOST: VertexId = VertexId(-1);

  pub fn is_ghost(self) -> bool {
    self == VertexId::GHOST
  }

  pub fn is_empty(self) -> bool {
    self == VertexId::EMPTY
  }

  /// A real point index (≥ 1).
  pub fn is_solid(self) -> bool {
    self.0 > 0
  }

  /// Index into the point store. Panics on the ghost vertex.
  pub fn usize(self) -> usize {
    debug_assert!(self.0 >= 0);
    self.0 as usize
  }
}

impl std::fmt::Debug for VertexId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_ghost() {
      f.write_str("ghost")
    } else if self.is_empty() {
      f.write_str("empty")
    } else {
      f.write_fmt(format_args!("v{}", self.0))
    }
  }
}

/// A directed edge: `(u, v)` and `(v, u)` are distinct keys.
pub type DirectedEdge = (VertexId, VertexId);

/// Undirected indexed edge, normalised on construction.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEdge {
  pub min: VertexId,
  pub max: VertexId,
}

impl IndexEdge {
  pub fn new(a: VertexId, b: VertexId) -> IndexEdge {
    IndexEdge {
      min: std::cmp::min(a, b),
      max: std::cmp::max(a, b),
    }
  }
}

impl std::fmt::Debug for IndexEdge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("IndexEdge")
      .field(&self.min)
      .field(&self.max)
      .finish()
  }
}

impl From<DirectedEdge> for IndexEdge {
  fn from((src, dst): DirectedEdge) -> IndexEdge {
    IndexEdge::new(src, dst)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sentinels_are_distinct() {
    assert_ne!(VertexId::EMPTY, VertexId::GHOST);
    assert!(!VertexId::EMPTY.is_solid());
    assert!(!VertexId::GHOST.is_solid());
    assert!(VertexId(1).is_solid());
  }

  #[test]
  fn index_edge_normalises() {
    let e = IndexEdge::new(VertexId(7), VertexId(3));
    assert_eq!(e, IndexEdge::new(VertexId(3), VertexId(7)));
    assert_eq!(e.min, VertexId(3));
    assert_eq!(e.max, VertexId(7));
  }
}
