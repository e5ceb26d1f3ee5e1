//! The mutually-consistent topological maps every algorithm edits through.
//!
//! `(u, v, w)` is a triangle of the triangulation iff
//! `adjacent[(u, v)] = w`, `adjacent[(v, w)] = u` and `adjacent[(w, u)] = v`.
//! `adjacent2vertex` inverts that map for neighbour enumeration and `graph`
//! holds the undirected vertex adjacency. The three structures are only
//! ever edited together, one triangle at a time.

use std::collections::{HashMap, HashSet};

use crate::data::{DirectedEdge, IndexEdge, Tri, VertexId};

#[derive(Debug, Clone, Default)]
pub struct Topology {
  adjacent: HashMap<DirectedEdge, VertexId>,
  adjacent2vertex: HashMap<VertexId, HashSet<DirectedEdge>>,
  graph: HashMap<VertexId, HashSet<VertexId>>,
  triangles: HashSet<Tri>,
}

impl Topology {
  pub fn new() -> Topology {
    Topology::default()
  }

  /// The vertex opposite the directed edge `(u, v)`, or `VertexId::EMPTY`.
  pub fn get_adjacent(&self, u: VertexId, v: VertexId) -> VertexId {
    self
      .adjacent
      .get(&(u, v))
      .copied()
      .unwrap_or(VertexId::EMPTY)
  }

  pub fn contains_triangle(&self, t: Tri) -> bool {
    self.triangles.contains(&t)
  }

  pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
    self.adjacent.contains_key(&(u, v)) || self.adjacent.contains_key(&(v, u))
  }

  pub fn num_triangles(&self) -> usize {
    self.triangles.len()
  }

  pub fn num_directed_edges(&self) -> usize {
    self.adjacent.len()
  }

  pub fn triangles(&self) -> impl Iterator<Item = Tri> + '_ {
    self.triangles.iter().copied()
  }

  pub fn edges_opposite(&self, w: VertexId) -> impl Iterator<Item = DirectedEdge> + '_ {
    self
      .adjacent2vertex
      .get(&w)
      .into_iter()
      .flat_map(|set| set.iter().copied())
  }

  pub fn neighbours(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
    self
      .graph
      .get(&v)
      .into_iter()
      .flat_map(|set| set.iter().copied())
  }

  pub fn has_vertex(&self, v: VertexId) -> bool {
    self.graph.get(&v).map_or(false, |set| !set.is_empty())
  }

  pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
    self
      .graph
      .iter()
      .filter(|(_, set)| !set.is_empty())
      .map(|(&v, _)| v)
  }

  pub fn degree(&self, v: VertexId) -> usize {
    self.graph.get(&v).map_or(0, |set| set.len())
  }

  /// Registers `(u, v, w)`. Returns `false` (and changes nothing) if the
  /// triangle is already present.
  pub fn insert_triangle(&mut self, t: Tri) -> bool {
    if !self.triangles.insert(t) {
      return false;
    }
    for &(a, b) in t.edges().iter() {
      let w = t.opposite(a, b).unwrap();
      let prev = self.adjacent.insert((a, b), w);
      debug_assert!(prev.is_none(), "edge {:?} already occupied", (a, b));
      self.adjacent2vertex.entry(w).or_default().insert((a, b));
      self.graph.entry(a).or_default().insert(b);
      self.graph.entry(b).or_default().insert(a);
    }
    true
  }

  /// Unregisters `(u, v, w)`. Returns `false` (and changes nothing) if the
  /// triangle is not present.
  pub fn remove_triangle(&mut self, t: Tri) -> bool {
    if !self.triangles.remove(&t) {
      return false;
    }
    for &(a, b) in t.edges().iter() {
      let w = t.opposite(a, b).unwrap();
      self.adjacent.remove(&(a, b));
      if let Some(set) = self.adjacent2vertex.get_mut(&w) {
        set.remove(&(a, b));
      }
    }
    // A neighbour pair survives as long as any triangle still uses it.
    for &(a, b) in t.edges().iter() {
      if !self.contains_edge(a, b) {
        if let Some(set) = self.graph.get_mut(&a) {
          set.remove(&b);
        }
        if let Some(set) = self.graph.get_mut(&b) {
          set.remove(&a);
        }
      }
    }
    true
  }

  /// Drops map slots whose sets have emptied out.
  pub fn clear_empty_features(&mut self) {
    self.adjacent2vertex.retain(|_, set| !set.is_empty());
    self.graph.retain(|_, set| !set.is_empty());
  }
}

/// The two constrained-edge sets: what the user asked for, and that plus
/// the boundary promotions. Kept in sync on every edit.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
  user: HashSet<IndexEdge>,
  all: HashSet<IndexEdge>,
}

impl Constraints {
  pub fn contains(&self, e: IndexEdge) -> bool {
    self.all.contains(&e)
  }

  pub fn is_user(&self, e: IndexEdge) -> bool {
    self.user.contains(&e)
  }

  pub fn add_edge(&mut self, e: IndexEdge) {
    self.user.insert(e);
    self.all.insert(e);
  }

  pub fn delete_edge(&mut self, e: IndexEdge) {
    self.user.remove(&e);
    self.all.remove(&e);
  }

  pub fn promote_boundary(&mut self, e: IndexEdge) {
    self.all.insert(e);
  }

  pub fn demote_boundary(&mut self, e: IndexEdge) {
    if !self.user.contains(&e) {
      self.all.remove(&e);
    }
  }

  pub fn is_empty(&self) -> bool {
    self.all.is_empty()
  }

  pub fn user_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self.user.iter().copied()
  }

  pub fn all_edges(&self) -> impl Iterator<Item = IndexEdge> + '_ {
    self.all.iter().copied()
  }
}
