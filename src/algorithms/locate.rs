//! Point location by jump-and-march: sample a handful of vertices, start
//! at the nearest, then walk triangle to triangle towards the query.
//!
//! The walk crosses whichever edge has the query strictly on its far side.
//! A query collinear with a walk edge is resolved deterministically: its
//! position on that segment (`sameside` underneath) picks the side, and
//! the random source is consulted only for genuine two-exit ties. On
//! reaching the hull the walk hands over to an exterior walk along the
//! ghost fan, whose angular wedges are keyed on the representative point.

use log::trace;
use ordered_float::OrderedFloat;
use rand::Rng;

use crate::data::{Point, Tri, VertexId};
use crate::predicates::{orient, point_position_on_line_segment, SegmentPosition};
use crate::triangulation::Triangulation;
use crate::{Error, Result};

/// Default sample-size rule: ⌈∛n⌉ / 4-ish, kept small.
pub fn default_num_samples(n: usize) -> usize {
  (((n as f64).cbrt() / 4.0).ceil() as usize).max(1).min(32)
}

#[derive(Clone, Copy)]
pub struct LocateOptions<'a> {
  /// Extra seed candidates, tried alongside the random sample.
  pub try_points: &'a [VertexId],
  pub num_sample_rule: fn(usize) -> usize,
  /// Restart from a fresh sample when the walk runs into a missing
  /// adjacency (possible after recent constrained edits).
  pub check_existence: bool,
}

impl Default for LocateOptions<'static> {
  fn default() -> LocateOptions<'static> {
    LocateOptions {
      try_points: &[],
      num_sample_rule: default_num_samples,
      check_existence: true,
    }
  }
}

const RESTART_LIMIT: usize = 8;

/// Locates the triangle whose region contains `q`: a solid triangle for
/// interior queries, a ghost triangle when `q` lies outside the hull.
pub fn jump_and_march<R: Rng + ?Sized>(
  tri: &Triangulation,
  q: &Point,
  opts: &LocateOptions,
  rng: &mut R,
) -> Result<Tri> {
  let mut steps_taken = 0;
  for attempt in 0..RESTART_LIMIT {
    let k = match select_initial_point(tri, q, opts, rng) {
      Some(k) => k,
      None => break,
    };
    match march(tri, q, k, rng) {
      Ok(t) => {
        trace!("jump_and_march: located {:?} on attempt {}", t, attempt);
        return Ok(t);
      }
      Err(steps) => {
        steps_taken += steps;
        if !opts.check_existence {
          break;
        }
      }
    }
  }
  Err(Error::WalkFailure {
    steps: steps_taken,
    point: *q,
  })
}

/// Nearest of the caller's candidates plus a random sample of inserted
/// vertices, by squared distance to `q`.
pub fn select_initial_point<R: Rng + ?Sized>(
  tri: &Triangulation,
  q: &Point,
  opts: &LocateOptions,
  rng: &mut R,
) -> Option<VertexId> {
  let n = tri.num_points();
  if n == 0 {
    return None;
  }
  let m = (opts.num_sample_rule)(n);
  let mut best: Option<(OrderedFloat<f64>, VertexId)> = None;
  let mut consider = |v: VertexId, best: &mut Option<(OrderedFloat<f64>, VertexId)>| {
    if !v.is_solid() || !tri.has_vertex(v) {
      return;
    }
    let d = OrderedFloat(tri.point(v).squared_euclidean_distance(q));
    if best.map_or(true, |(bd, _)| d < bd) {
      *best = Some((d, v));
    }
  };
  for &v in opts.try_points {
    consider(v, &mut best);
  }
  let mut found = 0;
  for _ in 0..4 * m + 16 {
    if found == m {
      break;
    }
    let v = VertexId(rng.gen_range(1..=n as i32));
    if tri.has_vertex(v) {
      found += 1;
      consider(v, &mut best);
    }
  }
  if best.is_none() {
    // Tiny or sparse triangulations: fall back to a scan.
    for v in tri.solid_vertices().collect::<Vec<_>>() {
      consider(v, &mut best);
    }
  }
  best.map(|(_, v)| v)
}

// One walk from the seed vertex `k`. Err carries the number of steps spent
// before giving up (missing adjacency or budget exhausted).
fn march<R: Rng + ?Sized>(
  tri: &Triangulation,
  q: &Point,
  k: VertexId,
  rng: &mut R,
) -> std::result::Result<Tri, usize> {
  let pk = tri.point(k);
  if *q == pk {
    // The query coincides with the seed; any incident triangle holds it.
    let (u, v) = tri.edges_opposite(k).next().ok_or(0usize)?;
    return Ok(Tri::new(u, v, k));
  }

  // Initial direction: the incident triangle whose wedge at k contains q.
  let mut start = None;
  let mut hull_ghost = None;
  for (u, v) in tri.edges_opposite(k) {
    if u.is_ghost() || v.is_ghost() {
      hull_ghost = Some(Tri::new(u, v, k));
      continue;
    }
    let o_u = orient(&pk, &tri.point(u), q);
    let o_v = orient(&pk, &tri.point(v), q);
    if o_u >= 0 && o_v <= 0 {
      start = Some(Tri::new(u, v, k));
      break;
    }
  }
  let cur = match (start, hull_ghost) {
    (Some(t), _) => t,
    // k is on the hull and q lies in its exterior angle.
    (None, Some(g)) => return exterior_walk(tri, g, q).ok_or(1usize),
    (None, None) => return Err(0),
  };

  let budget = 4 * tri.num_triangles() + 64;
  let mut cur = cur;
  for step in 0..budget {
    if cur.is_ghost() {
      return exterior_walk(tri, cur, q).ok_or(step);
    }
    let [a, b, c] = cur.vertices();
    let points = [tri.point(a), tri.point(b), tri.point(c)];
    let edges = [(a, b), (b, c), (c, a)];
    let orients = [
      orient(&points[0], &points[1], q),
      orient(&points[1], &points[2], q),
      orient(&points[2], &points[0], q),
    ];

    // Collinear with a walk edge: the side is picked deterministically
    // from the position on that segment, never from the random source.
    let mut exit = None;
    for i in 0..3 {
      if orients[i] != 0 {
        continue;
      }
      match point_position_on_line_segment(&points[i], &points[(i + 1) % 3], q) {
        // Past the far endpoint: leave through the edge after this one.
        SegmentPosition::Right => {
          exit = Some(edges[(i + 1) % 3]);
          break;
        }
        // Before the near endpoint: leave through the edge before it.
        SegmentPosition::Left => {
          exit = Some(edges[(i + 2) % 3]);
          break;
        }
        // On the closed segment: q belongs to this triangle.
        _ => {}
      }
    }

    let (x, y) = if let Some(e) = exit {
      e
    } else {
      let mut exits = [(a, b); 2];
      let mut num_exits = 0;
      for i in 0..3 {
        if orients[i] < 0 {
          exits[num_exits.min(1)] = edges[i];
          num_exits += 1;
        }
      }
      match num_exits {
        0 => return Ok(cur),
        1 => exits[0],
        // A genuine two-sided tie: break it with the random source;
        // correctness does not depend on the choice.
        _ => exits[rng.gen_range(0..2)],
      }
    };
    let w = tri.get_adjacent(y, x);
    if w.is_empty() {
      return Err(step);
    }
    cur = Tri::new(y, x, w);
  }
  Err(budget)
}

// Rotates along the ghost fan until the angular wedge (seen from the
// representative point) containing `q` is found. `q` is strictly outside
// the hull here.
fn exterior_walk(tri: &Triangulation, ghost: Tri, q: &Point) -> Option<Tri> {
  let c = tri.representative_point()?;
  let [a, b, _g] = ghost.vertices();
  // Standard form (a, b, ghost) covers the boundary edge (b, a).
  let (mut u, mut v) = (b, a);
  let bound = tri.num_triangles() + 2;
  for _ in 0..bound {
    let o_u = orient(&c, &tri.point(u), q);
    let o_v = orient(&c, &tri.point(v), q);
    if o_u >= 0 && o_v < 0 {
      return Some(Tri::new(v, u, VertexId::GHOST));
    }
    if o_u < 0 {
      // Rotate clockwise to the previous boundary edge.
      let t = tri.get_adjacent(VertexId::GHOST, u);
      if !t.is_solid() {
        return None;
      }
      v = u;
      u = t;
    } else {
      // Rotate counter-clockwise.
      let x = tri.get_adjacent(v, VertexId::GHOST);
      if !x.is_solid() {
        return None;
      }
      u = v;
      v = x;
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::predicates::TrianglePosition;
  use rand::rngs::SmallRng;
  use rand::SeedableRng;

  fn pt(x: f64, y: f64) -> Point {
    Point::new([x, y])
  }

  fn v(i: i32) -> VertexId {
    VertexId(i)
  }

  fn square() -> Triangulation {
    let mut tri = Triangulation::with_points(vec![
      pt(0.0, 0.0),
      pt(1.0, 0.0),
      pt(1.0, 1.0),
      pt(0.0, 1.0),
    ]);
    tri.add_triangle(v(1), v(2), v(3), true);
    tri.add_triangle(v(1), v(3), v(4), true);
    tri.compute_representative_points();
    tri
  }

  #[test]
  fn locates_interior_points() {
    let tri = square();
    let mut rng = SmallRng::seed_from_u64(1);
    let opts = LocateOptions::default();

    let t = jump_and_march(&tri, &pt(0.9, 0.5), &opts, &mut rng).unwrap();
    assert_eq!(t, Tri::new(v(1), v(2), v(3)));
    let t = jump_and_march(&tri, &pt(0.1, 0.5), &opts, &mut rng).unwrap();
    assert_eq!(t, Tri::new(v(1), v(3), v(4)));
  }

  #[test]
  fn locates_points_on_edges() {
    let tri = square();
    let mut rng = SmallRng::seed_from_u64(2);
    let opts = LocateOptions::default();
    // On the shared diagonal: either incident triangle is acceptable.
    let t = jump_and_march(&tri, &pt(0.5, 0.5), &opts, &mut rng).unwrap();
    assert!(t == Tri::new(v(1), v(2), v(3)) || t == Tri::new(v(1), v(3), v(4)));
    assert_eq!(
      tri.position_relative_to_triangle(t, &pt(0.5, 0.5)),
      TrianglePosition::On
    );
  }

  #[test]
  fn exterior_queries_return_ghosts() {
    let tri = square();
    let mut rng = SmallRng::seed_from_u64(3);
    let opts = LocateOptions::default();

    let t = jump_and_march(&tri, &pt(0.5, -2.0), &opts, &mut rng).unwrap();
    assert_eq!(t, Tri::new(v(2), v(1), VertexId::GHOST));
    assert_eq!(
      tri.position_relative_to_triangle(t, &pt(0.5, -2.0)),
      TrianglePosition::Outside
    );

    let t = jump_and_march(&tri, &pt(3.0, 0.5), &opts, &mut rng).unwrap();
    assert_eq!(t, Tri::new(v(3), v(2), VertexId::GHOST));

    let t = jump_and_march(&tri, &pt(0.5, 3.0), &opts, &mut rng).unwrap();
    assert_eq!(t, Tri::new(v(4), v(3), VertexId::GHOST));
  }

  #[test]
  fn collinear_queries_walk_deterministically() {
    // (2, 2) extends the square's diagonal beyond vertex 3. The side of
    // the collinear walk edge comes from the segment position, not the
    // rng, so every seed lands in the same wedge.
    let tri = square();
    let seeds = [v(1)];
    let opts = LocateOptions {
      try_points: &seeds,
      ..LocateOptions::default()
    };
    for seed in 0..8 {
      let mut rng = SmallRng::seed_from_u64(seed);
      let t = jump_and_march(&tri, &pt(2.0, 2.0), &opts, &mut rng).unwrap();
      assert_eq!(t, Tri::new(v(4), v(3), VertexId::GHOST));
    }
  }

  #[test]
  fn sample_rule_shape() {
    assert_eq!(default_num_samples(0), 1);
    assert_eq!(default_num_samples(1), 1);
    assert!(default_num_samples(1_000_000) <= 32);
  }
}
