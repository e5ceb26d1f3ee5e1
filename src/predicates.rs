//! Sign-exact geometric predicates and the certificates built on them.
//!
//! `orient` and `incircle` defer to the adaptive-precision kernels in
//! `geometry_predicates`; everything else is decided with exact `f64`
//! comparisons and orientation signs, so no predicate in this module can
//! report the wrong sign. Results depend only on the inputs; the sole
//! side effect is a debug-build invocation counter on `sameside`, there
//! so tests can observe that collinear tie-breaks take the exact path.

use geometry_predicates::{incircle as incircle_adapt, orient2d};

use crate::data::Point;

#[cfg(debug_assertions)]
static SAMESIDE_CALLS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Running count of `sameside` evaluations. Maintained in debug builds
/// only; returns 0 in release.
pub fn sameside_invocations() -> usize {
  #[cfg(debug_assertions)]
  {
    SAMESIDE_CALLS.load(std::sync::atomic::Ordering::Relaxed)
  }
  #[cfg(not(debug_assertions))]
  {
    0
  }
}

/// `+1` if `r` is left of the directed line `p→q`, `0` if collinear, `-1`
/// if right.
pub fn orient(p: &Point, q: &Point, r: &Point) -> i8 {
  sign(orient2d(p.array, q.array, r.array))
}

/// `+1` if `p` is strictly inside the circumcircle of the
/// positively-oriented triangle `(a, b, c)`, `0` if cocircular, `-1` if
/// strictly outside.
pub fn incircle(a: &Point, b: &Point, c: &Point, p: &Point) -> i8 {
  sign(incircle_adapt(a.array, b.array, c.array, p.array))
}

/// For `a`, `b` collinear with `p`: `+1` if `a` and `b` lie on the same
/// side of `p`, `0` if either equals `p`, `-1` if they straddle it.
pub fn sameside(a: &Point, b: &Point, p: &Point) -> i8 {
  #[cfg(debug_assertions)]
  SAMESIDE_CALLS.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
  let da = (sign(a[0] - p[0]), sign(a[1] - p[1]));
  let db = (sign(b[0] - p[0]), sign(b[1] - p[1]));
  if da == (0, 0) || db == (0, 0) {
    0
  } else if da == db {
    1
  } else {
    -1
  }
}

/// `+1` if the open segments `(p,q)` and `(a,b)` strictly cross, `-1` if
/// the closed segments overlap along a positive length, `0` otherwise
/// (disjoint, or sharing a single endpoint).
pub fn meet(p: &Point, q: &Point, a: &Point, b: &Point) -> i8 {
  match segment_intersection(p, q, a, b) {
    SegmentIntersection::Single => 1,
    SegmentIntersection::Multiple => -1,
    SegmentIntersection::Touching | SegmentIntersection::None => 0,
  }
}

fn sign(x: f64) -> i8 {
  if x > 0.0 {
    1
  } else if x < 0.0 {
    -1
  } else {
    0
  }
}

///////////////////////////////////////////////////////////////////////////////
// Certificates

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
  PositivelyOriented,
  Degenerate,
  NegativelyOriented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CirclePosition {
  Inside,
  On,
  Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePosition {
  Left,
  Collinear,
  Right,
}

/// Position of a point on the supporting line of a segment `a→b`; only
/// meaningful when the point is collinear with the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentPosition {
  /// Before `a`.
  Left,
  /// Strictly between `a` and `b`.
  On,
  /// After `b`.
  Right,
  /// Coincides with an endpoint.
  Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentIntersection {
  None,
  /// The open segments cross in a single interior point.
  Single,
  /// The closed segments overlap along a positive length.
  Multiple,
  /// The closed segments share exactly one point, an endpoint of at least
  /// one of them.
  Touching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrianglePosition {
  Inside,
  On,
  Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfplanePosition {
  Inside,
  On,
  Outside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLegality {
  Legal,
  Illegal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriangleSegmentIntersection {
  /// The closed segment lies in the closed triangle.
  Inside,
  /// The segment crosses the boundary exactly once.
  Single,
  /// The segment meets the boundary in more than one point: it passes
  /// through, or runs along an edge.
  Multiple,
  /// No common point.
  Outside,
  /// The segment grazes the boundary in a single point without entering
  /// the interior.
  Touching,
}

///////////////////////////////////////////////////////////////////////////////
// Position functions

pub fn triangle_orientation(p: &Point, q: &Point, r: &Point) -> Orientation {
  match orient(p, q, r) {
    1 => Orientation::PositivelyOriented,
    0 => Orientation::Degenerate,
    _ => Orientation::NegativelyOriented,
  }
}

pub fn point_position_relative_to_line(a: &Point, b: &Point, p: &Point) -> LinePosition {
  match orient(a, b, p) {
    1 => LinePosition::Left,
    0 => LinePosition::Collinear,
    _ => LinePosition::Right,
  }
}

/// `(a, b, c)` must be positively oriented.
pub fn point_position_relative_to_circle(
  a: &Point,
  b: &Point,
  c: &Point,
  p: &Point,
) -> CirclePosition {
  match incircle(a, b, c, p) {
    1 => CirclePosition::Inside,
    0 => CirclePosition::On,
    _ => CirclePosition::Outside,
  }
}

/// Where `p` sits on the segment `a→b`, given that `p` is collinear with
/// it. Decided entirely through `sameside`, which is exact.
pub fn point_position_on_line_segment(a: &Point, b: &Point, p: &Point) -> SegmentPosition {
  if p == a || p == b || a == b {
    return SegmentPosition::Degenerate;
  }
  if sameside(a, b, p) < 0 {
    // a and b straddle p.
    SegmentPosition::On
  } else if sameside(p, b, a) < 0 {
    // a sits between p and b.
    SegmentPosition::Left
  } else {
    SegmentPosition::Right
  }
}

pub fn segment_intersection(
  p: &Point,
  q: &Point,
  a: &Point,
  b: &Point,
) -> SegmentIntersection {
  let o1 = orient(p, q, a);
  let o2 = orient(p, q, b);
  if o1 == 0 && o2 == 0 {
    return collinear_segment_overlap(p, q, a, b);
  }
  let o3 = orient(a, b, p);
  let o4 = orient(a, b, q);
  if o1 * o2 < 0 && o3 * o4 < 0 {
    return SegmentIntersection::Single;
  }
  let touches = (o1 == 0 && on_closed_segment(p, q, a))
    || (o2 == 0 && on_closed_segment(p, q, b))
    || (o3 == 0 && on_closed_segment(a, b, p))
    || (o4 == 0 && on_closed_segment(a, b, q));
  if touches {
    SegmentIntersection::Touching
  } else {
    SegmentIntersection::None
  }
}

fn on_closed_segment(a: &Point, b: &Point, p: &Point) -> bool {
  matches!(
    point_position_on_line_segment(a, b, p),
    SegmentPosition::On | SegmentPosition::Degenerate
  )
}

// All four points collinear; compare 1D intervals on the dominant axis.
fn collinear_segment_overlap(
  p: &Point,
  q: &Point,
  a: &Point,
  b: &Point,
) -> SegmentIntersection {
  let dx = q[0] - p[0];
  let dy = q[1] - p[1];
  let axis = if dx.abs() >= dy.abs() { 0 } else { 1 };
  let (lo1, hi1) = minmax(p[axis], q[axis]);
  let (lo2, hi2) = minmax(a[axis], b[axis]);
  let lo = lo1.max(lo2);
  let hi = hi1.min(hi2);
  if lo > hi {
    SegmentIntersection::None
  } else if lo == hi {
    SegmentIntersection::Touching
  } else {
    SegmentIntersection::Multiple
  }
}

fn minmax(a: f64, b: f64) -> (f64, f64) {
  if a <= b {
    (a, b)
  } else {
    (b, a)
  }
}

/// `(a, b, c)` must be positively oriented.
pub fn point_position_relative_to_triangle(
  a: &Point,
  b: &Point,
  c: &Point,
  p: &Point,
) -> TrianglePosition {
  use LinePosition::*;
  let ab = point_position_relative_to_line(a, b, p);
  let bc = point_position_relative_to_line(b, c, p);
  let ca = point_position_relative_to_line(c, a, p);
  if ab == Right || bc == Right || ca == Right {
    TrianglePosition::Outside
  } else if ab == Collinear || bc == Collinear || ca == Collinear {
    TrianglePosition::On
  } else {
    TrianglePosition::Inside
  }
}

/// The oriented outer halfplane of `a→b`: the open halfplane to its left
/// together with the open segment `(a, b)`. This is the "circumcircle" of
/// a ghost triangle whose boundary edge, walked from the outside, is
/// `a→b`.
pub fn point_position_relative_to_oriented_outer_halfplane(
  a: &Point,
  b: &Point,
  p: &Point,
) -> HalfplanePosition {
  match point_position_relative_to_line(a, b, p) {
    LinePosition::Left => HalfplanePosition::Inside,
    LinePosition::Right => HalfplanePosition::Outside,
    LinePosition::Collinear => match point_position_on_line_segment(a, b, p) {
      SegmentPosition::On => HalfplanePosition::On,
      // Endpoints and points beyond them belong to the neighbouring faces.
      _ => HalfplanePosition::Outside,
    },
  }
}

/// Legality of the edge `(a, b)` shared by the positively-oriented
/// triangle `(a, b, c)` and the opposite vertex `p` across it.
pub fn edge_legality(a: &Point, b: &Point, c: &Point, p: &Point) -> EdgeLegality {
  if incircle(a, b, c, p) == 1 {
    EdgeLegality::Illegal
  } else {
    EdgeLegality::Legal
  }
}

/// Classifies the closed segment `[a, b]` against the positively-oriented
/// triangle `(p, q, r)`, covering every degenerate configuration: an
/// endpoint at a vertex, an endpoint on an edge, collinearity with an
/// edge, and grazing a vertex.
pub fn triangle_line_segment_intersection(
  p: &Point,
  q: &Point,
  r: &Point,
  a: &Point,
  b: &Point,
) -> TriangleSegmentIntersection {
  use TrianglePosition::*;
  let edges = [(p, q), (q, r), (r, p)];
  let mut singles = 0;
  let mut touches = 0;
  for &(u, v) in edges.iter() {
    match segment_intersection(u, v, a, b) {
      SegmentIntersection::Multiple => return TriangleSegmentIntersection::Multiple,
      SegmentIntersection::Single => singles += 1,
      SegmentIntersection::Touching => touches += 1,
      SegmentIntersection::None => {}
    }
  }
  let pos_a = point_position_relative_to_triangle(p, q, r, a);
  let pos_b = point_position_relative_to_triangle(p, q, r, b);
  match (pos_a, pos_b) {
    // The triangle is convex, so the segment cannot leave it.
    (Inside, Inside) | (Inside, On) | (On, Inside) | (On, On) => {
      TriangleSegmentIntersection::Inside
    }
    (Outside, Outside) => {
      if singles > 0 {
        TriangleSegmentIntersection::Multiple
      } else if touches > 0 {
        TriangleSegmentIntersection::Touching
      } else {
        TriangleSegmentIntersection::Outside
      }
    }
    (Inside, Outside) | (Outside, Inside) => TriangleSegmentIntersection::Single,
    (On, Outside) => classify_boundary_to_outside(p, q, r, a, b, singles),
    (Outside, On) => classify_boundary_to_outside(p, q, r, b, a, singles),
  }
}

// One endpoint (`on_pt`) sits on the boundary, the other (`out_pt`) lies
// outside. The result is Single exactly when the segment passes through
// the interior on its way out.
fn classify_boundary_to_outside(
  p: &Point,
  q: &Point,
  r: &Point,
  on_pt: &Point,
  out_pt: &Point,
  singles: usize,
) -> TriangleSegmentIntersection {
  if singles > 0 || enters_interior(p, q, r, on_pt, out_pt) {
    TriangleSegmentIntersection::Single
  } else {
    TriangleSegmentIntersection::Touching
  }
}

// Does the open segment from a boundary point `s` towards `t` immediately
// enter the triangle's interior?
fn enters_interior(p: &Point, q: &Point, r: &Point, s: &Point, t: &Point) -> bool {
  use LinePosition::*;
  // At a vertex, the segment must head into the angular wedge.
  for &(v, next, prev) in [(p, q, r), (q, r, p), (r, p, q)].iter() {
    if s == v {
      return point_position_relative_to_line(v, next, t) == Left
        && point_position_relative_to_line(prev, v, t) == Left;
    }
  }
  // On the open part of an edge, the interior is strictly to its left.
  for &(u, v) in [(p, q), (q, r), (r, p)].iter() {
    if point_position_relative_to_line(u, v, s) == Collinear {
      return point_position_relative_to_line(u, v, t) == Left;
    }
  }
  false
}
