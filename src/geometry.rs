//! Shared geometric vocabulary: points, axis-aligned rectangles, polygons
//! and the predicates the placement and corridor stages are built on.
//!
//! Everything here is pure math over `f64` meters. Inputs containing NaN or
//! negative extents are rejected at the model boundary (see
//! [`FloorPlan::new`](crate::floor_plan::FloorPlan::new)); the predicates
//! themselves assume well-formed operands.

use serde::{Deserialize, Serialize};

/// Tolerance used by on-edge and touching tests.
pub const EPSILON: f64 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance.
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle anchored at its lower-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two arbitrary corner points.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Rect {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn y_max(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Finite coordinates and non-negative extents.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Zero-area rectangles carry no placement information.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Closed containment: points on the boundary are inside.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x - EPSILON
            && p.x <= self.x_max() + EPSILON
            && p.y >= self.y - EPSILON
            && p.y <= self.y_max() + EPSILON
    }

    /// `other` lies entirely within `self` (boundaries may touch).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.x_max() <= self.x_max() + EPSILON
            && other.y_max() <= self.y_max() + EPSILON
    }

    /// Strict interior overlap. Touching edges do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.overlaps_with_clearance(other, 0.0)
    }

    /// Overlap test with a non-negative clearance gap: rectangles closer
    /// than `clearance` on every axis count as overlapping. Clearance 0
    /// degrades to the strict test.
    pub fn overlaps_with_clearance(&self, other: &Rect, clearance: f64) -> bool {
        self.x_max() + clearance > other.x
            && other.x_max() + clearance > self.x
            && self.y_max() + clearance > other.y
            && other.y_max() + clearance > self.y
    }

    /// Grow (or shrink, for negative `margin`) the rectangle on all sides.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: (self.width + 2.0 * margin).max(0.0),
            height: (self.height + 2.0 * margin).max(0.0),
        }
    }

    /// Closed segment vs. closed rectangle: the segment misses the
    /// rectangle iff it lies entirely on the outside half-plane of one of
    /// the four edges. The test is conservative for diagonal segments that
    /// pass close to a corner, which is the safe direction for every caller
    /// (rasterization and path-clearness both prefer false positives).
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        if a.x < self.x && b.x < self.x {
            return false;
        }
        if a.x > self.x_max() && b.x > self.x_max() {
            return false;
        }
        if a.y < self.y && b.y < self.y {
            return false;
        }
        if a.y > self.y_max() && b.y > self.y_max() {
            return false;
        }
        true
    }
}

/// Simple polygon given by its vertex ring (implicitly closed).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Polygon { vertices }
    }

    pub fn from_rect(r: &Rect) -> Self {
        Polygon {
            vertices: vec![
                Point::new(r.x, r.y),
                Point::new(r.x_max(), r.y),
                Point::new(r.x_max(), r.y_max()),
                Point::new(r.x, r.y_max()),
            ],
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area, always non-negative.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            acc += a.x * b.y - b.x * a.y;
        }
        (acc / 2.0).abs()
    }

    /// Axis-aligned bounding rectangle. Empty polygons collapse to a
    /// zero rect at the origin.
    pub fn bounds(&self) -> Rect {
        let mut vs = self.vertices.iter();
        let Some(first) = vs.next() else {
            return Rect::new(0.0, 0.0, 0.0, 0.0);
        };
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for v in vs {
            x0 = x0.min(v.x);
            y0 = y0.min(v.y);
            x1 = x1.max(v.x);
            y1 = y1.max(v.y);
        }
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Even-odd ray casting. Points on an edge are treated as inside;
    /// this is the documented tie-break for cells straddling a zone border.
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        for (a, b) in self.edges() {
            if point_on_segment(p, a, b) {
                return true;
            }
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) / (b.y - a.y);
                if p.x < a.x + t * (b.x - a.x) {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True when two non-adjacent edges cross. Shared endpoints between
    /// neighboring edges are not crossings.
    pub fn is_self_intersecting(&self) -> bool {
        let n = self.vertices.len();
        if n < 4 {
            return false;
        }
        for i in 0..n {
            for j in (i + 1)..n {
                // Skip adjacent edge pairs (they share a vertex).
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (a1, a2) = (self.vertices[i], self.vertices[(i + 1) % n]);
                let (b1, b2) = (self.vertices[j], self.vertices[(j + 1) % n]);
                if segments_intersect(a1, a2, b1, b2) {
                    return true;
                }
            }
        }
        false
    }
}

/// Signed orientation of the triple (a, b, c): positive for a left turn.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// `p` lies on the closed segment `[a, b]`.
pub fn point_on_segment(p: Point, a: Point, b: Point) -> bool {
    if orient(a, b, p).abs() > EPSILON {
        return false;
    }
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Proper or touching intersection of two closed segments.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1.abs() <= EPSILON && point_on_segment(a1, b1, b2))
        || (d2.abs() <= EPSILON && point_on_segment(a2, b1, b2))
        || (d3.abs() <= EPSILON && point_on_segment(b1, a1, a2))
        || (d4.abs() <= EPSILON && point_on_segment(b2, a1, a2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn clearance_overlap() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 0.0, 2.0, 2.0);
        // 1 m apart: strict test says disjoint, 1.2 m clearance says too close.
        assert!(!a.overlaps(&b));
        assert!(a.overlaps_with_clearance(&b, 1.2));
        assert!(!a.overlaps_with_clearance(&b, 0.5));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(2.0, 0.0, 2.0, 2.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn polygon_area_shoelace() {
        // Winding direction must not flip the sign.
        let ccw = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 3.0),
            Point::new(0.0, 3.0),
        ]);
        let cw = Polygon::new(vec![
            Point::new(0.0, 3.0),
            Point::new(4.0, 3.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 0.0),
        ]);
        assert!((ccw.area() - 12.0).abs() < EPSILON);
        assert!((cw.area() - 12.0).abs() < EPSILON);
    }

    #[test]
    fn point_in_polygon_even_odd() {
        let poly = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]);
        assert!(poly.contains_point(Point::new(2.0, 2.0)));
        assert!(!poly.contains_point(Point::new(5.0, 2.0)));
        // On-edge tie-break: inside.
        assert!(poly.contains_point(Point::new(4.0, 2.0)));
        assert!(poly.contains_point(Point::new(0.0, 0.0)));
    }

    #[test]
    fn self_intersection_detects_bowtie() {
        let bowtie = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
        ]);
        assert!(bowtie.is_self_intersecting());

        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ]);
        assert!(!square.is_self_intersecting());
    }

    #[test]
    fn segment_rect_half_plane_test() {
        let r = Rect::new(2.0, 2.0, 2.0, 2.0);
        // Entirely left of the rect.
        assert!(!r.intersects_segment(Point::new(0.0, 0.0), Point::new(1.0, 5.0)));
        // Crosses the rect.
        assert!(r.intersects_segment(Point::new(0.0, 3.0), Point::new(5.0, 3.0)));
        // Touches the boundary.
        assert!(r.intersects_segment(Point::new(2.0, 0.0), Point::new(2.0, 5.0)));
    }

    #[test]
    fn polygon_bounds_covers_vertices() {
        let poly = Polygon::new(vec![
            Point::new(1.0, 2.0),
            Point::new(5.0, 1.0),
            Point::new(3.0, 6.0),
        ]);
        let b = poly.bounds();
        assert_eq!(b.x, 1.0);
        assert_eq!(b.y, 1.0);
        assert_eq!(b.x_max(), 5.0);
        assert_eq!(b.y_max(), 6.0);
    }
}
