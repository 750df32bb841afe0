//! Polyline type for bulge paths.
//!
//! A polyline is a sequence of [`Vertex2D`]s. A closed polyline implicitly
//! connects its last vertex back to the first; the closing vertex is never
//! stored twice.

use super::{distance, rotate_about, ArcGeometry, Vertex2D};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// One edge of a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: (CoordF, CoordF),
    pub end: (CoordF, CoordF),
    pub bulge: CoordF,
}

impl Segment {
    /// Arc geometry, or `None` for a straight edge.
    #[inline]
    pub fn arc(&self) -> Option<ArcGeometry> {
        ArcGeometry::from_bulge(self.start, self.end, self.bulge)
    }

    /// Length along the edge; arcs use their arc length.
    pub fn length(&self) -> CoordF {
        match self.arc() {
            Some(arc) => arc.length(),
            None => distance(self.start, self.end),
        }
    }
}

/// A path of bulge vertices, open or closed.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    vertices: Vec<Vertex2D>,
    #[serde(default)]
    is_closed: bool,
}

impl Polyline {
    /// Create a new empty polyline.
    #[inline]
    pub fn new(is_closed: bool) -> Self {
        Self {
            vertices: Vec::new(),
            is_closed,
        }
    }

    /// Create an empty polyline with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize, is_closed: bool) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            is_closed,
        }
    }

    #[inline]
    pub fn from_vertices(vertices: Vec<Vertex2D>, is_closed: bool) -> Self {
        Self {
            vertices,
            is_closed,
        }
    }

    /// Create a straight-edged polyline from plain points.
    pub fn from_points(points: &[(CoordF, CoordF)], is_closed: bool) -> Self {
        Self {
            vertices: points.iter().map(|&p| Vertex2D::from(p)).collect(),
            is_closed,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex2D] {
        &self.vertices
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn push(&mut self, vertex: Vertex2D) {
        self.vertices.push(vertex);
    }

    #[inline]
    pub fn first(&self) -> Option<&Vertex2D> {
        self.vertices.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Vertex2D> {
        self.vertices.last()
    }

    /// Number of edges: one per vertex when closed, one fewer when open.
    pub fn segment_count(&self) -> usize {
        match (self.is_closed, self.vertices.len()) {
            (_, 0) => 0,
            (true, n) => n,
            (false, n) => n - 1,
        }
    }

    /// Iterate the edges in traversal order.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.vertices.len();
        (0..self.segment_count()).map(move |i| {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            Segment {
                start: a.point(),
                end: b.point(),
                bulge: a.bulge,
            }
        })
    }

    /// Total path length, arcs measured along the arc.
    pub fn length(&self) -> CoordF {
        self.segments().map(|s| s.length()).sum()
    }

    /// Whether every vertex has finite coordinates and bulge.
    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(Vertex2D::is_finite)
    }

    /// Whether any edge is an arc.
    pub fn has_arcs(&self) -> bool {
        self.segments().any(|s| s.arc().is_some())
    }

    /// Approximate the path by straight chords.
    ///
    /// Arc edges are subdivided so that no chord deviates from the arc by more
    /// than `tolerance`. The closing vertex of a closed polyline is not
    /// repeated.
    pub fn flatten(&self, tolerance: CoordF) -> Vec<(CoordF, CoordF)> {
        let mut points = Vec::with_capacity(self.vertices.len());
        if self.vertices.len() == 1 {
            points.push(self.vertices[0].point());
            return points;
        }
        for segment in self.segments() {
            points.push(segment.start);
            if let Some(arc) = segment.arc() {
                let chords = arc.chord_count(tolerance);
                let step = arc.sweep / chords as CoordF;
                for k in 1..chords {
                    points.push(rotate_about(segment.start, arc.center, step * k as CoordF));
                }
            }
        }
        if !self.is_closed {
            if let Some(last) = self.vertices.last() {
                points.push(last.point());
            }
        }
        points
    }

    /// Straight-edged copy of this polyline.
    pub fn flattened(&self, tolerance: CoordF) -> Polyline {
        Polyline::from_points(&self.flatten(tolerance), self.is_closed)
    }

    /// Signed area of the flattened outline (positive when counter-clockwise).
    pub fn signed_area(&self, tolerance: CoordF) -> CoordF {
        let points = self.flatten(tolerance);
        let n = points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: CoordF = (0..n)
            .map(|i| {
                let (x0, y0) = points[i];
                let (x1, y1) = points[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice * 0.5
    }
}

impl Index<usize> for Polyline {
    type Output = Vertex2D;

    #[inline]
    fn index(&self, index: usize) -> &Vertex2D {
        &self.vertices[index]
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polyline")
            .field("closed", &self.is_closed)
            .field("vertices", &self.vertices)
            .finish()
    }
}

/// Type alias for a collection of polylines.
pub type Polylines = Vec<Polyline>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::approx_eq;
    use std::f64::consts::PI;

    fn unit_square() -> Polyline {
        Polyline::from_points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], true)
    }

    /// Circle of radius 1 centred on the origin, as two half-turn arcs.
    fn unit_circle() -> Polyline {
        Polyline::from_vertices(
            vec![Vertex2D::new(1.0, 0.0, 1.0), Vertex2D::new(-1.0, 0.0, 1.0)],
            true,
        )
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(unit_square().segment_count(), 4);
        let open = Polyline::from_points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)], false);
        assert_eq!(open.segment_count(), 2);
        assert_eq!(Polyline::new(true).segment_count(), 0);
    }

    #[test]
    fn test_length() {
        assert!(approx_eq(unit_square().length(), 4.0, 1e-12));
        assert!(approx_eq(unit_circle().length(), 2.0 * PI, 1e-9));
    }

    #[test]
    fn test_flatten_straight_is_identity() {
        let square = unit_square();
        let points = square.flatten(0.01);
        assert_eq!(points.len(), 4);
        assert_eq!(points[2], (1.0, 1.0));
    }

    #[test]
    fn test_flatten_circle_stays_within_tolerance() {
        let tolerance = 0.01;
        let points = unit_circle().flatten(tolerance);
        assert!(points.len() > 8);
        for &(x, y) in &points {
            assert!(approx_eq(x.hypot(y), 1.0, 1e-9));
        }
        // Chord midpoints sag at most `tolerance` inside the circle.
        let n = points.len();
        for i in 0..n {
            let (x0, y0) = points[i];
            let (x1, y1) = points[(i + 1) % n];
            let mid = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
            assert!(1.0 - mid.0.hypot(mid.1) <= tolerance + 1e-9);
        }
    }

    #[test]
    fn test_signed_area_orientation() {
        assert!(approx_eq(unit_square().signed_area(0.01), 1.0, 1e-12));

        let cw = Polyline::from_points(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)], true);
        assert!(approx_eq(cw.signed_area(0.01), -1.0, 1e-12));

        let circle = unit_circle().signed_area(0.001);
        assert!(approx_eq(circle, PI, 0.01));
    }

    #[test]
    fn test_open_flatten_keeps_last_vertex() {
        let open = Polyline::from_vertices(
            vec![Vertex2D::new(1.0, 0.0, 1.0), Vertex2D::straight(-1.0, 0.0)],
            false,
        );
        let points = open.flatten(0.05);
        assert_eq!(points.first(), Some(&(1.0, 0.0)));
        assert_eq!(points.last(), Some(&(-1.0, 0.0)));
        assert!(points.iter().any(|p| p.1 > 0.5));
    }
}
