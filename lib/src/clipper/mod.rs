//! Clipper polygon offset and clipping module.
//!
//! This module bridges the slicer's bulge polylines to the geo-clipper
//! library and provides the spatial queries built on top of it.
//!
//! These operations are essential for:
//! - Computing shell offsets
//! - Validating boundary loops before offsetting
//! - Clipping infill paths to the innermost shell
//!
//! Offsetting works on straight edges only: arcs are flattened to chords
//! first and results come back as straight-edged regions.

use crate::geometry::{cross2f, Polyline, POINT_EPSILON};
use crate::{CoordF, Error, Result};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};
use rstar::{RTree, RTreeObject, AABB};

/// Plain 2D point in millimetres.
pub type Point2 = (CoordF, CoordF);

/// Integer scale geo-clipper applies internally (1 µm resolution).
const CLIPPER_FACTOR: CoordF = 1000.0;

/// Arc tolerance for round joins, as a fraction of the clipper unit.
const ROUND_JOIN_TOLERANCE: CoordF = 0.25;

/// A straight-edged area: one outer ring (counter-clockwise) and its holes
/// (clockwise). Rings do not repeat their first point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    pub outer: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

impl Region {
    /// Build a region from rings of any orientation.
    pub fn new(outer: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        let mut region = Self { outer, holes };
        region.normalize_orientation();
        region
    }

    /// Flatten bulge polylines into a region.
    pub fn from_polylines(outer: &Polyline, islands: &[Polyline], tolerance: CoordF) -> Self {
        Self::new(
            outer.flatten(tolerance),
            islands.iter().map(|p| p.flatten(tolerance)).collect(),
        )
    }

    /// Closed straight-edged polylines for the outer ring and each hole.
    pub fn to_polylines(&self) -> (Polyline, Vec<Polyline>) {
        (
            Polyline::from_points(&self.outer, true),
            self.holes
                .iter()
                .map(|h| Polyline::from_points(h, true))
                .collect(),
        )
    }

    fn normalize_orientation(&mut self) {
        if ring_signed_area(&self.outer) < 0.0 {
            self.outer.reverse();
        }
        for hole in &mut self.holes {
            if ring_signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
    }

    /// Net area (outer minus holes).
    pub fn area(&self) -> CoordF {
        ring_signed_area(&self.outer).abs()
            - self
                .holes
                .iter()
                .map(|h| ring_signed_area(h).abs())
                .sum::<CoordF>()
    }

    /// Whether `p` lies inside the outer ring and outside every hole.
    pub fn contains(&self, p: Point2) -> bool {
        point_in_ring(p, &self.outer) && !self.holes.iter().any(|h| point_in_ring(p, h))
    }

    /// All rings, outer first.
    pub fn rings(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }
}

// ============================================================================
// geo conversions
// ============================================================================

fn ring_to_geo(points: &[Point2]) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = points.iter().map(|&(x, y)| GeoCoord { x, y }).collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    LineString::new(ring)
}

fn geo_to_ring(line: &LineString<f64>) -> Vec<Point2> {
    let mut points: Vec<Point2> = line.coords().map(|c| (c.x, c.y)).collect();

    // Remove the closing point if present (our rings don't store it)
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn region_to_geo(region: &Region) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&region.outer),
        region.holes.iter().map(|h| ring_to_geo(h)).collect(),
    )
}

fn geo_to_region(poly: &GeoPolygon<f64>) -> Region {
    Region::new(
        geo_to_ring(poly.exterior()),
        poly.interiors()
            .iter()
            .map(geo_to_ring)
            .filter(|h| h.len() >= 3)
            .collect(),
    )
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset a set of regions by `delta` millimetres (negative = shrink).
///
/// Each connected area of the result becomes its own region, so a single
/// input may split into several outputs or vanish entirely.
pub fn offset_regions(regions: &[Region], delta: CoordF) -> Vec<Region> {
    if regions.is_empty() {
        return vec![];
    }

    let multi = MultiPolygon::new(regions.iter().map(region_to_geo).collect());
    let result = multi.offset(
        delta,
        JoinType::Round(ROUND_JOIN_TOLERANCE),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    );

    result
        .0
        .iter()
        .map(geo_to_region)
        .filter(|r| r.outer.len() >= 3)
        .collect()
}

// ============================================================================
// Spatial index of edges
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct IndexedEdge {
    a: Point2,
    b: Point2,
    ring: usize,
    index: usize,
}

impl RTreeObject for IndexedEdge {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.a.0, self.a.1], [self.b.0, self.b.1])
    }
}

/// R-tree over the edges of one or more closed rings.
pub struct EdgeIndex {
    tree: RTree<IndexedEdge>,
    ring_sizes: Vec<usize>,
}

impl EdgeIndex {
    pub fn new<'a>(rings: impl IntoIterator<Item = &'a [Point2]>) -> Self {
        let mut edges = Vec::new();
        let mut ring_sizes = Vec::new();
        for (ring, points) in rings.into_iter().enumerate() {
            let n = points.len();
            ring_sizes.push(n);
            for index in 0..n {
                edges.push(IndexedEdge {
                    a: points[index],
                    b: points[(index + 1) % n],
                    ring,
                    index,
                });
            }
        }
        Self {
            tree: RTree::bulk_load(edges),
            ring_sizes,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.tree.size()
    }

    fn adjacent(&self, e: &IndexedEdge, f: &IndexedEdge) -> bool {
        if e.ring != f.ring {
            return false;
        }
        let n = self.ring_sizes[e.ring];
        e.index == f.index || (e.index + 1) % n == f.index || (f.index + 1) % n == e.index
    }

    /// First point where two non-adjacent edges properly cross.
    pub fn find_self_intersection(&self) -> Option<Point2> {
        for edge in self.tree.iter() {
            for other in self.tree.locate_in_envelope_intersecting(&edge.envelope()) {
                if (other.ring, other.index) <= (edge.ring, edge.index)
                    || self.adjacent(edge, other)
                {
                    continue;
                }
                if let Some(t) = proper_crossing(edge.a, edge.b, other.a, other.b) {
                    return Some(lerp(edge.a, edge.b, t));
                }
            }
        }
        None
    }

    /// Parameters `t ∈ [0, 1]` along `p → q` where the segment meets an edge,
    /// sorted ascending.
    pub fn crossings(&self, p: Point2, q: Point2) -> Vec<CoordF> {
        let envelope = AABB::from_corners([p.0, p.1], [q.0, q.1]);
        let mut ts: Vec<CoordF> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|edge| segment_intersection(p, q, edge.a, edge.b))
            .collect();
        ts.sort_by(|a, b| a.total_cmp(b));
        ts
    }
}

#[inline]
fn lerp(a: Point2, b: Point2, t: CoordF) -> Point2 {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn sub(a: Point2, b: Point2) -> Point2 {
    (a.0 - b.0, a.1 - b.1)
}

/// Parameter along `p → q` where it meets `a → b`, endpoints included.
fn segment_intersection(p: Point2, q: Point2, a: Point2, b: Point2) -> Option<CoordF> {
    let d = sub(q, p);
    let e = sub(b, a);
    let denom = cross2f(d, e);
    if denom.abs() < 1e-15 {
        return None;
    }
    let ap = sub(a, p);
    let t = cross2f(ap, e) / denom;
    let u = cross2f(ap, d) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Parameter along `p → q` where it strictly crosses `a → b`.
fn proper_crossing(p: Point2, q: Point2, a: Point2, b: Point2) -> Option<CoordF> {
    const EPS: CoordF = 1e-12;
    let d = sub(q, p);
    let e = sub(b, a);
    let denom = cross2f(d, e);
    if denom.abs() < EPS {
        return None;
    }
    let ap = sub(a, p);
    let t = cross2f(ap, e) / denom;
    let u = cross2f(ap, d) / denom;
    if t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS {
        Some(t)
    } else {
        None
    }
}

// ============================================================================
// Ring queries
// ============================================================================

/// Signed area of a ring (positive when counter-clockwise).
pub fn ring_signed_area(ring: &[Point2]) -> CoordF {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let twice: CoordF = (0..n)
        .map(|i| cross2f(ring[i], ring[(i + 1) % n]))
        .sum();
    twice * 0.5
}

/// Even-odd point in ring test.
pub fn point_in_ring(p: Point2, ring: &[Point2]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Check that a ring can be offset: at least three distinct points, finite
/// coordinates, and no crossing edges.
pub fn validate_ring(ring: &[Point2]) -> Result<()> {
    if ring.iter().any(|p| !p.0.is_finite() || !p.1.is_finite()) {
        return Err(Error::GeometryOperation(
            "loop has non-finite coordinates".into(),
        ));
    }

    let mut distinct: Vec<Point2> = Vec::with_capacity(ring.len());
    for &p in ring {
        let duplicate = distinct.last().map_or(false, |&q: &Point2| {
            (p.0 - q.0).abs() < POINT_EPSILON && (p.1 - q.1).abs() < POINT_EPSILON
        });
        if !duplicate {
            distinct.push(p);
        }
    }
    if distinct.len() > 1 {
        let first = distinct[0];
        if let Some(&last) = distinct.last() {
            if (first.0 - last.0).abs() < POINT_EPSILON
                && (first.1 - last.1).abs() < POINT_EPSILON
            {
                distinct.pop();
            }
        }
    }
    if distinct.len() < 3 {
        return Err(Error::GeometryOperation(format!(
            "loop has {} distinct points, need at least 3",
            distinct.len()
        )));
    }

    let index = EdgeIndex::new([distinct.as_slice()]);
    if let Some((x, y)) = index.find_self_intersection() {
        return Err(Error::GeometryOperation(format!(
            "loop self-intersects near ({:.3}, {:.3})",
            x, y
        )));
    }
    Ok(())
}

// ============================================================================
// Open path clipping
// ============================================================================

/// Clip an open straight-edged path to a set of regions.
///
/// Returns the pieces of the path that lie inside some region's outer ring
/// and outside its holes. Consecutive inside pieces are merged into one path.
pub fn clip_open_path(path: &[Point2], regions: &[Region]) -> Vec<Vec<Point2>> {
    if path.len() < 2 || regions.is_empty() {
        return vec![];
    }

    let index = EdgeIndex::new(regions.iter().flat_map(|r| r.rings()));
    let inside = |p: Point2| regions.iter().any(|r| r.contains(p));

    let mut result = Vec::new();
    let mut current: Vec<Point2> = Vec::new();

    for pair in path.windows(2) {
        let (p, q) = (pair[0], pair[1]);

        let mut ts = Vec::with_capacity(4);
        ts.push(0.0);
        ts.extend(index.crossings(p, q));
        ts.push(1.0);
        ts.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        for span in ts.windows(2) {
            let (t0, t1) = (span[0], span[1]);
            if !inside(lerp(p, q, (t0 + t1) * 0.5)) {
                continue;
            }
            let start = lerp(p, q, t0);
            let end = lerp(p, q, t1);

            let connected = current.last().map_or(false, |&last: &Point2| {
                (last.0 - start.0).abs() < 1e-9 && (last.1 - start.1).abs() < 1e-9
            });
            if connected {
                current.push(end);
            } else {
                if current.len() >= 2 {
                    result.push(std::mem::take(&mut current));
                }
                current = vec![start, end];
            }
        }
    }

    if current.len() >= 2 {
        result.push(current);
    }
    result
}
