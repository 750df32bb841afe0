//! Boundary curve extraction.
//!
//! A cross-section boundary arrives as a chain of curve segments. Lines and
//! circular arcs convert exactly into bulge vertices; every other curve kind
//! degenerates to a straight segment between its endpoints.
//!
//! ## Arc Handling
//!
//! A bulge vertex can only describe sweeps up to a half turn. An arc sweeping
//! `θ` is split into `n = ceil(|θ|/π)` equal pieces, each a vertex with bulge
//! `tan(θ/4n)`.

use crate::geometry::{rotate_about, Polyline, Vertex2D};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Arcs needing more pieces than this degrade to a straight segment.
const MAXIMUM_ARC_PIECES: usize = 1024;

/// Underlying geometry of a boundary segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    Line,
    /// Circular arc; `sweep` is the signed sweep in radians (positive = CCW).
    Arc {
        center: (CoordF, CoordF),
        sweep: CoordF,
    },
    Ellipse,
    Bezier,
    #[serde(rename = "bspline")]
    BSpline,
}

/// One edge of a boundary loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSegment {
    pub curve: Curve,
    pub start: (CoordF, CoordF),
    pub end: (CoordF, CoordF),
    /// The edge is traversed against its native parametrization.
    #[serde(default)]
    pub reversed: bool,
}

impl CurveSegment {
    pub fn line(start: (CoordF, CoordF), end: (CoordF, CoordF)) -> Self {
        Self {
            curve: Curve::Line,
            start,
            end,
            reversed: false,
        }
    }

    /// A circular arc starting at `start` and sweeping `sweep` radians about
    /// `center`. The end point is derived.
    pub fn arc(start: (CoordF, CoordF), center: (CoordF, CoordF), sweep: CoordF) -> Self {
        Self {
            curve: Curve::Arc { center, sweep },
            start,
            end: rotate_about(start, center, sweep),
            reversed: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Endpoints and arc sweep in traversal order.
    fn oriented(&self) -> ((CoordF, CoordF), (CoordF, CoordF), Curve) {
        if !self.reversed {
            return (self.start, self.end, self.curve.clone());
        }
        let curve = match self.curve {
            Curve::Arc { center, sweep } => Curve::Arc {
                center,
                sweep: -sweep,
            },
            ref other => other.clone(),
        };
        (self.end, self.start, curve)
    }
}

/// A chain of boundary segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLoop {
    #[serde(default = "default_closed")]
    pub closed: bool,
    pub segments: Vec<CurveSegment>,
}

fn default_closed() -> bool {
    true
}

impl BoundaryLoop {
    pub fn new(segments: Vec<CurveSegment>) -> Self {
        Self {
            closed: true,
            segments,
        }
    }

    /// Closed loop of straight segments through the given points.
    pub fn polygon(points: &[(CoordF, CoordF)]) -> Self {
        let n = points.len();
        Self::new(
            (0..n)
                .map(|i| CurveSegment::line(points[i], points[(i + 1) % n]))
                .collect(),
        )
    }
}

/// Convert a closed boundary loop into a closed bulge polyline.
///
/// Returns `None` (with a warning) when the loop is not closed.
pub fn extract_polyline(boundary: &BoundaryLoop) -> Option<Polyline> {
    if !boundary.closed {
        log::warn!("Boundary: skipping open loop");
        return None;
    }

    let mut polyline = Polyline::with_capacity(boundary.segments.len(), true);
    for segment in &boundary.segments {
        let (start, _end, curve) = segment.oriented();
        match curve {
            Curve::Line => polyline.push(Vertex2D::straight(start.0, start.1)),
            Curve::Arc { center, sweep } => push_arc(&mut polyline, start, center, sweep),
            Curve::Ellipse | Curve::Bezier | Curve::BSpline => {
                log::trace!("Boundary: {:?} segment approximated by a straight line", curve);
                polyline.push(Vertex2D::straight(start.0, start.1));
            }
        }
    }
    Some(polyline)
}

/// Append an arc as equal pieces of at most a half turn each.
fn push_arc(
    polyline: &mut Polyline,
    start: (CoordF, CoordF),
    center: (CoordF, CoordF),
    sweep: CoordF,
) {
    let pieces = (sweep.abs() / PI).ceil().max(1.0);
    if !sweep.is_finite() || pieces > MAXIMUM_ARC_PIECES as CoordF {
        log::warn!("Boundary: arc sweep {} approximated by a straight line", sweep);
        polyline.push(Vertex2D::straight(start.0, start.1));
        return;
    }

    let pieces = pieces as usize;
    let step = sweep / pieces as CoordF;
    let bulge = (step / 4.0).tan();
    for k in 0..pieces {
        let p = if k == 0 {
            start
        } else {
            rotate_about(start, center, step * k as CoordF)
        };
        polyline.push(Vertex2D::new(p.0, p.1, bulge));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ArcGeometry;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_square_loop() {
        let square = BoundaryLoop::polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let polyline = extract_polyline(&square).unwrap();
        assert!(polyline.is_closed());
        assert_eq!(polyline.len(), 4);
        assert!(polyline.vertices().iter().all(|v| v.is_straight()));
        assert_eq!(polyline[2].point(), (10.0, 10.0));
    }

    #[test]
    fn test_open_loop_skipped() {
        let mut open = BoundaryLoop::polygon(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        open.closed = false;
        assert!(extract_polyline(&open).is_none());
    }

    #[test]
    fn test_full_circle_splits() {
        let r = 5.0;
        let circle = BoundaryLoop::new(vec![CurveSegment::arc((r, 0.0), (0.0, 0.0), 2.0 * PI)]);
        let polyline = extract_polyline(&circle).unwrap();
        assert_eq!(polyline.len(), 2);

        for segment in polyline.segments() {
            let arc = segment.arc().unwrap();
            assert!(arc.sweep.abs() <= PI + 1e-12);
            assert!((arc.radius - r).abs() < 1e-9);
            assert!(arc.center.0.abs() < 1e-9 && arc.center.1.abs() < 1e-9);
        }
        assert!((polyline[1].x + r).abs() < 1e-9);
        assert!((polyline.length() - 2.0 * PI * r).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_arc_bulge() {
        // Quarter circle closed by two lines (a pie slice).
        let pie = BoundaryLoop::new(vec![
            CurveSegment::line((0.0, 0.0), (1.0, 0.0)),
            CurveSegment::arc((1.0, 0.0), (0.0, 0.0), FRAC_PI_2),
            CurveSegment::line((0.0, 1.0), (0.0, 0.0)),
        ]);
        let polyline = extract_polyline(&pie).unwrap();
        assert_eq!(polyline.len(), 3);
        assert!((polyline[1].bulge - (FRAC_PI_2 / 4.0).tan()).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_arc() {
        // Same quarter arc, stored against the traversal direction.
        let native = CurveSegment::arc((1.0, 0.0), (0.0, 0.0), FRAC_PI_2);
        let pie = BoundaryLoop::new(vec![
            CurveSegment::line((0.0, 0.0), (0.0, 1.0)),
            native.reversed(),
            CurveSegment::line((1.0, 0.0), (0.0, 0.0)),
        ]);
        let polyline = extract_polyline(&pie).unwrap();
        let v = polyline[1];
        assert!((v.x - 0.0).abs() < 1e-12 && (v.y - 1.0).abs() < 1e-12);
        assert!(v.bulge < 0.0);

        let arc = ArcGeometry::from_bulge(v.point(), polyline[2].point(), v.bulge).unwrap();
        assert!((arc.radius - 1.0).abs() < 1e-9);
        assert!(arc.center.0.abs() < 1e-9 && arc.center.1.abs() < 1e-9);
    }

    #[test]
    fn test_large_clockwise_arc() {
        let sweep = -1.5 * PI;
        let boundary = BoundaryLoop::new(vec![
            CurveSegment::arc((2.0, 0.0), (0.0, 0.0), sweep),
            CurveSegment::line((0.0, 2.0), (2.0, 0.0)),
        ]);
        let polyline = extract_polyline(&boundary).unwrap();
        assert_eq!(polyline.len(), 3);
        let bulge = (sweep / 8.0).tan();
        assert!((polyline[0].bulge - bulge).abs() < 1e-12);
        assert!((polyline[1].bulge - bulge).abs() < 1e-12);
        // Half-angle point of a -270° sweep from (2,0) is at 135° clockwise.
        let expected = rotate_about((2.0, 0.0), (0.0, 0.0), sweep / 2.0);
        assert!((polyline[1].x - expected.0).abs() < 1e-12);
        assert!((polyline[1].y - expected.1).abs() < 1e-12);
    }

    #[test]
    fn test_multi_turn_arc_pieces() {
        // One and a half turns: three half-turn pieces, ending opposite the start.
        let sweep = 3.0 * PI;
        let boundary = BoundaryLoop::new(vec![
            CurveSegment::arc((1.0, 0.0), (0.0, 0.0), sweep),
            CurveSegment::line((-1.0, 0.0), (1.0, 0.0)),
        ]);
        let polyline = extract_polyline(&boundary).unwrap();
        assert_eq!(polyline.len(), 4);

        for v in &polyline.vertices()[..3] {
            assert!((4.0 * v.bulge.atan()).abs() <= PI + 1e-12);
            assert!((v.bulge - (PI / 4.0).tan()).abs() < 1e-12);
        }
        assert!((polyline[1].x + 1.0).abs() < 1e-12);
        assert!((polyline[2].x - 1.0).abs() < 1e-12);
        assert!(polyline[3].is_straight());
    }

    #[test]
    fn test_non_finite_sweep_is_straight() {
        let boundary = BoundaryLoop::new(vec![
            CurveSegment::arc((1.0, 0.0), (0.0, 0.0), f64::INFINITY),
            CurveSegment::line((-1.0, 0.0), (1.0, 0.0)),
        ]);
        let polyline = extract_polyline(&boundary).unwrap();
        assert_eq!(polyline.len(), 2);
        assert!(polyline[0].is_straight());
    }

    #[test]
    fn test_freeform_curves_degenerate_to_lines() {
        let boundary = BoundaryLoop::new(vec![
            CurveSegment {
                curve: Curve::BSpline,
                start: (0.0, 0.0),
                end: (4.0, 0.0),
                reversed: false,
            },
            CurveSegment {
                curve: Curve::Ellipse,
                start: (4.0, 0.0),
                end: (4.0, 3.0),
                reversed: false,
            },
            CurveSegment {
                curve: Curve::Bezier,
                start: (4.0, 3.0),
                end: (0.0, 0.0),
                reversed: false,
            },
        ]);
        let polyline = extract_polyline(&boundary).unwrap();
        assert_eq!(polyline.len(), 3);
        assert!(polyline.vertices().iter().all(|v| v.is_straight()));
    }

    #[test]
    fn test_deserialize_loop() {
        let json = r#"{
            "segments": [
                { "curve": { "type": "line" }, "start": [0.0, 0.0], "end": [2.0, 0.0] },
                { "curve": { "type": "arc", "center": [1.0, 0.0], "sweep": 3.141592653589793 },
                  "start": [2.0, 0.0], "end": [0.0, 0.0] }
            ]
        }"#;
        let boundary: BoundaryLoop = serde_json::from_str(json).unwrap();
        assert!(boundary.closed);
        let polyline = extract_polyline(&boundary).unwrap();
        assert_eq!(polyline.len(), 2);
        assert!((polyline[1].bulge - 1.0).abs() < 1e-12);
    }
}
