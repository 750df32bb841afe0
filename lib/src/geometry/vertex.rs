//! Bulge vertex type.

use super::BULGE_EPSILON;
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D vertex with the bulge of the segment that starts at it.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex2D {
    pub x: CoordF,
    pub y: CoordF,
    /// `tan(θ/4)` of the arc to the next vertex; 0 for a straight segment.
    #[serde(default)]
    pub bulge: CoordF,
}

impl Vertex2D {
    #[inline]
    pub fn new(x: CoordF, y: CoordF, bulge: CoordF) -> Self {
        Self { x, y, bulge }
    }

    /// A vertex starting a straight segment.
    #[inline]
    pub fn straight(x: CoordF, y: CoordF) -> Self {
        Self { x, y, bulge: 0.0 }
    }

    #[inline]
    pub fn point(&self) -> (CoordF, CoordF) {
        (self.x, self.y)
    }

    /// Whether the segment leaving this vertex is a straight line.
    #[inline]
    pub fn is_straight(&self) -> bool {
        self.bulge.abs() < BULGE_EPSILON
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.bulge.is_finite()
    }
}

impl fmt::Debug for Vertex2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_straight() {
            write!(f, "({:.4}, {:.4})", self.x, self.y)
        } else {
            write!(f, "({:.4}, {:.4} b={:.4})", self.x, self.y, self.bulge)
        }
    }
}

impl From<(CoordF, CoordF)> for Vertex2D {
    fn from((x, y): (CoordF, CoordF)) -> Self {
        Self::straight(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight() {
        let v = Vertex2D::straight(1.0, 2.0);
        assert!(v.is_straight());
        assert_eq!(v.point(), (1.0, 2.0));
        assert!(!Vertex2D::new(0.0, 0.0, 0.25).is_straight());
    }

    #[test]
    fn test_bulge_defaults_when_missing() {
        let v: Vertex2D = serde_json::from_str(r#"{ "x": 3.0, "y": 4.0 }"#).unwrap();
        assert_eq!(v, Vertex2D::straight(3.0, 4.0));
    }

    #[test]
    fn test_non_finite() {
        assert!(!Vertex2D::straight(CoordF::NAN, 0.0).is_finite());
        assert!(Vertex2D::new(1.0, 1.0, -0.5).is_finite());
    }
}
