//!
//! # Rectangular Bounding Boxes and Associated Trait
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::geom::{Point, Transform, TransformTrait};

/// # Rectangular Bounding Box
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Create a new [BoundBox] from two [Point]s.
    /// Callers are responsible for ensuring that p0.x <= p1.x, and p0.y <= p1.y.
    fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
    /// Create a new [BoundBox] from a single [Point].
    /// The resultant [BoundBox] comprises solely the point, having zero area.
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Create a new [BoundBox] from two opposite corners, in any order
    pub fn from_corners(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
    /// Create the smallest [BoundBox] around all of `pts`.
    /// Empty if `pts` is empty.
    pub fn from_points<'a>(pts: impl IntoIterator<Item = &'a Point>) -> Self {
        let mut bbox = Self::empty();
        for pt in pts {
            bbox = pt.union(&bbox);
        }
        bbox
    }
    /// Create an empty, otherwise invalid [BoundBox]
    pub fn empty() -> Self {
        Self {
            p0: Point::new(f64::INFINITY, f64::INFINITY),
            p1: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
    /// Boolean indication of whether a box is empty
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Boolean indication of whether [Point] `pt` lies inside out box.
    pub fn contains(&self, pt: &Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// The four corners, counter-clockwise from `p0`
    pub fn corners(&self) -> [Point; 4] {
        [
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }
    /// Convert to `Option`, `None` if empty
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
impl TransformTrait for BoundBox {
    /// Transform each corner, and re-box the result.
    /// Rotations other than multiples of 90 degrees grow the box.
    fn transform_mut(&mut self, trans: &Transform) {
        if self.is_empty() {
            return;
        }
        let corners = self.corners().map(|c| trans.apply(&c));
        *self = BoundBox::from_points(corners.iter());
    }
}

///
/// # Bounding Box Trait
///
/// Methods for interacting with [BoundBox]s.
/// Implementations for [Point]s, [BoundBox]s, and layout elements
/// enable unions and intersections.
///
pub trait BoundBoxTrait {
    /// Compute the intersection with rectangular bounding box `bbox`.
    /// Creates and returns a new [BoundBox].
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().intersection(bbox)
    }
    /// Compute the union with rectangular bounding box `bbox`.
    /// Creates and returns a new [BoundBox].
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        self.bbox().union(bbox)
    }
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> BoundBox;
}

impl BoundBoxTrait for BoundBox {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        let pmin = Point::new(self.p0.x.max(bbox.p0.x), self.p0.y.max(bbox.p0.y));
        let pmax = Point::new(self.p1.x.min(bbox.p1.x), self.p1.y.min(bbox.p1.y));
        if pmin.x > pmax.x || pmin.y > pmax.y {
            return BoundBox::empty();
        }
        BoundBox::new(pmin, pmax)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::new(
            Point::new(self.p0.x.min(bbox.p0.x), self.p0.y.min(bbox.p0.y)),
            Point::new(self.p1.x.max(bbox.p1.x), self.p1.y.max(bbox.p1.y)),
        )
    }
    fn bbox(&self) -> BoundBox {
        *self
    }
}

impl BoundBoxTrait for Point {
    fn intersection(&self, bbox: &BoundBox) -> BoundBox {
        if !bbox.contains(self) {
            return BoundBox::empty();
        }
        BoundBox::from_point(*self)
    }
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        BoundBox::new(
            Point::new(self.x.min(bbox.p0.x), self.y.min(bbox.p0.y)),
            Point::new(self.x.max(bbox.p1.x), self.y.max(bbox.p1.y)),
        )
    }
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_and_intersections() {
        let a = BoundBox::from_corners(Point::new(10., 10.), Point::new(0., 0.));
        let b = BoundBox::from_corners(Point::new(5., 5.), Point::new(20., 8.));
        assert_eq!(a.p0, Point::new(0., 0.));
        let u = a.union(&b);
        assert_eq!(u.p1, Point::new(20., 10.));
        let i = a.intersection(&b);
        assert_eq!(i, BoundBox::from_corners(Point::new(5., 5.), Point::new(10., 8.)));
        let far = BoundBox::from_point(Point::new(100., 100.));
        assert!(a.intersection(&far).is_empty());
        assert!(BoundBox::empty().union(&a) == a);
        assert!(BoundBox::from_points(Vec::<Point>::new().iter()).into_option().is_none());
    }
    #[test]
    fn transformed_corners() {
        let a = BoundBox::from_corners(Point::new(0., 0.), Point::new(10., 5.));
        let r = a.rotated(90., Point::default());
        assert_eq!(r, BoundBox::from_corners(Point::new(-5., 0.), Point::new(0., 10.)));
        assert!(BoundBox::empty().translated(1., 1.).is_empty());
    }
}
