//!
//! # Geometry Module
//!
//! Defines [Point] and the affine [Transform],
//! plus the [TransformTrait] implemented by everything that can be moved.
//!

// Crates.io
use derive_more::{Add, Neg, Sub};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// # Point in two-dimensional layout-space
/// Denoted in user units, generally microns.
#[derive(
    Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Add, Sub, Neg,
)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Multiply both coordinates by `k`
    pub fn times(&self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    /// Euclidean distance to `other`
    pub fn dist(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
impl From<(f64, f64)> for Point {
    fn from(p: (f64, f64)) -> Self {
        Self::new(p.0, p.1)
    }
}

/// Sine and cosine of `angle` degrees, exact at multiples of 90
pub(crate) fn sin_cos(angle: f64) -> (f64, f64) {
    let a = angle.rem_euclid(360.0);
    if a == 0.0 {
        (0., 1.)
    } else if a == 90.0 {
        (1., 0.)
    } else if a == 180.0 {
        (0., -1.)
    } else if a == 270.0 {
        (-1., 0.)
    } else {
        angle.to_radians().sin_cos()
    }
}

///
/// # Matrix-Vector Transformation
///
/// 2x2 linear matrix `a` and translation vector `b`.
/// Applied to points as `a·p + b`.
///
/// Placements (references, text) combine four operations, always in the order:
/// mirror about the x-axis, then scale, then rotate about the origin, then translate.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Linear Matrix, in row-major order
    pub a: [[f64; 2]; 2],
    /// X-Y Translation
    pub b: [f64; 2],
}
impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
impl Transform {
    /// The identity transform, leaving any transformed object unmodified
    pub fn identity() -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [0., 0.],
        }
    }
    /// Translation by (x,y)
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [x, y],
        }
    }
    /// Rotation by `angle` degrees counter-clockwise, about the origin
    pub fn rotate(angle: f64) -> Self {
        let (sin, cos) = sin_cos(angle);
        Self {
            a: [[cos, -sin], [sin, cos]],
            b: [0., 0.],
        }
    }
    /// Uniform scaling by `k`, about the origin
    pub fn scale(k: f64) -> Self {
        Self {
            a: [[k, 0.], [0., k]],
            b: [0., 0.],
        }
    }
    /// Reflection about the x-axis
    pub fn reflect_vert() -> Self {
        Self {
            a: [[1., 0.], [0., -1.]],
            b: [0., 0.],
        }
    }
    /// Create a reflection about the y-axis
    pub fn reflect_horiz() -> Self {
        Self {
            a: [[-1., 0.], [0., 1.]],
            b: [0., 0.],
        }
    }
    /// Create from placement fields.
    /// Equal to `translate(origin) · rotate(rotation) · scale(magnification) · reflect`.
    pub fn from_placement(
        origin: &Point,
        rotation: f64,
        magnification: f64,
        x_reflection: bool,
    ) -> Self {
        let (sin, cos) = sin_cos(rotation);
        let m = if x_reflection { -1. } else { 1. };
        let s = magnification;
        Self {
            a: [[s * cos, -s * sin * m], [s * sin, s * cos * m]],
            b: [origin.x, origin.y],
        }
    }
    /// Apply `inner` about `center` rather than about the origin
    pub fn about(center: &Point, inner: &Transform) -> Self {
        let there = Self::translate(center.x, center.y);
        let back = Self::translate(-center.x, -center.y);
        Self::cascade(&there, &Self::cascade(inner, &back))
    }
    /// Create a new [Transform] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to reference hierarchies:
    /// a point in the child's frame is first moved by `child`, then by `parent`.
    ///
    /// Note this operation *is not* commutative.
    /// Reflecting vertically, then translating by (1,1), lands a point at (1,1) at (2,-2);
    /// reversing the two lands it at (2,0).
    ///
    pub fn cascade(parent: &Transform, child: &Transform) -> Transform {
        let mut b = matvec(&parent.a, &child.b);
        b[0] += parent.b[0];
        b[1] += parent.b[1];
        let a = matmul(&parent.a, &child.a);
        Self { a, b }
    }
    /// Apply to a single [Point]
    pub fn apply(&self, p: &Point) -> Point {
        let v = matvec(&self.a, &[p.x, p.y]);
        Point::new(v[0] + self.b[0], v[1] + self.b[1])
    }
    /// Apply only the linear part, e.g. to a displacement vector
    pub fn apply_linear(&self, p: &Point) -> Point {
        let v = matvec(&self.a, &[p.x, p.y]);
        Point::new(v[0], v[1])
    }
    /// Determinant of the linear part
    pub fn det(&self) -> f64 {
        self.a[0][0] * self.a[1][1] - self.a[0][1] * self.a[1][0]
    }
    /// Inverse transform. `None` if singular, e.g. after scaling by zero.
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.det();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let a = [
            [self.a[1][1] / det, -self.a[0][1] / det],
            [-self.a[1][0] / det, self.a[0][0] / det],
        ];
        let b = matvec(&a, &self.b);
        Some(Self {
            a,
            b: [-b[0], -b[1]],
        })
    }
    /// Decompose back into placement fields:
    /// `(origin, rotation, magnification, x_reflection)`.
    /// Exact inverse of [Transform::from_placement] for any transform composed of
    /// translations, rotations, uniform scalings, and reflections.
    pub fn decompose(&self) -> (Point, f64, f64, bool) {
        let det = self.det();
        let reflected = det < 0.0;
        let magnification = det.abs().sqrt();
        // The x-axis image is unaffected by the reflection
        let mut rotation = self.a[1][0].atan2(self.a[0][0]).to_degrees();
        if rotation < 0.0 {
            rotation += 360.0;
        }
        if rotation == 0.0 || rotation >= 360.0 {
            rotation = 0.0;
        }
        let origin = Point::new(self.b[0], self.b[1]);
        (origin, rotation, magnification, reflected)
    }
}
/// Multiply 2x2 matrices, returning a new 2x2 matrix
fn matmul(a: &[[f64; 2]; 2], b: &[[f64; 2]; 2]) -> [[f64; 2]; 2] {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}
/// Multiply a 2x2 matrix by a 2-entry vector, returning a new 2-entry vector
fn matvec(a: &[[f64; 2]; 2], b: &[f64; 2]) -> [f64; 2] {
    [
        a[0][0] * b[0] + a[0][1] * b[1],
        a[1][0] * b[0] + a[1][1] * b[1],
    ]
}

///
/// # Transform Trait
///
/// Implementers provide the in-place `transform_mut`.
/// Each in-place operation has a copy-returning twin which leaves `self` untouched.
///
pub trait TransformTrait: Clone {
    /// Apply [Transform] `trans` in place
    fn transform_mut(&mut self, trans: &Transform);

    /// Create a new copy, transformed by `trans`
    fn transform(&self, trans: &Transform) -> Self {
        let mut rv = self.clone();
        rv.transform_mut(trans);
        rv
    }
    /// Shift by (dx, dy)
    fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.transform_mut(&Transform::translate(dx, dy));
        self
    }
    /// Copy, shifted by (dx, dy)
    fn translated(&self, dx: f64, dy: f64) -> Self {
        self.transform(&Transform::translate(dx, dy))
    }
    /// Rotate by `angle` degrees counter-clockwise about `center`
    fn rotate(&mut self, angle: f64, center: Point) -> &mut Self {
        self.transform_mut(&Transform::about(&center, &Transform::rotate(angle)));
        self
    }
    /// Copy, rotated by `angle` degrees counter-clockwise about `center`
    fn rotated(&self, angle: f64, center: Point) -> Self {
        self.transform(&Transform::about(&center, &Transform::rotate(angle)))
    }
    /// Scale by `k` about `center`
    fn scale(&mut self, k: f64, center: Point) -> &mut Self {
        self.transform_mut(&Transform::about(&center, &Transform::scale(k)));
        self
    }
    /// Copy, scaled by `k` about `center`
    fn scaled(&self, k: f64, center: Point) -> Self {
        self.transform(&Transform::about(&center, &Transform::scale(k)))
    }
    /// Mirror about the horizontal line at `y`
    fn reflect(&mut self, y: f64) -> &mut Self {
        let at = Point::new(0., y);
        self.transform_mut(&Transform::about(&at, &Transform::reflect_vert()));
        self
    }
    /// Copy, mirrored about the horizontal line at `y`
    fn reflected(&self, y: f64) -> Self {
        let at = Point::new(0., y);
        self.transform(&Transform::about(&at, &Transform::reflect_vert()))
    }
    /// Mirror about the vertical line at `x`
    fn reflect_horiz(&mut self, x: f64) -> &mut Self {
        let at = Point::new(x, 0.);
        self.transform_mut(&Transform::about(&at, &Transform::reflect_horiz()));
        self
    }
    /// Copy, mirrored about the vertical line at `x`
    fn reflected_horiz(&self, x: f64) -> Self {
        let at = Point::new(x, 0.);
        self.transform(&Transform::about(&at, &Transform::reflect_horiz()))
    }
}
impl TransformTrait for Point {
    fn transform_mut(&mut self, trans: &Transform) {
        *self = trans.apply(self);
    }
}
impl TransformTrait for Vec<Point> {
    fn transform_mut(&mut self, trans: &Transform) {
        for p in self.iter_mut() {
            p.transform_mut(trans);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_then_translate() {
        let p = Point::new(1., 0.).rotated(90., Point::default()).translated(5., 5.);
        assert_eq!(p, Point::new(5., 6.));

        let trans = Transform::cascade(&Transform::translate(5., 5.), &Transform::rotate(90.));
        assert_eq!(trans.apply(&Point::new(1., 0.)), Point::new(5., 6.));
    }
    #[test]
    fn reflect_about_x_axis() {
        assert_eq!(Point::new(1., 1.).reflected(0.), Point::new(1., -1.));
        assert_eq!(Point::new(1., 1.).reflected(2.), Point::new(1., 3.));
    }
    #[test]
    fn reflect_about_y_axis() {
        assert_eq!(Point::new(1., 1.).reflected_horiz(0.), Point::new(-1., 1.));
        assert_eq!(Point::new(1., 1.).reflected_horiz(2.), Point::new(3., 1.));
        let mut p = Point::new(-3., 5.);
        p.reflect_horiz(1.).reflect_horiz(1.);
        assert_eq!(p, Point::new(-3., 5.));
        // Mirroring both ways is a half turn
        let both = Transform::cascade(&Transform::reflect_horiz(), &Transform::reflect_vert());
        assert_eq!(both.apply(&Point::new(3., 7.)), Point::new(-3., -7.));
    }
    #[test]
    fn in_place_and_copy() {
        let mut p = Point::new(2., 3.);
        let q = p.scaled(2., Point::new(1., 1.));
        // The copy leaves the original untouched
        assert_eq!(p, Point::new(2., 3.));
        assert_eq!(q, Point::new(3., 5.));
        p.scale(2., Point::new(1., 1.)).translate(-3., -5.);
        assert_eq!(p, Point::default());
    }
    #[test]
    fn quarter_turns_are_exact() {
        let mut p = Point::new(3., 7.);
        for _ in 0..4 {
            p.rotate(90., Point::default());
        }
        assert_eq!(p, Point::new(3., 7.));
        assert_eq!(Point::new(3., 7.).rotated(-90., Point::default()), Point::new(7., -3.));
        assert_eq!(Point::new(3., 7.).rotated(540., Point::default()), Point::new(-3., -7.));
    }
    #[test]
    fn test_cascade1() {
        let trans1 = Transform::reflect_vert();
        let trans2 = Transform::translate(1., 1.);

        let p = Point::new(1., 1.);
        let cascade1 = Transform::cascade(&trans1, &trans2);
        assert_eq!(p.transform(&cascade1), Point::new(2., -2.));

        let cascade2 = Transform::cascade(&trans2, &trans1);
        assert_eq!(p.transform(&cascade2), Point::new(2., 0.));
    }
    #[test]
    fn placement_order() {
        // Mirror, then scale, then rotate, then translate
        let trans = Transform::from_placement(&Point::new(10., 0.), 90., 2., true);
        assert_eq!(trans.apply(&Point::new(1., 1.)), Point::new(12., 2.));
        let by_parts = Transform::cascade(
            &Transform::translate(10., 0.),
            &Transform::cascade(
                &Transform::rotate(90.),
                &Transform::cascade(&Transform::scale(2.), &Transform::reflect_vert()),
            ),
        );
        assert_eq!(by_parts, trans);
    }
    #[test]
    fn decompose_and_invert() {
        let trans = Transform::from_placement(&Point::new(-4., 6.), 270., 0.5, true);
        let (origin, rotation, mag, refl) = trans.decompose();
        assert_eq!(origin, Point::new(-4., 6.));
        assert_eq!(rotation, 270.);
        assert_eq!(mag, 0.5);
        assert!(refl);

        let inv = trans.inverse().unwrap();
        let p = Point::new(3., -8.);
        assert_eq!(inv.apply(&trans.apply(&p)), p);
        assert!(Transform::scale(0.).inverse().is_none());

        let (_, rotation, mag, refl) = Transform::rotate(30.).decompose();
        assert!((rotation - 30.).abs() < 1e-12);
        assert!((mag - 1.).abs() < 1e-12);
        assert!(!refl);
    }
}
