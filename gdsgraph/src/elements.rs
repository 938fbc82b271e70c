//!
//! # Layout Elements
//!
//! The drawing primitives held by each [crate::Cell]:
//! [Boundary] polygons, [Path]s, and [Text] labels,
//! plus the [Element] enum over all three.
//!

// Crates.io
use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::bbox::{BoundBox, BoundBoxTrait};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Point, Transform, TransformTrait};
use crate::utils::{enumstr, EnumStr};

/// Maximum number of points in a [Path], the capacity of a single XY record
pub const MAX_PATH_POINTS: usize = 8191;

/// # Layer Specification
/// The (layer, datatype) pair carried by every element.
/// For [Text], `datatype` is the GDSII "texttype".
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
pub struct LayerSpec {
    pub layer: i16,
    pub datatype: i16,
}
impl LayerSpec {
    pub fn new(layer: i16, datatype: i16) -> Self {
        Self { layer, datatype }
    }
}

/// Remove consecutive duplicates, and any closing repeat of the first point
fn open_outline(pts: &[Point]) -> Vec<Point> {
    let mut rv: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts {
        if rv.last() != Some(p) {
            rv.push(*p);
        }
    }
    while rv.len() > 1 && rv.first() == rv.last() {
        rv.pop();
    }
    rv
}

/// # Boundary
///
/// Closed polygon on a single layer.
/// Stored closed: the last point always repeats the first.
/// Self-intersection is not checked.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Boundary {
    pub layer: LayerSpec,
    points: Vec<Point>,
}
impl Boundary {
    /// Create a new [Boundary].
    /// Fails if `points` has fewer than three distinct vertices.
    /// Closes the outline if it is not already closed.
    pub fn new(points: impl Into<Vec<Point>>, layer: LayerSpec) -> LayoutResult<Self> {
        let mut points = points.into();
        if open_outline(&points).len() < 3 {
            return LayoutError::fail_geom(format!(
                "Boundary requires at least three distinct points, got {:?}",
                points
            ));
        }
        if points.first() != points.last() {
            points.push(points[0]);
        }
        Ok(Self { layer, points })
    }
    /// Create an axis-aligned rectangle from opposite corners
    pub fn rect(p0: Point, p1: Point, layer: LayerSpec) -> LayoutResult<Self> {
        let b = BoundBox::from_corners(p0, p1);
        Self::new(b.corners().to_vec(), layer)
    }
    /// Our (closed) outline
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    /// Signed area: positive for counter-clockwise outlines
    pub fn signed_area(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
            .sum::<f64>()
            / 2.0
    }
    /// Convert to a [Path] of `width` tracing our outline
    pub fn to_path(&self, width: f64) -> LayoutResult<Path> {
        Path::new(self.points.clone(), width, self.layer)
    }
}
impl TransformTrait for Boundary {
    fn transform_mut(&mut self, trans: &Transform) {
        self.points.transform_mut(trans);
    }
}

/// GDSII path end-styles. Stored and written unmodified, interpreted only by [Path::to_boundary].
pub mod pathtype {
    /// Square end, flush with the final point
    pub const FLUSH: i16 = 0;
    /// Round end
    pub const ROUND: i16 = 1;
    /// Square end, extended by half the width
    pub const HALF_WIDTH: i16 = 2;
    /// Square end, extended by `begin_extension` and `end_extension`
    pub const CUSTOM: i16 = 4;
}

/// # Path
///
/// Open center-line with a width.
/// The `pathtype` end-style is carried through reading and writing unmodified.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub layer: LayerSpec,
    points: Vec<Point>,
    /// Absolute width, in user units
    pub width: f64,
    pub pathtype: i16,
    pub begin_extension: Option<f64>,
    pub end_extension: Option<f64>,
}
impl Path {
    /// Create a new [Path], with [pathtype::FLUSH] ends.
    /// Fails for fewer than two, or more than [MAX_PATH_POINTS], points,
    /// and for negative or non-finite widths.
    pub fn new(points: impl Into<Vec<Point>>, width: f64, layer: LayerSpec) -> LayoutResult<Self> {
        let points = points.into();
        if points.len() < 2 || points.len() > MAX_PATH_POINTS {
            return LayoutError::fail_geom(format!(
                "Path requires between 2 and {} points, got {}",
                MAX_PATH_POINTS,
                points.len()
            ));
        }
        if !width.is_finite() || width < 0.0 {
            return LayoutError::fail_geom(format!("Invalid Path width {}", width));
        }
        Ok(Self {
            layer,
            points,
            width,
            pathtype: pathtype::FLUSH,
            begin_extension: None,
            end_extension: None,
        })
    }
    /// Set the end-style
    pub fn with_pathtype(mut self, pathtype: i16) -> Self {
        self.pathtype = pathtype;
        self
    }
    /// Set custom end-extensions, and the matching [pathtype::CUSTOM] end-style
    pub fn with_extensions(mut self, begin: f64, end: f64) -> Self {
        self.pathtype = pathtype::CUSTOM;
        self.begin_extension = Some(begin);
        self.end_extension = Some(end);
        self
    }
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    /// Total center-line length
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].dist(&w[1])).sum()
    }
    /// Extensions at the (begin, end) implied by our end-style
    fn extensions(&self) -> (f64, f64) {
        match self.pathtype {
            pathtype::HALF_WIDTH => (self.width / 2.0, self.width / 2.0),
            pathtype::CUSTOM => (
                self.begin_extension.unwrap_or(0.0),
                self.end_extension.unwrap_or(0.0),
            ),
            _ => (0.0, 0.0),
        }
    }
    ///
    /// Convert to a [Boundary] outlining the path.
    ///
    /// Corners are mitered. Ends are square, extended per our `pathtype`;
    /// round ends are approximated as flush.
    /// Fails for zero-width paths and paths without two distinct points.
    ///
    pub fn to_boundary(&self) -> LayoutResult<Boundary> {
        let mut pts: Vec<Point> = Vec::with_capacity(self.points.len());
        for p in self.points.iter() {
            if pts.last() != Some(p) {
                pts.push(*p);
            }
        }
        if pts.len() < 2 || self.width <= 0.0 {
            return LayoutError::fail_geom("Path has no outline");
        }
        let unit = |a: &Point, b: &Point| {
            let d = b.dist(a);
            Point::new((b.x - a.x) / d, (b.y - a.y) / d)
        };
        // Apply the end extensions along the first and last segments
        let (begin, end) = self.extensions();
        let n = pts.len();
        let d0 = unit(&pts[0], &pts[1]);
        pts[0] = pts[0] - d0.times(begin);
        let d1 = unit(&pts[n - 2], &pts[n - 1]);
        pts[n - 1] = pts[n - 1] + d1.times(end);

        let half = self.width / 2.0;
        let normal = |d: &Point| Point::new(-d.y, d.x);
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        for i in 0..n {
            let offset = if i == 0 {
                normal(&unit(&pts[0], &pts[1])).times(half)
            } else if i == n - 1 {
                normal(&unit(&pts[n - 2], &pts[n - 1])).times(half)
            } else {
                let n1 = normal(&unit(&pts[i - 1], &pts[i]));
                let n2 = normal(&unit(&pts[i], &pts[i + 1]));
                let sum = n1 + n2;
                let len = sum.dist(&Point::default());
                if len < 1e-9 {
                    // Reversal; no meaningful miter
                    n1.times(half)
                } else {
                    let m = sum.times(1.0 / len);
                    let cos = m.x * n1.x + m.y * n1.y;
                    m.times(half / cos)
                }
            };
            left.push(pts[i] + offset);
            right.push(pts[i] - offset);
        }
        right.reverse();
        left.extend(right);
        Boundary::new(left, self.layer)
    }
}
impl TransformTrait for Path {
    /// Transform the center-line. Widths and extensions scale with any magnification.
    fn transform_mut(&mut self, trans: &Transform) {
        self.points.transform_mut(trans);
        let mag = trans.det().abs().sqrt();
        self.width *= mag;
        self.begin_extension = self.begin_extension.map(|e| e * mag);
        self.end_extension = self.end_extension.map(|e| e * mag);
    }
}

enumstr!(
    /// # Text Anchor
    /// Justification of a [Text] label relative to its position.
    /// Compass-point names, with `o` the center.
    #[derive(JsonSchema)]
    Anchor {
        NorthWest: "nw",
        North: "n",
        NorthEast: "ne",
        West: "w",
        Center: "o",
        East: "e",
        SouthWest: "sw",
        South: "s",
        SouthEast: "se",
    }
);
impl Anchor {
    /// Justification bits of a GDSII PRESENTATION record.
    /// Bits 0-1 hold the horizontal (left, center, right), bits 2-3 the vertical (top, middle, bottom).
    pub fn bits(&self) -> u8 {
        match self {
            Self::NorthWest => 0,
            Self::North => 1,
            Self::NorthEast => 2,
            Self::West => 4,
            Self::Center => 5,
            Self::East => 6,
            Self::SouthWest => 8,
            Self::South => 9,
            Self::SouthEast => 10,
        }
    }
    /// Decode from PRESENTATION bits. Font bits are ignored.
    /// Returns `None` for the invalid justification values.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x0F {
            0 => Some(Self::NorthWest),
            1 => Some(Self::North),
            2 => Some(Self::NorthEast),
            4 => Some(Self::West),
            5 => Some(Self::Center),
            6 => Some(Self::East),
            8 => Some(Self::SouthWest),
            9 => Some(Self::South),
            10 => Some(Self::SouthEast),
            _ => None,
        }
    }
}
impl Default for Anchor {
    fn default() -> Self {
        Self::Center
    }
}

/// # Text Label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Text {
    pub string: String,
    pub position: Point,
    pub layer: LayerSpec,
    pub anchor: Anchor,
    /// Rotation, in degrees counter-clockwise
    pub rotation: f64,
    pub magnification: f64,
    pub x_reflection: bool,
}
impl Text {
    /// Create a new, centered, un-rotated [Text]
    pub fn new(string: impl Into<String>, position: Point, layer: LayerSpec) -> Self {
        Self {
            string: string.into(),
            position,
            layer,
            anchor: Anchor::default(),
            rotation: 0.0,
            magnification: 1.0,
            x_reflection: false,
        }
    }
    /// Set the anchor
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }
    /// Orientation as a position-less [Transform]
    fn orientation(&self) -> Transform {
        Transform::from_placement(
            &Point::default(),
            self.rotation,
            self.magnification,
            self.x_reflection,
        )
    }
}
impl TransformTrait for Text {
    /// Move the anchor point, and compose the label's orientation with that of `trans`
    fn transform_mut(&mut self, trans: &Transform) {
        self.position = trans.apply(&self.position);
        let mut linear = *trans;
        linear.b = [0., 0.];
        if linear == Transform::identity() {
            return;
        }
        let (_, rotation, magnification, x_reflection) =
            Transform::cascade(&linear, &self.orientation()).decompose();
        self.rotation = rotation;
        self.magnification = magnification;
        self.x_reflection = x_reflection;
    }
}

/// # Element Trait
///
/// Common element operations, dispatched from the [Element] enum to its variants by [enum_dispatch].
///
#[enum_dispatch]
pub trait ElementTrait {
    /// Our layer and datatype
    fn layer_spec(&self) -> LayerSpec;
    /// Our defining points. For [Text], the single anchor point.
    fn points(&self) -> &[Point];
    /// Drawn area: shoelace for boundaries, length times width for paths, zero for text.
    fn area(&self) -> f64;
}
impl ElementTrait for Boundary {
    fn layer_spec(&self) -> LayerSpec {
        self.layer
    }
    fn points(&self) -> &[Point] {
        &self.points
    }
    fn area(&self) -> f64 {
        self.signed_area().abs()
    }
}
impl ElementTrait for Path {
    fn layer_spec(&self) -> LayerSpec {
        self.layer
    }
    fn points(&self) -> &[Point] {
        &self.points
    }
    fn area(&self) -> f64 {
        self.length() * self.width
    }
}
impl ElementTrait for Text {
    fn layer_spec(&self) -> LayerSpec {
        self.layer
    }
    fn points(&self) -> &[Point] {
        std::slice::from_ref(&self.position)
    }
    fn area(&self) -> f64 {
        0.0
    }
}

/// # Element
///
/// The drawing primitives comprising each cell.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(ElementTrait)]
pub enum Element {
    Boundary(Boundary),
    Path(Path),
    Text(Text),
}
impl Element {
    /// Name of the element type, for error contexts and logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Boundary(_) => "Boundary",
            Self::Path(_) => "Path",
            Self::Text(_) => "Text",
        }
    }
}
impl TransformTrait for Element {
    fn transform_mut(&mut self, trans: &Transform) {
        match self {
            Self::Boundary(e) => e.transform_mut(trans),
            Self::Path(e) => e.transform_mut(trans),
            Self::Text(e) => e.transform_mut(trans),
        }
    }
}
/// Bounding boxes cover defining points only: path widths and text extents are excluded.
impl BoundBoxTrait for Element {
    fn bbox(&self) -> BoundBox {
        BoundBox::from_points(ElementTrait::points(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> LayoutResult<Boundary> {
        Boundary::new(
            vec![
                Point::new(0., 0.),
                Point::new(10., 0.),
                Point::new(10., 10.),
                Point::new(0., 10.),
            ],
            LayerSpec::new(1, 0),
        )
    }

    #[test]
    fn boundaries_close() -> LayoutResult<()> {
        let b = square()?;
        assert_eq!(b.points().len(), 5);
        assert_eq!(b.points()[4], Point::new(0., 0.));
        assert_eq!(ElementTrait::area(&b), 100.0);
        // Already closed outlines are left alone
        let again = Boundary::new(b.points().to_vec(), b.layer)?;
        assert_eq!(again, b);
        Ok(())
    }
    #[test]
    fn degenerate_geometry() {
        let pts = vec![Point::new(0., 0.), Point::new(1., 1.), Point::new(0., 0.)];
        assert!(matches!(
            Boundary::new(pts, LayerSpec::default()),
            Err(LayoutError::Geometry(_))
        ));
        assert!(matches!(
            Path::new(vec![Point::new(0., 0.)], 1.0, LayerSpec::default()),
            Err(LayoutError::Geometry(_))
        ));
        let many = vec![Point::default(); MAX_PATH_POINTS + 1];
        assert!(Path::new(many, 1.0, LayerSpec::default()).is_err());
        let two = vec![Point::default(), Point::new(1., 0.)];
        assert!(Path::new(two, -1.0, LayerSpec::default()).is_err());
    }
    #[test]
    fn path_outlines() -> LayoutResult<()> {
        let pts = vec![Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.)];
        let path = Path::new(pts, 2.0, LayerSpec::new(3, 0))?;
        assert_eq!(ElementTrait::area(&path), 40.0);
        let outline = path.to_boundary()?;
        let bbox = BoundBox::from_points(outline.points());
        assert_eq!(bbox, BoundBox::from_corners(Point::new(0., -1.), Point::new(11., 10.)));
        assert!((ElementTrait::area(&outline) - 40.0).abs() < 1e-9);

        let ext = path.clone().with_pathtype(pathtype::HALF_WIDTH).to_boundary()?;
        let bbox = BoundBox::from_points(ext.points());
        assert_eq!(bbox, BoundBox::from_corners(Point::new(-1., -1.), Point::new(11., 11.)));

        let zero = Path::new(path.points().to_vec(), 0.0, path.layer)?;
        assert!(zero.to_boundary().is_err());
        Ok(())
    }
    #[test]
    fn transformed_elements() -> LayoutResult<()> {
        let b = square()?.rotated(90., Point::default());
        assert_eq!(
            BoundBox::from_points(b.points()),
            BoundBox::from_corners(Point::new(-10., 0.), Point::new(0., 10.))
        );

        let pts = vec![Point::new(0., 0.), Point::new(1., 0.)];
        let path = Path::new(pts, 2.0, LayerSpec::default())?.scaled(3., Point::default());
        assert_eq!(path.width, 6.0);

        let text = Text::new("hi", Point::new(1., 0.), LayerSpec::default());
        let moved = text.rotated(90., Point::default()).reflected(0.);
        assert_eq!(moved.position, Point::new(0., -1.));
        assert!(moved.x_reflection);
        assert_eq!(moved.rotation, 270.);
        assert_eq!(moved.string, "hi");
        Ok(())
    }
    #[test]
    fn mirrored_about_vertical_line() -> LayoutResult<()> {
        let b = square()?.reflected_horiz(0.);
        assert_eq!(
            BoundBox::from_points(b.points()),
            BoundBox::from_corners(Point::new(-10., 0.), Point::new(0., 10.))
        );
        // Mirroring flips the winding
        assert_eq!(b.signed_area(), -100.0);

        let mut b = square()?;
        b.reflect_horiz(20.);
        assert_eq!(
            BoundBox::from_points(b.points()),
            BoundBox::from_corners(Point::new(30., 0.), Point::new(40., 10.))
        );

        let text = Text::new("hi", Point::new(1., 0.), LayerSpec::default()).reflected_horiz(0.);
        assert_eq!(text.position, Point::new(-1., 0.));
        assert!(text.x_reflection);
        assert_eq!(text.rotation, 180.);
        Ok(())
    }
    #[test]
    fn anchors() {
        for a in [Anchor::NorthWest, Anchor::Center, Anchor::SouthEast, Anchor::West] {
            assert_eq!(Anchor::from_bits(a.bits()), Some(a));
        }
        assert_eq!(Anchor::from_bits(0x15), Some(Anchor::Center));
        assert_eq!(Anchor::from_bits(3), None);
        assert_eq!(Anchor::from_str("o"), Some(Anchor::Center));
        assert_eq!(Anchor::SouthWest.to_string(), "sw");
    }
}
