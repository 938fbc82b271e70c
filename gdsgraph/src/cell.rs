//!
//! # Cells and the References Between Them
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use derive_builder::Builder;
use derive_more::From;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

// Local imports
use crate::elements::Element;
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Point, Transform, TransformTrait};
use gdswire::GdsDateTimes;

// Create key-types for each internal type stored in [SlotMap]s
new_key_type! {
    /// Keys for [Cell] entries
    pub struct CellKey;
}

///
/// # Placement
///
/// Location and orientation of a reference.
/// Applied to the referenced cell's contents as:
/// mirror about the x-axis (if `x_reflection`), then scale by `magnification`,
/// then rotate by `rotation` degrees counter-clockwise, then translate to `origin`.
///
#[derive(Debug, Clone, Builder, Serialize, Deserialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct Placement {
    #[builder(default)]
    pub origin: Point,
    /// Rotation, in degrees counter-clockwise
    #[builder(default)]
    pub rotation: f64,
    #[builder(default = "1.0")]
    pub magnification: f64,
    #[builder(default)]
    pub x_reflection: bool,
}
impl Placement {
    /// Create a [PlacementBuilder]
    pub fn builder() -> PlacementBuilder {
        PlacementBuilder::default()
    }
    /// Un-rotated, un-mirrored, unit-scale placement at `origin`
    pub fn at(origin: Point) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }
    /// Our full [Transform]
    pub fn transform(&self) -> Transform {
        Transform::from_placement(
            &self.origin,
            self.rotation,
            self.magnification,
            self.x_reflection,
        )
    }
    /// Our mirror and rotation, without magnification or translation.
    /// Array lattices are displaced through this.
    pub fn orientation(&self) -> Transform {
        Transform::from_placement(&Point::default(), self.rotation, 1.0, self.x_reflection)
    }
    /// Whether we require GDSII `STRANS` records
    pub fn has_strans(&self) -> bool {
        self.x_reflection || self.magnification != 1.0 || self.rotation != 0.0
    }
}
impl Default for Placement {
    fn default() -> Self {
        Self {
            origin: Point::default(),
            rotation: 0.0,
            magnification: 1.0,
            x_reflection: false,
        }
    }
}
impl TransformTrait for Placement {
    /// Compose `trans` onto our placement, i.e. apply it after we do
    fn transform_mut(&mut self, trans: &Transform) {
        let (origin, rotation, magnification, x_reflection) =
            Transform::cascade(trans, &self.transform()).decompose();
        self.origin = origin;
        self.rotation = rotation;
        self.magnification = magnification;
        self.x_reflection = x_reflection;
    }
}

/// # Cell Reference
/// Single placed instance of cell `cell`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellReference {
    pub cell: CellKey,
    pub placement: Placement,
}
impl CellReference {
    pub fn new(cell: CellKey, placement: Placement) -> Self {
        Self { cell, placement }
    }
}

/// # Array Spacing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub enum Spacing {
    /// Column pitch `dx` along x, row pitch `dy` along y
    Orthogonal(f64, f64),
    /// Arbitrary lattice, with one basis vector per column and per row
    Lattice { col: Point, row: Point },
}
impl Spacing {
    /// Column and row basis vectors
    pub fn vectors(&self) -> (Point, Point) {
        match *self {
            Self::Orthogonal(dx, dy) => (Point::new(dx, 0.), Point::new(0., dy)),
            Self::Lattice { col, row } => (col, row),
        }
    }
    /// Multiply both vectors by `k`
    pub fn scaled_by(&self, k: f64) -> Self {
        match *self {
            Self::Orthogonal(dx, dy) => Self::Orthogonal(dx * k, dy * k),
            Self::Lattice { col, row } => Self::Lattice {
                col: col.times(k),
                row: row.times(k),
            },
        }
    }
}

///
/// # Cell Array
///
/// `cols` x `rows` instances of cell `cell`.
/// Spacing vectors live in the array's local frame: they are mirrored and rotated
/// along with the placement, but never magnified.
/// Instance `(i, j)` sits at local offset `i * col + j * row`.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellArray {
    pub cell: CellKey,
    pub placement: Placement,
    pub cols: u16,
    pub rows: u16,
    pub spacing: Spacing,
}
impl CellArray {
    /// Create a new [CellArray]. Fails for zero rows or columns.
    pub fn new(
        cell: CellKey,
        cols: u16,
        rows: u16,
        spacing: Spacing,
        placement: Placement,
    ) -> LayoutResult<Self> {
        if cols == 0 || rows == 0 {
            return LayoutError::fail_geom(format!("Invalid {}x{} CellArray", cols, rows));
        }
        Ok(Self {
            cell,
            placement,
            cols,
            rows,
            spacing,
        })
    }
    /// Transform of instance (`col`, `row`)
    pub fn instance(&self, col: u16, row: u16) -> Transform {
        let (vcol, vrow) = self.spacing.vectors();
        let local = vcol.times(col as f64) + vrow.times(row as f64);
        let shift = self.placement.orientation().apply_linear(&local);
        let mut t = self.placement.transform();
        t.b[0] += shift.x;
        t.b[1] += shift.y;
        t
    }
    /// Transform of each instance, in row-major order
    pub fn instances(&self) -> Vec<Transform> {
        let mut rv = Vec::with_capacity(self.cols as usize * self.rows as usize);
        for j in 0..self.rows {
            for i in 0..self.cols {
                rv.push(self.instance(i, j));
            }
        }
        rv
    }
    /// Transforms of the (up to four) corner instances.
    /// Instance offsets are linear in (col, row), so these bound every other instance.
    pub fn corner_instances(&self) -> Vec<Transform> {
        let (c, r) = (self.cols.saturating_sub(1), self.rows.saturating_sub(1));
        let mut corners = vec![(0, 0), (c, 0), (0, r), (c, r)];
        corners.sort_unstable();
        corners.dedup();
        corners.into_iter().map(|(i, j)| self.instance(i, j)).collect()
    }
}

/// # Reference
/// Either a single [CellReference] or a [CellArray]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, From)]
pub enum Reference {
    Cell(CellReference),
    Array(CellArray),
}
impl Reference {
    /// Key of the referenced cell
    pub fn cell(&self) -> CellKey {
        match self {
            Self::Cell(r) => r.cell,
            Self::Array(a) => a.cell,
        }
    }
    pub fn placement(&self) -> &Placement {
        match self {
            Self::Cell(r) => &r.placement,
            Self::Array(a) => &a.placement,
        }
    }
    /// Transforms of each placed instance
    pub fn instances(&self) -> Vec<Transform> {
        match self {
            Self::Cell(r) => vec![r.placement.transform()],
            Self::Array(a) => a.instances(),
        }
    }
    /// Transforms of the instances at the extremes of an array,
    /// sufficient for bounding boxes
    pub fn extreme_instances(&self) -> Vec<Transform> {
        match self {
            Self::Cell(r) => vec![r.placement.transform()],
            Self::Array(a) => a.corner_instances(),
        }
    }
    /// Point at a different cell
    pub(crate) fn retarget(&mut self, key: CellKey) {
        match self {
            Self::Cell(r) => r.cell = key,
            Self::Array(a) => a.cell = key,
        }
    }
    /// Compose `trans` onto the placement.
    /// Array lattices are scaled by the magnification of `trans`,
    /// keeping every instance where `trans` puts it.
    pub fn compose(&mut self, trans: &Transform) {
        match self {
            Self::Cell(r) => r.placement.transform_mut(trans),
            Self::Array(a) => {
                let mag = trans.det().abs().sqrt();
                a.placement.transform_mut(trans);
                a.spacing = a.spacing.scaled_by(mag);
            }
        }
    }
}

///
/// # Cell
///
/// Named collection of [Element]s and [Reference]s to other cells.
/// A cell's identity is its [CellKey] within a [crate::Layout], not its name:
/// several cells may share a name.
///
/// References are added through [crate::Layout::add_reference],
/// which rejects those that would create a cycle.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub name: String,
    pub elements: Vec<Element>,
    references: Vec<Reference>,
    /// Creation and modification times
    pub dates: GdsDateTimes,
}
impl Cell {
    /// Create a new and empty [Cell]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
            references: Vec::new(),
            dates: GdsDateTimes::default(),
        }
    }
    /// Add an element
    pub fn add(&mut self, elem: impl Into<Element>) -> &mut Self {
        self.elements.push(elem.into());
        self
    }
    pub fn references(&self) -> &[Reference] {
        &self.references
    }
    /// Remove and return the reference at `idx`, if any
    pub fn remove_reference(&mut self, idx: usize) -> Option<Reference> {
        if idx < self.references.len() {
            Some(self.references.remove(idx))
        } else {
            None
        }
    }
    /// Remove all references
    pub fn clear_references(&mut self) {
        self.references.clear();
    }
    /// Boolean indication of no content
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.references.is_empty()
    }
    /// Append a reference, unchecked. Callers ensure no cycle results.
    pub(crate) fn push_reference(&mut self, r: Reference) {
        self.references.push(r);
    }
    /// Point each reference found in `map` at its replacement
    pub(crate) fn retarget_references(&mut self, map: &HashMap<CellKey, CellKey>) {
        for r in self.references.iter_mut() {
            if let Some(key) = map.get(&r.cell()) {
                r.retarget(*key);
            }
        }
    }
}
impl TransformTrait for Cell {
    /// Transform all elements, and compose `trans` onto each reference
    fn transform_mut(&mut self, trans: &Transform) {
        for elem in self.elements.iter_mut() {
            elem.transform_mut(trans);
        }
        for r in self.references.iter_mut() {
            r.compose(trans);
        }
    }
}
