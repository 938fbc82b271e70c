//!
//! # Layout Library
//!
//! The [Layout] owns every [Cell] in a slot-map arena, and tracks which of them
//! are registered members. All reference edges pass through [Layout::add_reference],
//! keeping the reference graph acyclic.
//!

// Std-Lib
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// Crates.io
use derive_more::{Add, AddAssign};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// Local imports
use crate::bbox::{BoundBox, BoundBoxTrait};
use crate::cell::{Cell, CellArray, CellKey, CellReference, Placement, Reference, Spacing};
use crate::config::LayoutConfig;
use crate::elements::{Boundary, Element, ElementTrait, LayerSpec, Path, Text};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::{Point, Transform, TransformTrait};
use crate::utils::{DepOrder, DepOrderer};
use gdswire::{GdsDateTimes, GdsUnits};

/// # Flattening Options
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FlattenOptions {
    /// Levels of hierarchy to resolve. `None` resolves all of them.
    pub depth: Option<usize>,
    /// Include [Text] elements
    pub text: bool,
}
impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            depth: None,
            text: true,
        }
    }
}

/// # Layout Summary Stats
///
/// Numbers of cells, elements, and references,
/// over the member cells and everything they reference.
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Add, AddAssign)]
pub struct LayoutStats {
    pub cells: usize,
    pub boundaries: usize,
    pub paths: usize,
    pub texts: usize,
    pub cell_refs: usize,
    pub arrays: usize,
}
impl LayoutStats {
    fn of(cell: &Cell) -> Self {
        let mut stats = Self {
            cells: 1,
            ..Default::default()
        };
        for elem in cell.elements.iter() {
            match elem {
                Element::Boundary(_) => stats.boundaries += 1,
                Element::Path(_) => stats.paths += 1,
                Element::Text(_) => stats.texts += 1,
            }
        }
        for r in cell.references() {
            match r {
                Reference::Cell(_) => stats.cell_refs += 1,
                Reference::Array(_) => stats.arrays += 1,
            }
        }
        stats
    }
}

///
/// # Layout
///
/// A GDSII library: named, with global units, holding a set of [Cell]s.
///
/// Cells live in an arena and are addressed by [CellKey].
/// Removing a cell un-registers it, but its key remains valid,
/// so it may still be referenced or re-added.
///
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Library Name
    pub name: String,
    /// User unit, in meters
    pub unit: f64,
    /// Database unit, in meters
    pub precision: f64,
    /// Library modification and access times
    pub dates: GdsDateTimes,
    pub config: LayoutConfig,
    /// Cell arena
    cells: SlotMap<CellKey, Cell>,
    /// Registered members, in order of addition
    members: IndexSet<CellKey>,
    /// Name lookup. Last registered wins.
    names: IndexMap<String, CellKey>,
}
impl Default for Layout {
    fn default() -> Self {
        Self::new("library")
    }
}
impl Layout {
    /// Create a new and empty [Layout], with 1µm user units and 1nm database units
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_units(name, 1e-6, 1e-9)
    }
    /// Create a new and empty [Layout] with `unit` and `precision`, both in meters
    pub fn with_units(name: impl Into<String>, unit: f64, precision: f64) -> Self {
        Self {
            name: name.into(),
            unit,
            precision,
            dates: GdsDateTimes::default(),
            config: LayoutConfig::default(),
            cells: SlotMap::with_key(),
            members: IndexSet::new(),
            names: IndexMap::new(),
        }
    }
    /// Database units per user unit.
    /// Snapped to the nearest integer when within floating-point noise of it.
    pub fn db_scale(&self) -> f64 {
        let scale = self.unit / self.precision;
        let rounded = scale.round();
        if rounded != 0.0 && ((scale - rounded) / rounded).abs() < 1e-9 {
            rounded
        } else {
            scale
        }
    }
    /// Our units, as written to GDSII
    pub fn units(&self) -> GdsUnits {
        GdsUnits::new(self.unit, self.precision)
    }
    /// Move `cell` into the arena, without registering it as a member
    pub fn insert(&mut self, cell: Cell) -> CellKey {
        self.cells.insert(cell)
    }
    /// Move `cell` into the arena, and register it as a member
    pub fn add(&mut self, cell: Cell) -> CellKey {
        let key = self.cells.insert(cell);
        self.register(key);
        key
    }
    /// Register an existing arena cell as a member, e.g. after [Layout::remove]
    pub fn add_key(&mut self, key: CellKey) -> LayoutResult<()> {
        self.cell(key)?;
        self.register(key);
        Ok(())
    }
    fn register(&mut self, key: CellKey) {
        let name = self.cells[key].name.clone();
        if let Some(prev) = self.names.get(&name) {
            if *prev != key && self.members.contains(prev) {
                warn!("Cell name `{}` registered more than once", name);
            }
        }
        self.members.insert(key);
        self.names.insert(name, key);
    }
    /// Un-register cell `key`. Returns whether it was a member.
    /// The cell itself stays in the arena, so references to it remain valid.
    pub fn remove(&mut self, key: CellKey) -> bool {
        if !self.members.shift_remove(&key) {
            return false;
        }
        let stale: Vec<String> = self
            .names
            .iter()
            .filter(|(_, k)| **k == key)
            .map(|(n, _)| n.clone())
            .collect();
        for name in stale {
            self.names.shift_remove(&name);
            // Fall back to the most recent remaining member of the same name
            let other = self
                .members
                .iter()
                .rev()
                .find(|k| self.cells[**k].name == name)
                .copied();
            if let Some(other) = other {
                self.names.insert(name, other);
            }
        }
        true
    }
    /// Boolean indication of whether `key` is a registered member
    pub fn contains(&self, key: CellKey) -> bool {
        self.members.contains(&key)
    }
    /// Member keys, in order of registration
    pub fn members(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.members.iter().copied()
    }
    pub fn cell(&self, key: CellKey) -> LayoutResult<&Cell> {
        self.cells
            .get(key)
            .ok_or_else(|| LayoutError::InvalidCell(format!("{:?}", key)))
    }
    pub fn cell_mut(&mut self, key: CellKey) -> LayoutResult<&mut Cell> {
        self.cells
            .get_mut(key)
            .ok_or_else(|| LayoutError::InvalidCell(format!("{:?}", key)))
    }
    /// Find the member cell named `name`. The most recently registered wins.
    pub fn cell_named(&self, name: &str) -> Option<CellKey> {
        if let Some(key) = self.names.get(name) {
            if self.members.contains(key) && self.cells[*key].name == name {
                return Some(*key);
            }
        }
        // Cells renamed after registration
        self.members
            .iter()
            .rev()
            .find(|k| self.cells[**k].name == name)
            .copied()
    }
    /// Add a [Reference] from cell `parent`.
    /// Fails with [LayoutError::Cycle] if the referenced cell reaches `parent`,
    /// including when it *is* `parent`.
    pub fn add_reference(&mut self, parent: CellKey, r: impl Into<Reference>) -> LayoutResult<()> {
        let r = r.into();
        let child = r.cell();
        let parent_name = &self.cell(parent)?.name;
        let child_name = &self.cell(child)?.name;
        if self.reaches(child, parent) {
            return Err(LayoutError::Cycle {
                parent: parent_name.clone(),
                child: child_name.clone(),
            });
        }
        self.cell_mut(parent)?.push_reference(r);
        Ok(())
    }
    /// Add a single placed instance of `child` to `parent`
    pub fn add_instance(
        &mut self,
        parent: CellKey,
        child: CellKey,
        placement: Placement,
    ) -> LayoutResult<()> {
        self.add_reference(parent, CellReference::new(child, placement))
    }
    /// Add a `cols` x `rows` array of `child` to `parent`
    pub fn add_array(
        &mut self,
        parent: CellKey,
        child: CellKey,
        cols: u16,
        rows: u16,
        spacing: Spacing,
        placement: Placement,
    ) -> LayoutResult<()> {
        let arr = CellArray::new(child, cols, rows, spacing, placement)?;
        self.add_reference(parent, arr)
    }
    /// Boolean indication of whether `to` is reachable from `from`, or is `from`
    pub fn reaches(&self, from: CellKey, to: CellKey) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(key) = stack.pop() {
            if key == to {
                return true;
            }
            if !visited.insert(key) {
                continue;
            }
            if let Some(cell) = self.cells.get(key) {
                stack.extend(cell.references().iter().map(Reference::cell));
            }
        }
        false
    }
    /// Members and every cell they reference, directly or not, in depth-first order
    fn reachable(&self) -> Vec<CellKey> {
        let mut rv = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<CellKey> = self.members.iter().rev().copied().collect();
        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                continue;
            }
            rv.push(key);
            if let Some(cell) = self.cells.get(key) {
                stack.extend(cell.references().iter().rev().map(Reference::cell));
            }
        }
        rv
    }
    /// Member cells not referenced by any cell reachable from the members
    pub fn top_level(&self) -> Vec<CellKey> {
        let mut targets = HashSet::new();
        for key in self.reachable() {
            for r in self.cells[key].references() {
                targets.insert(r.cell());
            }
        }
        self.members
            .iter()
            .filter(|k| !targets.contains(*k))
            .copied()
            .collect()
    }
    /// Every cell referenced by `key`, directly or not, dependencies first
    pub fn dependencies(&self, key: CellKey) -> LayoutResult<Vec<CellKey>> {
        let mut order = CellOrder(self).order(&[key])?;
        order.pop();
        Ok(order)
    }
    /// Copy cell `key` and everything it references, directly or not.
    ///
    /// The copy of `key` is named `name` and registered as a member.
    /// Each copied dependency is named with `suffix` appended, and lives in the arena only.
    /// References among the copies point at the copies; the originals are unchanged.
    pub fn deep_copy(
        &mut self,
        key: CellKey,
        name: impl Into<String>,
        suffix: &str,
    ) -> LayoutResult<CellKey> {
        let mut copies: HashMap<CellKey, CellKey> = HashMap::new();
        for dep in self.dependencies(key)? {
            let mut cell = self.cell(dep)?.clone();
            cell.name = format!("{}{}", cell.name, suffix);
            cell.retarget_references(&copies);
            copies.insert(dep, self.insert(cell));
        }
        let mut root = self.cell(key)?.clone();
        root.name = name.into();
        root.retarget_references(&copies);
        debug!(
            "Copied cell `{}` to `{}`, with {} dependencies",
            self.cells[key].name,
            root.name,
            copies.len()
        );
        Ok(self.add(root))
    }
    /// Members and their dependencies, dependencies first.
    /// The order in which cells are written.
    pub fn cell_order(&self) -> LayoutResult<Vec<CellKey>> {
        let members: Vec<CellKey> = self.members().collect();
        CellOrder(self).order(&members)
    }
    /// Bounding box of cell `key`, including everything it references.
    /// `None` for cells with no content, and for invalid keys.
    pub fn bounding_box(&self, key: CellKey) -> Option<BoundBox> {
        let mut cache = HashMap::new();
        self.bbox_cached(key, &mut cache).into_option()
    }
    fn bbox_cached(&self, key: CellKey, cache: &mut HashMap<CellKey, BoundBox>) -> BoundBox {
        if let Some(bbox) = cache.get(&key) {
            return *bbox;
        }
        let cell = match self.cells.get(key) {
            Some(cell) => cell,
            None => return BoundBox::empty(),
        };
        let mut bbox = BoundBox::empty();
        for elem in cell.elements.iter() {
            bbox = elem.union(&bbox);
        }
        for r in cell.references() {
            let child = self.bbox_cached(r.cell(), cache);
            if child.is_empty() {
                continue;
            }
            for trans in r.extreme_instances() {
                bbox = child.transform(&trans).union(&bbox);
            }
        }
        cache.insert(key, bbox);
        bbox
    }
    /// Bounding box of all top-level cells
    pub fn bbox(&self) -> Option<BoundBox> {
        let mut cache = HashMap::new();
        let mut bbox = BoundBox::empty();
        for key in self.top_level() {
            bbox = self.bbox_cached(key, &mut cache).union(&bbox);
        }
        bbox.into_option()
    }
    ///
    /// Flatten cell `key` into a new [Cell] of the same name.
    ///
    /// References are replaced by transformed copies of their cells' elements,
    /// down to `options.depth` levels. References below that depth are kept,
    /// with placements composed through the levels above.
    /// The source cell is left unmodified.
    ///
    pub fn flatten(&self, key: CellKey, options: &FlattenOptions) -> LayoutResult<Cell> {
        let src = self.cell(key)?;
        let mut dest = Cell::new(src.name.clone());
        dest.dates = src.dates.clone();
        self.flatten_into(src, &Transform::identity(), options.depth, options, &mut dest)?;
        Ok(dest)
    }
    fn flatten_into(
        &self,
        cell: &Cell,
        trans: &Transform,
        depth: Option<usize>,
        options: &FlattenOptions,
        dest: &mut Cell,
    ) -> LayoutResult<()> {
        let identity = *trans == Transform::identity();
        for elem in cell.elements.iter() {
            if !options.text && matches!(elem, Element::Text(_)) {
                continue;
            }
            if identity {
                dest.elements.push(elem.clone());
            } else {
                dest.elements.push(elem.transform(trans));
            }
        }
        for r in cell.references() {
            if depth == Some(0) {
                let mut r = r.clone();
                if !identity {
                    r.compose(trans);
                }
                dest.push_reference(r);
                continue;
            }
            let child = self.cell(r.cell())?;
            for inst in r.instances() {
                let t = Transform::cascade(trans, &inst);
                self.flatten_into(child, &t, depth.map(|d| d - 1), options, dest)?;
            }
        }
        Ok(())
    }
    /// Total drawn area of cell `key`, over all layers.
    /// Overlaps are counted repeatedly.
    pub fn area(&self, key: CellKey) -> LayoutResult<f64> {
        Ok(self.area_by_layer(key)?.values().sum())
    }
    /// Drawn area of cell `key`, per layer
    pub fn area_by_layer(&self, key: CellKey) -> LayoutResult<BTreeMap<LayerSpec, f64>> {
        let flat = self.flatten(key, &FlattenOptions::default())?;
        let mut rv = BTreeMap::new();
        for elem in flat.elements.iter() {
            if let Element::Text(_) = elem {
                continue;
            }
            *rv.entry(elem.layer_spec()).or_insert(0.0) += elem.area();
        }
        Ok(rv)
    }
    /// Every [LayerSpec] used by cell `key` and its dependencies
    pub fn layers(&self, key: CellKey) -> LayoutResult<BTreeSet<LayerSpec>> {
        let mut rv = BTreeSet::new();
        let mut keys = self.dependencies(key)?;
        keys.push(key);
        for k in keys {
            for elem in self.cell(k)?.elements.iter() {
                rv.insert(elem.layer_spec());
            }
        }
        Ok(rv)
    }
    ///
    /// Flattened outlines of cell `key`, grouped by layer.
    ///
    /// Boundaries contribute their points, paths their [Path::to_boundary] outlines.
    /// Text and zero-width paths contribute nothing.
    ///
    pub fn polygons(&self, key: CellKey) -> LayoutResult<BTreeMap<LayerSpec, Vec<Vec<Point>>>> {
        let options = FlattenOptions {
            depth: None,
            text: false,
        };
        let flat = self.flatten(key, &options)?;
        let mut rv: BTreeMap<LayerSpec, Vec<Vec<Point>>> = BTreeMap::new();
        for elem in flat.elements.iter() {
            let pts = match elem {
                Element::Boundary(b) => b.points().to_vec(),
                Element::Path(p) if p.width > 0.0 => p.to_boundary()?.points().to_vec(),
                Element::Path(_) => {
                    debug!("Skipping zero-width path in `{}`", flat.name);
                    continue;
                }
                Element::Text(_) => continue,
            };
            rv.entry(elem.layer_spec()).or_default().push(pts);
        }
        Ok(rv)
    }
    /// Summary statistics over the members and their dependencies
    pub fn stats(&self) -> LayoutStats {
        let mut stats = LayoutStats::default();
        for key in self.reachable() {
            stats += LayoutStats::of(&self.cells[key]);
        }
        stats
    }
    /// Create a [Boundary] on the configured default layer
    pub fn boundary(&self, points: impl Into<Vec<Point>>) -> LayoutResult<Boundary> {
        Boundary::new(points, self.config.defaults)
    }
    /// Create a [Path] on the configured default layer
    pub fn path(&self, points: impl Into<Vec<Point>>, width: f64) -> LayoutResult<Path> {
        Path::new(points, width, self.config.defaults)
    }
    /// Create a [Text] on the configured default layer
    pub fn text(&self, string: impl Into<String>, position: Point) -> Text {
        Text::new(string, position, self.config.defaults)
    }
}

/// Dependency-ordering view of a [Layout]'s reference graph
struct CellOrder<'a>(&'a Layout);
impl DepOrder for CellOrder<'_> {
    type Item = CellKey;
    type Error = LayoutError;

    fn process(&self, item: &CellKey, orderer: &mut DepOrderer<Self>) -> LayoutResult<()> {
        for r in self.0.cell(*item)?.references() {
            orderer.push(&r.cell())?;
        }
        Ok(())
    }
    fn fail(&self, item: &CellKey) -> LayoutError {
        let name = self
            .0
            .cells
            .get(*item)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        LayoutError::Cycle {
            parent: name.clone(),
            child: name,
        }
    }
}
