//!
//! # GDSII Export
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::cell::{CellArray, CellKey, CellReference, Placement, Reference};
use crate::elements::{Boundary, Element, Path, Text};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::Point;
use crate::layout::Layout;
use crate::uniquify::uniquify;
use crate::utils::{ErrorContext, ErrorHelper, Unwrapper};
use gdswire::{GdsRecord, GdsStrans};

/// GDSII stream version written in `HEADER`
pub const GDS_VERSION: i16 = 600;
/// Maximum points per `XY` record
const MAX_XY_POINTS: usize = 8191;
/// Longest cell name many readers accept
const MAX_NAME_LEN: usize = 32;

///
/// # GDSII Exporter
///
/// Converts a [Layout] into a sequence of [GdsRecord]s.
/// Cells are written dependencies-first, under the (optionally uniquified) names
/// assigned by [uniquify].
///
pub struct GdsExporter<'lib> {
    layout: &'lib Layout,
    /// Database units per user unit
    scale: f64,
    /// Cells to be written, in order
    order: Vec<CellKey>,
    /// Names assigned to each written cell
    names: HashMap<CellKey, String>,
    ctx: Vec<ErrorContext>,
}
impl<'lib> GdsExporter<'lib> {
    /// Export `layout` to a vector of records
    pub fn export(layout: &'lib Layout) -> LayoutResult<Vec<GdsRecord>> {
        let mut me = Self::new(layout)?;
        me.export_lib()
    }
    fn new(layout: &'lib Layout) -> LayoutResult<Self> {
        let order = layout.cell_order()?;
        let original = order
            .iter()
            .map(|k| Ok(layout.cell(*k)?.name.clone()))
            .collect::<LayoutResult<Vec<String>>>()?;
        let assigned = if layout.config.uniquify {
            uniquify(&original)
        } else {
            original
        };
        for name in assigned.iter().filter(|n| n.len() > MAX_NAME_LEN) {
            warn!("Cell name `{}` exceeds {} characters", name, MAX_NAME_LEN);
        }
        let names = order.iter().copied().zip(assigned.into_iter()).collect();
        Ok(Self {
            layout,
            scale: layout.db_scale(),
            order,
            names,
            ctx: vec![ErrorContext::Library(layout.name.clone())],
        })
    }
    fn export_lib(&mut self) -> LayoutResult<Vec<GdsRecord>> {
        let units = self.layout.units();
        let mut records = vec![
            GdsRecord::Header {
                version: GDS_VERSION,
            },
            GdsRecord::BgnLib {
                dates: self.layout.dates.encode(),
            },
            GdsRecord::LibName(self.layout.name.clone()),
            GdsRecord::Units(units.0, units.1),
        ];
        let order = self.order.clone();
        for key in order {
            self.export_cell(key, &mut records)?;
        }
        records.push(GdsRecord::EndLib);
        info!(
            "Exported library `{}`: {} cells, {} records",
            self.layout.name,
            self.order.len(),
            records.len()
        );
        Ok(records)
    }
    fn export_cell(&mut self, key: CellKey, records: &mut Vec<GdsRecord>) -> LayoutResult<()> {
        let layout = self.layout;
        let cell = layout.cell(key)?;
        let name = self.name(key)?;
        self.ctx.push(ErrorContext::Cell(name.clone()));
        debug!("Writing cell `{}`", name);
        records.push(GdsRecord::BgnStruct {
            dates: cell.dates.encode(),
        });
        records.push(GdsRecord::StructName(name));
        for elem in cell.elements.iter() {
            self.ctx.push(ErrorContext::Element(elem.kind()));
            match elem {
                Element::Boundary(b) => self.export_boundary(b, records)?,
                Element::Path(p) => self.export_path(p, records)?,
                Element::Text(t) => self.export_text(t, records)?,
            }
            self.ctx.pop();
        }
        for r in cell.references() {
            match r {
                Reference::Cell(r) => self.export_reference(r, records)?,
                Reference::Array(a) => self.export_array(a, records)?,
            }
        }
        records.push(GdsRecord::EndStruct);
        self.ctx.pop();
        Ok(())
    }
    /// Boundaries longer than a single `XY` record are split across several
    fn export_boundary(&self, b: &Boundary, records: &mut Vec<GdsRecord>) -> LayoutResult<()> {
        records.push(GdsRecord::Boundary);
        records.push(GdsRecord::Layer(b.layer.layer));
        records.push(GdsRecord::DataType(b.layer.datatype));
        for chunk in b.points().chunks(MAX_XY_POINTS) {
            records.push(GdsRecord::Xy(self.points(chunk)?));
        }
        records.push(GdsRecord::EndElement);
        Ok(())
    }
    fn export_path(&self, p: &Path, records: &mut Vec<GdsRecord>) -> LayoutResult<()> {
        records.push(GdsRecord::Path);
        records.push(GdsRecord::Layer(p.layer.layer));
        records.push(GdsRecord::DataType(p.layer.datatype));
        records.push(GdsRecord::PathType(p.pathtype));
        records.push(GdsRecord::Width(self.coord(p.width)?));
        if let Some(ext) = p.begin_extension {
            records.push(GdsRecord::BeginExtn(self.coord(ext)?));
        }
        if let Some(ext) = p.end_extension {
            records.push(GdsRecord::EndExtn(self.coord(ext)?));
        }
        records.push(GdsRecord::Xy(self.points(p.points())?));
        records.push(GdsRecord::EndElement);
        Ok(())
    }
    fn export_text(&self, t: &Text, records: &mut Vec<GdsRecord>) -> LayoutResult<()> {
        records.push(GdsRecord::Text);
        records.push(GdsRecord::Layer(t.layer.layer));
        records.push(GdsRecord::TextType(t.layer.datatype));
        records.push(GdsRecord::Presentation(0, t.anchor.bits()));
        records.extend(strans(t.x_reflection, t.magnification, t.rotation));
        records.push(GdsRecord::Xy(self.points(&[t.position])?));
        records.push(GdsRecord::String(t.string.clone()));
        records.push(GdsRecord::EndElement);
        Ok(())
    }
    fn export_reference(
        &mut self,
        r: &CellReference,
        records: &mut Vec<GdsRecord>,
    ) -> LayoutResult<()> {
        let name = self.name(r.cell)?;
        self.ctx.push(ErrorContext::Reference(name.clone()));
        records.push(GdsRecord::StructRef);
        records.push(GdsRecord::StructRefName(name));
        records.extend(placement_strans(&r.placement));
        records.push(GdsRecord::Xy(self.points(&[r.placement.origin])?));
        records.push(GdsRecord::EndElement);
        self.ctx.pop();
        Ok(())
    }
    ///
    /// Arrays are written as their origin plus two displacement points:
    /// the origin shifted by `cols` column-pitches, and by `rows` row-pitches,
    /// each mirrored and rotated with the placement.
    ///
    fn export_array(&mut self, a: &CellArray, records: &mut Vec<GdsRecord>) -> LayoutResult<()> {
        let name = self.name(a.cell)?;
        self.ctx.push(ErrorContext::Array(name.clone()));
        let cols = i16::try_from(a.cols).unwrapper(&*self, "Too many array columns")?;
        let rows = i16::try_from(a.rows).unwrapper(&*self, "Too many array rows")?;
        let (col, row) = a.spacing.vectors();
        let orient = a.placement.orientation();
        let origin = a.placement.origin;
        let pcol = origin + orient.apply_linear(&col.times(a.cols as f64));
        let prow = origin + orient.apply_linear(&row.times(a.rows as f64));

        records.push(GdsRecord::ArrayRef);
        records.push(GdsRecord::StructRefName(name));
        records.extend(placement_strans(&a.placement));
        records.push(GdsRecord::ColRow { cols, rows });
        records.push(GdsRecord::Xy(self.points(&[origin, pcol, prow])?));
        records.push(GdsRecord::EndElement);
        self.ctx.pop();
        Ok(())
    }
    /// Assigned name of cell `key`
    fn name(&self, key: CellKey) -> LayoutResult<String> {
        let name = self.names.get(&key).cloned();
        self.unwrap(name, format!("Referenced cell {:?} is not part of the layout", key))
    }
    /// Convert a user-unit distance to database units, rounding half away from zero
    fn coord(&self, val: f64) -> LayoutResult<i32> {
        let db = (val * self.scale).round();
        if !db.is_finite() || db > i32::MAX as f64 || db < i32::MIN as f64 {
            return self.fail(format!("Coordinate {} out of database range", val));
        }
        Ok(db as i32)
    }
    /// Convert and flatten a slice of [Point]s
    fn points(&self, pts: &[Point]) -> LayoutResult<Vec<i32>> {
        let mut xy = Vec::with_capacity(2 * pts.len());
        for p in pts {
            xy.push(self.coord(p.x)?);
            xy.push(self.coord(p.y)?);
        }
        Ok(xy)
    }
}
impl ErrorHelper for GdsExporter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Geometry(format!("{} ({:?})", msg.into(), self.ctx))
    }
}

/// `STRANS` and its `MAG` and `ANGLE` followers, each only if needed
fn strans(x_reflection: bool, magnification: f64, rotation: f64) -> Vec<GdsRecord> {
    if !x_reflection && magnification == 1.0 && rotation == 0.0 {
        return Vec::new();
    }
    GdsStrans {
        reflected: x_reflection,
        abs_mag: false,
        abs_angle: false,
        mag: (magnification != 1.0).then(|| magnification),
        angle: (rotation != 0.0).then(|| rotation),
    }
    .to_records()
}
fn placement_strans(p: &Placement) -> Vec<GdsRecord> {
    if !p.has_strans() {
        return Vec::new();
    }
    strans(p.x_reflection, p.magnification, p.rotation)
}
