//!
//! # GDSII Import
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::cell::{Cell, CellArray, CellKey, CellReference, Placement, Reference, Spacing};
use crate::config::ImportOptions;
use crate::elements::{Anchor, Boundary, Element, LayerSpec, Path, Text};
use crate::error::{LayoutError, LayoutResult};
use crate::geom::Point;
use crate::layout::Layout;
use crate::utils::{ErrorContext, ErrorHelper, Unwrapper};
use gdswire::{GdsDateTimes, GdsError, GdsReader, GdsRecord, GdsStrans};

/// Reference awaiting resolution of its target name
struct PendingRef {
    parent: CellKey,
    name: String,
    /// Offset of the `SNAME` record
    offset: usize,
    reference: Reference,
}

/// Records collected between an element's opening record and its `ENDEL`
#[derive(Default)]
struct ElementRecords {
    layer: Option<i16>,
    datatype: Option<i16>,
    texttype: Option<i16>,
    pathtype: Option<i16>,
    width: Option<i32>,
    begin_extn: Option<i32>,
    end_extn: Option<i32>,
    xy: Vec<i32>,
    string: Option<String>,
    presentation: Option<(u8, u8)>,
    strans: Option<GdsStrans>,
    sname: Option<(String, usize)>,
    colrow: Option<(i16, i16)>,
}

///
/// # GDSII Importer
///
/// Builds a [Layout] in a single forward pass over a GDSII stream.
/// Cells are added as their `ENDSTR` records arrive.
/// References are collected by target name, and resolved once the whole library
/// has been read, so they may point forward in the stream.
///
/// Any failure is a [LayoutError::Format] at the byte offset of the offending record.
///
pub struct GdsImporter<'opt> {
    options: &'opt ImportOptions,
    layout: Layout,
    /// Database units per user unit
    scale: f64,
    /// Offset of the most recent record
    offset: usize,
    pending: Vec<PendingRef>,
    /// Record types skipped so far, each logged once
    skipped: HashSet<u8>,
    ctx: Vec<ErrorContext>,
}
impl<'opt> GdsImporter<'opt> {
    /// Import the GDSII stream `bytes`, remapping per `options`
    pub fn import(bytes: &[u8], options: &'opt ImportOptions) -> LayoutResult<Layout> {
        let layout = Layout::default();
        let mut me = Self {
            options,
            scale: layout.db_scale(),
            layout,
            offset: 0,
            pending: Vec::new(),
            skipped: HashSet::new(),
            ctx: Vec::new(),
        };
        let mut rdr = GdsReader::new(bytes);
        me.import_lib(&mut rdr)?;
        me.resolve()?;
        info!(
            "Read library `{}`: {} records, {} cells",
            me.layout.name,
            rdr.numread(),
            me.layout.members().count()
        );
        Ok(me.layout)
    }
    /// Read the next record, failing at end of stream
    fn next(&mut self, rdr: &mut GdsReader) -> LayoutResult<GdsRecord> {
        if rdr.at_end() {
            self.offset = rdr.pos();
            return self.fail("Unexpected end of stream");
        }
        match rdr.read_record() {
            Ok((offset, record)) => {
                self.offset = offset;
                Ok(record)
            }
            Err(e) => Err(self.wrap(e)),
        }
    }
    /// Convert a record-level error, attaching our context
    fn wrap(&self, e: GdsError) -> LayoutError {
        match LayoutError::from(e) {
            LayoutError::Format {
                message, offset, ..
            } => LayoutError::Format {
                message,
                offset,
                stack: self.ctx.clone(),
            },
            other => other,
        }
    }
    /// Skip a record we do not model. Fails for modeled records out of place.
    fn skip(&mut self, record: GdsRecord) -> LayoutResult<()> {
        match record {
            GdsRecord::Other { .. }
            | GdsRecord::ElemFlags(..)
            | GdsRecord::Plex(_)
            | GdsRecord::PropAttr(_)
            | GdsRecord::PropValue(_) => {
                self.note_skipped(&record);
                Ok(())
            }
            _ => self.fail(format!("Unexpected {} record", record.name())),
        }
    }
    fn note_skipped(&mut self, record: &GdsRecord) {
        if self.skipped.insert(record.rtype()) {
            debug!("Skipping {} records", record.name());
        }
    }
    fn import_lib(&mut self, rdr: &mut GdsReader) -> LayoutResult<()> {
        match self.next(rdr)? {
            GdsRecord::Header { version } => debug!("GDSII version {}", version),
            other => return self.fail(format!("Expected HEADER, found {}", other.name())),
        }
        self.ctx.push(ErrorContext::Library(String::new()));
        loop {
            match self.next(rdr)? {
                GdsRecord::BgnLib { dates } => self.layout.dates = GdsDateTimes::decode(&dates),
                GdsRecord::LibName(name) => {
                    self.ctx[0] = ErrorContext::Library(name.clone());
                    self.layout.name = name;
                }
                GdsRecord::Units(db_user, db_meters) => self.import_units(db_user, db_meters)?,
                GdsRecord::BgnStruct { dates } => self.import_cell(rdr, dates)?,
                GdsRecord::EndLib => break,
                other => self.skip(other)?,
            }
        }
        Ok(())
    }
    /// `UNITS` holds the database unit in user units, then in meters
    fn import_units(&mut self, db_user: f64, db_meters: f64) -> LayoutResult<()> {
        self.ctx.push(ErrorContext::Units);
        let valid = |v: f64| v.is_finite() && v > 0.0;
        self.assert(
            valid(db_user) && valid(db_meters),
            format!("Invalid UNITS ({}, {})", db_user, db_meters),
        )?;
        self.layout.precision = db_meters;
        self.layout.unit = db_meters / db_user;
        self.scale = self.layout.db_scale();
        self.ctx.pop();
        Ok(())
    }
    fn import_cell(&mut self, rdr: &mut GdsReader, dates: [i16; 12]) -> LayoutResult<()> {
        let name = match self.next(rdr)? {
            GdsRecord::StructName(name) => self.options.name(name),
            other => return self.fail(format!("Expected STRNAME, found {}", other.name())),
        };
        self.ctx.push(ErrorContext::Cell(name.clone()));
        let mut cell = Cell::new(name);
        cell.dates = GdsDateTimes::decode(&dates);
        let mut refs = Vec::new();
        loop {
            let record = self.next(rdr)?;
            match record {
                GdsRecord::Boundary => {
                    let e = self.import_boundary(rdr)?;
                    cell.add(e);
                }
                GdsRecord::Path => {
                    let e = self.import_path(rdr)?;
                    cell.add(e);
                }
                GdsRecord::Text => {
                    let e = self.import_text(rdr)?;
                    cell.add(e);
                }
                GdsRecord::StructRef => refs.push(self.import_struct_ref(rdr)?),
                GdsRecord::ArrayRef => refs.push(self.import_array_ref(rdr)?),
                GdsRecord::Node | GdsRecord::Box => {
                    self.note_skipped(&record);
                    while self.next(rdr)? != GdsRecord::EndElement {}
                }
                GdsRecord::EndStruct => break,
                other => self.skip(other)?,
            }
        }
        debug!("Read cell `{}`", cell.name);
        let key = self.layout.add(cell);
        for mut r in refs {
            r.parent = key;
            self.pending.push(r);
        }
        self.ctx.pop();
        Ok(())
    }
    /// Collect an element's records, through its `ENDEL`
    fn read_element(&mut self, rdr: &mut GdsReader) -> LayoutResult<ElementRecords> {
        let mut e = ElementRecords::default();
        loop {
            match self.next(rdr)? {
                GdsRecord::EndElement => break,
                GdsRecord::Layer(d) => e.layer = Some(d),
                GdsRecord::DataType(d) => e.datatype = Some(d),
                GdsRecord::TextType(d) => e.texttype = Some(d),
                GdsRecord::PathType(d) => e.pathtype = Some(d),
                GdsRecord::Width(d) => e.width = Some(d),
                GdsRecord::BeginExtn(d) => e.begin_extn = Some(d),
                GdsRecord::EndExtn(d) => e.end_extn = Some(d),
                GdsRecord::Xy(d) => e.xy.extend(d),
                GdsRecord::String(s) => e.string = Some(s),
                GdsRecord::Presentation(d0, d1) => e.presentation = Some((d0, d1)),
                GdsRecord::Strans(d0, d1) => {
                    let mut strans = GdsStrans::from_bits(d0, d1);
                    if let Some(prev) = e.strans.take() {
                        strans.mag = prev.mag;
                        strans.angle = prev.angle;
                    }
                    e.strans = Some(strans);
                }
                GdsRecord::Mag(d) => e.strans.get_or_insert_with(Default::default).mag = Some(d),
                GdsRecord::Angle(d) => {
                    e.strans.get_or_insert_with(Default::default).angle = Some(d)
                }
                GdsRecord::StructRefName(s) => e.sname = Some((self.options.name(s), self.offset)),
                GdsRecord::ColRow { cols, rows } => e.colrow = Some((cols, rows)),
                other => self.skip(other)?,
            }
        }
        Ok(e)
    }
    /// Convert database-unit pairs to [Point]s
    fn points(&self, xy: &[i32]) -> Vec<Point> {
        xy.chunks_exact(2)
            .map(|p| Point::new(p[0] as f64 / self.scale, p[1] as f64 / self.scale))
            .collect()
    }
    fn dist(&self, d: i32) -> f64 {
        d as f64 / self.scale
    }
    fn layer_spec(&self, e: &ElementRecords, text: bool) -> LayoutResult<LayerSpec> {
        let layer = self.unwrap(e.layer, "Element missing LAYER")?;
        let datatype = if text {
            e.texttype.unwrap_or(0)
        } else {
            e.datatype.unwrap_or(0)
        };
        Ok(self.options.layer_spec(layer, datatype, text))
    }
    fn import_boundary(&mut self, rdr: &mut GdsReader) -> LayoutResult<Element> {
        self.ctx.push(ErrorContext::Element("Boundary"));
        let e = self.read_element(rdr)?;
        let layer = self.layer_spec(&e, false)?;
        let b = Boundary::new(self.points(&e.xy), layer).unwrapper(&*self, "Invalid BOUNDARY")?;
        self.ctx.pop();
        Ok(b.into())
    }
    fn import_path(&mut self, rdr: &mut GdsReader) -> LayoutResult<Element> {
        self.ctx.push(ErrorContext::Element("Path"));
        let e = self.read_element(rdr)?;
        let layer = self.layer_spec(&e, false)?;
        let mut width = e.width.unwrap_or(0);
        if width < 0 {
            // Negative widths are "absolute", i.e. unscaled by references
            warn!("Reading negative path width {} as absolute", width);
            width = width.saturating_abs();
        }
        let mut p = Path::new(self.points(&e.xy), self.dist(width), layer)
            .unwrapper(&*self, "Invalid PATH")?;
        p.pathtype = e.pathtype.unwrap_or(0);
        p.begin_extension = e.begin_extn.map(|d| self.dist(d));
        p.end_extension = e.end_extn.map(|d| self.dist(d));
        self.ctx.pop();
        Ok(p.into())
    }
    fn import_text(&mut self, rdr: &mut GdsReader) -> LayoutResult<Element> {
        self.ctx.push(ErrorContext::Element("Text"));
        let e = self.read_element(rdr)?;
        let layer = self.layer_spec(&e, true)?;
        let string = self.unwrap(e.string.clone(), "TEXT missing STRING")?;
        let pts = self.points(&e.xy);
        self.assert(pts.len() == 1, "TEXT requires a single XY point")?;
        let anchor = match e.presentation {
            None => Anchor::NorthWest,
            Some((_, bits)) => Anchor::from_bits(bits).unwrap_or_else(|| {
                debug!("Invalid text justification {:#04x}", bits);
                Anchor::NorthWest
            }),
        };
        let mut text = Text::new(string, pts[0], layer).with_anchor(anchor);
        if let Some(strans) = &e.strans {
            self.check_abs(strans);
            text.x_reflection = strans.reflected;
            text.magnification = strans.mag.unwrap_or(1.0);
            text.rotation = strans.angle.unwrap_or(0.0);
        }
        self.ctx.pop();
        Ok(text.into())
    }
    fn check_abs(&self, strans: &GdsStrans) {
        if strans.abs_mag || strans.abs_angle {
            warn!("Ignoring absolute magnification and angle flags");
        }
    }
    fn placement(&self, e: &ElementRecords, origin: Point) -> Placement {
        let mut placement = Placement::at(origin);
        if let Some(strans) = &e.strans {
            self.check_abs(strans);
            placement.x_reflection = strans.reflected;
            placement.magnification = strans.mag.unwrap_or(1.0);
            placement.rotation = strans.angle.unwrap_or(0.0);
        }
        placement
    }
    fn import_struct_ref(&mut self, rdr: &mut GdsReader) -> LayoutResult<PendingRef> {
        let e = self.read_element(rdr)?;
        let (name, offset) = self.unwrap(e.sname.clone(), "SREF missing SNAME")?;
        self.ctx.push(ErrorContext::Reference(name.clone()));
        let pts = self.points(&e.xy);
        self.assert(pts.len() == 1, "SREF requires a single XY point")?;
        let placement = self.placement(&e, pts[0]);
        self.ctx.pop();
        Ok(PendingRef {
            parent: CellKey::default(),
            name,
            offset,
            reference: CellReference::new(CellKey::default(), placement).into(),
        })
    }
    ///
    /// Arrays arrive as three points: the origin, and the origin displaced by
    /// all columns and by all rows. Displacements are un-rotated and un-mirrored
    /// back into the array's frame, and divided by the column and row counts.
    /// Lattices within half a database unit of orthogonal are stored as [Spacing::Orthogonal].
    ///
    fn import_array_ref(&mut self, rdr: &mut GdsReader) -> LayoutResult<PendingRef> {
        let e = self.read_element(rdr)?;
        let (name, offset) = self.unwrap(e.sname.clone(), "AREF missing SNAME")?;
        self.ctx.push(ErrorContext::Array(name.clone()));
        let (cols, rows) = self.unwrap(e.colrow, "AREF missing COLROW")?;
        self.assert(cols > 0 && rows > 0, format!("Invalid COLROW {}x{}", cols, rows))?;
        self.assert(e.xy.len() == 6, "AREF requires three XY points")?;
        let origin = self.points(&e.xy[0..2])[0];
        let placement = self.placement(&e, origin);
        let unorient = self.unwrap(
            placement.orientation().inverse(),
            "Singular array orientation",
        )?;
        // Displacements in database units, back in the array's frame
        let disp = |i: usize, n: i16| {
            let d = Point::new(
                (e.xy[i] as f64 - e.xy[0] as f64) / n as f64,
                (e.xy[i + 1] as f64 - e.xy[1] as f64) / n as f64,
            );
            unorient.apply_linear(&d)
        };
        let col = disp(2, cols);
        let row = disp(4, rows);
        let spacing = if col.y.abs() < 0.5 && row.x.abs() < 0.5 {
            Spacing::Orthogonal(col.x / self.scale, row.y / self.scale)
        } else {
            Spacing::Lattice {
                col: col.times(1.0 / self.scale),
                row: row.times(1.0 / self.scale),
            }
        };
        let arr = CellArray::new(
            CellKey::default(),
            cols as u16,
            rows as u16,
            spacing,
            placement,
        )?;
        self.ctx.pop();
        Ok(PendingRef {
            parent: CellKey::default(),
            name,
            offset,
            reference: arr.into(),
        })
    }
    /// Resolve all references by name, through [Layout::add_reference]
    fn resolve(&mut self) -> LayoutResult<()> {
        let pending = std::mem::take(&mut self.pending);
        for p in pending {
            self.offset = p.offset;
            let target = self.layout.cell_named(&p.name);
            let target = self.unwrap(target, format!("Unresolved reference to `{}`", p.name))?;
            let mut r = p.reference;
            r.retarget(target);
            if let Err(e) = self.layout.add_reference(p.parent, r) {
                return self.fail(format!("Invalid reference to `{}`: {}", p.name, e));
            }
        }
        Ok(())
    }
}
impl ErrorHelper for GdsImporter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Format {
            message: msg.into(),
            offset: self.offset,
            stack: self.ctx.clone(),
        }
    }
}
