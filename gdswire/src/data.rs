//!
//! # GDSII Record-Level Data Model
//!

// Crates.io
use chrono::{Datelike, NaiveDate, NaiveDateTime, SubsecRound, Timelike, Utc};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::{GdsError, GdsResult};

///
/// # Gds Record Types
///
/// In the numeric-order specified by GDSII, for automatic [FromPrimitive] conversions.
///
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum GdsRecordType {
    Header = 0x00,
    BgnLib,
    LibName,
    Units,
    EndLib,
    BgnStruct,
    StructName, // STRNAME
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Layer,
    DataType,
    Width,
    Xy,
    EndElement,
    StructRefName, // SNAME
    ColRow,
    TextNode, // "Not currently used"
    Node,
    TextType,
    Presentation,
    Spacing, // "Discontinued"
    String,
    Strans,
    Mag,
    Angle,
    Uinteger, // "No longer used"
    Ustring,  // "No longer used"
    RefLibs,
    Fonts,
    PathType,
    Generations,
    AttrTable,
    StypTable, // "Unreleased Feature"
    StrType,   // "Unreleased Feature"
    ElemFlags,
    ElemKey,  // "Unreleased Feature"
    LinkType, // "Unreleased Feature"
    LinkKeys, // "Unreleased Feature"
    Nodetype,
    PropAttr,
    PropValue,
    Box,
    BoxType,
    Plex,
    BeginExtn, // "Only occurs in CustomPlus"
    EndExtn,   // "Only occurs in CustomPlus"
    TapeNum,
    TapeCode,
    StrClass, // "Only for Calma internal use"
    Reserved, // "Reserved for future use"
    Format,
    Mask,
    EndMasks,
    LibDirSize,
    SrfName,
    LibSecur,
}
impl GdsRecordType {
    /// Decode from a raw record-type byte.
    /// Returns `None` for values beyond the GDSII-defined range.
    pub fn from_byte(b: u8) -> Option<Self> {
        FromPrimitive::from_u8(b)
    }
}

/// # Gds DataType Enumeration
/// In order as decoded from the header's data-type byte
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum GdsDataType {
    NoData = 0,
    BitArray = 1,
    I16 = 2,
    I32 = 3,
    F32 = 4,
    F64 = 5,
    Str = 6,
}

/// # Gds Record Header
/// Decoded contents of a record's four header bytes.
/// The record-type stays a raw byte, so unknown types can be carried and skipped.
/// `len` is the payload length, excluding the header itself.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsRecordHeader {
    pub rtype: u8,
    pub dtype: GdsDataType,
    pub len: u16,
}

///
/// # Gds Record Enumeration
///
/// Records with meaning for cells, elements, and references are decoded into typed content,
/// converting one-entry arrays into scalars.
/// Everything else is carried as [GdsRecord::Other], with its raw payload.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GdsRecord {
    Header { version: i16 },
    BgnLib { dates: [i16; 12] },
    LibName(String),
    Units(f64, f64),
    EndLib,
    BgnStruct { dates: [i16; 12] },
    StructName(String),    // STRNAME Record
    StructRefName(String), // SNAME Record
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Node,
    Box,
    Layer(i16),
    DataType(i16),
    Width(i32),
    Xy(Vec<i32>),
    EndElement,
    ColRow { cols: i16, rows: i16 },
    TextType(i16),
    Presentation(u8, u8),
    String(String),
    Strans(u8, u8),
    Mag(f64),
    Angle(f64),
    PathType(i16),
    ElemFlags(u8, u8),
    Plex(i32),
    PropAttr(i16),
    PropValue(String),
    BeginExtn(i32),
    EndExtn(i32),
    /// Any other record, carried opaquely
    Other { rtype: u8, dtype: u8, data: Vec<u8> },
}
impl GdsRecord {
    /// Get our raw record-type byte
    pub fn rtype(&self) -> u8 {
        use GdsRecordType as R;
        let r = match self {
            Self::Header { .. } => R::Header,
            Self::BgnLib { .. } => R::BgnLib,
            Self::LibName(_) => R::LibName,
            Self::Units(..) => R::Units,
            Self::EndLib => R::EndLib,
            Self::BgnStruct { .. } => R::BgnStruct,
            Self::StructName(_) => R::StructName,
            Self::StructRefName(_) => R::StructRefName,
            Self::EndStruct => R::EndStruct,
            Self::Boundary => R::Boundary,
            Self::Path => R::Path,
            Self::StructRef => R::StructRef,
            Self::ArrayRef => R::ArrayRef,
            Self::Text => R::Text,
            Self::Node => R::Node,
            Self::Box => R::Box,
            Self::Layer(_) => R::Layer,
            Self::DataType(_) => R::DataType,
            Self::Width(_) => R::Width,
            Self::Xy(_) => R::Xy,
            Self::EndElement => R::EndElement,
            Self::ColRow { .. } => R::ColRow,
            Self::TextType(_) => R::TextType,
            Self::Presentation(..) => R::Presentation,
            Self::String(_) => R::String,
            Self::Strans(..) => R::Strans,
            Self::Mag(_) => R::Mag,
            Self::Angle(_) => R::Angle,
            Self::PathType(_) => R::PathType,
            Self::ElemFlags(..) => R::ElemFlags,
            Self::Plex(_) => R::Plex,
            Self::PropAttr(_) => R::PropAttr,
            Self::PropValue(_) => R::PropValue,
            Self::BeginExtn(_) => R::BeginExtn,
            Self::EndExtn(_) => R::EndExtn,
            Self::Other { rtype, .. } => return *rtype,
        };
        r as u8
    }
    /// Short human-readable name, for logging and error messages
    pub fn name(&self) -> String {
        match GdsRecordType::from_byte(self.rtype()) {
            Some(r) => format!("{:?}", r),
            None => format!("Unknown(0x{:02X})", self.rtype()),
        }
    }
}

/// # Gds Floating Point
/// ## GDSII's Home-Grown Floating-Point Format
///
/// GDSII predates IEEE754, and stores reals in an "excess-64" format:
/// one sign bit, a seven-bit base-16 exponent biased by 64,
/// and a 56-bit mantissa normalized to the range [1/16, 1).
///
/// [GdsFloat64] is not a data-store, but a namespace
/// for the `encode` and `decode` operations to and from `f64`.
///
pub struct GdsFloat64;
impl GdsFloat64 {
    /// Decode GDSII's eight-byte representation, stored as a `u64`, to `f64`
    pub fn decode(val: u64) -> f64 {
        let neg = (val & 0x8000_0000_0000_0000) != 0;
        let exp: i32 = ((val & 0x7F00_0000_0000_0000) >> (8 * 7)) as i32 - 64;
        let mantissa: u64 = val & 0x00FF_FFFF_FFFF_FFFF;
        let mantissa: f64 = mantissa as f64 / 2f64.powi(8 * 7);
        if neg {
            -1.0 * mantissa * 16f64.powi(exp)
        } else {
            mantissa * 16f64.powi(exp)
        }
    }
    /// Encode `f64` to GDSII's eight bytes, stored as `u64`.
    ///
    /// Zero, non-finite values, and magnitudes below the format's range encode as zero.
    /// Magnitudes above its range saturate.
    pub fn encode(val: f64) -> u64 {
        if val == 0.0 || !val.is_finite() {
            return 0;
        }
        let sign: u64 = if val < 0.0 { 0x80 } else { 0 };
        let val = val.abs();
        let mantissa_at = |exp: i32| (val * 16f64.powi(14 - exp)).round();
        let (lo, hi) = (2f64.powi(52), 2f64.powi(56));

        // First guess from the logarithm, then correct for its inexactness and for rounding carries
        let mut exponent = (0.25 * val.log2()).floor() as i32 + 1;
        let mut mantissa = mantissa_at(exponent);
        while mantissa >= hi {
            exponent += 1;
            mantissa = mantissa_at(exponent);
        }
        while mantissa < lo && exponent > -64 {
            exponent -= 1;
            mantissa = mantissa_at(exponent);
        }
        if exponent < -64 || mantissa < 1.0 {
            return 0;
        }
        if exponent > 63 {
            return (sign | 0x7F) << 56 | 0x00FF_FFFF_FFFF_FFFF;
        }
        let top = sign | (64 + exponent) as u64;
        top << 56 | (mantissa as u64 & 0x00FF_FFFF_FFFF_FFFF)
    }
}

/// # Gds Translation Settings
/// Reflection, rotation, and magnification for text-elements and references.
/// As configured by `STRANS`, `MAG`, and `ANGLE` records.
#[derive(Default, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GdsStrans {
    /// Reflection, about the x-axis.
    /// Applied before rotation.
    pub reflected: bool,
    /// Absolute Magnification Setting
    pub abs_mag: bool,
    /// Absolute Angle Setting
    pub abs_angle: bool,
    /// Magnification Factor. Interpreted as unit-scaling (mag==1.0) if not specified.
    pub mag: Option<f64>,
    /// Angle, in degrees counter-clockwise. Defaults to zero if not specified.
    pub angle: Option<f64>,
}
impl GdsStrans {
    /// Decode the flag bits of a `STRANS` record.
    /// `mag` and `angle` arrive in their own, later records.
    pub fn from_bits(d0: u8, d1: u8) -> Self {
        Self {
            reflected: d0 & 0x80 != 0,
            abs_mag: d1 & 0x04 != 0,
            abs_angle: d1 & 0x02 != 0,
            mag: None,
            angle: None,
        }
    }
    /// Encode our flags into the two bytes of a `STRANS` record
    pub fn bits(&self) -> (u8, u8) {
        let d0 = if self.reflected { 0x80 } else { 0 };
        let mut d1 = 0;
        if self.abs_mag {
            d1 |= 0x04;
        }
        if self.abs_angle {
            d1 |= 0x02;
        }
        (d0, d1)
    }
    /// Convert to the `STRANS` record and its optional `MAG` and `ANGLE` followers
    pub fn to_records(&self) -> Vec<GdsRecord> {
        let (d0, d1) = self.bits();
        let mut records = vec![GdsRecord::Strans(d0, d1)];
        if let Some(mag) = self.mag {
            records.push(GdsRecord::Mag(mag));
        }
        if let Some(angle) = self.angle {
            records.push(GdsRecord::Angle(angle));
        }
        records
    }
}

/// # Gds Library Units
///
/// From the GDSII `UNITS` record-description:
/// ```text
/// Contains two eight-byte real numbers.
/// The first number is the size of a database-unit, in user-units.
/// The second is the size of a database-unit in meters.
/// To calculate the size of a user-unit in meters, divide the second number by the first.
/// ```
///
/// These two numbers are stored as-is in the [GdsUnits] tuple-struct.
///
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct GdsUnits(pub f64, pub f64);
impl GdsUnits {
    /// Create from the user-unit and database-unit sizes, both in meters
    pub fn new(unit: f64, precision: f64) -> Self {
        Self(precision / unit, precision)
    }
    /// Get the database-unit size, in meters
    pub fn db_unit(&self) -> f64 {
        self.1
    }
    /// Get the user-unit size, in meters
    pub fn user_unit(&self) -> f64 {
        self.1 / self.0
    }
}
impl Default for GdsUnits {
    /// 1nm database units, 1µm user units
    fn default() -> Self {
        Self(1e-3, 1e-9)
    }
}

///
/// # Gds Date & Time
///
/// Six `i16`s: year, month, day, hour, minute, and second.
///
/// Years are written as full calendar years (2024, not 124).
/// When reading, any twelve bytes are accepted and stored as-is.
/// Conversion to [NaiveDateTime] treats years below 1900 as offsets from 1900,
/// as some writers produce them.
///
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsDateTime {
    pub year: i16,
    pub month: i16,
    pub day: i16,
    pub hour: i16,
    pub minute: i16,
    pub second: i16,
}
impl From<NaiveDateTime> for GdsDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year() as i16,
            month: dt.month() as i16,
            day: dt.day() as i16,
            hour: dt.hour() as i16,
            minute: dt.minute() as i16,
            second: dt.second() as i16,
        }
    }
}
impl TryFrom<&GdsDateTime> for NaiveDateTime {
    type Error = GdsError;

    /// Fails if any of the stored values are invalid, e.g. "month 30" or "hour 99".
    fn try_from(d: &GdsDateTime) -> GdsResult<NaiveDateTime> {
        let year = if d.year < 1900 {
            d.year as i32 + 1900
        } else {
            d.year as i32
        };
        let ymd = NaiveDate::from_ymd_opt(year, d.month as u32, d.day as u32)
            .ok_or_else(|| GdsError::Str(format!("Invalid date {:?}", d)))?;
        ymd.and_hms_opt(d.hour as u32, d.minute as u32, d.second as u32)
            .ok_or_else(|| GdsError::Str(format!("Invalid time {:?}", d)))
    }
}
impl GdsDateTime {
    /// Get the current time, rounded to the nearest second
    pub fn now() -> Self {
        Utc::now().naive_utc().round_subsecs(0).into()
    }
    /// Convert from six `i16`s, in GDSII order
    pub fn from_slice(d: &[i16]) -> Self {
        Self {
            year: d[0],
            month: d[1],
            day: d[2],
            hour: d[3],
            minute: d[4],
            second: d[5],
        }
    }
    /// Convert to six `i16`s, in GDSII order
    pub fn encode(&self) -> [i16; 6] {
        [
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }
}
impl Default for GdsDateTime {
    fn default() -> Self {
        Self::now()
    }
}

/// # Pair of Dates & Times
/// As carried by `BGNSTR` (creation, modification) and `BGNLIB` (modification, access) records.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct GdsDateTimes {
    pub created: GdsDateTime,
    pub modified: GdsDateTime,
}
impl GdsDateTimes {
    /// Decode from the twelve `i16`s of a `BGNSTR` or `BGNLIB` record
    pub fn decode(d: &[i16; 12]) -> Self {
        Self {
            created: GdsDateTime::from_slice(&d[0..6]),
            modified: GdsDateTime::from_slice(&d[6..12]),
        }
    }
    /// Encode to twelve `i16`s
    pub fn encode(&self) -> [i16; 12] {
        let mut rv = [0; 12];
        rv[0..6].copy_from_slice(&self.created.encode());
        rv[6..12].copy_from_slice(&self.modified.encode());
        rv
    }
}
impl Default for GdsDateTimes {
    /// Both set to a single call to `Utc::now()`
    fn default() -> Self {
        let now = GdsDateTime::now();
        Self {
            created: now.clone(),
            modified: now,
        }
    }
}
