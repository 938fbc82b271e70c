//!
//! # Gds Record Encoding and Writing
//!

// Std-Lib
use std::io::Write;

// Crates.io
use byteorder::{BigEndian, WriteBytesExt};

// Local imports
use crate::{GdsDataType, GdsError, GdsFloat64, GdsRecord, GdsResult};

/// # Gds Writing Helper
///
/// Encodes [GdsRecord]s onto any [Write] destination,
/// tracking the number of bytes written.
pub struct GdsWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
    /// Bytes written so far
    pos: usize,
}
impl<'wr> GdsWriter<'wr> {
    /// Create a new [GdsWriter] to destination `dest`
    pub fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
            pos: 0,
        }
    }
    /// Number of bytes written so far
    pub fn pos(&self) -> usize {
        self.pos
    }
    /// Helper to write a sequence of [GdsRecord]s
    pub fn write_records(&mut self, records: &[GdsRecord]) -> GdsResult<()> {
        for r in records {
            self.write_record(r)?;
        }
        Ok(())
    }
    /// Flush the destination
    pub fn flush(&mut self) -> GdsResult<()> {
        self.dest.flush()?;
        Ok(())
    }
    /// Encode into bytes and write onto `dest`
    pub fn write_record(&mut self, record: &GdsRecord) -> GdsResult<()> {
        // GDS strings are padded to even lengths
        let gds_strlen = |s: &str| -> usize { s.len() + s.len() % 2 };
        // First grab the header info: RecordType, DataType, and payload length
        use GdsDataType::{BitArray, NoData, Str, F64, I16, I32};
        let (dtype, len) = match record {
            GdsRecord::Header { .. } => (I16, 2),
            GdsRecord::BgnLib { .. } | GdsRecord::BgnStruct { .. } => (I16, 24),
            GdsRecord::LibName(s)
            | GdsRecord::StructName(s)
            | GdsRecord::StructRefName(s)
            | GdsRecord::String(s)
            | GdsRecord::PropValue(s) => (Str, gds_strlen(s)),
            GdsRecord::Units(..) => (F64, 16),
            GdsRecord::EndLib
            | GdsRecord::EndStruct
            | GdsRecord::Boundary
            | GdsRecord::Path
            | GdsRecord::StructRef
            | GdsRecord::ArrayRef
            | GdsRecord::Text
            | GdsRecord::Node
            | GdsRecord::Box
            | GdsRecord::EndElement => (NoData, 0),
            GdsRecord::Layer(_)
            | GdsRecord::DataType(_)
            | GdsRecord::TextType(_)
            | GdsRecord::PathType(_)
            | GdsRecord::PropAttr(_) => (I16, 2),
            GdsRecord::Width(_)
            | GdsRecord::Plex(_)
            | GdsRecord::BeginExtn(_)
            | GdsRecord::EndExtn(_) => (I32, 4),
            GdsRecord::Xy(d) => (I32, 4 * d.len()),
            GdsRecord::ColRow { .. } => (I16, 4),
            GdsRecord::Presentation(..) | GdsRecord::Strans(..) | GdsRecord::ElemFlags(..) => {
                (BitArray, 2)
            }
            GdsRecord::Mag(_) | GdsRecord::Angle(_) => (F64, 8),
            GdsRecord::Other { dtype, data, .. } => {
                let dtype = <GdsDataType as num_traits::FromPrimitive>::from_u8(*dtype).ok_or(
                    GdsError::InvalidDataType {
                        dtype: *dtype,
                        offset: self.pos,
                    },
                )?;
                (dtype, data.len() + data.len() % 2)
            }
        };
        // Send the header-bytes to the writer, including them in the total length
        let total = len + 4;
        let total16 = match u16::try_from(total) {
            Ok(val) => val,
            Err(_) => {
                return Err(GdsError::RecordLen {
                    len: total,
                    offset: self.pos,
                })
            }
        };
        self.dest.write_u16::<BigEndian>(total16)?;
        self.dest.write_u8(record.rtype())?;
        self.dest.write_u8(dtype as u8)?;

        // Now write the data portion, organized by DataType
        match record {
            // NoData
            GdsRecord::EndLib
            | GdsRecord::EndStruct
            | GdsRecord::Boundary
            | GdsRecord::Path
            | GdsRecord::StructRef
            | GdsRecord::ArrayRef
            | GdsRecord::Text
            | GdsRecord::Node
            | GdsRecord::Box
            | GdsRecord::EndElement => (),

            // BitArrays
            GdsRecord::Presentation(d0, d1)
            | GdsRecord::Strans(d0, d1)
            | GdsRecord::ElemFlags(d0, d1) => {
                self.dest.write_u8(*d0)?;
                self.dest.write_u8(*d1)?;
            }
            // Single I16s
            GdsRecord::Header { version: d }
            | GdsRecord::Layer(d)
            | GdsRecord::DataType(d)
            | GdsRecord::TextType(d)
            | GdsRecord::PathType(d)
            | GdsRecord::PropAttr(d) => self.dest.write_i16::<BigEndian>(*d)?,

            // Single I32s
            GdsRecord::Width(d)
            | GdsRecord::Plex(d)
            | GdsRecord::BeginExtn(d)
            | GdsRecord::EndExtn(d) => self.dest.write_i32::<BigEndian>(*d)?,
            // Single F64s
            GdsRecord::Mag(d) | GdsRecord::Angle(d) => {
                self.dest.write_u64::<BigEndian>(GdsFloat64::encode(*d))?
            }
            // "Structs"
            GdsRecord::Units(d0, d1) => {
                self.dest.write_u64::<BigEndian>(GdsFloat64::encode(*d0))?;
                self.dest.write_u64::<BigEndian>(GdsFloat64::encode(*d1))?;
            }
            GdsRecord::ColRow { cols, rows } => {
                self.dest.write_i16::<BigEndian>(*cols)?;
                self.dest.write_i16::<BigEndian>(*rows)?;
            }
            // Vectors
            GdsRecord::BgnLib { dates: d } | GdsRecord::BgnStruct { dates: d } => {
                for val in d.iter() {
                    self.dest.write_i16::<BigEndian>(*val)?;
                }
            }
            GdsRecord::Xy(d) => {
                for val in d.iter() {
                    self.dest.write_i32::<BigEndian>(*val)?;
                }
            }
            // Strings
            GdsRecord::LibName(s)
            | GdsRecord::StructName(s)
            | GdsRecord::StructRefName(s)
            | GdsRecord::String(s)
            | GdsRecord::PropValue(s) => {
                self.dest.write_all(s.as_bytes())?;
                if s.len() % 2 != 0 {
                    self.dest.write_u8(0x00)?;
                }
            }
            // Opaque payloads
            GdsRecord::Other { data, .. } => {
                self.dest.write_all(data)?;
                if data.len() % 2 != 0 {
                    self.dest.write_u8(0x00)?;
                }
            }
        };
        self.pos += total;
        Ok(())
    }
}

