//!
//! # Gds Record Reading
//!

// Std-Lib
use std::io::Write;

// Crates.io
use byteorder::{BigEndian, ByteOrder};
use log::trace;
use num_traits::FromPrimitive;
use serde::Serialize;

// Local Imports
use crate::{GdsDataType, GdsError, GdsFloat64, GdsRecord, GdsRecordHeader, GdsRecordType, GdsResult};

/// Size of a record header, in bytes
pub const HEADER_LEN: usize = 4;

///
/// # GdsReader
///
/// Forward-only cursor over an in-memory GDSII stream.
/// Each call to [GdsReader::read_record] consumes exactly one record,
/// and reports the byte offset at which it began.
///
/// Records the reader does not model are returned as [GdsRecord::Other],
/// having consumed their declared length.
/// Lengths that are too short, odd, or extend past the end of the stream are errors.
///
pub struct GdsReader<'src> {
    /// Source bytes
    src: &'src [u8],
    /// Current byte position
    pos: usize,
    /// Number of records read
    numread: usize,
    /// Set after any failure; iteration stops
    failed: bool,
}
impl<'src> GdsReader<'src> {
    /// Create a [GdsReader] over `src`
    pub fn new(src: &'src [u8]) -> Self {
        Self {
            src,
            pos: 0,
            numread: 0,
            failed: false,
        }
    }
    /// Current byte position
    pub fn pos(&self) -> usize {
        self.pos
    }
    /// Number of records read so far
    pub fn numread(&self) -> usize {
        self.numread
    }
    /// Boolean indication of whether all bytes have been consumed
    pub fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }
    /// Number of bytes not yet consumed
    fn remaining(&self) -> usize {
        self.src.len().saturating_sub(self.pos)
    }
    /// Read the next record.
    /// Returns the byte offset of its header along with the decoded [GdsRecord].
    pub fn read_record(&mut self) -> GdsResult<(usize, GdsRecord)> {
        let offset = self.pos;
        let rv = self.read_header().and_then(|header| {
            let payload = self.take(offset, header.len.into())?;
            decode_payload(&header, payload, offset)
        });
        match rv {
            Ok(record) => {
                self.numread += 1;
                Ok((offset, record))
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }
    /// Read and validate the four header bytes of the record starting at `self.pos`
    fn read_header(&mut self) -> GdsResult<GdsRecordHeader> {
        let offset = self.pos;
        let bytes = self.take(offset, HEADER_LEN)?;
        let len = BigEndian::read_u16(&bytes[0..2]) as usize;
        if len < HEADER_LEN || len % 2 != 0 {
            return Err(GdsError::RecordLen { len, offset });
        }
        let rtype = bytes[2];
        let dtype: GdsDataType = FromPrimitive::from_u8(bytes[3]).ok_or(GdsError::InvalidDataType {
            dtype: bytes[3],
            offset,
        })?;
        // Check the payload is all there, before consuming any of it
        let needed = len - HEADER_LEN;
        if needed > self.remaining() {
            return Err(GdsError::Truncated {
                offset,
                needed: len,
                available: self.remaining() + HEADER_LEN,
            });
        }
        Ok(GdsRecordHeader {
            rtype,
            dtype,
            len: needed as u16,
        })
    }
    /// Consume `n` bytes. `offset` is the start of the enclosing record, for error reporting.
    fn take(&mut self, offset: usize, n: usize) -> GdsResult<&'src [u8]> {
        if n > self.remaining() {
            return Err(GdsError::Truncated {
                offset,
                needed: n,
                available: self.remaining(),
            });
        }
        let rv = &self.src[self.pos..self.pos + n];
        self.pos += n;
        Ok(rv)
    }
    /// Write a JSON-lines dump of every record in `src` to `dest`.
    /// Each line holds a record's byte offset and content.
    pub fn dump(src: &[u8], mut dest: impl Write) -> GdsResult<()> {
        #[derive(Serialize)]
        struct Line<'r> {
            offset: usize,
            record: &'r GdsRecord,
        }
        for rv in GdsReader::new(src) {
            let (offset, record) = rv?;
            serde_json::to_writer(&mut dest, &Line { offset, record: &record })?;
            dest.write_all(b"\n")?;
        }
        Ok(())
    }
}
impl Iterator for GdsReader<'_> {
    type Item = GdsResult<(usize, GdsRecord)>;
    /// Yields records until the stream is exhausted, or after the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.at_end() {
            return None;
        }
        Some(self.read_record())
    }
}

/// Decode a record payload, based on its header
fn decode_payload(header: &GdsRecordHeader, data: &[u8], offset: usize) -> GdsResult<GdsRecord> {
    use GdsDataType::{BitArray, NoData, Str, F64, I16, I32};
    let rtype = match GdsRecordType::from_byte(header.rtype) {
        Some(r) => r,
        None => return Ok(other(header, data, offset)),
    };
    let len = header.len;
    let bad = || GdsError::RecordDecode {
        rtype,
        dtype: header.dtype,
        len,
        offset,
    };
    let record = match (rtype, header.dtype, len) {
        // Library-Level Records
        (GdsRecordType::Header, I16, 2) => GdsRecord::Header {
            version: BigEndian::read_i16(data),
        },
        (GdsRecordType::BgnLib, I16, 24) => GdsRecord::BgnLib {
            dates: read_dates(data),
        },
        (GdsRecordType::LibName, Str, _) => GdsRecord::LibName(read_str(data, offset)?),
        (GdsRecordType::Units, F64, 16) => {
            let v = read_f64(data);
            GdsRecord::Units(v[0], v[1])
        }
        (GdsRecordType::EndLib, NoData, 0) => GdsRecord::EndLib,

        // Structure (Cell) Level Records
        (GdsRecordType::BgnStruct, I16, 24) => GdsRecord::BgnStruct {
            dates: read_dates(data),
        },
        (GdsRecordType::StructName, Str, _) => GdsRecord::StructName(read_str(data, offset)?),
        (GdsRecordType::StructRefName, Str, _) => {
            GdsRecord::StructRefName(read_str(data, offset)?)
        }
        (GdsRecordType::EndStruct, NoData, 0) => GdsRecord::EndStruct,

        // Element-Level Records
        (GdsRecordType::Boundary, NoData, 0) => GdsRecord::Boundary,
        (GdsRecordType::Path, NoData, 0) => GdsRecord::Path,
        (GdsRecordType::StructRef, NoData, 0) => GdsRecord::StructRef,
        (GdsRecordType::ArrayRef, NoData, 0) => GdsRecord::ArrayRef,
        (GdsRecordType::Text, NoData, 0) => GdsRecord::Text,
        (GdsRecordType::Node, NoData, 0) => GdsRecord::Node,
        (GdsRecordType::Box, NoData, 0) => GdsRecord::Box,
        (GdsRecordType::Layer, I16, 2) => GdsRecord::Layer(BigEndian::read_i16(data)),
        (GdsRecordType::DataType, I16, 2) => GdsRecord::DataType(BigEndian::read_i16(data)),
        (GdsRecordType::Width, I32, 4) => GdsRecord::Width(BigEndian::read_i32(data)),
        (GdsRecordType::Xy, I32, l) if l % 8 == 0 => GdsRecord::Xy(read_i32(data)),
        (GdsRecordType::EndElement, NoData, 0) => GdsRecord::EndElement,

        // Placement and Text Records
        (GdsRecordType::ColRow, I16, 4) => GdsRecord::ColRow {
            cols: BigEndian::read_i16(&data[0..2]),
            rows: BigEndian::read_i16(&data[2..4]),
        },
        (GdsRecordType::TextType, I16, 2) => GdsRecord::TextType(BigEndian::read_i16(data)),
        (GdsRecordType::Presentation, BitArray, 2) => GdsRecord::Presentation(data[0], data[1]),
        (GdsRecordType::String, Str, _) => GdsRecord::String(read_str(data, offset)?),
        (GdsRecordType::Strans, BitArray, 2) => GdsRecord::Strans(data[0], data[1]),
        (GdsRecordType::Mag, F64, 8) => GdsRecord::Mag(read_f64(data)[0]),
        (GdsRecordType::Angle, F64, 8) => GdsRecord::Angle(read_f64(data)[0]),
        (GdsRecordType::PathType, I16, 2) => GdsRecord::PathType(BigEndian::read_i16(data)),
        (GdsRecordType::ElemFlags, BitArray, 2) => GdsRecord::ElemFlags(data[0], data[1]),
        (GdsRecordType::Plex, I32, 4) => GdsRecord::Plex(BigEndian::read_i32(data)),
        (GdsRecordType::PropAttr, I16, 2) => GdsRecord::PropAttr(BigEndian::read_i16(data)),
        (GdsRecordType::PropValue, Str, _) => GdsRecord::PropValue(read_str(data, offset)?),
        (GdsRecordType::BeginExtn, I32, 4) => GdsRecord::BeginExtn(BigEndian::read_i32(data)),
        (GdsRecordType::EndExtn, I32, 4) => GdsRecord::EndExtn(BigEndian::read_i32(data)),

        // Modeled record-types with the wrong data-type or length are malformed
        (
            GdsRecordType::Header
            | GdsRecordType::BgnLib
            | GdsRecordType::LibName
            | GdsRecordType::Units
            | GdsRecordType::EndLib
            | GdsRecordType::BgnStruct
            | GdsRecordType::StructName
            | GdsRecordType::StructRefName
            | GdsRecordType::EndStruct
            | GdsRecordType::Boundary
            | GdsRecordType::Path
            | GdsRecordType::StructRef
            | GdsRecordType::ArrayRef
            | GdsRecordType::Text
            | GdsRecordType::Node
            | GdsRecordType::Box
            | GdsRecordType::Layer
            | GdsRecordType::DataType
            | GdsRecordType::Width
            | GdsRecordType::Xy
            | GdsRecordType::EndElement
            | GdsRecordType::ColRow
            | GdsRecordType::TextType
            | GdsRecordType::Presentation
            | GdsRecordType::String
            | GdsRecordType::Strans
            | GdsRecordType::Mag
            | GdsRecordType::Angle
            | GdsRecordType::PathType
            | GdsRecordType::ElemFlags
            | GdsRecordType::Plex
            | GdsRecordType::PropAttr
            | GdsRecordType::PropValue
            | GdsRecordType::BeginExtn
            | GdsRecordType::EndExtn,
            _,
            _,
        ) => return Err(bad()),

        // Everything else is carried without interpretation
        _ => other(header, data, offset),
    };
    Ok(record)
}
/// Create an opaque [GdsRecord::Other]
fn other(header: &GdsRecordHeader, data: &[u8], offset: usize) -> GdsRecord {
    trace!(
        "Unmodeled record-type 0x{:02X} ({} bytes) at byte {}",
        header.rtype,
        header.len,
        offset
    );
    GdsRecord::Other {
        rtype: header.rtype,
        dtype: header.dtype as u8,
        data: data.to_vec(),
    }
}
/// Decode an ASCII string, dropping its trailing null padding
fn read_str(data: &[u8], offset: usize) -> GdsResult<String> {
    let mut end = data.len();
    while end > 0 && data[end - 1] == 0x00 {
        end -= 1;
    }
    match std::str::from_utf8(&data[..end]) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Err(GdsError::InvalidString { offset }),
    }
}
/// Decode the twelve date `i16`s of a `BGNLIB` or `BGNSTR`
fn read_dates(data: &[u8]) -> [i16; 12] {
    let mut rv = [0; 12];
    BigEndian::read_i16_into(data, &mut rv);
    rv
}
/// Decode `len/4` i32s. Callers ensure `data.len()` is a multiple of four.
fn read_i32(data: &[u8]) -> Vec<i32> {
    let mut rv = vec![0; data.len() / 4];
    BigEndian::read_i32_into(data, &mut rv);
    rv
}
/// Decode `len/8` excess-64 reals. Callers ensure `data.len()` is a multiple of eight.
fn read_f64(data: &[u8]) -> Vec<f64> {
    let mut raw = vec![0; data.len() / 8];
    BigEndian::read_u64_into(data, &mut raw);
    raw.into_iter().map(GdsFloat64::decode).collect()
}
