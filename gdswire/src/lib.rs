//!
//! # Gdswire: GDSII Stream Records
//!
//! GDSII is the IC industry's de facto layout interchange format.
//! A GDSII stream is a flat sequence of variable-length records:
//!
//! * A two-byte big-endian length, which includes the four header bytes,
//! * A one-byte record type,
//! * A one-byte data type, dictating the payload's encoding, and
//! * `length - 4` bytes of payload.
//!
//! Nesting (library, structure, element) is implied by begin/end record pairs,
//! and reconstructed by whoever consumes the records.
//! This crate handles the records themselves:
//! [GdsReader] decodes them from bytes, with byte offsets for every record and every error;
//! [GdsWriter] encodes them.
//! Reals use GDSII's excess-64 format, encoded and decoded by [GdsFloat64].
//!
//! Building cells, elements, and references out of the record stream lives one level up,
//! in `gdsgraph`.
//!
//! ```
//! use gdswire::{GdsRecord, GdsReader, to_bytes};
//!
//! let bytes = to_bytes(&[GdsRecord::Header { version: 600 }, GdsRecord::EndLib]).unwrap();
//! assert_eq!(bytes, vec![0, 6, 0, 2, 2, 0x58, 0, 4, 4, 0]);
//! let records: Vec<_> = GdsReader::new(&bytes).collect::<Result<_, _>>().unwrap();
//! assert_eq!(records[1], (6, GdsRecord::EndLib));
//! ```
//!

pub mod data;
pub use data::*;

pub mod error;
pub use error::*;

pub mod read;
pub use read::*;

pub mod write;
pub use write::*;

#[cfg(test)]
mod tests;

/// Encode a sequence of records to bytes
pub fn to_bytes(records: &[GdsRecord]) -> GdsResult<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut wr = GdsWriter::new(&mut bytes);
        wr.write_records(records)?;
    }
    Ok(bytes)
}

/// Decode every record in `bytes`, paired with its byte offset
pub fn from_bytes(bytes: &[u8]) -> GdsResult<Vec<(usize, GdsRecord)>> {
    GdsReader::new(bytes).collect()
}
