//!
//! # Gds Result and Error Types
//!

// Std-Lib
use std::error::Error;

// Local Imports
use crate::{GdsDataType, GdsRecordType};

/// # GdsResult Type-Alias
pub type GdsResult<T> = Result<T, GdsError>;

/// # Gds Error Enumeration
///
/// Decoding errors carry the byte offset of the start of the offending record.
/// Writing errors carry the offset at which the record would have started.
#[derive(Debug)]
pub enum GdsError {
    /// Invalid record length: shorter than its own header, odd, or too long to encode
    RecordLen { len: usize, offset: usize },
    /// Record extends past the end of the stream
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Invalid data-type byte
    InvalidDataType { dtype: u8, offset: usize },
    /// Payload inconsistent with its record- and data-type
    RecordDecode {
        rtype: GdsRecordType,
        dtype: GdsDataType,
        len: u16,
        offset: usize,
    },
    /// String payload that is not valid text
    InvalidString { offset: usize },
    /// Boxed (External) Errors
    Boxed(Box<dyn Error + Send + Sync>),
    /// Other errors
    Str(String),
}
impl GdsError {
    /// Byte offset in the stream, if the error has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::RecordLen { offset, .. }
            | Self::Truncated { offset, .. }
            | Self::InvalidDataType { offset, .. }
            | Self::RecordDecode { offset, .. }
            | Self::InvalidString { offset } => Some(*offset),
            Self::Boxed(_) | Self::Str(_) => None,
        }
    }
}
impl std::fmt::Display for GdsError {
    /// Delegates to the derived [std::fmt::Debug] implementation.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl Error for GdsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<std::io::Error> for GdsError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<serde_json::Error> for GdsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for GdsError {
    fn from(e: String) -> Self {
        GdsError::Str(e)
    }
}
impl From<&str> for GdsError {
    fn from(e: &str) -> Self {
        GdsError::Str(e.to_string())
    }
}
