//!
//! # Layout Result and Error Types
//!

// Local Imports
use crate::utils::{ErrorContext, SerdeError};
use gdswire::GdsError;

/// # [LayoutError] Result Type
pub type LayoutResult<T> = Result<T, LayoutError>;

///
/// # Layout Error Enumeration
///
pub enum LayoutError {
    /// Adding a reference would close a cycle in the reference graph
    Cycle { parent: String, child: String },
    /// Malformed or inconsistent GDSII stream, at byte `offset`
    Format {
        message: String,
        offset: usize,
        stack: Vec<ErrorContext>,
    },
    /// Invalid geometry, e.g. too few points, or coordinates beyond the database range
    Geometry(String),
    /// Stale or foreign cell handle
    InvalidCell(String),
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl LayoutError {
    /// Create a [LayoutError::Geometry] from anything String-convertible
    pub fn geom(s: impl Into<String>) -> Self {
        Self::Geometry(s.into())
    }
    /// Create an error-variant [Result] of our [LayoutError::Geometry] variant
    pub fn fail_geom<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::geom(s))
    }
    /// Byte offset of a [LayoutError::Format], if this is one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Format { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
impl std::fmt::Debug for LayoutError {
    /// Display a [LayoutError]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LayoutError::Cycle { parent, child } => write!(
                f,
                "Cycle Error: reference from `{}` to `{}` would create a cycle",
                parent, child
            ),
            LayoutError::Format {
                message,
                offset,
                stack,
            } => write!(
                f,
                "Format Error at byte {}: \n - {} \n - {:?}",
                offset, message, stack
            ),
            LayoutError::Geometry(msg) => write!(f, "Geometry Error: {}", msg),
            LayoutError::InvalidCell(msg) => write!(f, "Invalid Cell: {}", msg),
            LayoutError::Boxed(err) => err.fmt(f),
            LayoutError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for LayoutError {
    /// Display a [LayoutError]
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<GdsError> for LayoutError {
    /// Record-level failures become [LayoutError::Format], keeping their offset.
    /// Wrapped IO and serialization errors pass through as [LayoutError::Boxed].
    fn from(e: GdsError) -> Self {
        let (offset, e) = match (e.offset(), e) {
            (None, GdsError::Boxed(e)) => return Self::Boxed(e),
            (offset, e) => (offset.unwrap_or(0), e),
        };
        Self::Format {
            message: e.to_string(),
            offset,
            stack: Vec::new(),
        }
    }
}
impl From<String> for LayoutError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for LayoutError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<std::io::Error> for LayoutError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<SerdeError> for LayoutError {
    fn from(e: SerdeError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::num::TryFromIntError> for LayoutError {
    fn from(e: std::num::TryFromIntError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
