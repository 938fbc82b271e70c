/// Enumerated locations within a layout or stream.
/// Stacked up while walking a hierarchy, and attached to errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    Library(String),
    Cell(String),
    Reference(String),
    Array(String),
    Element(&'static str),
    Units,
}
