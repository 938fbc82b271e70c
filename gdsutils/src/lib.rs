//!
//! # Gdsgraph Workspace Utilities
//!
//! Serialization to and from files, error-reporting helpers,
//! and the dependency-ordering used to walk cell hierarchies.
//!

pub mod ser;
pub use ser::*;

pub mod error;
pub use error::*;

pub mod context;
pub use context::*;

pub mod dep_order;
pub use dep_order::*;

pub mod enumstr;
pub use enumstr::*;
