//!
//! # Gdsgraph
//!
//! Hierarchical GDSII layout: cells of geometric elements,
//! placed in one another by references and arrays.
//!
//! A [Layout] owns its [Cell]s in an arena, addressed by [CellKey].
//! References between cells form a directed acyclic graph;
//! [Layout::add_reference] rejects any edge which would close a cycle.
//! The graph supports bounding-box computation, flattening, and top-level-cell queries.
//!
//! Conversion to and from GDSII streams lives in the [gds] module,
//! atop the record-level `gdswire` crate.
//!
//! ```
//! use gdsgraph::{Boundary, Cell, LayerSpec, Layout, Placement, Point};
//!
//! let mut layout = Layout::new("lib");
//! let mut unit = Cell::new("unit");
//! unit.add(Boundary::rect(Point::new(0., 0.), Point::new(10., 10.), LayerSpec::new(1, 0)).unwrap());
//! let unit = layout.add(unit);
//! let top = layout.add(Cell::new("top"));
//! layout.add_instance(top, unit, Placement::at(Point::new(5., 5.))).unwrap();
//!
//! let bbox = layout.bounding_box(top).unwrap();
//! assert_eq!(bbox.p1, Point::new(15., 15.));
//! assert_eq!(layout.top_level(), vec![top]);
//! ```
//!

// Internal modules & re-exports
pub use gdsutils as utils;

pub mod geom;
pub use geom::*;

pub mod bbox;
pub use bbox::*;

pub mod elements;
pub use elements::*;

pub mod cell;
pub use cell::*;

pub mod config;
pub use config::*;

pub mod error;
pub use error::*;

pub mod layout;
pub use layout::*;

pub mod uniquify;
pub use uniquify::*;

pub mod gds;
