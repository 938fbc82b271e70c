//!
//! # Layout Configuration
//!
//! Both [LayoutConfig] and [ImportOptions] are plain data,
//! loadable from and savable to JSON, YAML, or TOML through [SerdeFile].
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::elements::LayerSpec;
use crate::utils::SerdeFile;

/// # Layout Configuration
/// Per-[crate::Layout] settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Layer and datatype used by the [crate::Layout] element constructors
    pub defaults: LayerSpec,
    /// Rename duplicate cell names when writing
    pub uniquify: bool,
}
impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            defaults: LayerSpec::default(),
            uniquify: true,
        }
    }
}
impl SerdeFile for LayoutConfig {}

///
/// # Import Options
///
/// Remapping tables applied while reading a GDSII stream.
/// Entries absent from a table pass through unchanged.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ImportOptions {
    /// Layer numbers, for all element types
    pub layers: BTreeMap<i16, i16>,
    /// Boundary and path datatypes
    pub datatypes: BTreeMap<i16, i16>,
    /// Text texttypes
    pub texttypes: BTreeMap<i16, i16>,
    /// Cell names, applied to both definitions and references
    pub names: BTreeMap<String, String>,
}
impl ImportOptions {
    pub(crate) fn layer(&self, layer: i16) -> i16 {
        *self.layers.get(&layer).unwrap_or(&layer)
    }
    pub(crate) fn datatype(&self, datatype: i16) -> i16 {
        *self.datatypes.get(&datatype).unwrap_or(&datatype)
    }
    pub(crate) fn texttype(&self, texttype: i16) -> i16 {
        *self.texttypes.get(&texttype).unwrap_or(&texttype)
    }
    pub(crate) fn name(&self, name: String) -> String {
        match self.names.get(&name) {
            Some(n) => n.clone(),
            None => name,
        }
    }
    /// Remap an element [LayerSpec], with `texttypes` applying if `text`
    pub(crate) fn layer_spec(&self, layer: i16, datatype: i16, text: bool) -> LayerSpec {
        let datatype = if text {
            self.texttype(datatype)
        } else {
            self.datatype(datatype)
        };
        LayerSpec::new(self.layer(layer), datatype)
    }
}
impl SerdeFile for ImportOptions {}
