//!
//! # Serialization & Deserialization Utilities
//!
//! Configuration tables (layer defaults, import remaps) are plain serde types,
//! stored as JSON, YAML, or TOML files.
//!

// Std-Lib
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

// Crates.io
use serde::de::DeserializeOwned;
use serde::Serialize;
use textwrap::dedent;

/// # Supported Text Serialization Formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    Json,
    Yaml,
    Toml,
}
impl SerializationFormat {
    /// Infer a format from the extension of `fname`.
    /// Returns `None` for unknown or missing extensions.
    pub fn from_path(fname: impl AsRef<Path>) -> Option<Self> {
        let ext = fname.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
    /// Serialize `data` to a string
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, SerdeError> {
        match *self {
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
            Self::Toml => Ok(toml::to_string(data)?),
        }
    }
    /// Parse string `s`. Common leading indentation is stripped first,
    /// so inline test and doc strings can be indented with their code.
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> Result<T, SerdeError> {
        let s = dedent(s);
        match *self {
            Self::Json => Ok(serde_json::from_str(&s)?),
            Self::Yaml => Ok(serde_yaml::from_str(&s)?),
            Self::Toml => Ok(toml::from_str(&s)?),
        }
    }
    /// Save `data` to file `fname`
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), SerdeError> {
        let mut file = BufWriter::new(std::fs::File::create(fname)?);
        let s = self.to_string(data)?;
        file.write_all(s.as_bytes())?;
        file.flush()?;
        Ok(())
    }
    /// Load from file `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, SerdeError> {
        let file = std::fs::File::open(&fname)?;
        let mut file = BufReader::new(file);
        let rv: T = match *self {
            Self::Json => serde_json::from_reader(file)?,
            Self::Yaml => serde_yaml::from_reader(file)?,
            Self::Toml => {
                // No reader-based API for TOML
                let mut s = String::new();
                file.read_to_string(&mut s)?;
                toml::from_str(&s)?
            }
        };
        Ok(rv)
    }
}

/// # Serde File Trait
///
/// Saving and loading for any serde-compatible type.
/// Fully default-implemented; implementers generally write `impl SerdeFile for MyType {}`.
///
pub trait SerdeFile: Serialize + DeserializeOwned {
    /// Save in `fmt`-format to file `fname`
    fn save(&self, fmt: SerializationFormat, fname: impl AsRef<Path>) -> Result<(), SerdeError> {
        fmt.save(self, fname)
    }
    /// Open from `fmt`-format file `fname`
    fn open(fname: impl AsRef<Path>, fmt: SerializationFormat) -> Result<Self, SerdeError> {
        fmt.open(fname)
    }
    /// Open from file `fname`, with its format inferred from its extension
    fn load(fname: impl AsRef<Path>) -> Result<Self, SerdeError> {
        let fname = fname.as_ref();
        match SerializationFormat::from_path(fname) {
            Some(fmt) => fmt.open(fname),
            None => Err(SerdeError::UnknownFormat(fname.display().to_string())),
        }
    }
}

/// # Serialization Error
#[derive(Debug)]
pub enum SerdeError {
    /// File extension maps to no [SerializationFormat]
    UnknownFormat(String),
    /// Errors from serde backends and file IO
    Boxed(Box<dyn std::error::Error + Send + Sync>),
}
impl std::fmt::Display for SerdeError {
    /// Delegates to the derived [std::fmt::Debug] implementation.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl std::error::Error for SerdeError {}
impl From<serde_json::Error> for SerdeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<serde_yaml::Error> for SerdeError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<toml::ser::Error> for SerdeError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<toml::de::Error> for SerdeError {
    fn from(e: toml::de::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::io::Error> for SerdeError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct LayerPair {
        layer: i16,
        datatype: i16,
    }
    impl SerdeFile for LayerPair {}

    #[test]
    fn formats_from_paths() {
        use SerializationFormat::*;
        assert_eq!(SerializationFormat::from_path("a/b.json"), Some(Json));
        assert_eq!(SerializationFormat::from_path("b.YML"), Some(Yaml));
        assert_eq!(SerializationFormat::from_path("b.yaml"), Some(Yaml));
        assert_eq!(SerializationFormat::from_path("c.toml"), Some(Toml));
        assert_eq!(SerializationFormat::from_path("c.gds"), None);
        assert_eq!(SerializationFormat::from_path("noext"), None);
    }

    #[test]
    fn parse_indented() -> Result<(), SerdeError> {
        let p: LayerPair = SerializationFormat::Yaml.from_str(
            r#"
            layer: 5
            datatype: 2
            "#,
        )?;
        assert_eq!(p, LayerPair { layer: 5, datatype: 2 });
        Ok(())
    }

    #[test]
    fn save_and_load() -> Result<(), SerdeError> {
        let dir = tempfile::tempdir()?;
        let p = LayerPair { layer: 1, datatype: 7 };
        for name in ["p.json", "p.yaml", "p.toml"] {
            let path = dir.path().join(name);
            let fmt = SerializationFormat::from_path(&path).ok_or(SerdeError::UnknownFormat(name.into()))?;
            p.save(fmt, &path)?;
            assert_eq!(LayerPair::load(&path)?, p);
        }
        assert!(matches!(
            LayerPair::load(dir.path().join("p.txt")),
            Err(SerdeError::UnknownFormat(_))
        ));
        Ok(())
    }
}
