//!
//! # Enum-String Mapping
//!
//! The [enumstr] macro defines a fieldless enum paired with string values,
//! along with its implementation of [EnumStr].
//! Used for the short names text-anchors and similar settings take in configuration files.
//!
//! ```rs
//! use gdsutils::enumstr;
//!
//! enumstr!(
//! /// # Horizontal Justification
//! HorizJust {
//!     Left: "left",
//!     Center: "center",
//!     Right: "right",
//!  }
//! );
//! ```
//!

///
/// # String-Enumeration Trait
///
/// Defines two central methods:
/// * `to_str(&self) -> &'static str` converts the enum to its String values.
/// * `from_str(&str) -> Option<Self>` does the opposite, returning an [Option] indicator of success or failure.
///
/// While [EnumStr] can be implemented by any struct, its primary intent is
/// for implementation by the [enumstr] macro.
///
pub trait EnumStr: std::marker::Sized {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
}

///
/// # Enum-String Pairing Macro
///
/// For creating an `enum` which:
/// * (a) Has paired string-values, as commonly arrive in text-format fields.
/// * (b) Automatically implement the [EnumStr] trait for conversions to and from these strings.
/// * (c) Automatically implement [std::fmt::Display] writing the string-values
///
/// All variants are fieldless, and include derived implementations of common traits notably including `serde::{Serialize,Deserialize}`.
///
/// Example:
///
/// ```rs
/// use gdsutils::enumstr;
///
/// enumstr!(
/// /// # Path End Styles
/// PathEnd {
///     Flush: "flush",
///     Round: "round",
///  }
/// );
/// ```
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
        pub enum $enum_name {
            $( #[doc=$strval]
                $variant ),*
        }
        impl EnumStr for $enum_name {
            /// Convert a [$enum_name] variant to its paired (static) string value.
            #[allow(dead_code)]
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create a [$enum_name] from one of its string-values.
            /// Returns `None` if input `txt` does not match one of [$enum_name]'s variants.
            /// Note `from_str` is case *sensitive*, i.e. uses a native string comparison.
            /// If case-insensitive matching is intended instead, re-case outside `from_str`.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                let s = match self {
                    $( Self::$variant => $strval),*,
                };
                write!(f, "{}", s)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    enumstr!(
        /// # Vertical Justification
        VertJust {
            Top: "top",
            Middle: "middle",
            Bottom: "bottom",
        }
    );

    #[test]
    fn test_enumstr() {
        assert_eq!(VertJust::Top.to_str(), "top");
        assert_eq!(VertJust::Bottom.to_string(), "bottom");
        assert_eq!(VertJust::from_str("middle"), Some(VertJust::Middle));
        assert_eq!(VertJust::from_str("Middle"), None);
        assert_eq!(VertJust::from_str("baseline"), None);
    }
}
