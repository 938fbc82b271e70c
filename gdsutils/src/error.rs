//!
//! # Error-Helper Utilities
//!
//! Tree-walkers such as stream importers and exporters carry state worth reporting
//! on failure: the current cell, element, byte offset. [ErrorHelper] lets each
//! walker define how that state is attached, and [Unwrapper] routes
//! [Option]s and [Result]s through it.
//!
//! ```rust
//! use gdsutils::error::{ErrorHelper, Unwrapper};
//!
//! struct Cursor {
//!     offset: usize,
//! }
//! impl ErrorHelper for Cursor {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("{} at byte {}", msg.into(), self.offset)
//!     }
//! }
//! let c = Cursor { offset: 12 };
//! let r: Result<i16, String> = None.unwrapper(&c, "missing LAYER");
//! assert_eq!(r, Err("missing LAYER at byte 12".to_string()));
//! ```
//!

///
/// # ErrorHelper
///
/// Implementers provide `err`, which wraps a message with their internal state.
/// The remaining methods are provided.
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap the [Option] `opt` if it is [Some], and return our error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix application of an [ErrorHelper] to [Option]s and [Result]s.
/// For [Result]s the underlying error is appended to the message.
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}

impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        match self {
            Some(t) => Ok(t),
            None => helper.fail(msg),
        }
    }
}

impl<T, E: std::fmt::Display> Unwrapper for Result<T, E> {
    type Ok = T;
    fn unwrapper<H>(
        self,
        helper: &H,
        msg: impl Into<String>,
    ) -> Result<<Self as Unwrapper>::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        match self {
            Ok(t) => Ok(t),
            Err(e) => helper.fail(format!("{}: {}", msg.into(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct InCell(&'static str);
    impl ErrorHelper for InCell {
        type Error = String;
        fn err(&self, msg: impl Into<String>) -> String {
            format!("[{}] {}", self.0, msg.into())
        }
    }

    #[test]
    fn result_messages_include_cause() {
        let h = InCell("top");
        let r: Result<u8, _> = "300".parse::<u8>().unwrapper(&h, "bad layer");
        let msg = r.unwrap_err();
        assert!(msg.starts_with("[top] bad layer: "));
    }

    #[test]
    fn assert_and_unwrap() {
        let h = InCell("leaf");
        assert_eq!(h.assert(true, "fine"), Ok(()));
        assert_eq!(h.assert(false, "odd length"), Err("[leaf] odd length".into()));
        assert_eq!(h.unwrap(Some(3), "none"), Ok(3));
    }
}
