//! Call-site locations attached to taint operations
//!
//! The embedding supplies the current call site through [`CallSite`]; the
//! taint layer never walks stacks itself and treats the location as opaque
//! metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Script location at which a taint operation happened.
///
/// Every field defaults to empty/zero when the embedding cannot provide it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TaintLocation {
    /// Script file name or URL
    #[serde(default)]
    pub filename: String,
    /// Line number (1-indexed, 0 if unknown)
    #[serde(default)]
    pub line: u32,
    /// Column number (1-indexed, 0 if unknown)
    #[serde(default)]
    pub column: u32,
    /// Name of the enclosing function, empty for top-level code
    #[serde(default)]
    pub function: String,
}

impl TaintLocation {
    /// Create a new location
    pub fn new(
        filename: impl Into<String>,
        line: u32,
        column: u32,
        function: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
            function: function.into(),
        }
    }

    /// Is this the all-default (unknown) location?
    pub fn is_unknown(&self) -> bool {
        self.filename.is_empty() && self.line == 0 && self.column == 0 && self.function.is_empty()
    }
}

impl fmt::Display for TaintLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "<unknown>");
        }
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)?;
        if !self.function.is_empty() {
            write!(f, " ({})", self.function)?;
        }
        Ok(())
    }
}

/// Source of "where are we right now" for the operation factory.
///
/// Implementations must not fail: return `None` when nothing is known.
pub trait CallSite {
    fn current_location(&self) -> Option<TaintLocation>;
}

/// Call-site provider for contexts without script frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallSite;

impl CallSite for NoCallSite {
    fn current_location(&self) -> Option<TaintLocation> {
        None
    }
}

/// Call-site provider that always reports the same location.
#[derive(Debug, Clone, Default)]
pub struct FixedCallSite(pub TaintLocation);

impl CallSite for FixedCallSite {
    fn current_location(&self) -> Option<TaintLocation> {
        Some(self.0.clone())
    }
}

impl<F> CallSite for F
where
    F: Fn() -> Option<TaintLocation>,
{
    fn current_location(&self) -> Option<TaintLocation> {
        self()
    }
}
