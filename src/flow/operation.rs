//! Operation records: one provenance-producing event
//!
//! A record is immutable once built. The same type describes both sources
//! (where taint entered) and transformations applied afterwards.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::location::TaintLocation;

/// Name used for sources created by hand (tests, debugging hooks).
pub const MANUAL_SOURCE: &str = "manual taint source";

/// Inline capacity of the argument list; no builtin records more.
pub const INLINE_ARGUMENTS: usize = 3;

/// Stringified operation arguments
pub type Arguments = SmallVec<[String; INLINE_ARGUMENTS]>;

/// One event in a provenance chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaintOperation {
    name: Cow<'static, str>,
    #[serde(default)]
    native: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<TaintLocation>,
    #[serde(default)]
    arguments: Arguments,
}

/// Sources are plain operations; the alias documents intent at call sites.
pub type TaintSource = TaintOperation;

impl TaintOperation {
    /// Create an operation without location or arguments.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            native: false,
            location: None,
            arguments: Arguments::new(),
        }
    }

    /// Create an operation carrying stringified arguments.
    pub fn with_arguments<I, S>(name: impl Into<Cow<'static, str>>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            native: false,
            location: None,
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// The synthetic source used by manual tainting.
    pub fn manual_source() -> Self {
        Self::new(MANUAL_SOURCE)
    }

    /// Attach a call-site location.
    #[must_use]
    pub fn at(mut self, location: TaintLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Mark as originating from a builtin rather than script code.
    #[must_use]
    pub fn native(mut self) -> Self {
        self.native = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_native(&self) -> bool {
        self.native
    }

    pub fn location(&self) -> Option<&TaintLocation> {
        self.location.as_ref()
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Argument at `index`, if recorded.
    pub fn argument(&self, index: usize) -> Option<&str> {
        self.arguments.get(index).map(String::as_str)
    }
}

impl fmt::Display for TaintOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, "({})", self.arguments.join(", "))?;
        }
        if let Some(location) = &self.location {
            write!(f, " @ {}", location)?;
        }
        Ok(())
    }
}

impl From<&'static str> for TaintOperation {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}
