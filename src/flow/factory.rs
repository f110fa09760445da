//! Construction of operation records from the current call site
//!
//! The factory is the one place where embedder context (call-site location,
//! configuration) meets the core data model. Argument values are stringified
//! and capped in length so that huge inputs do not get copied into every
//! provenance node.

use std::borrow::Cow;
use std::fmt::Display;

use tracing::trace;

use super::location::{CallSite, NoCallSite};
use super::operation::{Arguments, TaintOperation};
use crate::config::TaintConfig;

/// Builds [`TaintOperation`]s stamped with the current call site.
#[derive(Debug, Clone)]
pub struct OperationFactory<C = NoCallSite> {
    call_site: C,
    config: TaintConfig,
}

impl OperationFactory {
    /// Factory for contexts without script frames.
    pub fn detached(config: TaintConfig) -> Self {
        Self::new(NoCallSite, config)
    }
}

impl Default for OperationFactory {
    fn default() -> Self {
        Self::detached(TaintConfig::default())
    }
}

impl<C: CallSite> OperationFactory<C> {
    pub fn new(call_site: C, config: TaintConfig) -> Self {
        Self { call_site, config }
    }

    pub fn config(&self) -> &TaintConfig {
        &self.config
    }

    pub fn call_site(&self) -> &C {
        &self.call_site
    }

    /// Script-level operation without arguments.
    pub fn named(&self, name: impl Into<Cow<'static, str>>) -> TaintOperation {
        self.build(name.into(), false, std::iter::empty::<&str>())
    }

    /// Script-level operation with stringified arguments.
    pub fn operation<I>(&self, name: impl Into<Cow<'static, str>>, arguments: I) -> TaintOperation
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.build(name.into(), false, arguments)
    }

    /// Operation performed by a builtin.
    pub fn native_operation<I>(
        &self,
        name: impl Into<Cow<'static, str>>,
        arguments: I,
    ) -> TaintOperation
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.build(name.into(), true, arguments)
    }

    fn build<I>(&self, name: Cow<'static, str>, native: bool, arguments: I) -> TaintOperation
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let max = self.config.max_argument_length;
        let arguments: Arguments = arguments
            .into_iter()
            .map(|arg| truncate_argument(arg.to_string(), max))
            .collect();

        let mut operation = TaintOperation::with_arguments(name, arguments);
        if native {
            operation = operation.native();
        }
        if self.config.record_locations {
            if let Some(location) = self.call_site.current_location() {
                operation = operation.at(location);
            }
        }
        operation
    }
}

fn truncate_argument(mut arg: String, max_chars: usize) -> String {
    if let Some((cut, _)) = arg.char_indices().nth(max_chars) {
        trace!("Truncating taint argument from {} to {} bytes", arg.len(), cut);
        arg.truncate(cut);
    }
    arg
}
