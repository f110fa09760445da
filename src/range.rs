//! A half-open character range carrying one provenance chain.

use std::fmt;

use crate::flow::{TaintFlow, TaintOperation};

/// `[begin, end)` over a string plus the chain those characters carry.
#[derive(Clone, PartialEq, Eq)]
pub struct TaintRange {
    begin: u32,
    end: u32,
    flow: TaintFlow,
}

impl TaintRange {
    /// Create a range.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    pub fn new(begin: u32, end: u32, flow: TaintFlow) -> Self {
        assert!(begin <= end, "inverted taint range {begin} - {end}");
        Self { begin, end, flow }
    }

    /// Range tainted by a fresh source node for `operation`.
    pub fn from_operation(begin: u32, end: u32, operation: TaintOperation) -> Self {
        Self::new(begin, end, TaintFlow::new(operation))
    }

    pub fn begin(&self) -> u32 {
        self.begin
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn flow(&self) -> &TaintFlow {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut TaintFlow {
        &mut self.flow
    }

    pub fn into_flow(self) -> TaintFlow {
        self.flow
    }

    pub fn len(&self) -> u32 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, index: u32) -> bool {
        self.begin <= index && index < self.end
    }

    /// Does this range share at least one character with `[begin, end)`?
    pub fn overlaps(&self, begin: u32, end: u32) -> bool {
        self.begin < end && self.end > begin
    }

    /// Change the boundaries, keeping the chain.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`.
    pub fn resize(&mut self, begin: u32, end: u32) {
        assert!(begin <= end, "inverted taint range {begin} - {end}");
        self.begin = begin;
        self.end = end;
    }

    /// Same chain, different boundaries.
    #[must_use]
    pub fn with_bounds(&self, begin: u32, end: u32) -> Self {
        Self::new(begin, end, self.flow.clone())
    }

    /// Same chain, moved by `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the result leaves the `u32` domain.
    #[must_use]
    pub fn shifted(&self, offset: i64) -> Self {
        let move_by = |pos: u32| -> u32 {
            u32::try_from(i64::from(pos) + offset)
                .unwrap_or_else(|_| panic!("taint range shift by {offset} out of bounds at {pos}"))
        };
        self.with_bounds(move_by(self.begin), move_by(self.end))
    }
}

impl fmt::Debug for TaintRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}) {:?}", self.begin, self.end, self.flow)
    }
}

impl fmt::Display for TaintRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} : {}",
            self.begin,
            self.end,
            self.flow.source().name()
        )
    }
}
