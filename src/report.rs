//! Structured taint reports
//!
//! A report flattens an index into plain data: one entry per range, each
//! carrying its operation history newest first. Reports own their data and
//! serialize with serde, so they can leave the single-threaded world the
//! index itself lives in.

use serde::Serialize;

use crate::flow::{TaintLocation, TaintOperation};
use crate::range::TaintRange;
use crate::string_taint::StringTaint;

/// One operation of a range's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub name: String,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<TaintLocation>,
    pub native: bool,
}

impl From<&TaintOperation> for OperationReport {
    fn from(operation: &TaintOperation) -> Self {
        Self {
            name: operation.name().to_owned(),
            arguments: operation.arguments().to_vec(),
            location: operation.location().cloned(),
            native: operation.is_native(),
        }
    }
}

/// One range with its full history, newest operation first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    pub begin: u32,
    pub end: u32,
    pub operations: Vec<OperationReport>,
}

impl RangeReport {
    /// The operation where the taint entered.
    pub fn source(&self) -> Option<&OperationReport> {
        self.operations.last()
    }
}

impl From<&TaintRange> for RangeReport {
    fn from(range: &TaintRange) -> Self {
        Self {
            begin: range.begin(),
            end: range.end(),
            operations: range.flow().operations().map(OperationReport::from).collect(),
        }
    }
}

impl StringTaint {
    /// Per-range provenance, in range order. Empty when untainted.
    pub fn report(&self) -> Vec<RangeReport> {
        self.iter().map(RangeReport::from).collect()
    }

    /// [`StringTaint::report`] rendered as a JSON array.
    pub fn report_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.report())
    }
}
