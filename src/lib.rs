//! Character-range taint tracking
//!
//! Every tracked string owns a [`StringTaint`]: a sorted list of disjoint
//! `[begin, end)` ranges, each pointing at a shared provenance chain
//! ([`TaintFlow`]). String operations map onto the range algebra
//! (`concat`, `subtaint`, `insert`, `shift`, `overlay`, `extend`,
//! `convert_base`), and chains grow one [`TaintOperation`] at a time.
//!
//! # Format Overview
//! - Text: `[{begin: 0, end: 4, source: 'url'}]` in, `0 - 4 : url` out
//! - JSON: per-range operation history via [`report`]
//!
//! # Example
//!
//! ```
//! use string_taint::{StringTaint, TaintOperation};
//!
//! let url = StringTaint::from_operation(0, 10, TaintOperation::new("location.href"));
//! let tail = url.subtaint(4, 10);
//!
//! assert_eq!(tail.top_range().map(|r| (r.begin(), r.end())), Some((0, 6)));
//! assert_eq!(tail.at(0).unwrap().source().name(), "location.href");
//! ```

pub mod config;
pub mod encoding;
mod error;
pub mod flow;
pub mod range;
pub mod report;
pub mod string_taint;
pub mod tainted;

pub use config::TaintConfig;
pub use encoding::{parse_taint, print_taint, try_parse_taint};
pub use error::{ConfigError, TaintError, TaintResult, TextError};
pub use flow::{
    CallSite, OperationFactory, TaintFlow, TaintLocation, TaintNode, TaintOperation, TaintSource,
    MANUAL_SOURCE,
};
pub use range::TaintRange;
pub use report::{OperationReport, RangeReport};
pub use string_taint::{BaseDirection, StringTaint, EMPTY_TAINT};
pub use tainted::{mark_tainted_arguments, TaintedString};
