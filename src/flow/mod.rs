//! Provenance: operation records and the chains built from them
//!
//! # Overview
//!
//! - **Operations**: immutable descriptions of one event (name, location,
//!   stringified arguments)
//! - **Nodes / Flows**: reference-counted, singly linked chains of operations,
//!   newest first; the terminal node is the taint source
//! - **Factory**: builds operations stamped with the embedder's call site
//!
//! # Example
//!
//! ```
//! use string_taint::flow::{TaintFlow, TaintOperation};
//!
//! let mut flow = TaintFlow::new(TaintOperation::new("location.hash"));
//! flow.extend(TaintOperation::with_arguments("substring", ["1", "8"]));
//!
//! assert_eq!(flow.operation().name(), "substring");
//! assert_eq!(flow.source().name(), "location.hash");
//! ```

pub mod factory;
pub mod location;
pub mod node;
pub mod operation;

pub use factory::OperationFactory;
pub use location::{CallSite, FixedCallSite, NoCallSite, TaintLocation};
pub use node::{FlowIter, TaintFlow, TaintNode};
pub use operation::{Arguments, TaintOperation, TaintSource, MANUAL_SOURCE};
