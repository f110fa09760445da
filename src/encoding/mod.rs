//! Encoding and decoding of taint information
//!
//! Only the human-readable text format is provided; structured output goes
//! through [`crate::report`] and serde.

mod text;

pub use text::{parse_taint, print_taint, try_parse_taint, TextDecoder, TextEncoder};
