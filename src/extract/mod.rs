// src/extract/mod.rs

//! CSV extraction.
//!
//! - [`source`] opens the configured byte stream (local file or HTTP body).
//! - [`projection`] parses it as delimited text and flattens the configured
//!   columns into one row-major sequence of values.

pub mod projection;
pub mod source;

pub use projection::{project_records, Extracted};
pub use source::{Extractor, SourceReader};
