//! # scitree-parser
//!
//! Strict parsers for text produced by the generation model. Model output is
//! never evaluated; it either fits one of these grammars or is rejected.
//!
//! - [`parse_year_filter`]: pest grammar for boolean expressions over `year`
//! - [`parse_intent_response`]: the two-field temporal intent JSON object
//! - [`parse_delimited_entries`]: `{…}` child entries, one per line

pub mod ast;
pub mod delimited;
pub mod error;
pub mod intent;
pub mod year_filter;

pub use ast::{CompOp, YearFilter};
pub use delimited::{parse_delimited_entries, DelimitedEntries};
pub use error::ParseError;
pub use intent::{parse_intent_response, IntentResponse};
pub use year_filter::parse_year_filter;
