//! Parser errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid year filter: {0}")]
    Syntax(String),

    #[error("comparison on `year` has no bound")]
    UnboundedComparison,

    #[error("integer literal '{0}' is out of range")]
    IntegerOutOfRange(String),

    #[error("malformed intent response: {0}")]
    Response(String),
}
