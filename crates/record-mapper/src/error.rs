//! Mapping errors.

use thiserror::Error;

/// Errors from converting store rows into records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapperError {
    /// A scanned row's body is missing or is not a well-formed field map.
    #[error("Malformed document '{id}': {reason}")]
    Malformed { id: String, reason: String },
}
