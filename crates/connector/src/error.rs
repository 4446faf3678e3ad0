//! Typed error type for the connector crate.

use thiserror::Error;

/// A failed remote call.
///
/// The `Display` output is the human-readable message only; steps pass it
/// through verbatim as their failure reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The service could not be reached, or the call was abandoned.
    #[error("{0}")]
    Unavailable(String),

    /// The service answered with an error.
    #[error("{message}")]
    Remote {
        operation: &'static str,
        message: String,
    },
}
