//! Step-level error type.

use connector::RpcError;
use thiserror::Error;

/// Errors returned by a step's `on_input` method.
///
/// Every variant is terminal for the invocation; the engine never retries.
/// The `Display` text becomes the failure reason and the status text shown to
/// the operator, so it is kept short and free of prefixes.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    /// The step's own logic gave up.
    #[error("{0}")]
    Failed(String),

    /// A configuration value is missing or does not parse.
    #[error("configuration '{key}' must be {expected} (got '{value}')")]
    InvalidConfig {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// The inbound payload has a shape this step cannot work with.
    #[error("{0}")]
    InvalidPayload(String),

    /// The remote call failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl StepError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
