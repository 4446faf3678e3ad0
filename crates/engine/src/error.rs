//! Engine-level error types.

use nodes::StepError;
use thiserror::Error;

/// Errors produced while registering or instantiating step types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Two definitions share the same (namespaced) type name.
    #[error("duplicate step type: '{0}'")]
    DuplicateStepType(String),

    /// No definition is registered under the requested type name.
    #[error("unknown step type: '{0}'")]
    UnknownStepType(String),
}

/// Why one invocation ended in the `Failed` state.
///
/// `Display` is the failure reason handed to the host.
#[derive(Debug, Error, Clone)]
pub enum InvocationError {
    /// The step type requires a flow run and the message carried none.
    #[error("This step must run as part of a correlated flow, after an originating step (missing flow run id).")]
    MissingFlowRun,

    /// The step's business logic failed; the reason is passed through verbatim.
    #[error(transparent)]
    Step(#[from] StepError),
}

impl InvocationError {
    /// Short text for the status indicator.
    pub fn status_text(&self) -> String {
        match self {
            Self::MissingFlowRun => "must run after a start-flow step (missing flow run id)".to_owned(),
            Self::Step(e) => e.to_string(),
        }
    }
}
