//! The `Step` trait — the contract every step must fulfil.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use connector::RequestMetadata;

use crate::{FlowRunId, Message, NodeStatus, StepConfig, StepError};

// ---------------------------------------------------------------------------
// RequestContext
// ---------------------------------------------------------------------------

/// Correlation context of one invocation.
///
/// Defined here (in the nodes crate) so both the engine, which builds it, and
/// individual steps, which embed it in remote calls, can use it without a
/// circular dependency.  Built fresh for every inbound message and never
/// shared between invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Identity of the step instance handling the message.
    pub executing_node_id: String,
    /// Flow run of the inbound message, if it carries one.
    pub flow_run_id: Option<FlowRunId>,
    /// Instrument from the step configuration, if it parses.
    pub instrument_id: Option<i32>,
}

impl RequestContext {
    /// Metadata block for outbound remote requests.
    pub fn metadata(&self) -> RequestMetadata {
        RequestMetadata {
            executing_node_id: self.executing_node_id.clone(),
            flow_run_id: self.flow_run_id.map(FlowRunId::get),
            instrument_id: self.instrument_id,
        }
    }
}

// ---------------------------------------------------------------------------
// StepOptions
// ---------------------------------------------------------------------------

/// Behaviour switches of a step *type*.
///
/// Fixed when the type is registered and shared by every instance of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    /// Reject messages that do not belong to a flow run, and tag every
    /// output with the inbound run id.
    pub require_flow_run: bool,
}

impl StepOptions {
    pub const CORRELATED: Self = Self {
        require_flow_run: true,
    };

    pub const STANDALONE: Self = Self {
        require_flow_run: false,
    };
}

impl Default for StepOptions {
    fn default() -> Self {
        Self::CORRELATED
    }
}

// ---------------------------------------------------------------------------
// StepOutput
// ---------------------------------------------------------------------------

/// What a step hands back for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    /// Nothing to send this turn.
    None,
    /// One message on port 0.
    Single(Message),
    /// One message per port, positionally.
    Many(Vec<Message>),
    /// Any number of messages per port; inner list `i` goes out port `i`.
    Fanout(Vec<Vec<Message>>),
    /// Another output, plus a status for the host to show once the step
    /// returns.  Built with [`StepOutput::with_status`].
    Reported {
        status: NodeStatus,
        output: Box<StepOutput>,
    },
}

impl StepOutput {
    /// True when there is nothing to send, whatever status is attached.
    pub fn is_none(&self) -> bool {
        match self {
            Self::None => true,
            Self::Reported { output, .. } => output.is_none(),
            _ => false,
        }
    }

    pub fn with_status(self, status: NodeStatus) -> Self {
        Self::Reported {
            status,
            output: Box::new(self),
        }
    }

    /// Split off the attached status.  The outermost status wins.
    pub fn into_parts(self) -> (Self, Option<NodeStatus>) {
        match self {
            Self::Reported { status, output } => (output.into_parts().0, Some(status)),
            other => (other, None),
        }
    }
}

impl From<Message> for StepOutput {
    fn from(msg: Message) -> Self {
        Self::Single(msg)
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// The business logic of a step.
///
/// Called exactly once per inbound message.  Implementations may await any
/// number of remote calls; a returned error ends the invocation.
#[async_trait]
pub trait Step: Send + Sync {
    async fn on_input(&self, msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError>;
}

/// Builds one step instance from its configuration.
pub type StepFactory = Arc<dyn Fn(&StepConfig) -> Box<dyn Step> + Send + Sync>;

/// Everything the engine needs to register a step type.
#[derive(Clone)]
pub struct StepDefinition {
    pub type_name: String,
    pub options: StepOptions,
    /// Number of output ports.
    pub outputs: usize,
    pub factory: StepFactory,
}

impl StepDefinition {
    /// A correlated, single-output step type.
    pub fn new<F>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&StepConfig) -> Box<dyn Step> + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            options: StepOptions::default(),
            outputs: 1,
            factory: Arc::new(factory),
        }
    }

    pub fn options(mut self, options: StepOptions) -> Self {
        self.options = options;
        self
    }

    pub fn outputs(mut self, outputs: usize) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn build(&self, config: &StepConfig) -> Box<dyn Step> {
        (self.factory)(config)
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("type_name", &self.type_name)
            .field("options", &self.options)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_split_from_the_output() {
        let out = StepOutput::Single(Message::new(1))
            .with_status(NodeStatus::error("stale"))
            .with_status(NodeStatus::success("Pong (1)"));

        let (output, status) = out.into_parts();

        assert_eq!(output, StepOutput::Single(Message::new(1)));
        assert_eq!(status, Some(NodeStatus::success("Pong (1)")));
    }

    #[test]
    fn a_bare_status_sends_nothing() {
        let out = StepOutput::None.with_status(NodeStatus::error("offline"));
        assert!(out.is_none());
        assert_eq!(StepOutput::None.into_parts(), (StepOutput::None, None));
    }
}
