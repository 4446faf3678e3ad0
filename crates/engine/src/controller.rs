//! Step lifecycle controller.
//!
//! `StepInstance` drives one inbound message through:
//! 1. `Received → ContextChecked`: reject messages without a flow run when
//!    the step type requires one; otherwise clear the previous status.
//! 2. `ContextChecked → Running`: build the `RequestContext` and call the
//!    step exactly once.
//! 3. `Running → Succeeded`: show any status the step attached, normalize
//!    and tag the output, then complete.
//! 4. `Running → Failed`: show the failure and hand it to the host.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nodes::{Message, Step};
use tracing::{debug, error, info, instrument, warn, Span};

use crate::{
    build_request_context, normalize, Completion, HostNode, InvocationError, Responder, StepType,
};

// ---------------------------------------------------------------------------
// Invocation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    ContextChecked,
    Running,
    Succeeded,
    Failed,
}

impl InvocationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::ContextChecked => "context-checked",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Output of one invocation
// ---------------------------------------------------------------------------

/// How one invocation ended.
#[derive(Debug, Clone)]
pub struct InvocationReport {
    /// Always terminal.
    pub state: InvocationState,
    /// Number of messages handed to the host.
    pub dispatched: usize,
    /// Failure reason, for `Failed`.
    pub reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl InvocationReport {
    fn succeeded(started_at: DateTime<Utc>, dispatched: usize) -> Self {
        Self {
            state: InvocationState::Succeeded,
            dispatched,
            reason: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn failed(started_at: DateTime<Utc>, failure: &InvocationError) -> Self {
        Self {
            state: InvocationState::Failed,
            dispatched: 0,
            reason: Some(failure.to_string()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == InvocationState::Succeeded
    }
}

// ---------------------------------------------------------------------------
// StepInstance
// ---------------------------------------------------------------------------

/// One placement of a step type in a flow, bound to its host node.
///
/// Holds no per-invocation state: `handle` takes `&self`, and concurrent
/// invocations each own their context, output, and completion.
pub struct StepInstance {
    step_type: Arc<StepType>,
    step: Box<dyn Step>,
    host: Arc<dyn HostNode>,
}

impl fmt::Debug for StepInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepInstance")
            .field("step_type", &self.step_type.name)
            .field("node_id", &self.host.id())
            .finish_non_exhaustive()
    }
}

impl StepInstance {
    /// Build the step from the host node's configuration.
    pub fn new(step_type: Arc<StepType>, host: Arc<dyn HostNode>) -> Self {
        let step = step_type.build(host.config());
        Self {
            step_type,
            step,
            host,
        }
    }

    pub fn id(&self) -> &str {
        self.host.id()
    }

    pub fn step_type(&self) -> &StepType {
        &self.step_type
    }

    /// Run one inbound message through the lifecycle.
    ///
    /// Always ends the invocation through `responder`, exactly once.
    #[instrument(
        skip_all,
        fields(
            step_type = %self.step_type.name,
            node_id = %self.host.id(),
            flow_run_id = tracing::field::Empty,
        )
    )]
    pub async fn handle(&self, msg: Message, responder: &mut dyn Responder) -> InvocationReport {
        let started_at = Utc::now();
        let options = self.step_type.options;
        let completion = Completion::new(self.host.as_ref(), responder);
        let mut state = InvocationState::Received;

        if let Some(id) = msg.flow_run_id {
            Span::current().record("flow_run_id", id.get());
        }

        // ------------------------------------------------------------------
        // Received → ContextChecked
        // ------------------------------------------------------------------
        if options.require_flow_run && msg.flow_run_id.is_none() {
            let failure = InvocationError::MissingFlowRun;
            warn!("rejected message without a flow run id");
            advance(&mut state, InvocationState::Failed);
            completion.fail(&failure);
            return InvocationReport::failed(started_at, &failure);
        }
        self.host.clear_status();
        advance(&mut state, InvocationState::ContextChecked);

        // ------------------------------------------------------------------
        // ContextChecked → Running
        // ------------------------------------------------------------------
        let ctx = build_request_context(&msg, self.host.id(), self.host.config());
        let active_run = if options.require_flow_run {
            msg.flow_run_id
        } else {
            None
        };
        advance(&mut state, InvocationState::Running);

        match self.step.on_input(msg, &ctx).await {
            // --------------------------------------------------------------
            // Running → Succeeded
            // --------------------------------------------------------------
            Ok(output) => {
                let (output, status) = output.into_parts();
                if let Some(status) = status {
                    self.host.set_status(status);
                }
                let dispatches = normalize(output, active_run, self.step_type.outputs);
                let dispatched = completion.complete(dispatches);
                advance(&mut state, InvocationState::Succeeded);
                info!(dispatched, "step succeeded");
                InvocationReport::succeeded(started_at, dispatched)
            }

            // --------------------------------------------------------------
            // Running → Failed
            // --------------------------------------------------------------
            Err(e) => {
                let failure = InvocationError::from(e);
                error!("step failed: {failure}");
                completion.fail(&failure);
                advance(&mut state, InvocationState::Failed);
                InvocationReport::failed(started_at, &failure)
            }
        }
    }
}

fn advance(state: &mut InvocationState, next: InvocationState) {
    debug_assert!(!state.is_terminal(), "invocation already ended in {state}");
    debug!(from = %state, to = %next, "invocation state");
    *state = next;
}
