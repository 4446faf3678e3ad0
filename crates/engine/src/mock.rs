//! Recording host doubles.
//!
//! `RecordingNode` and `RecordingResponder` stand in for the host runtime in
//! tests and keep everything the engine told them.

use std::sync::{Mutex, PoisonError};

use nodes::{Message, StepConfig};

use crate::{Dispatch, HostNode, InvocationError, NodeStatus, Responder};

/// A host node that remembers every status change.
#[derive(Debug)]
pub struct RecordingNode {
    id: String,
    config: StepConfig,
    /// `None` entries are clears.
    statuses: Mutex<Vec<Option<NodeStatus>>>,
}

impl RecordingNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_config(id, StepConfig::new())
    }

    pub fn with_config(id: impl Into<String>, config: StepConfig) -> Self {
        Self {
            id: id.into(),
            config,
            statuses: Mutex::new(Vec::new()),
        }
    }

    /// Status currently shown, if any.
    pub fn status(&self) -> Option<NodeStatus> {
        self.history().last().cloned().flatten()
    }

    /// Every status change in order; `None` entries are clears.
    pub fn history(&self) -> Vec<Option<NodeStatus>> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Put a status on the node as if a previous invocation had left it.
    pub fn preset(&self, status: NodeStatus) {
        self.set_status(status);
    }
}

impl HostNode for RecordingNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn config(&self) -> &StepConfig {
        &self.config
    }

    fn set_status(&self, status: NodeStatus) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Some(status));
    }

    fn clear_status(&self) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(None);
    }
}

/// A responder that keeps what was sent and how the invocation ended.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    /// Every dispatch, flattened across `send` calls.
    pub sent: Vec<Dispatch>,
    pub send_calls: usize,
    /// One entry per `done` call; `Some` for failures.
    pub outcomes: Vec<Option<InvocationError>>,
}

impl RecordingResponder {
    /// Messages sent, in order, without their ports.
    pub fn messages(&self) -> Vec<Message> {
        self.sent.iter().map(|d| d.message.clone()).collect()
    }

    /// The failure the invocation ended with, if any.
    pub fn failure(&self) -> Option<&InvocationError> {
        self.outcomes.iter().flatten().next()
    }
}

impl Responder for RecordingResponder {
    fn send(&mut self, dispatches: Vec<Dispatch>) {
        self.send_calls += 1;
        self.sent.extend(dispatches);
    }

    fn done(&mut self, failure: Option<&InvocationError>) {
        self.outcomes.push(failure.cloned());
    }
}
