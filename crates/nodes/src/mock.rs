//! `MockStep` — a test double for `Step`.
//!
//! Useful in unit and integration tests where a real step implementation is
//! either unavailable or irrelevant.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    Message, RequestContext, Step, StepConfig, StepDefinition, StepError, StepOptions, StepOutput,
};

/// Behaviour injected into `MockStep` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Return a specific output.
    Return(StepOutput),
    /// Hand the inbound message straight back.
    Echo,
    /// Fail with `StepError::Failed`.
    Fail(String),
}

/// One invocation seen by a `MockStep`.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub message: Message,
    pub context: RequestContext,
}

/// A mock step that records every call it receives and returns a
/// programmer-specified result.
///
/// Clones share the same call log, so a definition built from a mock keeps
/// reporting into the mock it was built from.
#[derive(Debug, Clone)]
pub struct MockStep {
    /// Label used in test assertions.
    pub name: String,
    /// What the step will do when `on_input` is called.
    pub behaviour: MockBehaviour,
    /// All invocations seen by this step (in call order).
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockStep {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given output.
    pub fn returning(name: impl Into<String>, output: impl Into<StepOutput>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Return(output.into()))
    }

    /// Create a mock that sends back whatever it receives.
    pub fn echoing(name: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Echo)
    }

    /// Create a mock that always fails with the given reason.
    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Fail(reason.into()))
    }

    /// A step type whose every instance reports into this mock.
    pub fn definition(&self, options: StepOptions, outputs: usize) -> StepDefinition {
        let mock = self.clone();
        StepDefinition::new(self.name.clone(), move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(mock.clone())
        })
        .options(options)
        .outputs(outputs)
    }

    /// All invocations so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times this step has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl Step for MockStep {
    async fn on_input(&self, msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(MockCall {
                message: msg.clone(),
                context: ctx.clone(),
            });

        match &self.behaviour {
            MockBehaviour::Return(output) => Ok(output.clone()),
            MockBehaviour::Echo => Ok(StepOutput::Single(msg)),
            MockBehaviour::Fail(reason) => Err(StepError::Failed(reason.clone())),
        }
    }
}
