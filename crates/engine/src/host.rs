//! Contracts the host runtime fulfils for the engine.
//!
//! A host owns the step instances placed in a flow.  For each instance it
//! provides a [`HostNode`] (identity, configuration, status indicator), and for
//! each inbound message a [`Responder`] (the send/done pair of that one
//! invocation).

use nodes::StepConfig;

use crate::{Dispatch, InvocationError};

pub use nodes::{NodeStatus, Severity};

/// Host-side view of one step instance.
///
/// Identity and configuration are fixed for the instance's lifetime.  Status
/// calls take `&self`; hosts keep their indicator behind their own interior
/// mutability.
pub trait HostNode: Send + Sync {
    fn id(&self) -> &str;

    fn config(&self) -> &StepConfig;

    fn set_status(&self, status: NodeStatus);

    fn clear_status(&self);
}

/// The send/done pair for one inbound message.
pub trait Responder: Send {
    /// Forward messages to the steps wired after this one.
    fn send(&mut self, dispatches: Vec<Dispatch>);

    /// End the invocation.  A failure is also the host's error report: the
    /// full error value is handed over so root causes stay inspectable.
    fn done(&mut self, failure: Option<&InvocationError>);
}
