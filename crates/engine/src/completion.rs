//! The completion protocol of one invocation.

use tracing::warn;

use crate::{Dispatch, HostNode, InvocationError, NodeStatus, Responder};

/// Terminal actions of one invocation.
///
/// Both [`Completion::complete`] and [`Completion::fail`] consume the handle,
/// so an invocation can end at most once.  A handle dropped without ending
/// leaves the host waiting forever: debug builds panic on it, release builds
/// log a warning.
pub struct Completion<'a> {
    node: &'a dyn HostNode,
    responder: &'a mut dyn Responder,
    settled: bool,
}

impl<'a> Completion<'a> {
    pub fn new(node: &'a dyn HostNode, responder: &'a mut dyn Responder) -> Self {
        Self {
            node,
            responder,
            settled: false,
        }
    }

    /// Hand the tagged output to the host and end the invocation.
    ///
    /// An empty output sends nothing.  Returns the number of messages sent.
    pub fn complete(mut self, dispatches: Vec<Dispatch>) -> usize {
        self.settled = true;
        let sent = dispatches.len();
        if sent > 0 {
            self.responder.send(dispatches);
        }
        self.responder.done(None);
        sent
    }

    /// Show the failure on the status indicator, then end the invocation with
    /// it.
    pub fn fail(mut self, failure: &InvocationError) {
        self.settled = true;
        self.node.set_status(NodeStatus::error(failure.status_text()));
        self.responder.done(Some(failure));
    }
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        if self.settled || std::thread::panicking() {
            return;
        }
        warn!(node_id = self.node.id(), "invocation dropped before it completed");
        debug_assert!(
            self.settled,
            "invocation on node '{}' dropped before it completed",
            self.node.id()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{RecordingNode, RecordingResponder};
    use crate::Severity;
    use nodes::{Message, StepError};

    #[test]
    fn complete_sends_once_then_signals_done() {
        let node = RecordingNode::new("n1");
        let mut responder = RecordingResponder::default();

        let sent = Completion::new(&node, &mut responder).complete(vec![Dispatch {
            port: 0,
            message: Message::new(1),
        }]);

        assert_eq!(sent, 1);
        assert_eq!(responder.send_calls, 1);
        assert_eq!(responder.outcomes.len(), 1);
        assert!(responder.outcomes[0].is_none());
        assert_eq!(node.status(), None);
    }

    #[test]
    fn empty_output_skips_send_but_still_ends() {
        let node = RecordingNode::new("n1");
        let mut responder = RecordingResponder::default();

        Completion::new(&node, &mut responder).complete(Vec::new());

        assert_eq!(responder.send_calls, 0);
        assert_eq!(responder.outcomes.len(), 1);
    }

    #[test]
    fn fail_sets_error_status_before_done() {
        let node = RecordingNode::new("n1");
        let mut responder = RecordingResponder::default();
        let failure = InvocationError::from(StepError::failed("gripper jammed"));

        Completion::new(&node, &mut responder).fail(&failure);

        let status = node.status().expect("status should be set");
        assert_eq!(status.severity, Severity::Error);
        assert_eq!(status.text, "gripper jammed");
        assert_eq!(responder.failure().unwrap().to_string(), "gripper jammed");
        assert!(responder.sent.is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropped before it completed")]
    fn unsettled_handle_panics_in_debug_builds() {
        let node = RecordingNode::new("n1");
        let mut responder = RecordingResponder::default();

        drop(Completion::new(&node, &mut responder));
    }

    #[test]
    fn settled_handle_drops_quietly() {
        let node = RecordingNode::new("n1");
        let mut responder = RecordingResponder::default();

        let completion = Completion::new(&node, &mut responder);
        completion.complete(Vec::new());

        assert_eq!(responder.outcomes.len(), 1);
    }
}
