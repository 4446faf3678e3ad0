//! A terminal host: dispatches go to stdout as JSON lines, statuses and
//! failures to the log.

use engine::{Dispatch, HostNode, InvocationError, NodeStatus, Responder, Severity};
use nodes::StepConfig;
use tracing::{error, info, warn};

pub struct ConsoleNode {
    id: String,
    config: StepConfig,
}

impl ConsoleNode {
    pub fn new(id: String, config: StepConfig) -> Self {
        Self { id, config }
    }
}

impl HostNode for ConsoleNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn config(&self) -> &StepConfig {
        &self.config
    }

    fn set_status(&self, status: NodeStatus) {
        match status.severity {
            Severity::Error => error!(node_id = %self.id, "status: {}", status.text),
            Severity::Warning => warn!(node_id = %self.id, "status: {}", status.text),
            Severity::Info | Severity::Success => {
                info!(node_id = %self.id, "status: {}", status.text)
            }
        }
    }

    fn clear_status(&self) {}
}

#[derive(Default)]
pub struct ConsoleResponder;

impl Responder for ConsoleResponder {
    fn send(&mut self, dispatches: Vec<Dispatch>) {
        for dispatch in dispatches {
            match serde_json::to_string(&dispatch) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("cannot encode message for port {}: {e}", dispatch.port),
            }
        }
    }

    fn done(&mut self, failure: Option<&InvocationError>) {
        if let Some(failure) = failure {
            error!(?failure, "invocation failed: {failure}");
        }
    }
}
