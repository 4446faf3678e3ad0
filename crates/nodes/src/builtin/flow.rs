//! Service-level steps: opening a flow run, listing the open runs, and pinging
//! the service.

use std::sync::Arc;

use async_trait::async_trait;
use connector::models::{GetRunningFlowsRequest, PingRequest, StartFlowRequest};
use connector::NodeConnector;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::{
    FlowRunId, Message, NodeStatus, RequestContext, Step, StepConfig, StepDefinition, StepError,
    StepOptions, StepOutput,
};

// ---------------------------------------------------------------------------
// start-flow
// ---------------------------------------------------------------------------

/// Opens a flow run and stamps its id on the outgoing message.
///
/// The only step that assigns a run id; everything downstream inherits it.
pub struct StartFlow {
    connector: Arc<dyn NodeConnector>,
    flow_name: String,
}

impl StartFlow {
    pub const TYPE: &'static str = "start-flow";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |config: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
                flow_name: config.get("flow_name").unwrap_or_default().to_owned(),
            })
        })
        .options(StepOptions::STANDALONE)
    }
}

#[async_trait]
impl Step for StartFlow {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = self
            .connector
            .start_flow(StartFlowRequest {
                start_node_id: ctx.executing_node_id.clone(),
                flow_name: self.flow_name.clone(),
            })
            .await?;

        if !response.success {
            return Err(StepError::failed(format!(
                "service refused to start flow '{}'",
                self.flow_name
            )));
        }

        let run_id: FlowRunId = response.run_id.parse().map_err(|_| {
            StepError::failed(format!("service returned an invalid run id '{}'", response.run_id))
        })?;

        info!(flow = %self.flow_name, %run_id, "flow run started");

        msg.flow_run_id = Some(run_id);
        msg.payload = json!({ "flow_name": self.flow_name, "run_id": run_id });
        Ok(StepOutput::Single(msg))
    }
}

// ---------------------------------------------------------------------------
// view-flows
// ---------------------------------------------------------------------------

/// Lists the flow runs the service still has in progress, newest first.
///
/// A failed lookup shows an error status and sends an empty message.
pub struct ViewFlows {
    connector: Arc<dyn NodeConnector>,
}

impl ViewFlows {
    pub const TYPE: &'static str = "view-flows";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
        .options(StepOptions::STANDALONE)
    }
}

#[async_trait]
impl Step for ViewFlows {
    async fn on_input(&self, _msg: Message, _ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = match self
            .connector
            .get_running_flows(GetRunningFlowsRequest::default())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("could not list running flows: {e}");
                return Ok(StepOutput::Single(Message::default())
                    .with_status(NodeStatus::error(e.to_string())));
            }
        };

        let runs = serde_json::to_value(&response.flow_runs)
            .map_err(|e| StepError::failed(format!("unreadable flow runs: {e}")))?;
        Ok(StepOutput::Single(Message::new(runs)))
    }
}

// ---------------------------------------------------------------------------
// grpc-ping
// ---------------------------------------------------------------------------

/// Round-trips the payload through the service.
///
/// Port 0 carries the success flag and port 1 the reply text.  The reply is
/// also shown as a success status.  An unreachable service is reported on the
/// same ports, with an error status, instead of failing the invocation.
pub struct GrpcPing {
    connector: Arc<dyn NodeConnector>,
}

impl GrpcPing {
    pub const TYPE: &'static str = "grpc-ping";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
        .options(StepOptions::STANDALONE)
        .outputs(2)
    }
}

#[async_trait]
impl Step for GrpcPing {
    async fn on_input(&self, msg: Message, _ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let message = match msg.payload {
            Value::String(text) => text,
            Value::Null => {
                return Err(StepError::InvalidPayload(
                    "ping needs a payload to send".to_owned(),
                ))
            }
            other => other.to_string(),
        };

        match self.connector.ping(PingRequest { message }).await {
            Ok(response) => {
                let status = NodeStatus::success(response.message.clone());
                Ok(StepOutput::Many(vec![
                    Message::new(response.success),
                    Message::new(response.message),
                ])
                .with_status(status))
            }
            Err(e) => {
                warn!("ping failed: {e}");
                Ok(StepOutput::Many(vec![
                    Message::new(false),
                    Message::new(e.to_string()),
                ])
                .with_status(NodeStatus::error(e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use connector::{SimulatedConnector, SimulatorConfig};

    use super::*;
    use crate::builtin::fixtures::context;

    #[tokio::test]
    async fn start_flow_assigns_the_new_run_id() {
        let sim = Arc::new(SimulatedConnector::new(SimulatorConfig {
            first_run_id: 42,
            ..SimulatorConfig::default()
        }));
        let step = StartFlow::definition(sim.clone())
            .build(&StepConfig::new().with("flow_name", "peel-and-move"));

        let out = step
            .on_input(Message::new(Value::Null), &context(None))
            .await
            .expect("start should succeed");

        let StepOutput::Single(msg) = out else {
            panic!("expected a single message");
        };
        assert_eq!(msg.flow_run_id, Some(FlowRunId(42)));
        assert_eq!(msg.payload, json!({ "flow_name": "peel-and-move", "run_id": 42 }));

        let calls = sim.calls();
        assert_eq!(calls[0].request["start_node_id"], "node-1");
    }

    #[tokio::test]
    async fn view_flows_lists_open_runs() {
        let sim = Arc::new(SimulatedConnector::new(SimulatorConfig {
            first_run_id: 3,
            ..SimulatorConfig::default()
        }));
        let start = StartFlow::definition(sim.clone())
            .build(&StepConfig::new().with("flow_name", "peel-and-move"));
        start
            .on_input(Message::default(), &context(None))
            .await
            .unwrap();

        let view = ViewFlows::definition(sim).build(&StepConfig::new());
        let out = view
            .on_input(Message::new("tick"), &context(None))
            .await
            .unwrap();

        let StepOutput::Single(msg) = out else {
            panic!("expected a single message");
        };
        let runs = msg.payload.as_array().expect("payload should list runs");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["id"], 3);
        assert_eq!(runs[0]["name"], "peel-and-move");
        assert_eq!(runs[0]["status"], "in-progress");
        assert_eq!(msg.flow_run_id, None);
    }

    #[tokio::test]
    async fn view_flows_reports_an_offline_service_with_an_empty_message() {
        let step = ViewFlows::definition(Arc::new(SimulatedConnector::offline()))
            .build(&StepConfig::new());

        let out = step
            .on_input(Message::new("tick"), &context(None))
            .await
            .unwrap();

        assert_eq!(
            out,
            StepOutput::Single(Message::default())
                .with_status(NodeStatus::error("device offline"))
        );
    }

    #[tokio::test]
    async fn ping_sends_result_and_reply_on_separate_ports() {
        let step = GrpcPing::definition(Arc::new(SimulatedConnector::default()))
            .build(&StepConfig::new());

        let out = step.on_input(Message::new(7), &context(None)).await.unwrap();

        assert_eq!(
            out,
            StepOutput::Many(vec![Message::new(true), Message::new("Pong (7)")])
                .with_status(NodeStatus::success("Pong (7)"))
        );
    }

    #[tokio::test]
    async fn ping_reports_an_offline_service_without_failing() {
        let step = GrpcPing::definition(Arc::new(SimulatedConnector::offline()))
            .build(&StepConfig::new());

        let out = step.on_input(Message::new("hi"), &context(None)).await.unwrap();

        assert_eq!(
            out,
            StepOutput::Many(vec![Message::new(false), Message::new("device offline")])
                .with_status(NodeStatus::error("device offline"))
        );
    }
}
