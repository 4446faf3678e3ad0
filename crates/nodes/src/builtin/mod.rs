//! Built-in steps.
//!
//! Each one is a thin transform around a single connector call: parse the
//! configuration, build the request with the invocation's metadata, and turn
//! the response into a payload.

use std::sync::Arc;

use connector::NodeConnector;

use crate::StepDefinition;

pub mod flow;
pub mod text;
pub mod ur3;
pub mod xpeel;

pub use flow::{GrpcPing, StartFlow, ViewFlows};
pub use text::LowerCase;
pub use ur3::{Ur3Move, Ur3MoveToJointWaypoint};
pub use xpeel::{XPeelReset, XPeelSealCheck, XPeelStatus, XPeelTapeRemaining, XPeelXPeel};

/// Definitions of every built-in step, bound to `connector`.
pub fn catalog(connector: Arc<dyn NodeConnector>) -> Vec<StepDefinition> {
    vec![
        StartFlow::definition(Arc::clone(&connector)),
        ViewFlows::definition(Arc::clone(&connector)),
        GrpcPing::definition(Arc::clone(&connector)),
        LowerCase::definition(),
        Ur3Move::definition(Arc::clone(&connector)),
        Ur3MoveToJointWaypoint::definition(Arc::clone(&connector)),
        XPeelStatus::definition(Arc::clone(&connector)),
        XPeelReset::definition(Arc::clone(&connector)),
        XPeelXPeel::definition(Arc::clone(&connector)),
        XPeelSealCheck::definition(Arc::clone(&connector)),
        XPeelTapeRemaining::definition(connector),
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{FlowRunId, RequestContext};

    pub fn context(flow_run_id: Option<i64>) -> RequestContext {
        RequestContext {
            executing_node_id: "node-1".into(),
            flow_run_id: flow_run_id.map(FlowRunId),
            instrument_id: Some(2),
        }
    }
}
