//! RequestContext construction.

use nodes::{Message, RequestContext, StepConfig};

/// Build the correlation context for one invocation.
///
/// Pure: reads the inbound message's run id, the instance identity, and the
/// optional `instrument_id` configuration value.  An instrument id that does
/// not parse is simply left out.
pub fn build_request_context(msg: &Message, node_id: &str, config: &StepConfig) -> RequestContext {
    RequestContext {
        executing_node_id: node_id.to_owned(),
        flow_run_id: msg.flow_run_id,
        instrument_id: config.instrument_id(),
    }
}
