//! Result normalization.
//!
//! Flattens whatever shape a step returned into `(port, message)` pairs and
//! stamps the active flow run id on every message.  Never fails: anything odd
//! is logged and passed through.  A status attached to the output is not a
//! dispatch and is dropped here; the controller shows it.

use nodes::{FlowRunId, Message, StepOutput};
use serde::Serialize;
use tracing::warn;

/// One outbound message and the output port it leaves on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispatch {
    pub port: usize,
    pub message: Message,
}

/// Normalize a step's output.
///
/// `flow_run_id` is the run to propagate, or `None` when the step type does
/// not take part in correlation (messages are then left as the step built
/// them).  `outputs` is the number of ports the step type declares.
pub fn normalize(output: StepOutput, flow_run_id: Option<FlowRunId>, outputs: usize) -> Vec<Dispatch> {
    let produced_something = !output.is_none();
    let (output, _) = output.into_parts();

    let dispatches: Vec<Dispatch> = match output {
        StepOutput::None | StepOutput::Reported { .. } => Vec::new(),
        StepOutput::Single(message) => vec![Dispatch { port: 0, message }],
        StepOutput::Many(messages) => messages
            .into_iter()
            .enumerate()
            .map(|(port, message)| Dispatch { port, message })
            .collect(),
        StepOutput::Fanout(ports) => ports
            .into_iter()
            .enumerate()
            .flat_map(|(port, messages)| {
                messages
                    .into_iter()
                    .map(move |message| Dispatch { port, message })
            })
            .collect(),
    };

    if produced_something && dispatches.is_empty() {
        warn!("step returned an empty result; nothing will be sent");
    }

    dispatches
        .into_iter()
        .map(|dispatch| {
            if dispatch.port >= outputs {
                warn!(
                    port = dispatch.port,
                    outputs, "message addressed to a port the step type does not declare"
                );
            }
            tag(dispatch, flow_run_id)
        })
        .collect()
}

fn tag(mut dispatch: Dispatch, flow_run_id: Option<FlowRunId>) -> Dispatch {
    let Some(active) = flow_run_id else {
        return dispatch;
    };

    if let Some(existing) = dispatch.message.flow_run_id {
        if existing != active {
            warn!(%existing, %active, "overwriting a foreign flow run id on an outbound message");
        }
    }
    dispatch.message.flow_run_id = Some(active);
    dispatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RUN: FlowRunId = FlowRunId(7);

    fn regroup(dispatches: &[Dispatch]) -> StepOutput {
        let ports = dispatches.iter().map(|d| d.port + 1).max().unwrap_or(0);
        let mut grouped = vec![Vec::new(); ports];
        for d in dispatches {
            grouped[d.port].push(d.message.clone());
        }
        StepOutput::Fanout(grouped)
    }

    #[test]
    fn single_message_goes_out_port_zero_tagged() {
        let out = normalize(StepOutput::Single(Message::new("ABC!")), Some(FlowRunId(42)), 1);
        assert_eq!(
            out,
            vec![Dispatch {
                port: 0,
                message: Message::new("ABC!").with_flow_run(42),
            }]
        );
    }

    #[test]
    fn flat_sequence_is_positional() {
        let out = normalize(
            StepOutput::Many(vec![Message::new(1), Message::new(2)]),
            Some(RUN),
            2,
        );
        assert_eq!(out.iter().map(|d| d.port).collect::<Vec<_>>(), vec![0, 1]);
        assert!(out.iter().all(|d| d.message.flow_run_id == Some(RUN)));
    }

    #[test]
    fn fanout_sends_several_messages_per_port() {
        let out = normalize(
            StepOutput::Fanout(vec![
                vec![Message::new("a"), Message::new("b")],
                vec![],
                vec![Message::new("c")],
            ]),
            Some(RUN),
            3,
        );
        let ports: Vec<_> = out.iter().map(|d| d.port).collect();
        assert_eq!(ports, vec![0, 0, 2]);
        assert!(out.iter().all(|d| d.message.flow_run_id == Some(RUN)));
    }

    #[test]
    fn array_payload_is_data_not_fanout() {
        let out = normalize(StepOutput::Single(Message::new(json!([1, 2, 3]))), Some(RUN), 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message.payload, json!([1, 2, 3]));
    }

    #[test]
    fn tagging_twice_changes_nothing() {
        let first = normalize(
            StepOutput::Fanout(vec![vec![Message::new(1)], vec![Message::new(2), Message::new(3)]]),
            Some(RUN),
            2,
        );
        let second = normalize(regroup(&first), Some(RUN), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn foreign_run_id_is_replaced() {
        let out = normalize(
            StepOutput::Single(Message::new(1).with_flow_run(99)),
            Some(RUN),
            1,
        );
        assert_eq!(out[0].message.flow_run_id, Some(RUN));
    }

    #[test]
    fn uncorrelated_steps_keep_their_own_tags() {
        let out = normalize(
            StepOutput::Many(vec![Message::new(1).with_flow_run(3), Message::new(2)]),
            None,
            2,
        );
        assert_eq!(out[0].message.flow_run_id, Some(FlowRunId(3)));
        assert_eq!(out[1].message.flow_run_id, None);
    }

    #[test]
    fn anomalies_still_pass_through() {
        let out = normalize(
            StepOutput::Many(vec![Message::new(1), Message::new(2)]),
            Some(RUN),
            1,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].message.flow_run_id, Some(RUN));

        assert!(normalize(StepOutput::Many(vec![]), Some(RUN), 1).is_empty());
        assert!(normalize(StepOutput::None, Some(RUN), 1).is_empty());
    }

    #[test]
    fn attached_status_does_not_change_the_dispatches() {
        let out = normalize(
            StepOutput::Many(vec![Message::new(true), Message::new("Pong (1)")])
                .with_status(nodes::NodeStatus::success("Pong (1)")),
            Some(RUN),
            2,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].port, 1);
        assert_eq!(out[1].message.flow_run_id, Some(RUN));
    }
}
