//! `SimulatedConnector` — an in-process stand-in for the node-connector
//! service.
//!
//! Answers every operation with the same shape of response the hardware
//! service gives on a healthy bench, without touching any device.  Used by the
//! CLI for dry runs and by tests that need to inspect the requests a step
//! sends.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{
    FlowRun, GetRunningFlowsRequest, GetRunningFlowsResponse, PingRequest, PingResponse,
    RequestMetadata, ResponseMetadata, StartFlowRequest,
    StartFlowResponse, Ur3MoveRequest, Ur3MoveResponse, Ur3MoveToJointWaypointRequest,
    Ur3MoveToJointWaypointResponse, XPeelGeneralRequest, XPeelSealCheckResponse,
    XPeelStatusResponse, XPeelTapeRemainingResponse, XPeelXPeelRequest,
};
use crate::{NodeConnector, RpcError};

/// Tuning knobs for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Artificial delay applied to every call.
    pub latency: Duration,
    /// When set, every call fails with `RpcError::Unavailable`.
    pub offline: bool,
    /// First run id handed out by `start_flow`.
    pub first_run_id: i64,
    pub deseals_remaining: i32,
    pub take_up_spool_space_remaining: i32,
    pub seal_detected: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            latency: Duration::ZERO,
            offline: false,
            first_run_id: 1,
            deseals_remaining: 100,
            take_up_spool_space_remaining: 100,
            seal_detected: true,
        }
    }
}

/// One request seen by the simulator.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub operation: &'static str,
    /// Correlation metadata, for flow-scoped operations.
    pub metadata: Option<RequestMetadata>,
    /// The full request, serialized.
    pub request: Value,
}

pub struct SimulatedConnector {
    config: SimulatorConfig,
    next_run_id: AtomicI64,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    /// Runs opened by `start_flow`; none of them ever finish.
    runs: Mutex<Vec<FlowRun>>,
}

impl SimulatedConnector {
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            next_run_id: AtomicI64::new(config.first_run_id),
            config,
            calls: Arc::new(Mutex::new(Vec::new())),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// A simulator whose every call fails as if the device were unplugged.
    pub fn offline() -> Self {
        Self::new(SimulatorConfig {
            offline: true,
            ..SimulatorConfig::default()
        })
    }

    /// All requests received so far, in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Record the call, apply latency, and fail if offline.
    async fn enter<R: Serialize>(
        &self,
        operation: &'static str,
        metadata: Option<&RequestMetadata>,
        request: &R,
    ) -> Result<(), RpcError> {
        debug!(operation, ?metadata, "simulated call");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                operation,
                metadata: metadata.cloned(),
                request: serde_json::to_value(request).unwrap_or(Value::Null),
            });

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        if self.config.offline {
            return Err(RpcError::Unavailable("device offline".to_owned()));
        }
        Ok(())
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

#[async_trait]
impl NodeConnector for SimulatedConnector {
    async fn ping(&self, request: PingRequest) -> Result<PingResponse, RpcError> {
        self.enter("Ping", None, &request).await?;
        Ok(PingResponse {
            message: format!("Pong ({})", request.message),
            success: true,
        })
    }

    async fn start_flow(&self, request: StartFlowRequest) -> Result<StartFlowResponse, RpcError> {
        self.enter("StartFlow", None, &request).await?;
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FlowRun {
                id: run_id,
                name: request.flow_name,
                current_node_id: request.start_node_id.clone(),
                start_flow_node_id: request.start_node_id,
                started_at: Utc::now(),
                status: "in-progress".to_owned(),
            });
        Ok(StartFlowResponse {
            success: true,
            run_id: run_id.to_string(),
        })
    }

    async fn get_running_flows(
        &self,
        request: GetRunningFlowsRequest,
    ) -> Result<GetRunningFlowsResponse, RpcError> {
        self.enter("GetRunningFlows", None, &request).await?;
        let mut flow_runs = self
            .runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        flow_runs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(GetRunningFlowsResponse { flow_runs })
    }

    async fn ur3_move(&self, request: Ur3MoveRequest) -> Result<Ur3MoveResponse, RpcError> {
        self.enter("UR3Move", Some(&request.metadata), &request)
            .await?;
        Ok(Ur3MoveResponse {
            metadata: ResponseMetadata { success: true },
        })
    }

    async fn ur3_move_to_joint_waypoint(
        &self,
        request: Ur3MoveToJointWaypointRequest,
    ) -> Result<Ur3MoveToJointWaypointResponse, RpcError> {
        self.enter("UR3MoveToJointWaypoint", Some(&request.metadata), &request)
            .await?;
        Ok(Ur3MoveToJointWaypointResponse { success: true })
    }

    async fn xpeel_status(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelStatusResponse, RpcError> {
        self.enter("XPeelStatus", Some(&request.metadata), &request)
            .await?;
        Ok(XPeelStatusResponse::default())
    }

    async fn xpeel_reset(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelStatusResponse, RpcError> {
        self.enter("XPeelReset", Some(&request.metadata), &request)
            .await?;
        Ok(XPeelStatusResponse::default())
    }

    async fn xpeel_xpeel(
        &self,
        request: XPeelXPeelRequest,
    ) -> Result<XPeelStatusResponse, RpcError> {
        self.enter("XPeelXPeel", Some(&request.metadata), &request)
            .await?;
        Ok(XPeelStatusResponse::default())
    }

    async fn xpeel_seal_check(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelSealCheckResponse, RpcError> {
        self.enter("XPeelSealCheck", Some(&request.metadata), &request)
            .await?;
        Ok(XPeelSealCheckResponse {
            seal_detected: self.config.seal_detected,
        })
    }

    async fn xpeel_tape_remaining(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelTapeRemainingResponse, RpcError> {
        self.enter("XPeelTapeRemaining", Some(&request.metadata), &request)
            .await?;
        Ok(XPeelTapeRemainingResponse {
            deseals_remaining: self.config.deseals_remaining,
            take_up_spool_space_remaining: self.config.take_up_spool_space_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(flow_run_id: i64) -> RequestMetadata {
        RequestMetadata {
            executing_node_id: "n1".into(),
            flow_run_id: Some(flow_run_id),
            instrument_id: None,
        }
    }

    #[tokio::test]
    async fn ping_echoes_the_message() {
        let sim = SimulatedConnector::default();
        let resp = sim
            .ping(PingRequest { message: "hello".into() })
            .await
            .expect("ping should succeed");
        assert_eq!(resp.message, "Pong (hello)");
        assert!(resp.success);
    }

    #[tokio::test]
    async fn start_flow_hands_out_sequential_run_ids() {
        let sim = SimulatedConnector::new(SimulatorConfig {
            first_run_id: 40,
            ..SimulatorConfig::default()
        });
        let req = StartFlowRequest {
            start_node_id: "start".into(),
            flow_name: "plate".into(),
        };
        let a = sim.start_flow(req.clone()).await.unwrap();
        let b = sim.start_flow(req).await.unwrap();
        assert_eq!(a.run_id, "40");
        assert_eq!(b.run_id, "41");
    }

    #[tokio::test]
    async fn started_runs_are_listed_newest_first() {
        let sim = SimulatedConnector::new(SimulatorConfig {
            first_run_id: 7,
            ..SimulatorConfig::default()
        });
        for name in ["plate", "seal"] {
            sim.start_flow(StartFlowRequest {
                start_node_id: "start".into(),
                flow_name: name.into(),
            })
            .await
            .unwrap();
        }

        let resp = sim
            .get_running_flows(GetRunningFlowsRequest::default())
            .await
            .unwrap();

        let ids: Vec<_> = resp.flow_runs.iter().map(|run| run.id).collect();
        assert_eq!(ids, vec![8, 7]);
        assert_eq!(resp.flow_runs[1].name, "plate");
        assert_eq!(resp.flow_runs[1].current_node_id, "start");
        assert_eq!(resp.flow_runs[1].status, "in-progress");
    }

    #[tokio::test]
    async fn offline_simulator_fails_and_still_records() {
        let sim = SimulatedConnector::offline();
        let err = sim
            .xpeel_status(XPeelGeneralRequest { metadata: metadata(3) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "device offline");
        assert_eq!(sim.call_count(), 1);
    }

    #[tokio::test]
    async fn flow_scoped_calls_record_their_metadata() {
        let sim = SimulatedConnector::default();
        sim.ur3_move_to_joint_waypoint(Ur3MoveToJointWaypointRequest {
            waypoint_number: 4,
            metadata: metadata(9),
        })
        .await
        .unwrap();

        let calls = sim.calls();
        assert_eq!(calls[0].operation, "UR3MoveToJointWaypoint");
        assert_eq!(calls[0].metadata.as_ref().unwrap().flow_run_id, Some(9));
        assert_eq!(calls[0].request["waypoint_number"], 4);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_is_applied_before_answering() {
        let sim = SimulatedConnector::new(SimulatorConfig {
            latency: Duration::from_secs(2),
            ..SimulatorConfig::default()
        });
        let started = tokio::time::Instant::now();
        sim.xpeel_seal_check(XPeelGeneralRequest { metadata: metadata(1) })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
