//! Request and response messages exchanged with the node-connector service.
//!
//! Requests for operations that run inside a flow embed a [`RequestMetadata`]
//! so the service can correlate the call with the flow run and the step that
//! issued it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Correlation data attached to every flow-scoped request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Identity of the step instance issuing the call.
    pub executing_node_id: String,
    /// Flow run the call belongs to, if any.
    pub flow_run_id: Option<i64>,
    /// Instrument the step is configured to drive, if any.
    pub instrument_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Service-level operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
    pub success: bool,
}

/// Opens a new flow run on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartFlowRequest {
    /// Identity of the step that originates the run.
    pub start_node_id: String,
    pub flow_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartFlowResponse {
    pub success: bool,
    /// Decimal id of the new run, as sent on the wire.
    pub run_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRunningFlowsRequest {}

/// One flow run as the service tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRun {
    pub id: i64,
    pub name: String,
    pub start_flow_node_id: String,
    /// Step the run is currently executing.
    pub current_node_id: String,
    pub started_at: DateTime<Utc>,
    pub status: String,
}

/// Runs still in progress, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRunningFlowsResponse {
    pub flow_runs: Vec<FlowRun>,
}

// ---------------------------------------------------------------------------
// UR3 arm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ur3MoveRequest {
    pub source_waypoint_number: i32,
    pub destination_waypoint_number: i32,
    /// Pause between the two movements, in seconds.
    pub delay_between_movements: f64,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ur3MoveResponse {
    pub metadata: ResponseMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ur3MoveToJointWaypointRequest {
    pub waypoint_number: i32,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ur3MoveToJointWaypointResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// XPeel de-sealer
// ---------------------------------------------------------------------------

/// Request for XPeel operations that take no arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPeelGeneralRequest {
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPeelXPeelRequest {
    pub set_number: i32,
    pub adhere_time: i32,
    pub metadata: RequestMetadata,
}

/// The three error-code registers reported by the de-sealer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPeelStatusResponse {
    pub error_code_1: i32,
    pub error_code_2: i32,
    pub error_code_3: i32,
}

impl XPeelStatusResponse {
    pub fn codes(&self) -> [i32; 3] {
        [self.error_code_1, self.error_code_2, self.error_code_3]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPeelSealCheckResponse {
    pub seal_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XPeelTapeRemainingResponse {
    pub deseals_remaining: i32,
    pub take_up_spool_space_remaining: i32,
}
