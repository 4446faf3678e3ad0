//! The `NodeConnector` trait — the client side of the node-connector service.

use async_trait::async_trait;

use crate::models::{
    GetRunningFlowsRequest, GetRunningFlowsResponse, PingRequest, PingResponse,
    StartFlowRequest, StartFlowResponse, Ur3MoveRequest,
    Ur3MoveResponse, Ur3MoveToJointWaypointRequest, Ur3MoveToJointWaypointResponse,
    XPeelGeneralRequest, XPeelSealCheckResponse, XPeelStatusResponse,
    XPeelTapeRemainingResponse, XPeelXPeelRequest,
};
use crate::RpcError;

/// One method per remote operation.
///
/// Every call is a single suspend point for the caller.  Timeouts and
/// cancellation belong to the implementation; an abandoned call must resolve
/// to [`RpcError::Unavailable`] rather than hang.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    async fn ping(&self, request: PingRequest) -> Result<PingResponse, RpcError>;

    async fn start_flow(&self, request: StartFlowRequest) -> Result<StartFlowResponse, RpcError>;

    async fn get_running_flows(
        &self,
        request: GetRunningFlowsRequest,
    ) -> Result<GetRunningFlowsResponse, RpcError>;

    async fn ur3_move(&self, request: Ur3MoveRequest) -> Result<Ur3MoveResponse, RpcError>;

    async fn ur3_move_to_joint_waypoint(
        &self,
        request: Ur3MoveToJointWaypointRequest,
    ) -> Result<Ur3MoveToJointWaypointResponse, RpcError>;

    async fn xpeel_status(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelStatusResponse, RpcError>;

    async fn xpeel_reset(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelStatusResponse, RpcError>;

    async fn xpeel_xpeel(&self, request: XPeelXPeelRequest)
        -> Result<XPeelStatusResponse, RpcError>;

    async fn xpeel_seal_check(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelSealCheckResponse, RpcError>;

    async fn xpeel_tape_remaining(
        &self,
        request: XPeelGeneralRequest,
    ) -> Result<XPeelTapeRemainingResponse, RpcError>;
}
