//! UR3 arm steps.

use std::sync::Arc;

use async_trait::async_trait;
use connector::models::{Ur3MoveRequest, Ur3MoveToJointWaypointRequest};
use connector::NodeConnector;
use serde_json::json;

use crate::{Message, RequestContext, Step, StepConfig, StepDefinition, StepError, StepOutput};

/// Moves a plate from one waypoint to another.
pub struct Ur3Move {
    connector: Arc<dyn NodeConnector>,
    config: StepConfig,
}

impl Ur3Move {
    pub const TYPE: &'static str = "ur3-move";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |config: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
                config: config.clone(),
            })
        })
    }
}

#[async_trait]
impl Step for Ur3Move {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let source_waypoint_number = self.config.require("source_waypoint_number")?;
        let destination_waypoint_number = self.config.require("destination_waypoint_number")?;
        let delay_between_movements = self
            .config
            .parse("delay_between_movements")
            .unwrap_or(0.0);

        let response = self
            .connector
            .ur3_move(Ur3MoveRequest {
                source_waypoint_number,
                destination_waypoint_number,
                delay_between_movements,
                metadata: ctx.metadata(),
            })
            .await?;

        msg.payload = json!({ "success": response.metadata.success });
        Ok(StepOutput::Single(msg))
    }
}

/// Drives the arm to one stored joint waypoint.
pub struct Ur3MoveToJointWaypoint {
    connector: Arc<dyn NodeConnector>,
    config: StepConfig,
}

impl Ur3MoveToJointWaypoint {
    pub const TYPE: &'static str = "ur3-movetojointwaypoint";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |config: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
                config: config.clone(),
            })
        })
    }
}

#[async_trait]
impl Step for Ur3MoveToJointWaypoint {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let waypoint_number = self.config.require("waypoint_number")?;

        let response = self
            .connector
            .ur3_move_to_joint_waypoint(Ur3MoveToJointWaypointRequest {
                waypoint_number,
                metadata: ctx.metadata(),
            })
            .await?;

        msg.payload = json!({ "success": response.success });
        Ok(StepOutput::Single(msg))
    }
}
