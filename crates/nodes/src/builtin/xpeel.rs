//! XPeel de-sealer steps.

use std::sync::Arc;

use async_trait::async_trait;
use connector::models::{XPeelGeneralRequest, XPeelXPeelRequest};
use connector::NodeConnector;
use serde_json::json;

use crate::{Message, RequestContext, Step, StepConfig, StepDefinition, StepError, StepOutput};

fn general(ctx: &RequestContext) -> XPeelGeneralRequest {
    XPeelGeneralRequest {
        metadata: ctx.metadata(),
    }
}

/// Reads the three error-code registers.
pub struct XPeelStatus {
    connector: Arc<dyn NodeConnector>,
}

impl XPeelStatus {
    pub const TYPE: &'static str = "xpeel-status";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
    }
}

#[async_trait]
impl Step for XPeelStatus {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = self.connector.xpeel_status(general(ctx)).await?;
        msg.payload = json!(response.codes());
        Ok(StepOutput::Single(msg))
    }
}

/// Resets the de-sealer and reports its error codes.
pub struct XPeelReset {
    connector: Arc<dyn NodeConnector>,
}

impl XPeelReset {
    pub const TYPE: &'static str = "xpeel-reset";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
    }
}

#[async_trait]
impl Step for XPeelReset {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = self.connector.xpeel_reset(general(ctx)).await?;
        msg.payload = json!(response.codes());
        Ok(StepOutput::Single(msg))
    }
}

/// Peels the seal off the current plate.
///
/// `set_number` selects the peel profile and `adhere_time` the dwell before
/// lifting.
pub struct XPeelXPeel {
    connector: Arc<dyn NodeConnector>,
    config: StepConfig,
}

impl XPeelXPeel {
    pub const TYPE: &'static str = "xpeel-xpeel";

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
impl Step for XPeelXPeel {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let request = XPeelXPeelRequest {
            set_number: self.config.require("set_number")?,
            adhere_time: self.config.require("adhere_time")?,
            metadata: ctx.metadata(),
        };
        let response = self.connector.xpeel_xpeel(request).await?;
        msg.payload = json!(response.codes());
        Ok(StepOutput::Single(msg))
    }
}

pub struct XPeelSealCheck {
    connector: Arc<dyn NodeConnector>,
}

impl XPeelSealCheck {
    pub const TYPE: &'static str = "xpeel-sealcheck";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
    }
}

#[async_trait]
impl Step for XPeelSealCheck {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = self.connector.xpeel_seal_check(general(ctx)).await?;
        msg.payload = json!({ "seal_detected": response.seal_detected });
        Ok(StepOutput::Single(msg))
    }
}

pub struct XPeelTapeRemaining {
    connector: Arc<dyn NodeConnector>,
}

impl XPeelTapeRemaining {
    pub const TYPE: &'static str = "xpeel-taperemaining";

    pub fn definition(connector: Arc<dyn NodeConnector>) -> StepDefinition {
        StepDefinition::new(Self::TYPE, move |_: &StepConfig| -> Box<dyn Step> {
            Box::new(Self {
                connector: Arc::clone(&connector),
            })
        })
    }
}

#[async_trait]
impl Step for XPeelTapeRemaining {
    async fn on_input(&self, mut msg: Message, ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let response = self.connector.xpeel_tape_remaining(general(ctx)).await?;
        msg.payload = json!({
            "deseals_remaining": response.deseals_remaining,
            "take_up_spool_space_remaining": response.take_up_spool_space_remaining,
        });
        Ok(StepOutput::Single(msg))
    }
}
