//! Local text transforms that never touch the service.

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    Message, RequestContext, Step, StepConfig, StepDefinition, StepError, StepOptions, StepOutput,
};

/// Lowercases a text payload and appends `!`.
pub struct LowerCase;

impl LowerCase {
    pub const TYPE: &'static str = "lower-case";

    pub fn definition() -> StepDefinition {
        StepDefinition::new(Self::TYPE, |_: &StepConfig| -> Box<dyn Step> { Box::new(Self) })
            .options(StepOptions::STANDALONE)
    }
}

#[async_trait]
impl Step for LowerCase {
    async fn on_input(&self, mut msg: Message, _ctx: &RequestContext) -> Result<StepOutput, StepError> {
        let Value::String(text) = &msg.payload else {
            return Err(StepError::InvalidPayload(
                "lower-case needs a text payload".to_owned(),
            ));
        };
        msg.payload = Value::String(format!("{}!", text.to_lowercase()));
        Ok(StepOutput::Single(msg))
    }
}
