use async_trait::async_trait;

use crate::error::ActionError;
use crate::handler::Action;
use crate::scheduler::ActionContext;

/// Say a message and keep the speaker busy for its duration.
#[derive(Debug, Clone)]
pub struct Speak {
    pub message: String,
}

impl Speak {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Action for Speak {
    fn name(&self) -> &'static str {
        "speak"
    }

    async fn run(&self, ctx: &ActionContext) -> Result<(), ActionError> {
        ctx.actuate(|a| a.speak(&self.message))?;
        ctx.hold(ctx.speech_secs(&self.message)).await;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("speak: {}", self.message)
    }
}
