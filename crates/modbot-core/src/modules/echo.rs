use async_trait::async_trait;

use crate::{
    module::{BotModule, MessageContext},
    Result,
};

/// Echoes back what the user said.
#[derive(Debug, Default)]
pub struct EchoModule;

impl EchoModule {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BotModule for EchoModule {
    fn name(&self) -> &str {
        "echo"
    }

    fn help(&self) -> String {
        "Echoes back what user has said".to_string()
    }

    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()> {
        let args = ctx.args();
        tracing::debug!(module = self.name(), room = %ctx.room.name, sender = %ctx.event.sender, "wants an echo");
        if args.is_empty() {
            let usage = format!("Usage: {}echo <text>", ctx.bot.prefix());
            return ctx.reply_text(&usage).await;
        }
        ctx.reply_text(&args.join(" ")).await
    }
}
