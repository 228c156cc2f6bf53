use async_trait::async_trait;

use crate::{
    module::{BotModule, MessageContext},
    Result,
};

/// `!help` lists modules, `!help <module> [args...]` shows a module's long help.
#[derive(Debug, Default)]
pub struct HelpModule;

impl HelpModule {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BotModule for HelpModule {
    fn name(&self) -> &str {
        "help"
    }

    fn help(&self) -> String {
        "Prints help on commands".to_string()
    }

    fn can_be_disabled(&self) -> bool {
        false
    }

    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()> {
        let args = ctx.args();
        let prefix = ctx.bot.prefix();

        let Some((target, rest)) = args.split_first() else {
            let mut lines = Vec::new();
            for info in ctx.bot.modules() {
                let suffix = if info.enabled { "" } else { " (disabled)" };
                lines.push(format!("{prefix}{} - {}{suffix}", info.name, info.help));
            }
            return ctx.reply_text(&lines.join("\n")).await;
        };

        let target = target.strip_prefix(prefix).unwrap_or(target.as_str());
        match ctx.bot.resolve(target).await {
            Some(module) => ctx.reply_text(&module.long_help(rest)).await,
            None => ctx.reply_text(&format!("Unknown module: {target}")).await,
        }
    }
}
