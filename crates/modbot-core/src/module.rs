//! Contract every bot module implements.
//!
//! A module answers messages that start with `<prefix><module name>` (or one of
//! its aliases). Modules with several sub-commands implement
//! [`SubCommandModule`] and forward [`BotModule::message`] to
//! [`dispatch_subcommand`].

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    bot::Bot,
    commands::{CommandRegistry, Invocation},
    domain::{Room, TextEvent},
    Result,
};

/// Everything a module needs to answer one message.
#[derive(Clone, Copy)]
pub struct MessageContext<'a> {
    pub bot: &'a Bot,
    pub room: &'a Room,
    pub event: &'a TextEvent,
}

impl MessageContext<'_> {
    /// Arguments after the module token.
    pub fn args(&self) -> Vec<String> {
        self.event.args()
    }

    pub async fn reply_text(&self, text: &str) -> Result<()> {
        self.bot.send_text(&self.room.id, text).await
    }

    pub async fn reply_html(&self, html: &str, plain: &str) -> Result<()> {
        self.bot.send_html(&self.room.id, html, plain).await
    }
}

#[async_trait]
pub trait BotModule: Send + Sync {
    fn name(&self) -> &str;

    /// One-line help.
    fn help(&self) -> String;

    /// Longer help for `!help <module> [args...]`. Falls back to [`help`](Self::help).
    fn long_help(&self, _args: &[String]) -> String {
        self.help()
    }

    /// Alternate names this module asks for when the bot starts.
    fn aliases(&self) -> Vec<String> {
        Vec::new()
    }

    fn can_be_disabled(&self) -> bool {
        true
    }

    /// Called once on startup, after settings were applied.
    async fn start(&self, _bot: &Bot) -> Result<()> {
        tracing::info!(module = self.name(), "Starting..");
        Ok(())
    }

    /// Called once before exit.
    async fn stop(&self, _bot: &Bot) -> Result<()> {
        tracing::info!(module = self.name(), "Stopping..");
        Ok(())
    }

    /// Called every poll interval with a monotonically increasing counter.
    async fn poll(&self, _bot: &Bot, _pollcount: u64) -> Result<()> {
        Ok(())
    }

    /// Called for each message addressed to this module.
    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()>;

    /// Module-specific settings. `enabled` is managed by the bot.
    async fn settings(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Apply settings previously returned by [`settings`](Self::settings).
    async fn apply_settings(&self, _data: &Map<String, Value>) -> Result<()> {
        Ok(())
    }
}

/// A module whose behavior is split into named sub-commands.
#[async_trait]
pub trait SubCommandModule: BotModule {
    /// Handler identifier stored in the registry.
    type Command: Send + Sync;

    fn commands(&self) -> &CommandRegistry<Self::Command>;

    /// Run `command`. `rest` excludes the command token, `args` includes it.
    async fn run_command(
        &self,
        ctx: &MessageContext<'_>,
        command: &Self::Command,
        rest: &[String],
        args: &[String],
    ) -> Result<()>;
}

/// Route a message to a sub-command or reply with the help screen.
pub async fn dispatch_subcommand<M>(module: &M, ctx: &MessageContext<'_>) -> Result<()>
where
    M: SubCommandModule + ?Sized,
{
    let args = ctx.args();
    match module.commands().route(&args) {
        Invocation::Run {
            command,
            handler,
            rest,
            args,
        } => {
            tracing::debug!(module = module.name(), command, "dispatching sub-command");
            module.run_command(ctx, handler, rest, args).await
        }
        Invocation::Help { args } => {
            let text = module.commands().help_text(args);
            ctx.reply_text(&text).await
        }
    }
}
