use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    commands::CommandRegistry,
    module::{dispatch_subcommand, BotModule, MessageContext, SubCommandModule},
    ports::PlayerStore,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtgaCommand {
    Register,
    Whois,
    Players,
}

/// Tracks which chat users play Magic: The Gathering Arena under which name.
pub struct MtgaModule {
    players: Arc<dyn PlayerStore>,
    commands: CommandRegistry<MtgaCommand>,
}

impl MtgaModule {
    pub fn new(players: Arc<dyn PlayerStore>) -> Result<Self> {
        let commands = CommandRegistry::builder()
            .command(
                "register",
                MtgaCommand::Register,
                "Register your Arena player name

                Usage: register <name>
                Links your chat account to <name>, replacing any earlier registration.",
            )
            .command(
                "whois",
                MtgaCommand::Whois,
                "Show who plays under an Arena name

                Usage: whois <name>",
            )
            .command("players", MtgaCommand::Players, "List registered players")
            .alias("reg", "register")
            .build()?;

        Ok(Self { players, commands })
    }

    async fn register(&self, ctx: &MessageContext<'_>, rest: &[String]) -> Result<()> {
        if rest.is_empty() {
            return ctx.reply_text("Usage: register <name>").await;
        }
        let name = rest.join(" ");
        self.players.upsert_player(&ctx.event.sender, &name).await?;
        tracing::debug!(module = self.name(), sender = %ctx.event.sender, player = %name, "registered player");
        ctx.reply_text(&format!("Registered {} as {name}", ctx.event.sender))
            .await
    }

    async fn whois(&self, ctx: &MessageContext<'_>, rest: &[String]) -> Result<()> {
        if rest.is_empty() {
            return ctx.reply_text("Usage: whois <name>").await;
        }
        let name = rest.join(" ");
        let found = self.players.find_players(Some(&name)).await?;
        if found.is_empty() {
            return ctx.reply_text(&format!("No player named {name}")).await;
        }
        let users = found
            .iter()
            .map(|p| p.user_id.0.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ctx.reply_text(&format!("{name} is played by {users}")).await
    }

    async fn list(&self, ctx: &MessageContext<'_>) -> Result<()> {
        let players = self.players.find_players(None).await?;
        if players.is_empty() {
            return ctx.reply_text("No players registered").await;
        }
        let lines = players
            .iter()
            .map(|p| format!("{} ({})", p.name, p.user_id))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.reply_text(&lines).await
    }
}

#[async_trait]
impl BotModule for MtgaModule {
    fn name(&self) -> &str {
        "mtga"
    }

    fn help(&self) -> String {
        "Track Magic: The Gathering Arena players".to_string()
    }

    fn long_help(&self, args: &[String]) -> String {
        self.commands.help_text(args)
    }

    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()> {
        dispatch_subcommand(self, ctx).await
    }
}

#[async_trait]
impl SubCommandModule for MtgaModule {
    type Command = MtgaCommand;

    fn commands(&self) -> &CommandRegistry<MtgaCommand> {
        &self.commands
    }

    async fn run_command(
        &self,
        ctx: &MessageContext<'_>,
        command: &MtgaCommand,
        rest: &[String],
        _args: &[String],
    ) -> Result<()> {
        match command {
            MtgaCommand::Register => self.register(ctx, rest).await,
            MtgaCommand::Whois => self.whois(ctx, rest).await,
            MtgaCommand::Players => self.list(ctx).await,
        }
    }
}
