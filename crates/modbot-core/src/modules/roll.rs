use std::sync::Arc;

use async_trait::async_trait;
use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::Mutex;

use crate::{
    dice::{DiceExpression, DiceSource, RngDice},
    module::{BotModule, MessageContext},
    ports::LastRollStore,
    Result,
};

/// Rolled when the user gives no expression and has never rolled before.
pub const DEFAULT_EXPRESSION: &str = "1d6";

pub const INVALID_NOTATION_REPLY: &str = "Invalid dice notation";

/// Dice roller. Remembers each user's last expression so a bare `!roll`
/// repeats it.
pub struct RollModule {
    store: Arc<dyn LastRollStore>,
    dice: Mutex<Box<dyn DiceSource + Send>>,
    max_count: u32,
}

impl RollModule {
    pub fn new(store: Arc<dyn LastRollStore>, max_count: u32) -> Self {
        Self::with_dice(
            store,
            max_count,
            Box::new(RngDice(StdRng::from_entropy())),
        )
    }

    pub fn with_dice(
        store: Arc<dyn LastRollStore>,
        max_count: u32,
        dice: Box<dyn DiceSource + Send>,
    ) -> Self {
        Self {
            store,
            dice: Mutex::new(dice),
            max_count,
        }
    }
}

#[async_trait]
impl BotModule for RollModule {
    fn name(&self) -> &str {
        "roll"
    }

    fn help(&self) -> String {
        "Roll dice, e.g. 2d6+3 d20".to_string()
    }

    fn long_help(&self, _args: &[String]) -> String {
        [
            "Roll dice: roll [<count>]d<sides>[+/-<modifier>] ...",
            "Several terms may be given, separated by spaces or ' + '.",
            "Without an expression your last roll is repeated (or 1d6).",
        ]
        .join("\n")
    }

    async fn message(&self, ctx: &MessageContext<'_>) -> Result<()> {
        let sender = &ctx.event.sender;
        let args = ctx.args();
        tracing::debug!(
            module = self.name(),
            room = %ctx.room.name,
            sender = %sender,
            ?args,
            "wants dice rolled"
        );

        let mut dice = args.join(" ");
        if dice.is_empty() {
            dice = self
                .store
                .get_last_expression(sender)
                .await?
                .unwrap_or_else(|| DEFAULT_EXPRESSION.to_string());
        }

        let expression = match DiceExpression::parse_with_limit(&dice, self.max_count) {
            Ok(expression) => expression,
            Err(e) => {
                tracing::debug!(module = self.name(), error = %e, "rejected dice expression");
                return ctx.reply_text(INVALID_NOTATION_REPLY).await;
            }
        };

        let rolled = {
            let mut source = self.dice.lock().await;
            expression.roll(&mut **source)
        };
        let outcome = match rolled {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(module = self.name(), error = %e, "dice total out of range");
                return ctx.reply_text(INVALID_NOTATION_REPLY).await;
            }
        };

        self.store.set_last_expression(sender, &dice).await?;

        let name = ctx.bot.display_name(&ctx.room.id, sender).await;
        ctx.reply_text(&format!("@{name} {dice} = {outcome}")).await
    }
}
