use std::sync::Arc;

use modbot_core::{
    bot::Bot,
    config::Config,
    modules::{EchoModule, HelpModule, MtgaModule, RollModule, WolframModule},
    settings::JsonFileSettings,
};
use modbot_sqlite::Database;
use modbot_telegram::TelegramChat;
use modbot_wolfram::WolframClient;

#[tokio::main]
async fn main() -> Result<(), modbot_core::Error> {
    modbot_core::logging::init("modbot")?;

    let cfg = Config::load()?;
    let db = Database::connect(&cfg.database_url).await?;
    let wolfram = Arc::new(WolframClient::new(cfg.wolfram_api_url.clone())?);

    let tg = teloxide::Bot::new(cfg.telegram_bot_token.clone());
    let chat = Arc::new(TelegramChat::new(tg.clone()));
    let settings = Arc::new(JsonFileSettings::new(cfg.settings_file.clone()));

    let mut bot = Bot::new(chat, settings, cfg.owners.clone(), cfg.command_prefix.clone());
    bot.register(Arc::new(HelpModule::new()))?;
    bot.register(Arc::new(EchoModule::new()))?;
    bot.register(Arc::new(RollModule::new(
        Arc::new(db.rolls()),
        cfg.dice_max_count,
    )))?;
    bot.register(Arc::new(WolframModule::new(wolfram)))?;
    bot.register_built("mtga", MtgaModule::new(Arc::new(db.players())));

    let bot = Arc::new(bot);
    bot.start().await?;
    let poller = bot.clone().spawn_poller(cfg.poll_interval);

    let res = modbot_telegram::router::run_polling(tg, bot.clone()).await;

    tracing::info!("shutting down");
    poller.abort();
    bot.stop().await;
    db.close().await;

    res.map_err(|e| modbot_core::Error::External(format!("telegram bot failed: {e}")))
}
