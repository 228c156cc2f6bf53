use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use modbot_core::{
    bot::Bot as ModBot,
    domain::{Room, RoomId, TextEvent, UserId},
};

/// Room for a Telegram chat, named after its title or @username when it has one.
pub fn room_for(chat_id: i64, title: Option<&str>, username: Option<&str>) -> Room {
    let id = RoomId(chat_id.to_string());
    let name = title
        .map(str::to_string)
        .or_else(|| username.map(|u| format!("@{u}")))
        .unwrap_or_else(|| id.0.clone());
    Room { id, name }
}

pub async fn run_polling(tg: Bot, bot: Arc<ModBot>) -> anyhow::Result<()> {
    if let Ok(me) = tg.get_me().await {
        tracing::info!(username = %me.username(), "modbot started");
    }
    tracing::info!(modules = bot.modules().len(), prefix = %bot.prefix(), "listening for commands");

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(tg, handler)
        .dependencies(dptree::deps![bot])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, bot: Arc<ModBot>) -> ResponseResult<()> {
    let (Some(text), Some(from)) = (msg.text(), msg.from()) else {
        return Ok(());
    };
    if from.is_bot {
        return Ok(());
    }

    let room = room_for(msg.chat.id.0, msg.chat.title(), msg.chat.username());
    let event = TextEvent {
        sender: UserId(from.id.0.to_string()),
        body: text.to_string(),
    };

    if let Err(e) = bot.handle_message(&room, &event).await {
        tracing::error!(room = %room.name, sender = %event.sender, error = %e, "message handling failed");
    }
    Ok(())
}
