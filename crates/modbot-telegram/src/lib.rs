//! Telegram adapter (teloxide).
//!
//! This crate implements the `modbot-core` ChatPort over the Telegram Bot API
//! and feeds incoming text messages to the bot host.

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode};

use tokio::time::sleep;

pub mod router;

use modbot_core::{
    domain::{RoomId, UserId},
    errors::Error,
    ports::ChatPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(room: &RoomId) -> Result<teloxide::types::ChatId> {
        room.0
            .parse::<i64>()
            .map(teloxide::types::ChatId)
            .map_err(|_| Error::External(format!("not a telegram chat id: {room}")))
    }

    fn tg_user(user: &UserId) -> Result<teloxide::types::UserId> {
        user.0
            .parse::<u64>()
            .map(teloxide::types::UserId)
            .map_err(|_| Error::External(format!("not a telegram user id: {user}")))
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChatPort for TelegramChat {
    async fn send_text(&self, room: &RoomId, text: &str) -> Result<()> {
        let chat_id = Self::tg_chat(room)?;
        self.with_retry(|| self.bot.send_message(chat_id, text.to_string()))
            .await?;
        Ok(())
    }

    async fn send_html(&self, room: &RoomId, html: &str, plain: &str) -> Result<()> {
        let chat_id = Self::tg_chat(room)?;
        let tg_html = to_telegram_html(html);
        let sent = self
            .with_retry(|| {
                self.bot
                    .send_message(chat_id, tg_html.clone())
                    .parse_mode(ParseMode::Html)
            })
            .await;

        if let Err(e) = sent {
            tracing::warn!(room = %room, error = %e, "html message rejected, sending plain text");
            return self.send_text(room, plain).await;
        }
        Ok(())
    }

    async fn display_name(&self, room: &RoomId, user: &UserId) -> Result<Option<String>> {
        let chat_id = Self::tg_chat(room)?;
        let user_id = Self::tg_user(user)?;
        let member = self
            .with_retry(|| self.bot.get_chat_member(chat_id, user_id))
            .await?;
        Ok(Some(member.user.full_name()))
    }
}

/// Reduce generic rich text to the subset Telegram accepts
/// (`<b>`, `<i>`, `<code>`, `<pre>`, `<a>`): paragraphs and lists become
/// plain lines with bullets.
pub fn to_telegram_html(html: &str) -> String {
    html.replace("<strong>", "<b>")
        .replace("</strong>", "</b>")
        .replace("<em>", "<i>")
        .replace("</em>", "</i>")
        .replace("<li>", "• ")
        .replace("</li>", "")
        .replace("<ul>\n", "")
        .replace("<ul>", "")
        .replace("</ul>", "")
        .replace("<p>", "")
        .replace("</p>", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_lists_and_strong() {
        let html = "<p><strong>Result</strong>\n<ul>\n<li>4</li>\n</ul></p>";
        assert_eq!(to_telegram_html(html), "<b>Result</b>\n• 4\n");
    }

    #[test]
    fn ids_must_be_numeric() {
        assert!(TelegramChat::tg_chat(&RoomId("-100123".into())).is_ok());
        assert!(TelegramChat::tg_chat(&RoomId("!room:x".into())).is_err());
        assert!(TelegramChat::tg_user(&UserId("42".into())).is_ok());
        assert!(TelegramChat::tg_user(&UserId("-1".into())).is_err());
    }
}
