//! Test doubles shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{
    bot::Bot,
    domain::{Room, RoomId, TextEvent, UserId},
    module::BotModule,
    ports::{ChatPort, SettingsMap, SettingsStore},
    Result,
};

pub const OWNER: &str = "@owner:x";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    Html { html: String, plain: String },
}

#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<Sent>>,
    names: Mutex<Vec<(UserId, String)>>,
}

impl RecordingChat {
    pub fn with_name(self, user: &str, name: &str) -> Self {
        self.names
            .lock()
            .unwrap()
            .push((UserId(user.to_string()), name.to_string()));
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                Sent::Html { .. } => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }
}

#[async_trait]
impl ChatPort for RecordingChat {
    async fn send_text(&self, _room: &RoomId, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_html(&self, _room: &RoomId, html: &str, plain: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Html {
            html: html.to_string(),
            plain: plain.to_string(),
        });
        Ok(())
    }

    async fn display_name(&self, _room: &RoomId, user: &UserId) -> Result<Option<String>> {
        Ok(self
            .names
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u == user)
            .map(|(_, n)| n.clone()))
    }
}

#[derive(Default)]
pub struct MemorySettings {
    data: tokio::sync::Mutex<SettingsMap>,
}

impl MemorySettings {
    pub async fn snapshot(&self) -> SettingsMap {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> Result<SettingsMap> {
        Ok(self.data.lock().await.clone())
    }

    async fn save(&self, settings: &SettingsMap) -> Result<()> {
        *self.data.lock().await = settings.clone();
        Ok(())
    }
}

pub fn room() -> Room {
    Room {
        id: RoomId("!room:x".to_string()),
        name: "test room".to_string(),
    }
}

pub fn event(sender: &str, body: &str) -> TextEvent {
    TextEvent {
        sender: UserId(sender.to_string()),
        body: body.to_string(),
    }
}

/// A bot owned by [`OWNER`] with the given modules and a recording chat.
pub fn bot_with(modules: Vec<Arc<dyn BotModule>>) -> (Bot, Arc<RecordingChat>) {
    bot_with_chat(modules, RecordingChat::default())
}

pub fn bot_with_chat(
    modules: Vec<Arc<dyn BotModule>>,
    chat: RecordingChat,
) -> (Bot, Arc<RecordingChat>) {
    let chat = Arc::new(chat);
    let mut bot = Bot::new(
        chat.clone(),
        Arc::new(MemorySettings::default()),
        vec![UserId(OWNER.to_string())],
        "!",
    );
    for m in modules {
        bot.register(m).expect("register module");
    }
    (bot, chat)
}
