//! Hexagonal ports: everything the bot calls into but does not implement.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{
    domain::{RoomId, UserId},
    Result,
};

/// Chat network the bot is connected to.
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn send_text(&self, room: &RoomId, text: &str) -> Result<()>;

    /// Rich message with a plain-text fallback for clients that cannot render it.
    async fn send_html(&self, room: &RoomId, html: &str, plain: &str) -> Result<()>;

    /// Display name of a room member, if the network knows one.
    async fn display_name(&self, room: &RoomId, user: &UserId) -> Result<Option<String>>;
}

/// Last dice expression rolled by each user.
#[async_trait]
pub trait LastRollStore: Send + Sync {
    async fn get_last_expression(&self, user: &UserId) -> Result<Option<String>>;
    async fn set_last_expression(&self, user: &UserId, expression: &str) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub user_id: UserId,
    pub name: String,
}

/// Player names registered by chat users.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn upsert_player(&self, user: &UserId, name: &str) -> Result<()>;

    /// All players, or only those with exactly `name`, ordered by user id.
    async fn find_players(&self, name: Option<&str>) -> Result<Vec<Player>>;
}

/// Per-module settings blobs keyed by module name.
pub type SettingsMap = BTreeMap<String, serde_json::Map<String, serde_json::Value>>;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<SettingsMap>;
    async fn save(&self, settings: &SettingsMap) -> Result<()>;
}

/// A titled block of answers from the knowledge engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pod {
    pub title: String,
    pub primary: bool,
    pub subpods: Vec<Subpod>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subpod {
    pub title: Option<String>,
    pub plaintext: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub success: bool,
    pub error: Option<String>,
    pub pods: Vec<Pod>,
}

/// Computational knowledge engine (Wolfram|Alpha style).
#[async_trait]
pub trait KnowledgeEngine: Send + Sync {
    async fn query(&self, app_id: &str, input: &str) -> Result<QueryResult>;
}
