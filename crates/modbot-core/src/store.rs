//! In-memory store implementations (tests and ephemeral deployments).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::UserId,
    ports::{LastRollStore, Player, PlayerStore},
    Result,
};

#[derive(Default)]
pub struct MemoryLastRollStore {
    rolls: Mutex<HashMap<UserId, String>>,
}

impl MemoryLastRollStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LastRollStore for MemoryLastRollStore {
    async fn get_last_expression(&self, user: &UserId) -> Result<Option<String>> {
        Ok(self.rolls.lock().await.get(user).cloned())
    }

    async fn set_last_expression(&self, user: &UserId, expression: &str) -> Result<()> {
        self.rolls
            .lock()
            .await
            .insert(user.clone(), expression.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPlayerStore {
    players: Mutex<HashMap<UserId, String>>,
}

impl MemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStore for MemoryPlayerStore {
    async fn upsert_player(&self, user: &UserId, name: &str) -> Result<()> {
        self.players
            .lock()
            .await
            .insert(user.clone(), name.to_string());
        Ok(())
    }

    async fn find_players(&self, name: Option<&str>) -> Result<Vec<Player>> {
        let players = self.players.lock().await;
        let mut out: Vec<Player> = players
            .iter()
            .filter(|(_, n)| name.map_or(true, |wanted| n.as_str() == wanted))
            .map(|(user_id, name)| Player {
                user_id: user_id.clone(),
                name: name.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(s: &str) -> UserId {
        UserId(s.to_string())
    }

    #[tokio::test]
    async fn last_roll_is_last_writer_wins() {
        let store = MemoryLastRollStore::new();
        assert_eq!(store.get_last_expression(&user("a")).await.unwrap(), None);
        store.set_last_expression(&user("a"), "1d6").await.unwrap();
        store.set_last_expression(&user("a"), "2d8").await.unwrap();
        assert_eq!(
            store.get_last_expression(&user("a")).await.unwrap().as_deref(),
            Some("2d8")
        );
    }

    #[tokio::test]
    async fn players_filter_by_exact_name() {
        let store = MemoryPlayerStore::new();
        store.upsert_player(&user("b"), "Chandra").await.unwrap();
        store.upsert_player(&user("a"), "Jace").await.unwrap();
        store.upsert_player(&user("c"), "Jace").await.unwrap();

        let all = store.find_players(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].user_id, user("a"));

        let jaces = store.find_players(Some("Jace")).await.unwrap();
        assert_eq!(jaces.len(), 2);
        assert!(store.find_players(Some("jace")).await.unwrap().is_empty());
    }
}
