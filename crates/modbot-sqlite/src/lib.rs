//! SQLite persistence (sqlx) for the roll and mtga modules.
//!
//! The pool is an explicitly constructed handle passed to whichever module
//! needs it. Every store call acquires a connection for one statement and
//! releases it afterwards.

use std::{
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use modbot_core::{
    domain::UserId,
    errors::Error,
    ports::{LastRollStore, Player, PlayerStore},
    Result,
};

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

fn map_err(e: sqlx::Error) -> Error {
    Error::Store(format!("sqlite error: {e}"))
}

/// Database handle with connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connection acquire timeout.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connect to `url` (e.g. `sqlite://bot.db` or `sqlite::memory:`) and
    /// create the tables if needed.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = if url.contains(":memory:") {
            // Each in-memory database gets a unique shared-cache name so
            // parallel tests never see each other's rows.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:modbot-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );
            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(map_err)?
        } else {
            let options = SqliteConnectOptions::from_str(url)
                .map_err(|e| Error::Config(format!("invalid database url {url}: {e}")))?
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .connect_with(options)
                .await
                .map_err(map_err)?
        };

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Store(format!("migration error: {e}")))?;

        tracing::info!(url = %url, "Database connected");
        Ok(Self { pool })
    }

    pub fn rolls(&self) -> SqliteRollStore {
        SqliteRollStore {
            pool: self.pool.clone(),
        }
    }

    pub fn players(&self) -> SqlitePlayerStore {
        SqlitePlayerStore {
            pool: self.pool.clone(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// `user_roll` table: last dice expression per user.
#[derive(Clone, Debug)]
pub struct SqliteRollStore {
    pool: SqlitePool,
}

#[async_trait]
impl LastRollStore for SqliteRollStore {
    async fn get_last_expression(&self, user: &UserId) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT last_roll FROM user_roll WHERE user_id = ?")
            .bind(&user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_err)
    }

    async fn set_last_expression(&self, user: &UserId, expression: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roll (user_id, last_roll) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET last_roll = excluded.last_roll
            "#,
        )
        .bind(&user.0)
        .bind(expression)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }
}

/// `player` table: Arena player name per chat user.
#[derive(Clone, Debug)]
pub struct SqlitePlayerStore {
    pool: SqlitePool,
}

#[async_trait]
impl PlayerStore for SqlitePlayerStore {
    async fn upsert_player(&self, user: &UserId, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO player (user_id, name) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&user.0)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;
        Ok(())
    }

    async fn find_players(&self, name: Option<&str>) -> Result<Vec<Player>> {
        let rows: Vec<(String, String)> = match name {
            Some(name) => {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT user_id, name FROM player WHERE name = ? ORDER BY user_id",
                )
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT user_id, name FROM player ORDER BY user_id",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_err)?;

        Ok(rows
            .into_iter()
            .map(|(user_id, name)| Player {
                user_id: UserId(user_id),
                name,
            })
            .collect())
    }
}
