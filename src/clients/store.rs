use std::str::FromStr;

use anyhow::{Error, Result, anyhow};
use chrono::Utc;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{debug, info};

use crate::models::message::{InAppMessage, MessageSummary};

/// Store of persisted in-app messages, backed by an embedded SQLite
/// database.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        info!(database_url, "Connecting to message store");

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| anyhow!("Invalid database URL: {}", e))?
            .create_if_missing(true);

        // A single connection keeps in-memory databases coherent; SQLite
        // serializes writers regardless of pool size.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;

        let store = Self { pool };
        store.create_tables().await?;

        info!("Message store ready");

        Ok(store)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS in_app_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to create in_app_messages table: {}", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_in_app_messages_user_id
             ON in_app_messages (user_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Failed to create user_id index: {}", e))?;

        Ok(())
    }

    /// Inserts a message row and returns the committed record with its
    /// assigned id.
    pub async fn insert_message(&self, user_id: &str, message: &str) -> Result<InAppMessage, Error> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO in_app_messages (user_id, message, created_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(user_id)
        .bind(message)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!("Database write failed: {}", e))?;

        let id = result.last_insert_rowid();

        debug!(id, user_id, "In-app message written");

        Ok(InAppMessage {
            id,
            user_id: user_id.to_string(),
            message: message.to_string(),
            created_at,
        })
    }

    /// All messages for a user, oldest first.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<MessageSummary>, Error> {
        let messages = sqlx::query_as::<_, MessageSummary>(
            "SELECT id, message FROM in_app_messages
             WHERE user_id = ?1
             ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("Database read failed: {}", e))?;

        Ok(messages)
    }

    /// Closes the underlying pool; subsequent queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
