use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted in-app message. Rows are insert-only; the id is assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InAppMessage {
    pub id: i64,
    pub user_id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// The read-path projection returned by the notifications listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MessageSummary {
    pub id: i64,
    pub message: String,
}
