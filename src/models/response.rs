use serde::Serialize;

use crate::models::message::MessageSummary;

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMessagesResponse {
    pub user_id: String,
    pub messages: Vec<MessageSummary>,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
