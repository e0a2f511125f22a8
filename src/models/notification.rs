use anyhow::{Error, Result, anyhow};
use serde::{Deserialize, Serialize};

/// A notification submission, and the wire format placed on the queue.
///
/// `type` is deliberately kept as a free-form string: ingress only enforces
/// the per-type required fields below, and the worker decides what to do
/// with types it does not recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,
}

impl NotificationRequest {
    pub fn validate(&self) -> Result<(), Error> {
        match self.kind.as_str() {
            "email" if !has_value(&self.email) => {
                Err(anyhow!("Please provide an email address."))
            }
            "sms" if !has_value(&self.phone) || !has_value(&self.user_id) => {
                Err(anyhow!("Phone and user ID are needed for SMS."))
            }
            "in_app" if !has_value(&self.user_id) => {
                Err(anyhow!("User ID is required for in-app notifications."))
            }
            _ => Ok(()),
        }
    }
}

fn has_value(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.is_empty())
}

/// A notification whose delivery attempts were exhausted, published to the
/// failed queue with its failure context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    pub notification: NotificationRequest,
    pub failure_reason: String,
    pub failed_at: String,
}
