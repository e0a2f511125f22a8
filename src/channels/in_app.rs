use tracing::debug;

use crate::{
    channels::DeliveryError, clients::store::MessageStore, models::message::InAppMessage,
};

/// In-app delivery: persists the message for later retrieval instead of
/// pushing it anywhere.
pub struct InAppChannel {
    store: MessageStore,
}

impl InAppChannel {
    pub fn new(store: MessageStore) -> Self {
        Self { store }
    }

    pub async fn save(&self, user_id: &str, message: &str) -> Result<InAppMessage, DeliveryError> {
        debug!(user_id, "Persisting in-app message");

        self.store
            .insert_message(user_id, message)
            .await
            .map_err(|e| DeliveryError::Retryable(format!("Store write failed: {}", e)))
    }
}
