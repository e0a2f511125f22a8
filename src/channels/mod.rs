use thiserror::Error;

pub mod email;
pub mod in_app;
pub mod sms;

pub use email::EmailChannel;
pub use in_app::InAppChannel;
pub use sms::SmsChannel;

/// A failed delivery, classified by whether redelivering the same message
/// can ever succeed. The dispatcher maps these onto its acknowledgment
/// decision.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("retryable delivery failure: {0}")]
    Retryable(String),

    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}
