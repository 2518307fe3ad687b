pub mod enhancer;
pub mod mailer;
pub mod paystack;

pub use enhancer::{EnhancedQuery, HttpTextEnhancer, TextEnhancer};
pub use mailer::{Mailer, SmtpMailer};
pub use paystack::{
    InitializePayment, InitializedTransaction, PaymentGateway, PaystackClient,
    VerifiedTransaction,
};

use thiserror::Error;

/// Error from an outbound service call.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("network error: {0}")]
    Network(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("parse error: {0}")]
    Parse(String),
}
