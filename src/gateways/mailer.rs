use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
};

use super::GatewayError;
use crate::config::SmtpConfig;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), GatewayError>;
}

pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(config: Option<&SmtpConfig>) -> Self {
        let Some(config) = config else {
            return Self {
                transport: None,
                from: String::new(),
            };
        };

        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = match AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host) {
            Ok(builder) => Some(builder.credentials(creds).build()),
            Err(err) => {
                tracing::warn!(error = %err, host = %config.host, "invalid smtp relay");
                None
            }
        };

        Self {
            transport,
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), GatewayError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(GatewayError::NotConfigured("email delivery"))?;

        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| GatewayError::Parse(format!("invalid sender address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| GatewayError::Parse(format!("invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| GatewayError::Service(e.to_string()))?;
        Ok(())
    }
}
