use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::GatewayError;

pub const PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CURRENCY: &str = "NGN";
const CHANNELS: [&str; 4] = ["card", "bank", "ussd", "bank_transfer"];

#[derive(Debug, Clone)]
pub struct InitializePayment {
    pub email: String,
    pub amount: i64,
    pub reference: String,
    pub callback_url: String,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct InitializedTransaction {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub paid_at: Option<String>,
    pub channel: Option<String>,
    pub metadata: Option<Value>,
}

/// Hosted-checkout payment gateway. Reference deduplication and
/// double-payment prevention are the gateway's responsibility.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(
        &self,
        request: InitializePayment,
    ) -> Result<InitializedTransaction, GatewayError>;

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;
}

pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: Option<String>,
}

impl PaystackClient {
    pub fn new(secret_key: Option<String>) -> Self {
        Self::with_base_url(secret_key, PAYSTACK_BASE_URL)
    }

    pub fn with_base_url(secret_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            secret_key,
        }
    }

    fn secret(&self) -> Result<&str, GatewayError> {
        self.secret_key
            .as_deref()
            .ok_or(GatewayError::NotConfigured("payment system"))
    }
}

#[derive(Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct InitData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    currency: String,
    paid_at: Option<String>,
    channel: Option<String>,
    metadata: Option<Value>,
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        request: InitializePayment,
    ) -> Result<InitializedTransaction, GatewayError> {
        let secret = self.secret()?;
        let body = serde_json::json!({
            "email": request.email,
            "amount": request.amount,
            "reference": request.reference,
            "currency": CURRENCY,
            "channels": CHANNELS,
            "callback_url": request.callback_url,
            "metadata": request.metadata,
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(secret)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let data: InitData = read_envelope(response).await?;
        Ok(InitializedTransaction {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let secret = self.secret()?;
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(secret)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let data: VerifyData = read_envelope(response).await?;
        Ok(VerifiedTransaction {
            status: data.status,
            reference: data.reference,
            amount: data.amount,
            currency: data.currency,
            paid_at: data.paid_at,
            channel: data.channel,
            metadata: data.metadata,
        })
    }
}

/// Unwrap the gateway's `{ status, message, data }` envelope, keeping the
/// gateway's own message on failure.
async fn read_envelope<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let http_status = response.status();
    if !http_status.is_success() {
        let message = error_message(response).await;
        return Err(GatewayError::Service(format!("HTTP {http_status}: {message}")));
    }

    let envelope: PaystackEnvelope<T> = response
        .json()
        .await
        .map_err(|e| GatewayError::Parse(e.to_string()))?;
    if !envelope.status {
        return Err(GatewayError::Service(envelope.message));
    }
    envelope
        .data
        .ok_or_else(|| GatewayError::Parse("missing data in gateway response".to_string()))
}

async fn error_message(response: reqwest::Response) -> String {
    match response.json::<Value>().await {
        Ok(body) => body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => "unreadable error body".to_string(),
    }
}
