use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitializePaymentRequest {
    pub email: Option<String>,
    /// Integer minor currency units.
    pub amount: Option<i64>,
    pub order_id: Option<Uuid>,
    pub reference: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentInitialized {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentQuery {
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentVerification {
    pub status: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub paid_at: Option<String>,
    pub channel: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
}
