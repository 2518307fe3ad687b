use crate::{
    dto::payment::{
        InitializePaymentRequest, PaymentInitialized, PaymentVerification, VerifyPaymentQuery,
    },
    error::{AppError, AppResult},
    gateways::InitializePayment,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Start a hosted-checkout transaction. All four fields must be present
/// before the gateway sees the request.
pub async fn initialize(
    state: &AppState,
    _auth: &AuthUser,
    payload: InitializePaymentRequest,
) -> AppResult<ApiResponse<PaymentInitialized>> {
    let email = required_text(payload.email, "email")?;
    let amount = payload
        .amount
        .ok_or_else(|| AppError::BadRequest("amount is required".to_string()))?;
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "amount must be a positive integer".to_string(),
        ));
    }
    let order_id = payload
        .order_id
        .ok_or_else(|| AppError::BadRequest("order_id is required".to_string()))?;
    let reference = required_text(payload.reference, "reference")?;

    let mut metadata = serde_json::json!({ "order_id": order_id });
    if let Some(extra) = payload.metadata {
        metadata["custom"] = extra;
    }

    let transaction = state
        .payments
        .initialize(InitializePayment {
            email,
            amount,
            reference,
            callback_url: format!("{}/payment/callback", state.config.app_base_url),
            metadata: Some(metadata),
        })
        .await?;

    Ok(ApiResponse::success(
        "Payment initialized",
        PaymentInitialized {
            authorization_url: transaction.authorization_url,
            access_code: transaction.access_code,
            reference: transaction.reference,
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify(
    state: &AppState,
    _auth: &AuthUser,
    query: VerifyPaymentQuery,
) -> AppResult<ApiResponse<PaymentVerification>> {
    let reference = required_text(query.reference, "reference")?;

    let transaction = state.payments.verify(&reference).await?;

    Ok(ApiResponse::success(
        "Payment verified",
        PaymentVerification {
            status: transaction.status,
            reference: transaction.reference,
            amount: transaction.amount,
            currency: transaction.currency,
            paid_at: transaction.paid_at,
            channel: transaction.channel,
            metadata: transaction.metadata,
        },
        Some(Meta::empty()),
    ))
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    use super::*;
    use crate::config::AppConfig;
    use crate::gateways::{
        EnhancedQuery, GatewayError, InitializedTransaction, Mailer, PaymentGateway,
        PaystackClient, TextEnhancer, VerifiedTransaction,
    };

    struct CountingGateway {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingGateway {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl PaymentGateway for CountingGateway {
        async fn initialize(
            &self,
            request: InitializePayment,
        ) -> Result<InitializedTransaction, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Service("declined by gateway".to_string()));
            }
            Ok(InitializedTransaction {
                authorization_url: "https://checkout.example/abc".to_string(),
                access_code: "abc".to_string(),
                reference: request.reference,
            })
        }

        async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Service("HTTP 502: upstream down".to_string()));
            }
            Ok(VerifiedTransaction {
                status: "success".to_string(),
                reference: reference.to_string(),
                amount: 1500,
                currency: "NGN".to_string(),
                paid_at: Some("2026-01-01T00:00:00Z".to_string()),
                channel: Some("card".to_string()),
                metadata: None,
            })
        }
    }

    struct NullEnhancer;

    #[async_trait]
    impl TextEnhancer for NullEnhancer {
        async fn enhance(&self, _query: &str) -> Result<EnhancedQuery, GatewayError> {
            Ok(EnhancedQuery::default())
        }

        async fn suggest(
            &self,
            _query: &str,
            _context_titles: &[String],
        ) -> Result<Vec<String>, GatewayError> {
            Ok(Vec::new())
        }
    }

    struct NullMailer;

    #[async_trait]
    impl Mailer for NullMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn test_state(gateway: Arc<CountingGateway>) -> AppState {
        AppState {
            pool: PgPoolOptions::new()
                .connect_lazy("postgres://localhost/unused")
                .unwrap(),
            orm: sea_orm::DatabaseConnection::default(),
            payments: gateway,
            enhancer: Arc::new(NullEnhancer),
            mailer: Arc::new(NullMailer),
            config: AppConfig {
                database_url: "postgres://localhost/unused".to_string(),
                host: "127.0.0.1".to_string(),
                port: 3000,
                app_base_url: "http://127.0.0.1:3000".to_string(),
                paystack_secret_key: Some("sk_test".to_string()),
                ai_api_key: None,
                ai_base_url: "https://api.openai.com/v1".to_string(),
                smtp: None,
            },
        }
    }

    fn auth() -> AuthUser {
        AuthUser {
            external_id: "idp_user_1".to_string(),
        }
    }

    fn full_payload() -> InitializePaymentRequest {
        InitializePaymentRequest {
            email: Some("buyer@example.com".to_string()),
            amount: Some(1500),
            order_id: Some(Uuid::new_v4()),
            reference: Some("ref_abc123".to_string()),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn initialize_rejects_missing_fields_before_the_gateway() {
        let gateway = CountingGateway::new(false);
        let state = test_state(gateway.clone());

        for payload in [
            InitializePaymentRequest {
                email: None,
                ..full_payload()
            },
            InitializePaymentRequest {
                amount: None,
                ..full_payload()
            },
            InitializePaymentRequest {
                order_id: None,
                ..full_payload()
            },
            InitializePaymentRequest {
                reference: Some("  ".to_string()),
                ..full_payload()
            },
        ] {
            let result = initialize(&state, &auth(), payload).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn initialize_returns_the_hosted_checkout_handle() {
        let gateway = CountingGateway::new(false);
        let state = test_state(gateway.clone());

        let response = initialize(&state, &auth(), full_payload()).await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.authorization_url, "https://checkout.example/abc");
        assert_eq!(data.reference, "ref_abc123");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn verify_requires_a_reference() {
        let gateway = CountingGateway::new(false);
        let state = test_state(gateway.clone());

        let result = verify(&state, &auth(), VerifyPaymentQuery { reference: None }).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_normalizes_the_gateway_transaction() {
        let gateway = CountingGateway::new(false);
        let state = test_state(gateway);

        let response = verify(
            &state,
            &auth(),
            VerifyPaymentQuery {
                reference: Some("ref_abc123".to_string()),
            },
        )
        .await
        .unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.status, "success");
        assert_eq!(data.amount, 1500);
        assert_eq!(data.currency, "NGN");
    }

    #[tokio::test]
    async fn gateway_failures_keep_the_downstream_message() {
        let gateway = CountingGateway::new(true);
        let state = test_state(gateway);

        let result = verify(
            &state,
            &auth(),
            VerifyPaymentQuery {
                reference: Some("ref_abc123".to_string()),
            },
        )
        .await;
        match result {
            Err(AppError::Gateway(message)) => assert!(message.contains("upstream down")),
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unconfigured_secret_key_is_a_well_defined_error() {
        let client = PaystackClient::new(None);
        let result = client.verify("ref_abc123").await;
        match result {
            Err(err) => assert_eq!(err.to_string(), "payment system is not configured"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }
}
