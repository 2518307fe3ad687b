use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::payment::{
        InitializePaymentRequest, PaymentInitialized, PaymentVerification, VerifyPaymentQuery,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initialize", post(initialize))
        .route("/verify", get(verify))
}

#[utoipa::path(
    post,
    path = "/api/payment/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Hosted checkout handle", body = ApiResponse<PaymentInitialized>),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Unauthenticated"),
        (status = 500, description = "Gateway failure or payment system not configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn initialize(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<InitializePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentInitialized>>> {
    let resp = payment_service::initialize(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payment/verify",
    params(
        ("reference" = Option<String>, Query, description = "Transaction reference")
    ),
    responses(
        (status = 200, description = "Normalized transaction state", body = ApiResponse<PaymentVerification>),
        (status = 400, description = "Missing reference"),
        (status = 401, description = "Unauthenticated"),
        (status = 500, description = "Gateway failure or payment system not configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payment"
)]
pub async fn verify(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<VerifyPaymentQuery>,
) -> AppResult<Json<ApiResponse<PaymentVerification>>> {
    let resp = payment_service::verify(&state, &user, query).await?;
    Ok(Json(resp))
}
