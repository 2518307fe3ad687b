use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::vendors::{ApproveVendorRequest, RejectVendorRequest, VendorList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Vendor,
    response::ApiResponse,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vendors/pending", get(list_pending_vendors))
        .route("/vendors/approve", post(approve_vendor))
        .route("/vendors/reject", post(reject_vendor))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors/pending",
    responses(
        (status = 200, description = "Pending vendor applications, oldest first", body = ApiResponse<VendorList>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_pending_vendors(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<VendorList>>> {
    let resp = admin_service::list_pending_vendors(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vendors/approve",
    request_body = ApproveVendorRequest,
    responses(
        (status = 200, description = "Vendor approved", body = ApiResponse<Vendor>),
        (status = 400, description = "Application already processed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApproveVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = admin_service::approve_vendor(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/vendors/reject",
    request_body = RejectVendorRequest,
    responses(
        (status = 200, description = "Vendor rejected", body = ApiResponse<Vendor>),
        (status = 400, description = "Application already processed or missing reason"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_vendor(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RejectVendorRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = admin_service::reject_vendor(&state, &user, payload).await?;
    Ok(Json(resp))
}
