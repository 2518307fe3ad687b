use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        listings::ListingList,
        orders::{OrderDetailList, UpdateOrderStatusRequest},
        vendors::{CreateListingRequest, SetListingActiveRequest, VendorApplyRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Listing, Order, Vendor},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, vendor_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply))
        .route("/products", get(list_products))
        .route("/products", post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}/active", patch(set_product_active))
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    post,
    path = "/api/vendor/apply",
    request_body = VendorApplyRequest,
    responses(
        (status = 200, description = "Application submitted", body = ApiResponse<Vendor>),
        (status = 400, description = "Missing business name or already applied"),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VendorApplyRequest>,
) -> AppResult<Json<ApiResponse<Vendor>>> {
    let resp = vendor_service::apply(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products",
    responses(
        (status = 200, description = "The vendor's listings, newest first", body = ApiResponse<ListingList>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an approved vendor"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = vendor_service::list_products(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/vendor/products",
    request_body = CreateListingRequest,
    responses(
        (status = 200, description = "Listing created", body = ApiResponse<Listing>),
        (status = 400, description = "Missing or invalid field"),
        (status = 403, description = "Not an approved vendor"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateListingRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = vendor_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing detail", body = ApiResponse<Listing>),
        (status = 403, description = "Not an approved vendor"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = vendor_service::get_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/vendor/products/{id}/active",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = SetListingActiveRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<Listing>),
        (status = 403, description = "Not an approved vendor"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn set_product_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetListingActiveRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = vendor_service::set_product_active(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/vendor/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc"),
    ),
    responses(
        (status = 200, description = "Orders for the vendor with items and buyer names", body = ApiResponse<OrderDetailList>),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Not an approved vendor"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderDetailList>>> {
    let resp = order_service::list_vendor_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/vendor/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status or transition"),
        (status = 403, description = "Not an approved vendor"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vendor"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
