use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        listings::ListingList,
        reviews::{CreateReviewRequest, ReviewList},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Listing, Review},
    response::ApiResponse,
    routes::params::{ListingQuery, Pagination},
    services::{listing_service, review_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(browse_listings))
        .route("/{id}", get(get_listing))
        .route("/{id}/reviews", get(list_reviews))
        .route("/{id}/reviews", post(create_review))
}

#[utoipa::path(
    get,
    path = "/api/listings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Free-text filter on title and description"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("min_price" = Option<i64>, Query, description = "Minimum price in minor units"),
        ("max_price" = Option<i64>, Query, description = "Maximum price in minor units"),
        ("sort_by" = Option<String>, Query, description = "Sort by: created_at, price, title"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc"),
    ),
    responses(
        (status = 200, description = "Active listings", body = ApiResponse<ListingList>),
    ),
    tag = "Listings"
)]
pub async fn browse_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::browse(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing detail", body = ApiResponse<Listing>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Listings"
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::get_listing(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Listing ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first", body = ApiResponse<ReviewList>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Listings"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    let resp = review_service::list_reviews(&state, id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/listings/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Listing ID")
    ),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or body, or already reviewed"),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::create_review(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
