use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::search::{EnhanceRequest, EnhanceResponse, SuggestionList, SuggestionQuery},
    error::AppResult,
    response::ApiResponse,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enhance", post(enhance))
        .route("/suggestions", get(suggestions))
}

#[utoipa::path(
    post,
    path = "/api/search/enhance",
    request_body = EnhanceRequest,
    responses(
        (status = 200, description = "Structured reading of the query", body = ApiResponse<EnhanceResponse>),
        (status = 400, description = "Missing query"),
        (status = 500, description = "Enhancement service failure"),
    ),
    tag = "Search"
)]
pub async fn enhance(
    State(state): State<AppState>,
    Json(payload): Json<EnhanceRequest>,
) -> AppResult<Json<ApiResponse<EnhanceResponse>>> {
    let resp = search_service::enhance(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/search/suggestions",
    params(
        ("q" = Option<String>, Query, description = "Partial query; two characters or fewer return an empty list")
    ),
    responses(
        (status = 200, description = "Merged AI and direct-match suggestions, capped at 8", body = ApiResponse<SuggestionList>),
    ),
    tag = "Search"
)]
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<ApiResponse<SuggestionList>>> {
    let resp = search_service::suggestions(&state, query).await?;
    Ok(Json(resp))
}
