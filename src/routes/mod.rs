use axum::Router;

use crate::state::AppState;

pub mod activity;
pub mod admin;
pub mod doc;
pub mod health;
pub mod listings;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod payment;
pub mod reviews;
pub mod search;
pub mod vendor;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/activity", activity::router())
        .nest("/admin", admin::router())
        .nest("/listings", listings::router())
        .nest("/notifications", notifications::router())
        .nest("/orders", orders::router())
        .nest("/payment", payment::router())
        .nest("/reviews", reviews::router())
        .nest("/search", search::router())
        .nest("/vendor", vendor::router())
}
