use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Review;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub rating: Option<i32>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondReviewRequest {
    pub response: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HelpfulToggle {
    pub helpful_count: i32,
    pub is_helpful: bool,
}
