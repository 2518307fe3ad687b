use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnhanceRequest {
    pub query: Option<String>,
}

/// Inclusive lower bound, exclusive-unbounded upper bound, minor units.
#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct PriceRange {
    pub min: i64,
    pub max: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnhancedSearch {
    pub keywords: Vec<String>,
    pub category: Option<String>,
    /// Whether any active listing carries the suggested category.
    pub category_exists: bool,
    pub price_intent: Option<String>,
    pub price_range: Option<PriceRange>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnhanceResponse {
    pub enhanced: EnhancedSearch,
    pub original: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SuggestionQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionList {
    pub suggestions: Vec<String>,
}
