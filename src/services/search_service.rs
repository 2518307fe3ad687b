use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect};

use crate::{
    dto::search::{
        EnhanceRequest, EnhanceResponse, EnhancedSearch, PriceRange, SuggestionList,
        SuggestionQuery,
    },
    entity::listings::{Column as ListingCol, Entity as Listings},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

const SUGGESTION_CONTEXT_LIMIT: u64 = 20;
const DIRECT_MATCH_LIMIT: usize = 3;
const SUGGESTION_CAP: usize = 8;
const MIN_SUGGESTION_QUERY_CHARS: usize = 3;

pub async fn enhance(
    state: &AppState,
    payload: EnhanceRequest,
) -> AppResult<ApiResponse<EnhanceResponse>> {
    let query = payload
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("query is required".to_string()))?
        .to_string();

    let enhanced = state.enhancer.enhance(&query).await?;

    let price_range = enhanced
        .price_intent
        .as_deref()
        .and_then(price_range_for_intent);

    let category_exists = match enhanced.category.as_deref() {
        Some(category) => category_has_active_listings(state, category).await?,
        None => false,
    };

    Ok(ApiResponse::success(
        "Query enhanced",
        EnhanceResponse {
            enhanced: EnhancedSearch {
                keywords: enhanced.keywords,
                category: enhanced.category,
                category_exists,
                price_intent: enhanced.price_intent,
                price_range,
                attributes: enhanced.attributes,
            },
            original: query,
        },
        Some(Meta::empty()),
    ))
}

pub async fn suggestions(
    state: &AppState,
    query: SuggestionQuery,
) -> AppResult<ApiResponse<SuggestionList>> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();

    // Very short prefixes never reach the AI service.
    if q.chars().count() < MIN_SUGGESTION_QUERY_CHARS {
        return Ok(ApiResponse::success(
            "Suggestions",
            SuggestionList {
                suggestions: Vec::new(),
            },
            Some(Meta::empty()),
        ));
    }

    let pattern = format!("%{q}%");
    let titles: Vec<String> = Listings::find()
        .filter(
            Condition::all().add(ListingCol::IsActive.eq(true)).add(
                Condition::any()
                    .add(Expr::col(ListingCol::Title).ilike(pattern.clone()))
                    .add(Expr::col(ListingCol::Description).ilike(pattern)),
            ),
        )
        .limit(SUGGESTION_CONTEXT_LIMIT)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|l| l.title)
        .collect();

    let needle = q.to_lowercase();
    let direct: Vec<String> = titles
        .iter()
        .filter(|title| title.to_lowercase().contains(&needle))
        .take(DIRECT_MATCH_LIMIT)
        .cloned()
        .collect();

    // A failed enhancement degrades to the direct matches.
    let ai = match state.enhancer.suggest(q, &titles).await {
        Ok(suggestions) => suggestions,
        Err(err) => {
            tracing::warn!(error = %err, "suggestion enhancement failed");
            Vec::new()
        }
    };

    Ok(ApiResponse::success(
        "Suggestions",
        SuggestionList {
            suggestions: merge_suggestions(ai, direct),
        },
        Some(Meta::empty()),
    ))
}

/// Fixed three-tier mapping from price intent to minor-unit ranges.
fn price_range_for_intent(intent: &str) -> Option<PriceRange> {
    match intent {
        "budget" => Some(PriceRange {
            min: 0,
            max: Some(10_000),
        }),
        "mid-range" => Some(PriceRange {
            min: 10_000,
            max: Some(50_000),
        }),
        "premium" => Some(PriceRange {
            min: 50_000,
            max: None,
        }),
        _ => None,
    }
}

/// Merge AI and direct suggestions, dropping case-insensitive duplicates
/// and capping the result.
fn merge_suggestions(ai: Vec<String>, direct: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for suggestion in ai.into_iter().chain(direct) {
        let trimmed = suggestion.trim();
        if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        merged.push(trimmed.to_string());
        if merged.len() == SUGGESTION_CAP {
            break;
        }
    }
    merged
}

async fn category_has_active_listings(state: &AppState, category: &str) -> AppResult<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM listings WHERE is_active AND $1 = ANY (categories))",
    )
    .bind(category)
    .fetch_one(&state.pool)
    .await?;
    Ok(exists)
}
