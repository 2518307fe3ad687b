use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::{PgExpr, PgFunc};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::listings::ListingList,
    entity::listings::{Column as ListingCol, Entity as Listings},
    error::{AppError, AppResult},
    models::Listing,
    response::{ApiResponse, Meta},
    routes::params::{ListingQuery, ListingSortBy, SortOrder},
    services::vendor_service::listing_from_entity,
    state::AppState,
};

/// Public storefront browse over active listings.
pub async fn browse(state: &AppState, query: ListingQuery) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(ListingCol::IsActive.eq(true));

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ListingCol::Title).ilike(pattern.clone()))
                .add(Expr::col(ListingCol::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|c| !c.is_empty()) {
        condition = condition
            .add(Expr::val(category.clone()).eq(PgFunc::any(Expr::col(ListingCol::Categories))));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(ListingCol::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(ListingCol::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ListingSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ListingSortBy::CreatedAt => ListingCol::CreatedAt,
        ListingSortBy::Price => ListingCol::Price,
        ListingSortBy::Title => ListingCol::Title,
    };

    let mut finder = Listings::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(listing_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Listings",
        ListingList { items },
        Some(meta),
    ))
}

pub async fn get_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Listing>> {
    let listing = Listings::find()
        .filter(
            Condition::all()
                .add(ListingCol::Id.eq(id))
                .add(ListingCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Listing",
        listing_from_entity(listing),
        None,
    ))
}
