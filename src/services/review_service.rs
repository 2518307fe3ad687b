use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, HelpfulToggle, RespondReviewRequest, ReviewList},
    entity::{
        listings::{Column as ListingCol, Entity as Listings},
        review_helpfuls::{
            ActiveModel as HelpfulActive, Column as HelpfulCol, Entity as ReviewHelpfuls,
        },
        reviews::{
            ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel,
        },
        vendors::{Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::identity,
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    auth: &AuthUser,
    listing_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let user = identity::resolve_user(state, auth).await?;

    let rating = payload
        .rating
        .ok_or_else(|| AppError::BadRequest("rating is required".to_string()))?;
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    let body = payload
        .body
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::BadRequest("body is required".to_string()))?
        .to_string();

    let listing = Listings::find()
        .filter(
            Condition::all()
                .add(ListingCol::Id.eq(listing_id))
                .add(ListingCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    let own_vendor = Vendors::find()
        .filter(VendorCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?;
    if own_vendor.is_some_and(|v| v.id == listing.vendor_id) {
        return Err(AppError::Forbidden);
    }

    let existing = Reviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::ListingId.eq(listing_id))
                .add(ReviewCol::BuyerId.eq(user.id)),
        )
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::InvalidState(
            "listing already reviewed by this account".to_string(),
        ));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        listing_id: Set(listing_id),
        buyer_id: Set(user.id),
        rating: Set(rating),
        body: Set(body),
        helpful_count: Set(0),
        vendor_response: Set(None),
        vendor_responded_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn list_reviews(
    state: &AppState,
    listing_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let listing = Listings::find()
        .filter(
            Condition::all()
                .add(ListingCol::Id.eq(listing_id))
                .add(ListingCol::IsActive.eq(true)),
        )
        .one(&state.orm)
        .await?;
    if listing.is_none() {
        return Err(AppError::NotFound);
    }

    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(ReviewCol::ListingId.eq(listing_id))
        .order_by_desc(ReviewCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(meta),
    ))
}

/// One helpful vote per user per review; the counter always equals the
/// number of vote rows. The review row is locked so racing toggles
/// cannot drift the counter.
pub async fn toggle_helpful(
    state: &AppState,
    auth: &AuthUser,
    review_id: Uuid,
) -> AppResult<ApiResponse<HelpfulToggle>> {
    let user = identity::resolve_user(state, auth).await?;

    let txn = state.orm.begin().await?;

    let review = Reviews::find_by_id(review_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    if review.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = ReviewHelpfuls::find()
        .filter(
            Condition::all()
                .add(HelpfulCol::ReviewId.eq(review_id))
                .add(HelpfulCol::UserId.eq(user.id)),
        )
        .one(&txn)
        .await?;

    let is_helpful = match existing {
        Some(vote) => {
            ReviewHelpfuls::delete_by_id(vote.id).exec(&txn).await?;
            Reviews::update_many()
                .col_expr(
                    ReviewCol::HelpfulCount,
                    Expr::col(ReviewCol::HelpfulCount).sub(1),
                )
                .filter(ReviewCol::Id.eq(review_id))
                .exec(&txn)
                .await?;
            false
        }
        None => {
            HelpfulActive {
                id: Set(Uuid::new_v4()),
                review_id: Set(review_id),
                user_id: Set(user.id),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            Reviews::update_many()
                .col_expr(
                    ReviewCol::HelpfulCount,
                    Expr::col(ReviewCol::HelpfulCount).add(1),
                )
                .filter(ReviewCol::Id.eq(review_id))
                .exec(&txn)
                .await?;
            true
        }
    };

    let helpful_count = Reviews::find_by_id(review_id)
        .one(&txn)
        .await?
        .map(|r| r.helpful_count)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("review vanished mid-toggle")))?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        if is_helpful {
            "Marked helpful"
        } else {
            "Helpful vote removed"
        },
        HelpfulToggle {
            helpful_count,
            is_helpful,
        },
        Some(Meta::empty()),
    ))
}

/// Write-once vendor response on a review of the vendor's own listing.
pub async fn respond(
    state: &AppState,
    auth: &AuthUser,
    review_id: Uuid,
    payload: RespondReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_vendor(state, &user).await?;

    let response = payload
        .response
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("response must not be empty".to_string()))?
        .to_string();

    let review = Reviews::find_by_id(review_id).one(&state.orm).await?;
    let review = match review {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let listing = Listings::find_by_id(review.listing_id).one(&state.orm).await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    if listing.vendor_id != vendor.id {
        return Err(AppError::Forbidden);
    }

    if review.vendor_response.is_some() {
        return Err(AppError::InvalidState(
            "review already has a vendor response".to_string(),
        ));
    }

    let mut active: ReviewActive = review.into();
    active.vendor_response = Set(Some(response));
    active.vendor_responded_at = Set(Some(Utc::now().into()));
    let review = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Response recorded",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        listing_id: model.listing_id,
        buyer_id: model.buyer_id,
        rating: model.rating,
        body: model.body,
        helpful_count: model.helpful_count,
        vendor_response: model.vendor_response,
        vendor_responded_at: model.vendor_responded_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
