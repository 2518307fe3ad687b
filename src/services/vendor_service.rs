use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::{
    dto::{
        listings::ListingList,
        vendors::{CreateListingRequest, SetListingActiveRequest, VendorApplyRequest},
    },
    entity::{
        listings::{
            ActiveModel as ListingActive, Column as ListingCol, Entity as Listings,
            Model as ListingModel,
        },
        vendors::{ActiveModel as VendorActive, Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Listing, Vendor, VendorStatus},
    response::{ApiResponse, Meta},
    services::{identity, identity::vendor_from_entity},
    state::AppState,
};

pub async fn apply(
    state: &AppState,
    auth: &AuthUser,
    payload: VendorApplyRequest,
) -> AppResult<ApiResponse<Vendor>> {
    let user = identity::resolve_user(state, auth).await?;

    let business_name = payload
        .business_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("business_name is required".to_string()))?
        .to_string();

    let existing = Vendors::find()
        .filter(VendorCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::InvalidState(
            "a vendor application already exists for this account".to_string(),
        ));
    }

    let vendor = VendorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        business_name: Set(business_name),
        status: Set(VendorStatus::Pending.as_str().to_string()),
        rejection_reason: Set(None),
        approved_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Application submitted",
        vendor_from_entity(vendor),
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<ListingList>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;

    let items = Listings::find()
        .filter(ListingCol::VendorId.eq(vendor.id))
        .order_by_desc(ListingCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(listing_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Products",
        ListingList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    auth: &AuthUser,
    payload: CreateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;

    let new_listing = validate_new_listing(payload)?;

    let listing = ListingActive {
        id: Set(Uuid::new_v4()),
        vendor_id: Set(vendor.id),
        title: Set(new_listing.title),
        description: Set(new_listing.description),
        price: Set(new_listing.price),
        inventory: Set(new_listing.inventory),
        categories: Set(new_listing.categories),
        images: Set(new_listing.images),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Product created",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn get_product(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Listing>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;

    let listing = find_owned_listing(state, vendor.id, id).await?;
    Ok(ApiResponse::success(
        "Product",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

pub async fn set_product_active(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    payload: SetListingActiveRequest,
) -> AppResult<ApiResponse<Listing>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;

    let listing = find_owned_listing(state, vendor.id, id).await?;

    let mut active: ListingActive = listing.into();
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let listing = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Product updated",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}

/// Ownership is part of the lookup, so another vendor's listing is
/// indistinguishable from a missing one.
async fn find_owned_listing(
    state: &AppState,
    vendor_id: Uuid,
    listing_id: Uuid,
) -> AppResult<ListingModel> {
    let listing = Listings::find()
        .filter(
            Condition::all()
                .add(ListingCol::Id.eq(listing_id))
                .add(ListingCol::VendorId.eq(vendor_id)),
        )
        .one(&state.orm)
        .await?;
    match listing {
        Some(l) => Ok(l),
        None => Err(AppError::NotFound),
    }
}

struct NewListing {
    title: String,
    description: String,
    price: i64,
    inventory: i32,
    categories: Vec<String>,
    images: Vec<String>,
}

fn validate_new_listing(payload: CreateListingRequest) -> Result<NewListing, AppError> {
    let title = required_text(payload.title, "title")?;
    let description = required_text(payload.description, "description")?;

    let price = payload
        .price
        .ok_or_else(|| AppError::BadRequest("price is required".to_string()))?;
    if price < 0 {
        return Err(AppError::BadRequest(
            "price must be a non-negative integer".to_string(),
        ));
    }

    let inventory = payload
        .inventory
        .ok_or_else(|| AppError::BadRequest("inventory is required".to_string()))?;
    if inventory < 0 {
        return Err(AppError::BadRequest(
            "inventory must be a non-negative integer".to_string(),
        ));
    }

    let categories = non_empty_list(payload.categories, "category")?;
    let images = non_empty_list(payload.images, "image")?;

    Ok(NewListing {
        title,
        description,
        price,
        inventory,
        categories,
        images,
    })
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest(format!("{field} is required")))
}

fn non_empty_list(values: Option<Vec<String>>, field: &str) -> Result<Vec<String>, AppError> {
    let values: Vec<String> = values
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(AppError::BadRequest(format!(
            "at least one {field} is required"
        )));
    }
    Ok(values)
}

pub(crate) fn listing_from_entity(model: ListingModel) -> Listing {
    Listing {
        id: model.id,
        vendor_id: model.vendor_id,
        title: model.title,
        description: model.description,
        price: model.price,
        inventory: model.inventory,
        categories: model.categories,
        images: model.images,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> CreateListingRequest {
        CreateListingRequest {
            title: Some("Blue Mug".to_string()),
            description: Some("A mug, blue".to_string()),
            price: Some(1500),
            inventory: Some(10),
            categories: Some(vec!["kitchen".to_string()]),
            images: Some(vec!["https://img.example/mug.jpg".to_string()]),
        }
    }

    #[test]
    fn accepts_a_complete_listing() {
        let listing = validate_new_listing(valid_payload()).expect("valid listing");
        assert_eq!(listing.title, "Blue Mug");
        assert_eq!(listing.price, 1500);
        assert_eq!(listing.inventory, 10);
    }

    #[test]
    fn rejects_missing_or_blank_title() {
        let mut payload = valid_payload();
        payload.title = None;
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));

        let mut payload = valid_payload();
        payload.title = Some("   ".to_string());
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_negative_price_and_inventory() {
        let mut payload = valid_payload();
        payload.price = Some(-1);
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));

        let mut payload = valid_payload();
        payload.inventory = Some(-5);
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_empty_category_and_image_sets() {
        let mut payload = valid_payload();
        payload.categories = Some(vec!["  ".to_string()]);
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));

        let mut payload = valid_payload();
        payload.images = None;
        assert!(matches!(
            validate_new_listing(payload),
            Err(AppError::BadRequest(_))
        ));
    }
}
