use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::{
    entity::{
        users::{Column as UserCol, Entity as Users, Model as UserModel},
        vendors::{Column as VendorCol, Entity as Vendors, Model as VendorModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User, Vendor, VendorStatus},
    state::AppState,
};

/// Resolve the authenticated principal to its stored user row.
pub async fn resolve_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    let user = Users::find()
        .filter(UserCol::ExternalId.eq(auth.external_id.as_str()))
        .one(&state.orm)
        .await?;
    match user {
        Some(user) => Ok(user_from_entity(user)),
        None => Err(AppError::NotFound),
    }
}

pub fn ensure_role(user: &User, role: Role) -> Result<(), AppError> {
    if user.role != role.as_str() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &User) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// The caller's vendor record regardless of status.
pub async fn require_vendor(state: &AppState, user: &User) -> AppResult<Vendor> {
    let vendor = Vendors::find()
        .filter(VendorCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?;
    match vendor {
        Some(vendor) => Ok(vendor_from_entity(vendor)),
        None => Err(AppError::Forbidden),
    }
}

/// Catalog and fulfilment entry points are open to approved vendors only.
pub async fn require_approved_vendor(state: &AppState, user: &User) -> AppResult<Vendor> {
    let vendor = require_vendor(state, user).await?;
    if vendor.status != VendorStatus::Approved.as_str() {
        return Err(AppError::Forbidden);
    }
    Ok(vendor)
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        external_id: model.external_id,
        email: model.email,
        display_name: model.display_name,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn vendor_from_entity(model: VendorModel) -> Vendor {
    Vendor {
        id: model.id,
        user_id: model.user_id,
        business_name: model.business_name,
        status: model.status,
        rejection_reason: model.rejection_reason,
        approved_at: model.approved_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
