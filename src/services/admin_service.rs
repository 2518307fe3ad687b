use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use crate::{
    dto::vendors::{ApproveVendorRequest, RejectVendorRequest, VendorList},
    entity::{
        users::Entity as Users,
        vendors::{ActiveModel as VendorActive, Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Vendor, VendorStatus},
    response::{ApiResponse, Meta},
    services::{identity, identity::vendor_from_entity, notify},
    state::AppState,
};

pub async fn list_pending_vendors(
    state: &AppState,
    auth: &AuthUser,
) -> AppResult<ApiResponse<VendorList>> {
    let user = identity::resolve_user(state, auth).await?;
    identity::ensure_admin(&user)?;

    // Oldest applications first so the queue drains fairly.
    let vendors = Vendors::find()
        .filter(VendorCol::Status.eq(VendorStatus::Pending.as_str()))
        .order_by_asc(VendorCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(vendor_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Pending vendors",
        VendorList { items: vendors },
        Some(Meta::empty()),
    ))
}

pub async fn approve_vendor(
    state: &AppState,
    auth: &AuthUser,
    payload: ApproveVendorRequest,
) -> AppResult<ApiResponse<Vendor>> {
    let user = identity::resolve_user(state, auth).await?;
    identity::ensure_admin(&user)?;

    let txn = state.orm.begin().await?;

    let vendor = Vendors::find_by_id(payload.vendor_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let vendor = match vendor {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    if vendor.status != VendorStatus::Pending.as_str() {
        return Err(AppError::InvalidState(
            "vendor application already processed".to_string(),
        ));
    }

    let applicant_id = vendor.user_id;
    let business_name = vendor.business_name.clone();

    let mut active: VendorActive = vendor.into();
    active.status = Set(VendorStatus::Approved.as_str().to_string());
    active.approved_at = Set(Some(Utc::now().into()));
    active.rejection_reason = Set(None);
    let vendor = active.update(&txn).await?;

    notify::create_notification(
        &txn,
        applicant_id,
        "vendor_approved",
        "Application approved",
        &format!("Your vendor application for {business_name} has been approved. You can start listing products."),
        Some(serde_json::json!({ "vendor_id": vendor.id })),
    )
    .await?;

    txn.commit().await?;

    if let Some(applicant) = Users::find_by_id(applicant_id).one(&state.orm).await? {
        notify::send_email_best_effort(
            state,
            &applicant.email,
            "Your TradeFair vendor application was approved",
            &format!(
                "Hello {},\n\nYour application for {business_name} has been approved. Welcome aboard!",
                applicant.display_name
            ),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Vendor approved",
        vendor_from_entity(vendor),
        Some(Meta::empty()),
    ))
}

pub async fn reject_vendor(
    state: &AppState,
    auth: &AuthUser,
    payload: RejectVendorRequest,
) -> AppResult<ApiResponse<Vendor>> {
    let user = identity::resolve_user(state, auth).await?;
    identity::ensure_admin(&user)?;

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("a rejection reason is required".to_string()))?
        .to_string();

    let txn = state.orm.begin().await?;

    let vendor = Vendors::find_by_id(payload.vendor_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let vendor = match vendor {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    if vendor.status != VendorStatus::Pending.as_str() {
        return Err(AppError::InvalidState(
            "vendor application already processed".to_string(),
        ));
    }

    let applicant_id = vendor.user_id;
    let business_name = vendor.business_name.clone();

    let mut active: VendorActive = vendor.into();
    active.status = Set(VendorStatus::Rejected.as_str().to_string());
    active.rejection_reason = Set(Some(reason.clone()));
    let vendor = active.update(&txn).await?;

    notify::create_notification(
        &txn,
        applicant_id,
        "vendor_rejected",
        "Application rejected",
        &format!("Your vendor application for {business_name} was rejected: {reason}"),
        Some(serde_json::json!({ "vendor_id": vendor.id })),
    )
    .await?;

    txn.commit().await?;

    if let Some(applicant) = Users::find_by_id(applicant_id).one(&state.orm).await? {
        notify::send_email_best_effort(
            state,
            &applicant.email,
            "Your TradeFair vendor application was rejected",
            &format!(
                "Hello {},\n\nYour application for {business_name} was rejected.\nReason: {reason}",
                applicant.display_name
            ),
        )
        .await;
    }

    Ok(ApiResponse::success(
        "Vendor rejected",
        vendor_from_entity(vendor),
        Some(Meta::empty()),
    ))
}
