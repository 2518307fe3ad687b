use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    activity::record_activity,
    dto::orders::{CheckoutRequest, OrderDetail, OrderDetailList, OrderLine, UpdateOrderStatusRequest},
    entity::{
        listings::{Column as ListingCol, Entity as Listings, Model as ListingModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::{Column as UserCol, Entity as Users},
        vendors::{Column as VendorCol, Entity as Vendors},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ActivityType, Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::{identity, notify},
    state::AppState,
};

pub async fn checkout(
    state: &AppState,
    auth: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let user = identity::resolve_user(state, auth).await?;

    let items = payload.items.unwrap_or_default();
    if items.is_empty() {
        return Err(AppError::BadRequest("at least one item is required".to_string()));
    }
    if items.iter().any(|item| item.quantity <= 0) {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    if items.iter().any(|item| !seen.insert(item.listing_id)) {
        return Err(AppError::BadRequest(
            "duplicate listing in order items".to_string(),
        ));
    }

    let reference = payload
        .payment_reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::BadRequest("payment_reference is required".to_string()))?
        .to_string();

    // Reference dedup and double-charge prevention are the gateway's job;
    // this side only demands a successful charge covering the total.
    let verified = state.payments.verify(&reference).await?;
    if verified.status != "success" {
        return Err(AppError::BadRequest("payment was not successful".to_string()));
    }

    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = items.iter().map(|item| item.listing_id).collect();
    let listings = Listings::find()
        .filter(ListingCol::Id.is_in(ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    if listings.len() != items.len() {
        return Err(AppError::BadRequest(
            "one or more listings are unavailable".to_string(),
        ));
    }

    let by_id: HashMap<Uuid, &ListingModel> = listings.iter().map(|l| (l.id, l)).collect();

    let vendor_id = listings[0].vendor_id;
    if listings.iter().any(|l| l.vendor_id != vendor_id) {
        return Err(AppError::BadRequest(
            "all items in an order must come from a single vendor".to_string(),
        ));
    }

    let mut total: i64 = 0;
    for item in &items {
        let listing = by_id[&item.listing_id];
        if !listing.is_active {
            return Err(AppError::BadRequest(format!(
                "listing {} is unavailable",
                listing.title
            )));
        }
        if listing.inventory < item.quantity {
            return Err(AppError::BadRequest(format!(
                "insufficient inventory for {}",
                listing.title
            )));
        }
        total += listing.price * i64::from(item.quantity);
    }

    if verified.amount != total {
        return Err(AppError::BadRequest(
            "payment amount does not match the order total".to_string(),
        ));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        buyer_id: Set(user.id),
        vendor_id: Set(vendor_id),
        status: Set(OrderStatus::Paid.as_str().to_string()),
        total_amount: Set(total),
        payment_reference: Set(reference),
        tracking_number: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<OrderLine> = Vec::new();
    for item in &items {
        let listing = by_id[&item.listing_id];
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            listing_id: Set(listing.id),
            quantity: Set(item.quantity),
            price: Set(listing.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        lines.push(OrderLine {
            id: row.id,
            listing_id: listing.id,
            title: listing.title.clone(),
            images: listing.images.clone(),
            quantity: row.quantity,
            price: row.price,
        });

        Listings::update_many()
            .col_expr(
                ListingCol::Inventory,
                Expr::col(ListingCol::Inventory).sub(item.quantity),
            )
            .filter(ListingCol::Id.eq(listing.id))
            .exec(&txn)
            .await?;
    }

    // The vendor's notification commits or rolls back with the order.
    let vendor = Vendors::find_by_id(vendor_id).one(&txn).await?;
    let vendor = match vendor {
        Some(v) => v,
        None => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "vendor {vendor_id} missing for checkout"
            )));
        }
    };
    notify::create_notification(
        &txn,
        vendor.user_id,
        "order_placed",
        "New order",
        &format!("You received a new order of {} item(s).", lines.len()),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": total })),
    )
    .await?;

    txn.commit().await?;

    if let Err(err) = record_activity(
        &state.pool,
        user.id,
        None,
        ActivityType::Purchase,
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "activity log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderDetail {
            order: order_from_entity(order),
            items: lines,
            vendor_name: Some(vendor.business_name),
            buyer_name: None,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    auth: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderDetailList>> {
    let user = identity::resolve_user(state, auth).await?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::BuyerId.eq(user.id))
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = assemble_details(&state.orm, orders, Counterpart::VendorName).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderDetailList { items },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let user = identity::resolve_user(state, auth).await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::BuyerId.eq(user.id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut details = assemble_details(&state.orm, vec![order], Counterpart::VendorName).await?;
    let detail = details
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order detail assembly lost the order")))?;

    Ok(ApiResponse::success("Order", detail, Some(Meta::empty())))
}

pub async fn list_vendor_orders(
    state: &AppState,
    auth: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderDetailList>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderCol::VendorId.eq(vendor.id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = assemble_details(&state.orm, orders, Counterpart::BuyerName).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderDetailList { items },
        Some(meta),
    ))
}

pub async fn update_status(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let user = identity::resolve_user(state, auth).await?;
    let vendor = identity::require_approved_vendor(state, &user).await?;

    let status = payload
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?;
    let next = OrderStatus::parse(status)
        .ok_or_else(|| AppError::BadRequest("Invalid order status".to_string()))?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::VendorId.eq(vendor.id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = OrderStatus::parse(&order.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown status {}",
            order.id,
            order.status
        ))
    })?;
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidState(format!(
            "cannot move order from {current} to {next}"
        )));
    }

    let buyer_id = order.buyer_id;
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    if let Some(tracking) = payload
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        active.tracking_number = Set(Some(tracking.to_string()));
    }
    let order = active.update(&txn).await?;

    let message = match order.tracking_number.as_deref() {
        Some(tracking) => format!("Your order is now {next}. Tracking number: {tracking}"),
        None => format!("Your order is now {next}."),
    };
    notify::create_notification(
        &txn,
        buyer_id,
        "order_status",
        "Order update",
        &message,
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

#[derive(Clone, Copy)]
enum Counterpart {
    VendorName,
    BuyerName,
}

/// Join orders with their line items, the listings' display fields, and
/// the counterpart's name for the reading side.
async fn assemble_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
    counterpart: Counterpart,
) -> AppResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(conn)
        .await?;

    let listing_ids: Vec<Uuid> = items.iter().map(|i| i.listing_id).collect();
    let listing_display: HashMap<Uuid, (String, Vec<String>)> = Listings::find()
        .filter(ListingCol::Id.is_in(listing_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| (l.id, (l.title, l.images)))
        .collect();

    let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for item in items {
        let (title, images) = listing_display
            .get(&item.listing_id)
            .cloned()
            .unwrap_or_default();
        lines_by_order.entry(item.order_id).or_default().push(OrderLine {
            id: item.id,
            listing_id: item.listing_id,
            title,
            images,
            quantity: item.quantity,
            price: item.price,
        });
    }

    let names: HashMap<Uuid, String> = match counterpart {
        Counterpart::VendorName => {
            let vendor_ids: Vec<Uuid> = orders.iter().map(|o| o.vendor_id).collect();
            Vendors::find()
                .filter(VendorCol::Id.is_in(vendor_ids))
                .all(conn)
                .await?
                .into_iter()
                .map(|v| (v.id, v.business_name))
                .collect()
        }
        Counterpart::BuyerName => {
            let buyer_ids: Vec<Uuid> = orders.iter().map(|o| o.buyer_id).collect();
            Users::find()
                .filter(UserCol::Id.is_in(buyer_ids))
                .all(conn)
                .await?
                .into_iter()
                .map(|u| (u.id, u.display_name))
                .collect()
        }
    };

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = lines_by_order.remove(&order.id).unwrap_or_default();
            let (vendor_name, buyer_name) = match counterpart {
                Counterpart::VendorName => (names.get(&order.vendor_id).cloned(), None),
                Counterpart::BuyerName => (None, names.get(&order.buyer_id).cloned()),
            };
            OrderDetail {
                order: order_from_entity(order),
                items,
                vendor_name,
                buyer_name,
            }
        })
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        buyer_id: model.buyer_id,
        vendor_id: model.vendor_id,
        status: model.status,
        total_amount: model.total_amount,
        payment_reference: model.payment_reference,
        tracking_number: model.tracking_number,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
