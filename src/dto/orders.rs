use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub listing_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Option<Vec<CheckoutItem>>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
}

/// Line item joined with the listing's display fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub title: String,
    pub images: Vec<String>,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderLine>,
    /// Set on buyer-facing reads.
    pub vendor_name: Option<String>,
    /// Set on vendor-facing reads.
    pub buyer_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailList {
    pub items: Vec<OrderDetail>,
}
