use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Vendor;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VendorApplyRequest {
    pub business_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveVendorRequest {
    pub vendor_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectVendorRequest {
    pub vendor_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VendorList {
    pub items: Vec<Vendor>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub inventory: Option<i32>,
    pub categories: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetListingActiveRequest {
    pub is_active: bool,
}
