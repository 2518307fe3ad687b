use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Listing;

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingList {
    pub items: Vec<Listing>,
}
