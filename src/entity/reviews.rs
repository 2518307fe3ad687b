use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub rating: i32,
    pub body: String,
    pub helpful_count: i32,
    pub vendor_response: Option<String>,
    pub vendor_responded_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::listings::Entity",
        from = "Column::ListingId",
        to = "super::listings::Column::Id"
    )]
    Listings,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::BuyerId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::review_helpfuls::Entity")]
    ReviewHelpfuls,
}

impl Related<super::listings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::review_helpfuls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewHelpfuls.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
