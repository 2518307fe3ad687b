use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vendors::Entity")]
    Vendors,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
    #[sea_orm(has_many = "super::review_helpfuls::Entity")]
    ReviewHelpfuls,
    #[sea_orm(has_many = "super::user_activities::Entity")]
    UserActivities,
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendors.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl Related<super::review_helpfuls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewHelpfuls.def()
    }
}

impl Related<super::user_activities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserActivities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
