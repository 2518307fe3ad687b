pub mod listings;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod review_helpfuls;
pub mod reviews;
pub mod user_activities;
pub mod users;
pub mod vendors;

pub use listings::Entity as Listings;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use review_helpfuls::Entity as ReviewHelpfuls;
pub use reviews::Entity as Reviews;
pub use user_activities::Entity as UserActivities;
pub use users::Entity as Users;
pub use vendors::Entity as Vendors;
