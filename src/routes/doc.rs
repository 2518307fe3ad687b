use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        activity::{ActivityTracked, TrackActivityRequest},
        listings::ListingList,
        notifications::NotificationList,
        orders::{CheckoutItem, CheckoutRequest, OrderDetail, OrderDetailList, OrderLine, UpdateOrderStatusRequest},
        payment::{InitializePaymentRequest, PaymentInitialized, PaymentVerification},
        reviews::{CreateReviewRequest, HelpfulToggle, RespondReviewRequest, ReviewList},
        search::{EnhanceRequest, EnhanceResponse, EnhancedSearch, PriceRange, SuggestionList},
        vendors::{ApproveVendorRequest, CreateListingRequest, RejectVendorRequest, SetListingActiveRequest, VendorApplyRequest, VendorList},
    },
    models::{Listing, Notification, Order, Review, Vendor},
    response::{ApiResponse, Meta},
    routes::{activity, admin, health, listings, notifications, orders, params, payment, reviews, search, vendor},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        activity::track,
        admin::list_pending_vendors,
        admin::approve_vendor,
        admin::reject_vendor,
        listings::browse_listings,
        listings::get_listing,
        listings::list_reviews,
        listings::create_review,
        notifications::list_notifications,
        orders::checkout,
        orders::list_my_orders,
        orders::get_order,
        payment::initialize,
        payment::verify,
        reviews::toggle_helpful,
        reviews::respond,
        search::enhance,
        search::suggestions,
        vendor::apply,
        vendor::list_products,
        vendor::create_product,
        vendor::get_product,
        vendor::set_product_active,
        vendor::list_orders,
        vendor::update_order_status
    ),
    components(
        schemas(
            Vendor,
            Listing,
            Order,
            Review,
            Notification,
            VendorApplyRequest,
            ApproveVendorRequest,
            RejectVendorRequest,
            VendorList,
            CreateListingRequest,
            SetListingActiveRequest,
            ListingList,
            CheckoutItem,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderLine,
            OrderDetail,
            OrderDetailList,
            InitializePaymentRequest,
            PaymentInitialized,
            PaymentVerification,
            CreateReviewRequest,
            RespondReviewRequest,
            ReviewList,
            HelpfulToggle,
            EnhanceRequest,
            EnhanceResponse,
            EnhancedSearch,
            PriceRange,
            SuggestionList,
            TrackActivityRequest,
            ActivityTracked,
            NotificationList,
            params::Pagination,
            params::ListingQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Vendor>,
            ApiResponse<Listing>,
            ApiResponse<ListingList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderDetailList>,
            ApiResponse<VendorList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Activity", description = "Best-effort activity tracking"),
        (name = "Admin", description = "Vendor onboarding administration"),
        (name = "Listings", description = "Public storefront endpoints"),
        (name = "Notifications", description = "Notification feed"),
        (name = "Orders", description = "Buyer order endpoints"),
        (name = "Payment", description = "Payment gateway bridge"),
        (name = "Reviews", description = "Review interactions"),
        (name = "Search", description = "AI-enhanced search"),
        (name = "Vendor", description = "Vendor catalog and fulfilment"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
