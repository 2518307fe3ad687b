use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Statement};
use uuid::Uuid;

use tradefair_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        orders::{CheckoutItem, CheckoutRequest, UpdateOrderStatusRequest},
        reviews::{CreateReviewRequest, RespondReviewRequest},
        vendors::{
            ApproveVendorRequest, CreateListingRequest, SetListingActiveRequest,
            VendorApplyRequest,
        },
    },
    entity::{UserActivities, users},
    error::AppError,
    gateways::{
        EnhancedQuery, GatewayError, InitializePayment, InitializedTransaction, Mailer,
        PaymentGateway, TextEnhancer, VerifiedTransaction,
    },
    middleware::auth::AuthUser,
    models::{Listing, Vendor},
    routes::params::{OrderListQuery, Pagination},
    services::{admin_service, order_service, review_service, vendor_service},
    state::AppState,
};

/// Gateway double that accepts any reference and reports a fixed amount.
struct TestGateway {
    amount: i64,
}

#[async_trait]
impl PaymentGateway for TestGateway {
    async fn initialize(
        &self,
        request: InitializePayment,
    ) -> Result<InitializedTransaction, GatewayError> {
        Ok(InitializedTransaction {
            authorization_url: "https://checkout.example/test".to_string(),
            access_code: "test".to_string(),
            reference: request.reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        Ok(VerifiedTransaction {
            status: "success".to_string(),
            reference: reference.to_string(),
            amount: self.amount,
            currency: "NGN".to_string(),
            paid_at: Some("2026-01-01T00:00:00Z".to_string()),
            channel: Some("card".to_string()),
            metadata: None,
        })
    }
}

struct NullEnhancer;

#[async_trait]
impl TextEnhancer for NullEnhancer {
    async fn enhance(&self, _query: &str) -> Result<EnhancedQuery, GatewayError> {
        Ok(EnhancedQuery::default())
    }

    async fn suggest(
        &self,
        _query: &str,
        _context_titles: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        Ok(Vec::new())
    }
}

struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

// The tests share one database and truncate it in setup, so they must
// not interleave.
static DB_LOCK: Mutex<()> = Mutex::new(());

fn db_guard() -> MutexGuard<'static, ()> {
    DB_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .or_else(|| {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        })
}

async fn setup_state(database_url: &str, gateway_amount: i64) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE user_activities, notifications, review_helpfuls, reviews, order_items, orders, listings, vendors, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        payments: Arc::new(TestGateway {
            amount: gateway_amount,
        }),
        enhancer: Arc::new(NullEnhancer),
        mailer: Arc::new(NullMailer),
        config: AppConfig {
            database_url: database_url.to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            app_base_url: "http://127.0.0.1:3000".to_string(),
            paystack_secret_key: Some("sk_test".to_string()),
            ai_api_key: None,
            ai_base_url: "https://api.openai.com/v1".to_string(),
            smtp: None,
        },
    })
}

async fn create_user(
    state: &AppState,
    external_id: &str,
    email: &str,
    display_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        external_id: Set(external_id.to_string()),
        email: Set(email.to_string()),
        display_name: Set(display_name.to_string()),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}

fn auth(external_id: &str) -> AuthUser {
    AuthUser {
        external_id: external_id.to_string(),
    }
}

async fn approved_vendor(
    state: &AppState,
    admin: &AuthUser,
    applicant: &AuthUser,
    business_name: &str,
) -> anyhow::Result<Vendor> {
    let vendor = vendor_service::apply(
        state,
        applicant,
        VendorApplyRequest {
            business_name: Some(business_name.to_string()),
        },
    )
    .await?
    .data
    .expect("vendor");

    let vendor = admin_service::approve_vendor(
        state,
        admin,
        ApproveVendorRequest {
            vendor_id: vendor.id,
        },
    )
    .await?
    .data
    .expect("approved vendor");

    Ok(vendor)
}

async fn create_listing(
    state: &AppState,
    seller: &AuthUser,
    title: &str,
    price: i64,
    inventory: i32,
) -> anyhow::Result<Listing> {
    let listing = vendor_service::create_product(
        state,
        seller,
        CreateListingRequest {
            title: Some(title.to_string()),
            description: Some(format!("{title}, as described")),
            price: Some(price),
            inventory: Some(inventory),
            categories: Some(vec!["kitchen".to_string()]),
            images: Some(vec!["https://cdn.tradefair.app/test.jpg".to_string()]),
        },
    )
    .await?
    .data
    .expect("listing");

    Ok(listing)
}

// Integration flow: seller applies and is approved, lists a product,
// buyer checks out, seller walks the order through fulfilment.
#[tokio::test]
async fn onboarding_catalog_checkout_and_fulfilment_flow() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = db_guard();
    let state = setup_state(&database_url, 3000).await?;

    create_user(&state, "idp_admin", "admin@example.com", "Admin", "admin").await?;
    create_user(&state, "idp_seller", "seller@example.com", "Sade", "buyer").await?;
    create_user(&state, "idp_buyer", "buyer@example.com", "Bola", "buyer").await?;
    create_user(&state, "idp_rival", "rival@example.com", "Ade", "buyer").await?;

    let admin = auth("idp_admin");
    let seller = auth("idp_seller");
    let buyer = auth("idp_buyer");
    let rival = auth("idp_rival");

    // Application goes in pending and cannot be repeated.
    let vendor = vendor_service::apply(
        &state,
        &seller,
        VendorApplyRequest {
            business_name: Some("Sade Homewares".to_string()),
        },
    )
    .await?
    .data
    .expect("vendor");
    assert_eq!(vendor.status, "pending");

    let dup = vendor_service::apply(
        &state,
        &seller,
        VendorApplyRequest {
            business_name: Some("Sade Again".to_string()),
        },
    )
    .await;
    assert!(matches!(dup, Err(AppError::InvalidState(_))));

    // A pending vendor cannot touch the catalog.
    let forbidden = vendor_service::list_products(&state, &seller).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    // Queue is admin-only.
    let not_admin = admin_service::list_pending_vendors(&state, &buyer).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    let pending = admin_service::list_pending_vendors(&state, &admin)
        .await?
        .data
        .expect("pending list");
    assert_eq!(pending.items.len(), 1);

    // Approval is one-way from pending.
    let approved = admin_service::approve_vendor(
        &state,
        &admin,
        ApproveVendorRequest {
            vendor_id: vendor.id,
        },
    )
    .await?
    .data
    .expect("approved");
    assert_eq!(approved.status, "approved");
    assert!(approved.approved_at.is_some());

    let twice = admin_service::approve_vendor(
        &state,
        &admin,
        ApproveVendorRequest {
            vendor_id: vendor.id,
        },
    )
    .await;
    assert!(matches!(twice, Err(AppError::InvalidState(_))));

    let listing = create_listing(&state, &seller, "Blue Mug", 1500, 10).await?;
    assert!(listing.is_active);
    assert_eq!(listing.price, 1500);

    // Another vendor can never learn the listing exists.
    approved_vendor(&state, &admin, &rival, "Ade Ceramics").await?;
    let not_mine = vendor_service::get_product(&state, &rival, listing.id).await;
    assert!(matches!(not_mine, Err(AppError::NotFound)));
    let not_mine = vendor_service::set_product_active(
        &state,
        &rival,
        listing.id,
        SetListingActiveRequest { is_active: false },
    )
    .await;
    assert!(matches!(not_mine, Err(AppError::NotFound)));

    // Checkout against the verified reference.
    let checkout = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            items: Some(vec![CheckoutItem {
                listing_id: listing.id,
                quantity: 2,
            }]),
            payment_reference: Some("ref_flow_1".to_string()),
        },
    )
    .await?
    .data
    .expect("checkout");
    assert_eq!(checkout.order.status, "paid");
    assert_eq!(checkout.order.total_amount, 3000);
    assert_eq!(checkout.items.len(), 1);

    let refreshed = vendor_service::get_product(&state, &seller, listing.id)
        .await?
        .data
        .expect("listing");
    assert_eq!(refreshed.inventory, 8);

    // Only the selling vendor may move the order, only along the table.
    let foreign = order_service::update_status(
        &state,
        &rival,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("processing".to_string()),
            tracking_number: None,
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound)));

    let invalid = order_service::update_status(
        &state,
        &seller,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("teleported".to_string()),
            tracking_number: None,
        },
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    let skipped = order_service::update_status(
        &state,
        &seller,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("delivered".to_string()),
            tracking_number: None,
        },
    )
    .await;
    assert!(matches!(skipped, Err(AppError::InvalidState(_))));

    let processing = order_service::update_status(
        &state,
        &seller,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("processing".to_string()),
            tracking_number: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(processing.status, "processing");

    let shipped = order_service::update_status(
        &state,
        &seller,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("shipped".to_string()),
            tracking_number: Some("TRK-1".to_string()),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.status, "shipped");
    assert_eq!(shipped.tracking_number.as_deref(), Some("TRK-1"));

    // Cancellation window has closed.
    let late_cancel = order_service::update_status(
        &state,
        &seller,
        checkout.order.id,
        UpdateOrderStatusRequest {
            status: Some("cancelled".to_string()),
            tracking_number: None,
        },
    )
    .await;
    assert!(matches!(late_cancel, Err(AppError::InvalidState(_))));

    // Each side sees the counterpart's name on its read path.
    let my_orders = order_service::list_my_orders(
        &state,
        &buyer,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(my_orders.items.len(), 1);
    assert_eq!(
        my_orders.items[0].vendor_name.as_deref(),
        Some("Sade Homewares")
    );
    assert_eq!(my_orders.items[0].items[0].title, "Blue Mug");

    let vendor_orders = order_service::list_vendor_orders(
        &state,
        &seller,
        OrderListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            status: None,
            sort_order: None,
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(vendor_orders.items.len(), 1);
    assert_eq!(vendor_orders.items[0].buyer_name.as_deref(), Some("Bola"));

    // The buyer's own order read is ownership-scoped.
    let foreign_read = order_service::get_order(&state, &rival, checkout.order.id).await;
    assert!(matches!(foreign_read, Err(AppError::NotFound)));

    Ok(())
}

#[tokio::test]
async fn checkout_rejects_mismatched_payment_and_split_vendors() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = db_guard();
    // Gateway reports 1000, which matches no cart below.
    let state = setup_state(&database_url, 1000).await?;

    create_user(&state, "idp_admin", "admin@example.com", "Admin", "admin").await?;
    create_user(&state, "idp_seller", "seller@example.com", "Sade", "buyer").await?;
    create_user(&state, "idp_rival", "rival@example.com", "Ade", "buyer").await?;
    create_user(&state, "idp_buyer", "buyer@example.com", "Bola", "buyer").await?;

    let admin = auth("idp_admin");
    let seller = auth("idp_seller");
    let rival = auth("idp_rival");
    let buyer = auth("idp_buyer");

    approved_vendor(&state, &admin, &seller, "Sade Homewares").await?;
    approved_vendor(&state, &admin, &rival, "Ade Ceramics").await?;

    let mug = create_listing(&state, &seller, "Blue Mug", 1500, 10).await?;
    let vase = create_listing(&state, &rival, "Clay Vase", 2500, 4).await?;

    // Two vendors in one order is rejected before anything is written.
    let split = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            items: Some(vec![
                CheckoutItem {
                    listing_id: mug.id,
                    quantity: 1,
                },
                CheckoutItem {
                    listing_id: vase.id,
                    quantity: 1,
                },
            ]),
            payment_reference: Some("ref_split".to_string()),
        },
    )
    .await;
    assert!(matches!(split, Err(AppError::BadRequest(_))));

    // Amount mismatch rejects the order and leaves inventory alone.
    let mismatch = order_service::checkout(
        &state,
        &buyer,
        CheckoutRequest {
            items: Some(vec![CheckoutItem {
                listing_id: mug.id,
                quantity: 1,
            }]),
            payment_reference: Some("ref_mismatch".to_string()),
        },
    )
    .await;
    assert!(matches!(mismatch, Err(AppError::BadRequest(_))));

    let unchanged = vendor_service::get_product(&state, &seller, mug.id)
        .await?
        .data
        .expect("listing");
    assert_eq!(unchanged.inventory, 10);

    Ok(())
}

#[tokio::test]
async fn review_votes_and_vendor_responses() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = db_guard();
    let state = setup_state(&database_url, 0).await?;

    create_user(&state, "idp_admin", "admin@example.com", "Admin", "admin").await?;
    create_user(&state, "idp_seller", "seller@example.com", "Sade", "buyer").await?;
    create_user(&state, "idp_rival", "rival@example.com", "Ade", "buyer").await?;
    create_user(&state, "idp_buyer", "buyer@example.com", "Bola", "buyer").await?;
    create_user(&state, "idp_other", "other@example.com", "Chi", "buyer").await?;

    let admin = auth("idp_admin");
    let seller = auth("idp_seller");
    let rival = auth("idp_rival");
    let buyer = auth("idp_buyer");
    let other = auth("idp_other");

    approved_vendor(&state, &admin, &seller, "Sade Homewares").await?;
    approved_vendor(&state, &admin, &rival, "Ade Ceramics").await?;
    let listing = create_listing(&state, &seller, "Blue Mug", 1500, 10).await?;

    let review = review_service::create_review(
        &state,
        &buyer,
        listing.id,
        CreateReviewRequest {
            rating: Some(5),
            body: Some("Lovely glaze.".to_string()),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(review.helpful_count, 0);

    let dup = review_service::create_review(
        &state,
        &buyer,
        listing.id,
        CreateReviewRequest {
            rating: Some(4),
            body: Some("Again".to_string()),
        },
    )
    .await;
    assert!(matches!(dup, Err(AppError::InvalidState(_))));

    // Toggling alternates per user and the counter tracks the votes.
    let vote = review_service::toggle_helpful(&state, &buyer, review.id)
        .await?
        .data
        .expect("toggle");
    assert!(vote.is_helpful);
    assert_eq!(vote.helpful_count, 1);

    let second = review_service::toggle_helpful(&state, &other, review.id)
        .await?
        .data
        .expect("toggle");
    assert!(second.is_helpful);
    assert_eq!(second.helpful_count, 2);

    let undone = review_service::toggle_helpful(&state, &buyer, review.id)
        .await?
        .data
        .expect("toggle");
    assert!(!undone.is_helpful);
    assert_eq!(undone.helpful_count, 1);

    // Vendor response: owner only, non-empty, write-once.
    let blank = review_service::respond(
        &state,
        &seller,
        review.id,
        RespondReviewRequest {
            response: Some("   ".to_string()),
        },
    )
    .await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));

    let foreign = review_service::respond(
        &state,
        &rival,
        review.id,
        RespondReviewRequest {
            response: Some("Thanks!".to_string()),
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::Forbidden)));

    let responded = review_service::respond(
        &state,
        &seller,
        review.id,
        RespondReviewRequest {
            response: Some("Thank you!".to_string()),
        },
    )
    .await?
    .data
    .expect("review");
    assert_eq!(responded.vendor_response.as_deref(), Some("Thank you!"));
    assert!(responded.vendor_responded_at.is_some());

    let overwrite = review_service::respond(
        &state,
        &seller,
        review.id,
        RespondReviewRequest {
            response: Some("One more thing".to_string()),
        },
    )
    .await;
    assert!(matches!(overwrite, Err(AppError::InvalidState(_))));

    Ok(())
}

#[tokio::test]
async fn anonymous_activity_tracking_writes_nothing() -> anyhow::Result<()> {
    use axum::{Json, extract::State};
    use tradefair_api::dto::activity::TrackActivityRequest;
    use tradefair_api::middleware::auth::MaybeAuthUser;
    use tradefair_api::routes::activity::track;

    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = db_guard();
    let state = setup_state(&database_url, 0).await?;

    create_user(&state, "idp_buyer", "buyer@example.com", "Bola", "buyer").await?;

    // Anonymous: success, tracked=false, and no row, twice over.
    for _ in 0..2 {
        let response = track(
            State(state.clone()),
            MaybeAuthUser(None),
            Json(TrackActivityRequest {
                listing_id: None,
                activity_type: Some("view_product".to_string()),
                metadata: None,
            }),
        )
        .await
        .expect("anonymous tracking succeeds");
        let data = response.0.data.expect("tracked flag");
        assert!(response.0.success);
        assert!(!data.tracked);
    }
    assert_eq!(UserActivities::find().count(&state.orm).await?, 0);

    // Authenticated with a bad type is a validation error.
    let invalid = track(
        State(state.clone()),
        MaybeAuthUser(Some(auth("idp_buyer"))),
        Json(TrackActivityRequest {
            listing_id: None,
            activity_type: Some("checkout".to_string()),
            metadata: None,
        }),
    )
    .await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    // A principal with no stored user is NotFound.
    let unknown = track(
        State(state.clone()),
        MaybeAuthUser(Some(auth("idp_ghost"))),
        Json(TrackActivityRequest {
            listing_id: None,
            activity_type: Some("search".to_string()),
            metadata: None,
        }),
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound)));

    // Authenticated with a valid type writes one row.
    let tracked = track(
        State(state.clone()),
        MaybeAuthUser(Some(auth("idp_buyer"))),
        Json(TrackActivityRequest {
            listing_id: None,
            activity_type: Some("search".to_string()),
            metadata: Some(serde_json::json!({ "q": "mug" })),
        }),
    )
    .await
    .expect("tracking succeeds");
    assert!(tracked.0.data.expect("tracked flag").tracked);
    assert_eq!(UserActivities::find().count(&state.orm).await?, 1);

    Ok(())
}
