//! Integration tests for customer registration, sessions, and deletion.
//!
//! Run with: cargo test -p skydeck-integration-tests

#![allow(clippy::unwrap_used)]

use skydeck_backend::ServiceError;
use skydeck_backend::models::PreOrderItem;
use skydeck_backend::services::AuthError;
use skydeck_backend::services::auth::{CustomerRegistration, DeletionMode};
use skydeck_backend::services::pre_orders::PreOrderDraft;
use skydeck_core::{PreOrderId, PreOrderStatus, Price, Role, Uid};
use skydeck_integration_tests::{OWNER_EMAIL, TestContext, email};

const GUEST: &str = "guest@butuan.ph";

fn registration() -> CustomerRegistration {
    CustomerRegistration {
        full_name: "Maria Santos".to_owned(),
        phone_number: Some(" +63 912 345 6789 ".to_owned()),
    }
}

fn pre_order() -> PreOrderDraft {
    PreOrderDraft {
        items: vec![PreOrderItem {
            id: "espresso".to_owned(),
            name: "Espresso".to_owned(),
            price: Price::from_cents(12_000),
            quantity: 1,
            category: "Hot Coffee".to_owned(),
        }],
        total_amount: Price::from_cents(12_000),
        pickup_date: "2026-10-20".to_owned(),
        pickup_time: "07:30".to_owned(),
        special_instructions: None,
    }
}

async fn register_guest(ctx: &TestContext) -> Uid {
    ctx.state
        .customer_auth()
        .register(GUEST, &TestContext::password(), registration())
        .await
        .expect("registration")
        .uid
}

// ============================================================================
// Registration & Session
// ============================================================================

#[tokio::test]
async fn test_registration_drives_session_to_customer() {
    let ctx = TestContext::new();
    let mut session = ctx.state.session().expect("subscribe");

    // Initial state: nobody signed in.
    assert!(session.next_event().await.unwrap());
    assert!(session.state().user.is_none());
    assert!(!session.state().is_loading);

    let uid = register_guest(&ctx).await;
    assert_eq!(ctx.identity.verification_emails(), vec![email(GUEST)]);

    assert!(session.next_event().await.unwrap());
    let state = session.state();
    assert_eq!(state.user.as_ref().map(|u| &u.uid), Some(&uid));
    assert_eq!(state.role, Some(Role::Customer));
    assert!(state.is_customer());
    let profile = state.customer_profile.as_ref().expect("profile loaded");
    assert_eq!(profile.full_name, "Maria Santos");
    assert_eq!(profile.phone_number, "+63 912 345 6789");

    ctx.state.customer_auth().logout().await.unwrap();
    assert!(session.next_event().await.unwrap());
    assert!(session.state().user.is_none());
    assert!(session.state().role.is_none());
}

#[tokio::test]
async fn test_session_resolves_allow_listed_admin_without_profile() {
    let ctx = TestContext::new();
    let admin = ctx
        .state
        .admin_auth()
        .register(OWNER_EMAIL, &TestContext::password())
        .await
        .unwrap();
    ctx.state.admin_auth().logout().await.unwrap();

    // The admin profile exists, so the resolver finds it first.
    let resolution = ctx
        .state
        .role_resolver()
        .resolve(&admin.uid, Some(&admin.email))
        .await
        .unwrap();
    assert_eq!(resolution.role, Role::Admin);
    assert!(!resolution.is_customer);

    // An unknown identity with the allow-listed email falls back to admin.
    let resolution = ctx
        .state
        .role_resolver()
        .resolve(&Uid::new("no-profile"), Some(&email(OWNER_EMAIL)))
        .await
        .unwrap();
    assert_eq!(resolution.role, Role::Admin);
}

#[tokio::test]
async fn test_admin_cannot_use_customer_login() {
    let ctx = TestContext::new();
    ctx.state
        .admin_auth()
        .register(OWNER_EMAIL, &TestContext::password())
        .await
        .unwrap();
    ctx.state.admin_auth().logout().await.unwrap();

    let err = ctx
        .state
        .customer_auth()
        .login(OWNER_EMAIL, &TestContext::password())
        .await
        .expect_err("admins use the admin login");
    assert!(matches!(err, ServiceError::Auth(AuthError::NotPermitted(_))));
    assert!(ctx.state.identity().current_user().await.is_none());
}

#[tokio::test]
async fn test_customer_cannot_use_admin_login() {
    let ctx = TestContext::new();
    register_guest(&ctx).await;
    ctx.state.customer_auth().logout().await.unwrap();

    let err = ctx
        .state
        .admin_auth()
        .login(GUEST, &TestContext::password())
        .await
        .expect_err("customers use the customer login");
    assert!(matches!(err, ServiceError::Auth(AuthError::NotPermitted(_))));
}

// ============================================================================
// Account Deletion
// ============================================================================

#[tokio::test]
async fn test_soft_delete_cancels_open_pre_orders() {
    let ctx = TestContext::new();
    let uid = register_guest(&ctx).await;

    let pre_orders = ctx.state.pre_orders();
    let open = pre_orders.create_pre_order(&uid, pre_order()).await.unwrap();
    let done = pre_orders.create_pre_order(&uid, pre_order()).await.unwrap();
    pre_orders
        .update_pre_order_status(&done.id, PreOrderStatus::Completed)
        .await
        .unwrap();

    let report = ctx
        .state
        .customer_auth()
        .delete_account(DeletionMode::Soft)
        .await
        .unwrap();
    assert!(report.is_complete(), "{report:?}");

    let orders = pre_orders.list_customer_pre_orders(&uid).await.unwrap();
    let status_of = |id: &PreOrderId| {
        orders
            .iter()
            .find(|o| &o.id == id)
            .map(|o| o.record.status)
    };
    assert_eq!(status_of(&open.id), Some(PreOrderStatus::Cancelled));
    assert_eq!(status_of(&done.id), Some(PreOrderStatus::Completed));

    assert!(!ctx.identity.has_account(&email(GUEST)));
    assert_eq!(ctx.store.count("customers"), 1);

    // The kept profile is marked inactive and deleted.
    let profile = ctx.state.customer_auth().profile(&uid).await.unwrap();
    assert!(!profile.is_active);
    assert!(profile.deleted_at.is_some());
}

#[tokio::test]
async fn test_hard_delete_reports_failed_steps_and_continues() {
    let ctx = TestContext::new();
    register_guest(&ctx).await;
    ctx.store.fail_collection("preorders");

    let report = ctx
        .state
        .customer_auth()
        .delete_account(DeletionMode::Hard)
        .await
        .unwrap();

    assert!(!report.is_complete());
    let failed: Vec<_> = report.steps.iter().filter(|s| !s.ok).map(|s| s.step).collect();
    assert_eq!(failed, vec!["pre_orders"]);

    assert_eq!(ctx.store.count("customers"), 0);
    assert!(!ctx.identity.has_account(&email(GUEST)));
}

#[tokio::test]
async fn test_delete_account_requires_sign_in() {
    let ctx = TestContext::new();
    let err = ctx
        .state
        .customer_auth()
        .delete_account(DeletionMode::Soft)
        .await
        .expect_err("nobody signed in");
    assert!(matches!(err, ServiceError::Auth(AuthError::NotSignedIn)));
}
