//! Live checks of the Firebase adapters.
//!
//! These tests require:
//! - `FIREBASE_API_KEY` and `FIREBASE_PROJECT_ID` for a disposable project
//! - Email/password sign-in enabled
//! - Firestore rules that let a signed-in user write `customers/{uid}`
//!
//! Run with: cargo test -p skydeck-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use skydeck_backend::AppState;
use skydeck_backend::config::SkydeckConfig;
use skydeck_backend::services::auth::{CustomerRegistration, DeletionMode};
use skydeck_core::Role;
use skydeck_integration_tests::TestContext;

fn live_state() -> AppState {
    let config = SkydeckConfig::from_env().expect("Firebase configuration");
    AppState::from_config(&config).expect("Firebase client")
}

/// A unique address so reruns never collide.
fn throwaway_email() -> String {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("skydeck-it-{stamp}@example.com")
}

#[tokio::test]
#[ignore = "Requires a Firebase project"]
async fn test_customer_round_trip_against_firebase() {
    let state = live_state();
    let email = throwaway_email();

    let user = state
        .customer_auth()
        .register(
            &email,
            &TestContext::password(),
            CustomerRegistration {
                full_name: "Integration Test".to_owned(),
                phone_number: None,
            },
        )
        .await
        .expect("register against Firebase");

    let resolution = state
        .role_resolver()
        .resolve(&user.uid, Some(&user.email))
        .await
        .unwrap();
    assert_eq!(resolution.role, Role::Customer);

    let profile = state.customer_auth().profile(&user.uid).await.unwrap();
    assert_eq!(profile.full_name, "Integration Test");

    let report = state
        .customer_auth()
        .delete_account(DeletionMode::Hard)
        .await
        .unwrap();
    assert!(report.is_complete(), "{report:?}");
}

#[tokio::test]
#[ignore = "Requires a Firebase project"]
async fn test_menu_listing_against_firebase() {
    let state = live_state();
    let menu = state.menu().list_menu().await.expect("list menu_items");

    for pair in menu.windows(2) {
        assert!(pair[0].record.category <= pair[1].record.category);
    }
}
