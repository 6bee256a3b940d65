//! Integration tests for Sky Deck.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios
//! cargo test -p skydeck-integration-tests
//!
//! # Include the live Firebase checks
//! FIREBASE_API_KEY=... FIREBASE_PROJECT_ID=... \
//!     cargo test -p skydeck-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `news_publication` - Publication cap and archiving
//! - `customer_accounts` - Registration, sessions, and account deletion
//! - `pre_orders` - Pre-order lifecycle
//! - `envelope` - Caller-facing result envelope
//! - `firebase_live` - Adapters against a real project

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use skydeck_backend::AppState;
use skydeck_backend::blob::InMemoryBlobStore;
use skydeck_backend::identity::InMemoryIdentity;
use skydeck_backend::services::{AdminAllowList, RoleResolverConfig};
use skydeck_backend::store::InMemoryStore;
use skydeck_core::Email;

/// Allow-listed administrator address used across tests.
pub const OWNER_EMAIL: &str = "owner@lagusancoffee.com";

/// Password accepted by every adapter.
pub const PASSWORD: &str = "sky-deck-2026";

/// Application state over in-memory adapters, with handles to the adapters
/// for inspection and fault injection.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub identity: Arc<InMemoryIdentity>,
    pub blobs: Arc<InMemoryBlobStore>,
}

impl TestContext {
    /// Fresh adapters, [`OWNER_EMAIL`] allow-listed, no lookup retries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(RoleResolverConfig {
            retries: 0,
            retry_delay: Duration::ZERO,
        })
    }

    /// Fresh adapters with a custom role lookup policy.
    #[must_use]
    pub fn with_resolver(role_resolver: RoleResolverConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let identity = Arc::new(InMemoryIdentity::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let admin_emails = AdminAllowList::parse(OWNER_EMAIL).unwrap_or_default();

        let state = AppState::new(
            store.clone(),
            identity.clone(),
            blobs.clone(),
            admin_emails,
            role_resolver,
        );

        Self {
            state,
            store,
            identity,
            blobs,
        }
    }

    /// The shared test password.
    #[must_use]
    pub fn password() -> SecretString {
        SecretString::from(PASSWORD)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an address known to be valid.
///
/// # Panics
///
/// Panics if `raw` is not a valid email.
#[must_use]
#[allow(clippy::expect_used)]
pub fn email(raw: &str) -> Email {
    Email::parse(raw).expect("test email should be valid")
}
