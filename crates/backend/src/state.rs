//! Application state shared across handlers.

use std::sync::Arc;

use crate::blob::{BlobStore, InMemoryBlobStore};
use crate::config::SkydeckConfig;
use crate::firebase::{
    FirebaseBlobStore, FirebaseClient, FirebaseError, FirebaseIdentity, FirestoreStore,
};
use crate::identity::{IdentityProvider, InMemoryIdentity};
use crate::services::{
    AdminAllowList, AdminAuth, ContentService, CustomerAuth, FormsService, ImageService,
    MenuService, NewsService, PreOrderService, PreferencesService, PublicationGate, RoleResolver,
    RoleResolverConfig,
};
use crate::session::AuthSession;
use crate::store::{DocumentStore, InMemoryStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and owns the three ports.
/// Services borrow from it for the length of one operation.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    blobs: Arc<dyn BlobStore>,
    admin_emails: AdminAllowList,
    role_resolver: RoleResolverConfig,
}

impl AppState {
    /// Create state over arbitrary port implementations.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        admin_emails: AdminAllowList,
        role_resolver: RoleResolverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                identity,
                blobs,
                admin_emails,
                role_resolver,
            }),
        }
    }

    /// Create state backed by the configured Firebase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &SkydeckConfig) -> Result<Self, FirebaseError> {
        let client = FirebaseClient::new(config.firebase.clone())?;

        Ok(Self::new(
            Arc::new(FirestoreStore::new(client.clone())),
            Arc::new(FirebaseIdentity::new(client.clone())),
            Arc::new(FirebaseBlobStore::new(client)),
            config.admin_emails.clone(),
            config.role_resolver,
        ))
    }

    /// Create state over fresh in-memory adapters.
    #[must_use]
    pub fn in_memory(admin_emails: AdminAllowList, role_resolver: RoleResolverConfig) -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryIdentity::new()),
            Arc::new(InMemoryBlobStore::new()),
            admin_emails,
            role_resolver,
        )
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get a reference to the blob store.
    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.inner.blobs.as_ref()
    }

    /// Get a reference to the administrator allow-list.
    #[must_use]
    pub fn admin_emails(&self) -> &AdminAllowList {
        &self.inner.admin_emails
    }

    // =========================================================================
    // Services
    // =========================================================================

    #[must_use]
    pub fn role_resolver(&self) -> RoleResolver<'_> {
        RoleResolver::new(self.store(), self.admin_emails(), self.inner.role_resolver)
    }

    #[must_use]
    pub fn publication_gate(&self) -> PublicationGate<'_> {
        PublicationGate::new(self.store())
    }

    #[must_use]
    pub fn news(&self) -> NewsService<'_> {
        NewsService::new(self.store())
    }

    #[must_use]
    pub fn menu(&self) -> MenuService<'_> {
        MenuService::new(self.store())
    }

    #[must_use]
    pub fn forms(&self) -> FormsService<'_> {
        FormsService::new(self.store())
    }

    #[must_use]
    pub fn content(&self) -> ContentService<'_> {
        ContentService::new(self.store())
    }

    #[must_use]
    pub fn pre_orders(&self) -> PreOrderService<'_> {
        PreOrderService::new(self.store())
    }

    #[must_use]
    pub fn preferences(&self) -> PreferencesService<'_> {
        PreferencesService::new(self.store())
    }

    #[must_use]
    pub fn images(&self) -> ImageService<'_> {
        ImageService::new(self.store(), self.blobs())
    }

    #[must_use]
    pub fn admin_auth(&self) -> AdminAuth<'_> {
        AdminAuth::new(
            self.store(),
            self.identity(),
            self.admin_emails(),
            self.inner.role_resolver,
        )
    }

    #[must_use]
    pub fn customer_auth(&self) -> CustomerAuth<'_> {
        CustomerAuth::new(self.store(), self.identity(), self.role_resolver())
    }

    /// Subscribe a session context to auth-state changes.
    ///
    /// # Errors
    ///
    /// Fails while another session is subscribed.
    pub fn session(&self) -> crate::Result<AuthSession<'_>> {
        AuthSession::init(self.store(), self.identity(), self.role_resolver())
    }
}
