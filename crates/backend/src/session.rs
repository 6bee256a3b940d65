//! Auth session context.
//!
//! An [`AuthSession`] owns the provider's auth-state subscription and keeps a
//! [`SessionState`] in step with it: every sign-in is role-resolved, customer
//! sign-ins also load the profile, and a sign-out clears everything.

use serde::Serialize;
use skydeck_core::Role;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::identity::{AuthEvent, AuthEvents, AuthUser, IdentityProvider};
use crate::models::CustomerProfile;
use crate::services::roles::RoleResolver;
use crate::store::{DocumentStore, Records};

/// What the UI knows about the current identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub role: Option<Role>,
    pub customer_profile: Option<CustomerProfile>,
    /// True until the first auth event has been applied.
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            role: None,
            customer_profile: None,
            is_loading: true,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_some() && self.role == Some(Role::Admin)
    }

    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.user.is_some() && self.role == Some(Role::Customer)
    }

    fn signed_out() -> Self {
        Self {
            is_loading: false,
            ..Self::default()
        }
    }
}

/// A live subscription to auth-state changes.
pub struct AuthSession<'a> {
    customers: Records<'a, CustomerProfile>,
    resolver: RoleResolver<'a>,
    events: Option<AuthEvents>,
    state: SessionState,
}

impl<'a> AuthSession<'a> {
    /// Subscribe to the provider's auth-state changes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Provider` while another session is subscribed.
    pub fn init(
        store: &'a dyn DocumentStore,
        identity: &'a dyn IdentityProvider,
        resolver: RoleResolver<'a>,
    ) -> Result<Self> {
        let events = identity.subscribe()?;
        Ok(Self {
            customers: Records::new(store),
            resolver,
            events: Some(events),
            state: SessionState::default(),
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Wait for one auth event and apply it.
    ///
    /// Returns `false` once the subscription has ended or was torn down.
    ///
    /// # Errors
    ///
    /// Returns the store error when the role or profile lookup fails. The
    /// user stays set with no role in that case.
    pub async fn next_event(&mut self) -> Result<bool> {
        let Some(events) = self.events.as_mut() else {
            return Ok(false);
        };
        let Some(event) = events.recv().await else {
            debug!("Auth event stream closed");
            self.events = None;
            return Ok(false);
        };
        self.apply(event).await?;
        Ok(true)
    }

    #[instrument(skip_all)]
    async fn apply(&mut self, event: AuthEvent) -> Result<()> {
        let user = match event {
            AuthEvent::SignedOut => {
                debug!("Signed out");
                self.state = SessionState::signed_out();
                return Ok(());
            }
            AuthEvent::SignedIn(user) => user,
        };

        self.state = SessionState {
            user: Some(user.clone()),
            role: None,
            customer_profile: None,
            is_loading: true,
        };

        let outcome = self.resolve(&user).await;
        self.state.is_loading = false;
        if let Err(e) = &outcome {
            warn!(uid = %user.uid, error = %e, "Failed to resolve session role");
        }
        outcome
    }

    async fn resolve(&mut self, user: &AuthUser) -> Result<()> {
        let resolution = self.resolver.resolve(&user.uid, Some(&user.email)).await?;
        if resolution.is_customer {
            self.state.customer_profile = self.customers.get(&user.uid).await?.map(|p| p.record);
        }
        self.state.role = Some(resolution.role);
        debug!(uid = %user.uid, role = %resolution.role, "Session role resolved");
        Ok(())
    }

    /// Stop listening. Later calls to [`next_event`](Self::next_event) return
    /// `false`, and another session may subscribe.
    pub fn teardown(&mut self) {
        if let Some(events) = self.events.take() {
            events.unsubscribe();
        }
    }
}

impl Drop for AuthSession<'_> {
    fn drop(&mut self) {
        self.teardown();
    }
}
