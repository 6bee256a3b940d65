//! Customer accounts.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use skydeck_core::{PreOrderStatus, Role, Uid};
use tracing::{info, instrument, warn};

use super::{AuthError, parse_email, validate_full_name, validate_password};
use crate::error::{Result, ServiceError};
use crate::identity::{AuthUser, IdentityProvider};
use crate::models::{CustomerProfile, CustomerProfilePatch, Touched};
use crate::services::pre_orders::PreOrderService;
use crate::services::preferences::PreferencesService;
use crate::services::roles::RoleResolver;
use crate::store::{DocumentStore, Records};

/// Profile details collected at sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRegistration {
    pub full_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// How [`CustomerAuth::delete_account`] treats the profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    /// Keep the profile, marked inactive and deleted.
    #[default]
    Soft,
    /// Remove the profile.
    Hard,
}

/// Outcome of one account deletion step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionStep {
    pub step: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-step outcome of an account deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub steps: Vec<DeletionStep>,
}

impl DeletionReport {
    /// Whether every step succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.ok)
    }

    fn record(&mut self, step: &'static str, outcome: Result<()>) {
        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                warn!(step, error = %e, "Account deletion step failed");
                Some(e.to_string())
            }
        };
        self.steps.push(DeletionStep {
            step,
            ok: error.is_none(),
            error,
        });
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedFlag {
    email_verified: bool,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SoftDelete {
    is_active: bool,
    deleted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Customer registration, login and self-service.
pub struct CustomerAuth<'a> {
    store: &'a dyn DocumentStore,
    identity: &'a dyn IdentityProvider,
    customers: Records<'a, CustomerProfile>,
    resolver: RoleResolver<'a>,
}

impl<'a> CustomerAuth<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn DocumentStore,
        identity: &'a dyn IdentityProvider,
        resolver: RoleResolver<'a>,
    ) -> Self {
        Self {
            store,
            identity,
            customers: Records::new(store),
            resolver,
        }
    }

    // =========================================================================
    // Registration & Sessions
    // =========================================================================

    /// Create a customer account and profile, then send a verification email.
    ///
    /// A verification email that fails to send is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad input, `AuthError::EmailInUse` for a
    /// taken address, or a provider/store error.
    #[instrument(skip(self, email, password, details))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        details: CustomerRegistration,
    ) -> Result<AuthUser> {
        let email = parse_email(email)?;
        validate_password(password)?;
        let full_name = validate_full_name(&details.full_name)?;

        let user = self.identity.register(&email, password).await?;
        self.customers
            .put(
                &user.uid,
                &CustomerProfile {
                    full_name,
                    email,
                    phone_number: details
                        .phone_number
                        .map(|p| p.trim().to_owned())
                        .unwrap_or_default(),
                    photo_url: None,
                    role: Some(Role::Customer),
                    is_active: true,
                    email_verified: user.email_verified,
                    created_at: Utc::now(),
                    updated_at: None,
                    deleted_at: None,
                },
            )
            .await?;

        if let Err(e) = self.identity.send_email_verification().await {
            warn!(uid = %user.uid, error = %e, "Failed to send verification email");
        }

        info!(uid = %user.uid, "Customer registered");
        Ok(user)
    }

    /// Sign in as a customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials`, `AuthError::NotPermitted` for
    /// admin identities, `AuthError::Inactive` for deactivated or deleted
    /// accounts, or a provider/store error.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthUser> {
        let email = parse_email(email)?;
        let user = self.identity.sign_in(&email, password).await?;

        if let Err(e) = self.check_customer(&user).await {
            if let Err(sign_out) = self.identity.sign_out().await {
                warn!(error = %sign_out, "Failed to sign out rejected customer login");
            }
            return Err(e);
        }

        info!(uid = %user.uid, "Customer logged in");
        Ok(user)
    }

    async fn check_customer(&self, user: &AuthUser) -> Result<()> {
        let resolution = self.resolver.resolve(&user.uid, Some(&user.email)).await?;
        if resolution.role == Role::Admin {
            return Err(AuthError::NotPermitted(
                "admin accounts must use the admin login".to_owned(),
            )
            .into());
        }
        if let Some(profile) = self.customers.get(&user.uid).await?
            && (!profile.record.is_active || profile.record.deleted_at.is_some())
        {
            return Err(AuthError::Inactive.into());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a provider error if sign-out fails.
    pub async fn logout(&self) -> Result<()> {
        self.identity.sign_out().await?;
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// # Errors
    ///
    /// Returns `NotFound` when the customer has no profile.
    pub async fn profile(&self, uid: &Uid) -> Result<CustomerProfile> {
        Ok(self.customers.require(uid).await?.record)
    }

    /// Change the customer's own profile fields.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` for a blank name, `NotFound` when the
    /// profile is absent.
    #[instrument(skip(self, patch), fields(uid = %uid))]
    pub async fn update_profile(&self, uid: &Uid, patch: &CustomerProfilePatch) -> Result<()> {
        let mut patch = patch.clone();
        if let Some(name) = patch.full_name.as_deref() {
            patch.full_name = Some(validate_full_name(name)?);
        }
        if patch.is_empty() {
            return Err(ServiceError::validation("nothing to update"));
        }
        self.customers.update(uid, &Touched::now(&patch)).await?;
        Ok(())
    }

    // =========================================================================
    // Email Verification
    // =========================================================================

    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a current user.
    pub async fn send_verification(&self) -> Result<()> {
        self.identity.send_email_verification().await?;
        Ok(())
    }

    /// Reload the current user and report whether their email is verified.
    ///
    /// A newly verified address is copied onto the profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a current user, or a store error.
    pub async fn check_verification(&self) -> Result<bool> {
        let user = self.identity.reload_user().await?;
        if user.email_verified {
            self.customers
                .update(
                    &user.uid,
                    &VerifiedFlag {
                        email_verified: true,
                        updated_at: Utc::now(),
                    },
                )
                .await?;
        }
        Ok(user.email_verified)
    }

    // =========================================================================
    // Account Deletion
    // =========================================================================

    /// Delete the signed-in customer's account.
    ///
    /// Every step runs even when an earlier one fails; failures are logged
    /// and reported per step.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a current user. Step failures
    /// are reported in the [`DeletionReport`] instead.
    #[instrument(skip(self))]
    pub async fn delete_account(&self, mode: DeletionMode) -> Result<DeletionReport> {
        let user = self
            .identity
            .current_user()
            .await
            .ok_or(AuthError::NotSignedIn)?;
        let uid = &user.uid;
        let mut report = DeletionReport::default();

        let preferences = PreferencesService::new(self.store)
            .delete_preferences(uid)
            .await;
        report.record("preferences", preferences);

        report.record("pre_orders", self.cancel_open_pre_orders(uid).await);

        let profile = match mode {
            DeletionMode::Soft => {
                let now = Utc::now();
                self.customers
                    .update(
                        uid,
                        &SoftDelete {
                            is_active: false,
                            deleted_at: now,
                            updated_at: now,
                        },
                    )
                    .await
            }
            DeletionMode::Hard => self.customers.delete(uid).await,
        };
        report.record("profile", profile.map_err(ServiceError::from));

        let identity = self.identity.delete_current_user().await;
        report.record("identity", identity.map_err(ServiceError::from));

        info!(
            uid = %uid,
            ?mode,
            complete = report.is_complete(),
            "Customer account deleted"
        );
        Ok(report)
    }

    async fn cancel_open_pre_orders(&self, uid: &Uid) -> Result<()> {
        let service = PreOrderService::new(self.store);
        for order in service.list_customer_pre_orders(uid).await? {
            if !order.record.status.is_final() {
                service
                    .update_pre_order_status(&order.id, PreOrderStatus::Cancelled)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use skydeck_core::{Email, ErrorKind, Price};

    use super::*;
    use crate::identity::InMemoryIdentity;
    use crate::models::{AdminProfile, CustomerPreferences, PreOrder, PreOrderItem, PreferencesPatch};
    use crate::services::pre_orders::PreOrderDraft;
    use crate::services::roles::{AdminAllowList, RoleResolverConfig};
    use crate::store::InMemoryStore;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn no_delay() -> RoleResolverConfig {
        RoleResolverConfig {
            retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    fn ana() -> CustomerRegistration {
        CustomerRegistration {
            full_name: " Ana Reyes ".to_owned(),
            phone_number: Some("0917 555 0101".to_owned()),
        }
    }

    fn draft() -> PreOrderDraft {
        PreOrderDraft {
            items: vec![PreOrderItem {
                id: "latte".to_owned(),
                name: "Cafe Latte".to_owned(),
                price: Price::from_cents(575),
                quantity: 1,
                category: "coffee".to_owned(),
            }],
            total_amount: Price::from_cents(575),
            pickup_date: "2026-11-02".to_owned(),
            pickup_time: "08:30".to_owned(),
            special_instructions: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_sends_verification() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));

        let user = auth
            .register("ana@example.ph", &secret("latte-art"), ana())
            .await
            .unwrap();
        let profile = auth.profile(&user.uid).await.unwrap();
        assert_eq!(profile.full_name, "Ana Reyes");
        assert_eq!(profile.role, Some(Role::Customer));
        assert_eq!(idp.verification_emails(), vec![user.email]);
    }

    #[tokio::test]
    async fn test_register_validates_before_provider() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));

        let err = auth
            .register(
                "ana@example.ph",
                &secret("latte-art"),
                CustomerRegistration::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = auth
            .register("ana@example.ph", &secret("short"), ana())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!idp.has_account(&Email::parse("ana@example.ph").unwrap()));
    }

    #[tokio::test]
    async fn test_admin_cannot_log_in_as_customer() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let email = Email::parse("owner@lagusancoffee.com").unwrap();
        let user = idp.register(&email, &secret("espresso")).await.unwrap();
        Records::<AdminProfile>::new(&store)
            .put(
                &user.uid,
                &AdminProfile {
                    email,
                    role: Some(Role::Admin),
                    is_active: true,
                    email_verified: true,
                    created_at: Utc::now(),
                    updated_at: None,
                    last_login_at: None,
                },
            )
            .await
            .unwrap();
        idp.sign_out().await.unwrap();

        let allow = AdminAllowList::default();
        let err = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()))
            .login("owner@lagusancoffee.com", &secret("espresso"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(idp.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_check_verification_mirrors_flag() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));
        let user = auth
            .register("ana@example.ph", &secret("latte-art"), ana())
            .await
            .unwrap();

        assert!(!auth.check_verification().await.unwrap());
        idp.confirm_email(&user.email);
        assert!(auth.check_verification().await.unwrap());
        assert!(auth.profile(&user.uid).await.unwrap().email_verified);
    }

    #[tokio::test]
    async fn test_update_profile_rejects_blank_name() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));
        let user = auth
            .register("ana@example.ph", &secret("latte-art"), ana())
            .await
            .unwrap();

        let blank = CustomerProfilePatch {
            full_name: Some("  ".to_owned()),
            ..CustomerProfilePatch::default()
        };
        assert_eq!(
            auth.update_profile(&user.uid, &blank).await.unwrap_err().kind(),
            ErrorKind::Validation
        );

        let phone = CustomerProfilePatch {
            phone_number: Some("0917 555 0199".to_owned()),
            ..CustomerProfilePatch::default()
        };
        auth.update_profile(&user.uid, &phone).await.unwrap();
        let profile = auth.profile(&user.uid).await.unwrap();
        assert_eq!(profile.phone_number, "0917 555 0199");
        assert!(profile.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_inactive_profile() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));
        let user = auth
            .register("ana@example.ph", &secret("latte-art"), ana())
            .await
            .unwrap();
        PreferencesService::new(&store)
            .update_preferences(
                &user.uid,
                &PreferencesPatch {
                    promotional_emails: Some(true),
                    ..PreferencesPatch::default()
                },
            )
            .await
            .unwrap();
        let placed = PreOrderService::new(&store)
            .create_pre_order(&user.uid, draft())
            .await
            .unwrap();

        let report = auth.delete_account(DeletionMode::Soft).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.steps.len(), 4);

        let profile = auth.profile(&user.uid).await.unwrap();
        assert!(!profile.is_active);
        assert!(profile.deleted_at.is_some());
        assert_eq!(
            PreferencesService::new(&store)
                .get_preferences(&user.uid)
                .await
                .unwrap(),
            CustomerPreferences::default()
        );
        let order = Records::<PreOrder>::new(&store)
            .require(&placed.id)
            .await
            .unwrap();
        assert_eq!(order.record.status, PreOrderStatus::Cancelled);
        assert!(!idp.has_account(&user.email));
    }

    #[tokio::test]
    async fn test_failed_step_does_not_stop_later_steps() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let auth = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()));
        let user = auth
            .register("ana@example.ph", &secret("latte-art"), ana())
            .await
            .unwrap();
        store.fail_collection("preorders");

        let report = auth.delete_account(DeletionMode::Hard).await.unwrap();
        assert!(!report.is_complete());
        let failed: Vec<_> = report.steps.iter().filter(|s| !s.ok).map(|s| s.step).collect();
        assert_eq!(failed, vec!["pre_orders"]);
        assert!(
            Records::<CustomerProfile>::new(&store)
                .get(&user.uid)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!idp.has_account(&user.email));
    }

    #[tokio::test]
    async fn test_delete_requires_sign_in() {
        let store = InMemoryStore::new();
        let idp = InMemoryIdentity::new();
        let allow = AdminAllowList::default();
        let err = CustomerAuth::new(&store, &idp, RoleResolver::new(&store, &allow, no_delay()))
            .delete_account(DeletionMode::Soft)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
