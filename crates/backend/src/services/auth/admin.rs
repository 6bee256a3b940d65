//! Staff authentication.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use skydeck_core::{Role, Uid};
use tracing::{info, instrument, warn};

use super::{AuthError, parse_email, validate_password};
use crate::error::Result;
use crate::identity::{AuthUser, IdentityProvider};
use crate::models::AdminProfile;
use crate::services::roles::{AdminAllowList, RoleResolver, RoleResolverConfig};
use crate::store::{DocumentStore, Records};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginStamp {
    last_login_at: DateTime<Utc>,
    email_verified: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveFlag {
    is_active: bool,
    updated_at: DateTime<Utc>,
}

/// Admin registration and login.
pub struct AdminAuth<'a> {
    identity: &'a dyn IdentityProvider,
    admins: Records<'a, AdminProfile>,
    resolver: RoleResolver<'a>,
    allow_list: &'a AdminAllowList,
}

impl<'a> AdminAuth<'a> {
    #[must_use]
    pub fn new(
        store: &'a dyn DocumentStore,
        identity: &'a dyn IdentityProvider,
        allow_list: &'a AdminAllowList,
        resolver_config: RoleResolverConfig,
    ) -> Self {
        Self {
            identity,
            admins: Records::new(store),
            resolver: RoleResolver::new(store, allow_list, resolver_config),
            allow_list,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register an administrator account.
    ///
    /// Only allow-listed addresses may register; the check happens before the
    /// identity provider is contacted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotPermitted` for an address not on the allow-list,
    /// validation errors for bad input, and provider or store errors.
    #[instrument(skip(self, email, password))]
    pub async fn register(&self, email: &str, password: &SecretString) -> Result<AuthUser> {
        let email = parse_email(email)?;
        validate_password(password)?;
        if !self.allow_list.allows(&email) {
            return Err(AuthError::NotPermitted(
                "this email is not authorized for admin access".to_owned(),
            )
            .into());
        }

        let user = self.identity.register(&email, password).await?;
        let now = Utc::now();
        self.admins
            .put(
                &user.uid,
                &AdminProfile {
                    email,
                    role: Some(Role::Admin),
                    is_active: true,
                    email_verified: user.email_verified,
                    created_at: now,
                    updated_at: Some(now),
                    last_login_at: None,
                },
            )
            .await?;

        info!(uid = %user.uid, "Admin registered");
        Ok(user)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Sign in as an administrator.
    ///
    /// A customer identity is signed straight back out. An allow-listed
    /// identity without a profile gets one on its first login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials`, `AuthError::NotPermitted` for
    /// non-admins, `AuthError::Inactive` for deactivated admins, or a
    /// provider/store error.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthUser> {
        let email = parse_email(email)?;
        let user = self.identity.sign_in(&email, password).await?;

        let resolution = match self.resolver.resolve(&user.uid, Some(&user.email)).await {
            Ok(resolution) => resolution,
            Err(e) => {
                self.sign_out_quietly().await;
                return Err(e);
            }
        };
        if resolution.role != Role::Admin {
            self.sign_out_quietly().await;
            return Err(AuthError::NotPermitted(
                "this account does not have admin access".to_owned(),
            )
            .into());
        }

        let now = Utc::now();
        match self.admins.get(&user.uid).await? {
            Some(profile) if !profile.record.is_active => {
                self.sign_out_quietly().await;
                return Err(AuthError::Inactive.into());
            }
            Some(_) => {
                self.admins
                    .update(
                        &user.uid,
                        &LoginStamp {
                            last_login_at: now,
                            email_verified: user.email_verified,
                        },
                    )
                    .await?;
            }
            None => {
                self.admins
                    .put(
                        &user.uid,
                        &AdminProfile {
                            email: user.email.clone(),
                            role: Some(Role::Admin),
                            is_active: true,
                            email_verified: user.email_verified,
                            created_at: now,
                            updated_at: Some(now),
                            last_login_at: Some(now),
                        },
                    )
                    .await?;
                info!(uid = %user.uid, "Admin profile provisioned on first login");
            }
        }

        info!(uid = %user.uid, "Admin logged in");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns a provider error if sign-out fails.
    pub async fn logout(&self) -> Result<()> {
        self.identity.sign_out().await?;
        Ok(())
    }

    /// Activate or deactivate an administrator.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown uid.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn set_active(&self, uid: &Uid, active: bool) -> Result<()> {
        self.admins
            .update(
                uid,
                &ActiveFlag {
                    is_active: active,
                    updated_at: Utc::now(),
                },
            )
            .await?;
        info!(active, "Admin activation changed");
        Ok(())
    }

    async fn sign_out_quietly(&self) {
        if let Err(e) = self.identity.sign_out().await {
            warn!(error = %e, "Failed to sign out rejected admin login");
        }
    }
}
