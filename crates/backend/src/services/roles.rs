//! Role resolution for a signed-in identity.
//!
//! Admins and customers live in disjoint profile collections keyed by uid.
//! A profile written during registration may not be visible yet when the
//! first auth-state event arrives, so a miss is retried a fixed number of
//! times before falling back.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use skydeck_core::{Email, Role, Uid};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::{AdminProfile, CustomerProfile};
use crate::store::{DocumentStore, Records};

/// Lowercased administrator emails.
///
/// Consulted when no profile exists for an identity, and when someone tries
/// to register as an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<String>,
}

impl AdminAllowList {
    /// Parse a comma-separated list. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first entry that is not a valid email.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let mut emails = BTreeSet::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let email = Email::parse(entry).map_err(|e| format!("{entry}: {e}"))?;
            emails.insert(email.as_str().to_lowercase());
        }
        Ok(Self { emails })
    }

    /// Build an allow-list from already-validated addresses.
    pub fn from_emails(emails: impl IntoIterator<Item = Email>) -> Self {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_str().to_lowercase())
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Case-insensitive membership test on a raw address.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    /// Whether `email` is an administrator address.
    #[must_use]
    pub fn allows(&self, email: &Email) -> bool {
        self.contains(email.as_str())
    }
}

/// Retry policy for profile lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleResolverConfig {
    /// Extra lookups after the first miss.
    pub retries: u32,
    /// Pause before each extra lookup.
    pub retry_delay: Duration,
}

impl Default for RoleResolverConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Where a resolved role came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleSource {
    AdminProfile,
    CustomerProfile,
    /// No profile; the email is on the allow-list.
    AllowList,
    /// No profile; assumed to be a customer.
    Fallback,
}

/// Outcome of [`RoleResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResolution {
    pub role: Role,
    /// True exactly when `role` is `customer`.
    pub is_customer: bool,
    pub source: RoleSource,
}

impl RoleResolution {
    #[must_use]
    pub fn new(role: Role, source: RoleSource) -> Self {
        Self {
            role,
            is_customer: role == Role::Customer,
            source,
        }
    }
}

/// Decides whether an identity is an admin or a customer.
pub struct RoleResolver<'a> {
    admins: Records<'a, AdminProfile>,
    customers: Records<'a, CustomerProfile>,
    allow_list: &'a AdminAllowList,
    config: RoleResolverConfig,
}

impl<'a> RoleResolver<'a> {
    /// Create a resolver over the profile collections.
    #[must_use]
    pub fn new(
        store: &'a dyn DocumentStore,
        allow_list: &'a AdminAllowList,
        config: RoleResolverConfig,
    ) -> Self {
        Self {
            admins: Records::new(store),
            customers: Records::new(store),
            allow_list,
            config,
        }
    }

    /// Resolve the role of `uid`.
    ///
    /// An admin profile wins over a customer profile. When neither exists
    /// after all retries, the identity is a customer unless `email` is on the
    /// allow-list.
    ///
    /// # Errors
    ///
    /// Any store error aborts resolution; no role is asserted in that case.
    #[instrument(skip(self, email), fields(uid = %uid))]
    pub async fn resolve(&self, uid: &Uid, email: Option<&Email>) -> Result<RoleResolution> {
        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                debug!(attempt, "No profile found, retrying role lookup");
                tokio::time::sleep(self.config.retry_delay).await;
            }
            if let Some(resolution) = self.lookup(uid).await? {
                return Ok(resolution);
            }
        }

        let resolution = if email.is_some_and(|e| self.allow_list.allows(e)) {
            RoleResolution::new(Role::Admin, RoleSource::AllowList)
        } else {
            RoleResolution::new(Role::Customer, RoleSource::Fallback)
        };
        info!(
            role = %resolution.role,
            source = ?resolution.source,
            "No profile for identity, using fallback role"
        );
        Ok(resolution)
    }

    async fn lookup(&self, uid: &Uid) -> Result<Option<RoleResolution>> {
        if let Some(admin) = self.admins.get(uid).await? {
            let role = admin.record.role.unwrap_or(Role::Admin);
            return Ok(Some(RoleResolution::new(role, RoleSource::AdminProfile)));
        }
        if let Some(customer) = self.customers.get(uid).await? {
            let role = customer.record.role.unwrap_or(Role::Customer);
            return Ok(Some(RoleResolution::new(role, RoleSource::CustomerProfile)));
        }
        Ok(None)
    }
}
