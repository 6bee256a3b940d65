//! Admin and customer profile records.
//!
//! Both collections are keyed by the identity provider's uid. A profile is
//! created at registration and never duplicates the provider's own record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{Email, Role, Uid};

use super::default_true;
use crate::store::Record;

/// Staff profile in the `admins` collection.
///
/// Admin profiles are never deleted; deactivate them instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub email: Email,
    /// Missing means `admin`.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Record for AdminProfile {
    const COLLECTION: &'static str = "admins";
    type Id = Uid;
}

/// Guest profile in the `customers` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub full_name: String,
    pub email: Email,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    /// Missing means `customer`.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Set when the account was soft-deleted.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for CustomerProfile {
    const COLLECTION: &'static str = "customers";
    type Id = Uid;
}

/// Fields a customer may change on their own profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// `Some(None)` clears the photo.
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<Option<String>>,
}

impl CustomerProfilePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.phone_number.is_none() && self.photo_url.is_none()
    }
}
