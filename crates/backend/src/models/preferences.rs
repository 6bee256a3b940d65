//! Per-customer notification and pickup preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::Uid;

use crate::store::Record;

/// Preferences stored under the customer's uid (`customer_preferences`).
///
/// Fields missing from the stored document take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomerPreferences {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub promotional_emails: bool,
    /// `HH:MM`, empty when unset.
    pub default_pickup_time: String,
    pub save_payment_method: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CustomerPreferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            sms_notifications: true,
            promotional_emails: false,
            default_pickup_time: String::new(),
            save_payment_method: false,
            updated_at: None,
        }
    }
}

impl Record for CustomerPreferences {
    const COLLECTION: &'static str = "customer_preferences";
    type Id = Uid;
}

/// Partial preference update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_emails: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pickup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_payment_method: Option<bool>,
}
