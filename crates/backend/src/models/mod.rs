//! Typed records stored in the document store.
//!
//! Field names follow the camelCase keys the site has always written, so
//! records written by older versions decode unchanged. Fields that older
//! documents may lack carry `#[serde(default)]`.

pub mod content;
pub mod forms;
pub mod image;
pub mod menu;
pub mod news;
pub mod pre_order;
pub mod preferences;
pub mod profile;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use content::{ContactInfo, SiteContent, SocialMedia};
pub use forms::{ContactSubmission, NewsletterSubscription, Order, OrderItem};
pub use image::UploadedImage;
pub use menu::{MenuItem, MenuItemPatch};
pub use news::{NewsPatch, NewsUpdate};
pub use pre_order::{PreOrder, PreOrderItem};
pub use preferences::{CustomerPreferences, PreferencesPatch};
pub use profile::{AdminProfile, CustomerProfile, CustomerProfilePatch};

/// A partial record plus a fresh `updatedAt`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Touched<'a, P> {
    #[serde(flatten)]
    pub patch: &'a P,
    pub updated_at: DateTime<Utc>,
}

impl<'a, P> Touched<'a, P> {
    /// Stamp `patch` with the current time.
    #[must_use]
    pub fn now(patch: &'a P) -> Self {
        Self {
            patch,
            updated_at: Utc::now(),
        }
    }
}

pub(crate) const fn default_true() -> bool {
    true
}
