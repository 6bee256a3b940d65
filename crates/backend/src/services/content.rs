//! Editable site copy and contact details.

use chrono::{DateTime, Utc};
use serde::Serialize;
use skydeck_core::{ContactInfoId, ContentId};
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::models::{ContactInfo, SiteContent};
use crate::store::{DocumentStore, Fields, Records, Stored};

/// Keys a content body may not carry; they belong to the record itself.
const RESERVED_KEYS: &[&str] = &["section", "createdAt", "updatedAt"];

/// Body fields merged into an existing section.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentChange<'b> {
    #[serde(flatten)]
    body: &'b Fields,
    updated_at: DateTime<Utc>,
}

/// Site copy and contact info management.
pub struct ContentService<'a> {
    content: Records<'a, SiteContent>,
    contact: Records<'a, ContactInfo>,
}

impl<'a> ContentService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            content: Records::new(store),
            contact: Records::new(store),
        }
    }

    /// The copy for `section`, if any was saved.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn get_content(&self, section: &str) -> Result<Option<Stored<SiteContent>>> {
        Ok(self
            .content
            .list()
            .await?
            .into_iter()
            .find(|c| c.record.section == section))
    }

    /// Create the copy for `section`, or merge `body` into the saved copy.
    ///
    /// Fields missing from `body` keep their saved values.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank section or a body that sets
    /// `section`, `createdAt` or `updatedAt`, or a store error.
    #[instrument(skip(self, body))]
    pub async fn save_content(&self, section: &str, body: Fields) -> Result<ContentId> {
        if section.trim().is_empty() {
            return Err(ServiceError::validation("section is required"));
        }
        if let Some(key) = RESERVED_KEYS.iter().find(|k| body.contains_key(**k)) {
            return Err(ServiceError::validation(format!(
                "content body cannot set `{key}`"
            )));
        }

        let now = Utc::now();
        if let Some(existing) = self.get_content(section).await? {
            let change = ContentChange {
                body: &body,
                updated_at: now,
            };
            self.content.update(&existing.id, &change).await?;
            info!(content_id = %existing.id, "Site content updated");
            return Ok(existing.id);
        }

        let id = self
            .content
            .create(&SiteContent {
                section: section.to_owned(),
                created_at: Some(now),
                updated_at: Some(now),
                body,
            })
            .await?;
        info!(content_id = %id, "Site content created");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_content(&self) -> Result<Vec<Stored<SiteContent>>> {
        Ok(self.content.list().await?)
    }

    /// The shop's contact details, if set.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn get_contact_info(&self) -> Result<Option<Stored<ContactInfo>>> {
        Ok(self.contact.list().await?.into_iter().next())
    }

    /// Replace the contact details, creating the record on first use.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    #[instrument(skip_all)]
    pub async fn update_contact_info(&self, contact: ContactInfo) -> Result<ContactInfoId> {
        let record = ContactInfo {
            updated_at: Some(Utc::now()),
            ..contact
        };
        match self.get_contact_info().await? {
            Some(existing) => {
                self.contact.put(&existing.id, &record).await?;
                Ok(existing.id)
            }
            None => Ok(self.contact.create(&record).await?),
        }
    }
}
