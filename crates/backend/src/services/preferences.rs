//! Customer preferences.
//!
//! Nothing is stored until a customer changes something; until then the
//! defaults are returned.

use chrono::NaiveTime;
use skydeck_core::Uid;
use tracing::instrument;

use crate::error::{Result, ServiceError};
use crate::models::{CustomerPreferences, PreferencesPatch, Touched};
use crate::store::{DocumentStore, Records};

pub struct PreferencesService<'a> {
    preferences: Records<'a, CustomerPreferences>,
}

impl<'a> PreferencesService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            preferences: Records::new(store),
        }
    }

    /// Stored preferences, or the defaults.
    ///
    /// # Errors
    ///
    /// Returns a store error if the record can't be read.
    pub async fn get_preferences(&self, uid: &Uid) -> Result<CustomerPreferences> {
        Ok(self
            .preferences
            .get(uid)
            .await?
            .map(|p| p.record)
            .unwrap_or_default())
    }

    /// Merge the fields present in `patch`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed pickup time, or a store error.
    #[instrument(skip(self, patch), fields(uid = %uid))]
    pub async fn update_preferences(&self, uid: &Uid, patch: &PreferencesPatch) -> Result<()> {
        if let Some(time) = patch.default_pickup_time.as_deref()
            && !time.is_empty()
            && NaiveTime::parse_from_str(time, "%H:%M").is_err()
        {
            return Err(ServiceError::validation("pickup time must be HH:MM"));
        }
        self.preferences.merge(uid, &Touched::now(patch)).await?;
        Ok(())
    }

    /// Remove stored preferences.
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails.
    pub async fn delete_preferences(&self, uid: &Uid) -> Result<()> {
        self.preferences.delete(uid).await?;
        Ok(())
    }
}
