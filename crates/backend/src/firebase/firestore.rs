//! Cloud Firestore documents API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use url::Url;

use super::value::{decode_fields, encode_fields};
use super::{FirebaseClient, FirebaseError, check_status};
use crate::store::{Document, DocumentStore, Fields, SetMode, StoreError};

/// Documents fetched per list page.
const PAGE_SIZE: &str = "300";

/// A document as the REST API returns it.
#[derive(Debug, Deserialize)]
struct RawDocument {
    /// `projects/{p}/databases/(default)/documents/{collection}/{id}`
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl RawDocument {
    fn into_document(self) -> Result<Document, FirebaseError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| FirebaseError::InvalidValue(format!("document name {}", self.name)))?
            .to_owned();
        Ok(Document {
            id,
            fields: decode_fields(&self.fields)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// [`DocumentStore`] backed by Cloud Firestore.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirebaseClient,
}

impl FirestoreStore {
    #[must_use]
    pub const fn new(client: FirebaseClient) -> Self {
        Self { client }
    }

    fn documents_url(&self, segments: &[&str]) -> Result<Url, FirebaseError> {
        let mut url = Url::parse("https://firestore.googleapis.com/v1/")?;
        url.path_segments_mut()
            .map_err(|()| FirebaseError::InvalidValue("base URL".to_owned()))?
            .pop_if_empty()
            .extend([
                "projects",
                self.client.config().project_id.as_str(),
                "databases",
                "(default)",
                "documents",
            ])
            .extend(segments);
        url.query_pairs_mut().append_pair("key", self.client.api_key());
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FirebaseError> {
        let response = self.client.authorize(request).await?.send().await?;
        check_status(response).await
    }

    /// PATCH a document, optionally restricted to the given fields.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: &Fields,
        mask: bool,
        must_exist: bool,
    ) -> Result<(), FirebaseError> {
        let mut url = self.documents_url(&[collection, id])?;
        {
            let mut query = url.query_pairs_mut();
            if mask {
                for key in fields.keys() {
                    query.append_pair("updateMask.fieldPaths", &field_path(key));
                }
            }
            if must_exist {
                query.append_pair("currentDocument.exists", "true");
            }
        }

        let body = json!({ "fields": encode_fields(fields) });
        self.send(self.client.http().patch(url).json(&body)).await?;
        Ok(())
    }
}

/// Quote a field name that isn't a simple identifier.
fn field_path(key: &str) -> String {
    let simple = key.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_owned()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self, fields))]
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let url = self.documents_url(&[collection])?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self.send(self.client.http().post(url).json(&body)).await?;
        let created: RawDocument = response.json().await.map_err(FirebaseError::from)?;
        let document = created.into_document()?;
        debug!(id = %document.id, "Document created");
        Ok(document.id)
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.documents_url(&[collection, id])?;
        match self.send(self.client.http().get(url)).await {
            Ok(response) => {
                let raw: RawDocument = response.json().await.map_err(FirebaseError::from)?;
                Ok(Some(raw.into_document()?))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, fields))]
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError> {
        self.patch(collection, id, &fields, mode == SetMode::Merge, false)
            .await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        match self.patch(collection, id, &fields, true, true).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(StoreError::not_found(collection, id)),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.documents_url(&[collection, id])?;
        match self.send(self.client.http().delete(url)).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.documents_url(&[collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", PAGE_SIZE);
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.client.http().get(url)).await?;
            let page: ListResponse = response.json().await.map_err(FirebaseError::from)?;
            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = documents.len(), "Collection listed");
        Ok(documents)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_from_name() {
        let raw = RawDocument {
            name: "projects/sky-deck/databases/(default)/documents/news_updates/abc123".to_owned(),
            fields: Map::new(),
        };
        assert_eq!(raw.into_document().unwrap().id, "abc123");
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("photoURL"), "photoURL");
        assert_eq!(field_path("updated_at"), "updated_at");
        assert_eq!(field_path("contact-email"), "`contact-email`");
        assert_eq!(field_path("2fa"), "`2fa`");
    }

    #[test]
    fn test_list_response_without_documents() {
        let page: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
