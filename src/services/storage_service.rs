use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// External object store holding receipts and user documents.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn delete_file(&self, storage_id: &str) -> Result<(), AppError>;

    async fn generate_upload_url(&self) -> Result<String, AppError>;
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadUrlResponse {
    pub success: bool,
    pub upload_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadUrlPayload {
    upload_url: String,
}

/// Object store reached over HTTP with a bearer key.
pub struct HttpFileStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFileStorage {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl FileStorage for HttpFileStorage {
    async fn delete_file(&self, storage_id: &str) -> Result<(), AppError> {
        let url = format!("{}/files/{}", self.base_url, urlencoding::encode(storage_id));
        log::debug!("🗑️ Deleting stored file: {}", storage_id);

        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to reach storage: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Storage delete failed for {}: {}",
                storage_id,
                response.status()
            )));
        }

        Ok(())
    }

    async fn generate_upload_url(&self) -> Result<String, AppError> {
        let url = format!("{}/upload-urls", self.base_url);

        let response = self
            .authorized(self.client.post(&url))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to reach storage: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Storage upload URL request failed: {}",
                response.status()
            )));
        }

        let payload: UploadUrlPayload = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid storage response: {}", e)))?;

        Ok(payload.upload_url)
    }
}

/// Reduces a storage reference to its bare id.
///
/// Accepts a bare id, a path (`/files/abc`) or a full URL carrying the id
/// as its last path segment, optionally followed by a `?token=` query.
/// `None` when no non-empty segment is left, e.g. `?token=abc` or a URL
/// pointing at the host root.
pub fn clean_storage_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if let Ok(url) = reqwest::Url::parse(trimmed) {
        let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
        let id = urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        return Some(id).filter(|id| !id.trim().is_empty());
    }

    trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records deletions; optionally fails every call.
    #[derive(Default)]
    pub(crate) struct RecordingStorage {
        pub deleted: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl RecordingStorage {
        pub(crate) fn failing() -> Self {
            Self {
                deleted: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub(crate) fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FileStorage for RecordingStorage {
        async fn delete_file(&self, storage_id: &str) -> Result<(), AppError> {
            self.deleted.lock().unwrap().push(storage_id.to_string());
            if self.fail {
                return Err(AppError::ExternalService("storage unavailable".into()));
            }
            Ok(())
        }

        async fn generate_upload_url(&self) -> Result<String, AppError> {
            Ok("https://files.test/upload?token=abc".to_string())
        }
    }

    #[test]
    fn bare_id_is_unchanged() {
        assert_eq!(clean_storage_id("kg2abc123").as_deref(), Some("kg2abc123"));
        assert_eq!(clean_storage_id("  kg2abc123 ").as_deref(), Some("kg2abc123"));
    }

    #[test]
    fn strips_url_query_and_prefix() {
        assert_eq!(
            clean_storage_id("https://files.example.com/api/storage/kg2abc123?token=xyz").as_deref(),
            Some("kg2abc123")
        );
        assert_eq!(
            clean_storage_id("https://files.example.com/api/storage/kg2abc123/").as_deref(),
            Some("kg2abc123")
        );
    }

    #[test]
    fn strips_relative_path_and_token() {
        assert_eq!(
            clean_storage_id("/api/storage/kg2abc123?token=xyz").as_deref(),
            Some("kg2abc123")
        );
        assert_eq!(clean_storage_id("receipts/kg2abc123").as_deref(), Some("kg2abc123"));
    }

    #[test]
    fn references_without_an_id_segment_yield_nothing() {
        assert_eq!(clean_storage_id("?token=abc"), None);
        assert_eq!(clean_storage_id("https://files.test/?token=abc"), None);
        assert_eq!(clean_storage_id("https://files.test"), None);
        assert_eq!(clean_storage_id("/"), None);
    }
}
