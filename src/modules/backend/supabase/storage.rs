use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::json;

use super::{encode_key, rejection, SupabaseClient};
use crate::modules::backend::{BackendError, ObjectStorage};

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let size = data.len();

        let response = self
            .http_client
            .post(self.object_url(key))
            .headers(self.headers().await)
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        tracing::debug!(
            "Object uploaded: bucket={}, key={}, size={}",
            self.config.files_bucket,
            key,
            size
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url,
            self.config.files_bucket,
            encode_key(key)
        )
    }

    async fn remove_object(&self, key: &str) -> Result<(), BackendError> {
        let response = self
            .http_client
            .delete(format!(
                "{}/storage/v1/object/{}",
                self.config.url, self.config.files_bucket
            ))
            .headers(self.headers().await)
            .json(&json!({ "prefixes": [key] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        tracing::debug!(
            "Object removed: bucket={}, key={}",
            self.config.files_bucket,
            key
        );
        Ok(())
    }
}
