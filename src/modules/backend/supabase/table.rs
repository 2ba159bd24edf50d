use async_trait::async_trait;

use super::{decode, rejection, SupabaseClient};
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::modules::backend::{BackendError, FileTable};

#[async_trait]
impl FileTable for SupabaseClient {
    async fn select_files(&self) -> Result<Vec<FileRecord>, BackendError> {
        let response = self
            .http_client
            .get(self.rest_url())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .headers(self.headers().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let records: Vec<FileRecord> = decode(response).await?;
        tracing::debug!("Fetched {} file record(s)", records.len());
        Ok(records)
    }

    async fn insert_file(&self, record: NewFileRecord) -> Result<FileRecord, BackendError> {
        let response = self
            .http_client
            .post(self.rest_url())
            .headers(self.headers().await)
            .header("Prefer", "return=representation")
            .json(&[&record])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let inserted: Vec<FileRecord> = decode(response).await?;
        let inserted = inserted
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no rows".to_string()))?;

        tracing::info!(
            "File record inserted: id={}, name={}, size={}",
            inserted.id,
            inserted.name,
            inserted.size
        );
        Ok(inserted)
    }

    async fn delete_file(&self, id: &str) -> Result<(), BackendError> {
        let response = self
            .http_client
            .delete(self.rest_url())
            .query(&[("id", format!("eq.{}", id))])
            .headers(self.headers().await)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        tracing::info!("File record deleted: id={}", id);
        Ok(())
    }
}
