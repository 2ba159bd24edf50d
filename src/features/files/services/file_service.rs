use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::features::files::models::{FileRecord, NewFileRecord};
use crate::features::files::views::FileListView;
use crate::modules::backend::{AuthBackend, Backend, FileTable, ObjectStorage};

lazy_static! {
    /// Extensions kept in storage keys: ASCII alphanumerics only
    /// - Valid: "pdf", "docx", "mp4"
    /// - Invalid: "tar gz", "p/df", ""
    static ref EXTENSION_REGEX: Regex = Regex::new(r"^[A-Za-z0-9]{1,16}$").unwrap();
}

/// A file received from the client, not yet stored
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Upload and delete actions of the read-write file list
pub struct FileService {
    backend: Arc<dyn Backend>,
    config: UploadConfig,
}

impl FileService {
    pub fn new(backend: Arc<dyn Backend>, config: UploadConfig) -> Self {
        Self { backend, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Random storage key keeping the original extension, e.g. `"3f2a….pdf"`
    pub fn storage_key(file_name: &str) -> String {
        let id = Uuid::new_v4();
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && EXTENSION_REGEX.is_match(ext) => {
                format!("{}.{}", id, ext.to_lowercase())
            }
            _ => id.to_string(),
        }
    }

    /// Store the object, record its metadata and refresh the list
    ///
    /// Steps run in order without retries: upload, public URL, user lookup, insert,
    /// re-fetch. If the insert fails the object stays in storage unless orphan
    /// compensation is enabled. Returns the inserted record and its storage key.
    pub async fn upload(
        &self,
        view: &FileListView,
        upload: FileUpload,
    ) -> Result<(FileRecord, String)> {
        if upload.data.is_empty() {
            return Err(AppError::Validation("File is empty".to_string()));
        }
        if upload.data.len() > self.config.max_file_size {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.config.max_file_size,
                self.config.max_file_size / 1024 / 1024
            )));
        }

        let key = Self::storage_key(&upload.name);
        let size = upload.data.len() as u64;
        let _uploading = view.begin_upload();

        self.backend
            .upload_object(&key, upload.data, &upload.content_type)
            .await
            .map_err(AppError::mutation)?;
        debug!("Object stored under key {}", key);

        let url = self.backend.public_url(&key);

        let user = match self.backend.get_user().await {
            Ok(user) => user,
            Err(e) => {
                self.discard_orphan(&key).await;
                return Err(AppError::auth(e));
            }
        };

        let record = NewFileRecord {
            name: upload.name,
            content_type: upload.content_type,
            size,
            url,
            user_id: user.id,
        };

        let inserted = match self.backend.insert_file(record).await {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!("File record insert failed after upload of {}: {}", key, e);
                self.discard_orphan(&key).await;
                return Err(AppError::mutation(e));
            }
        };

        info!(
            "File uploaded: id={}, key={}, size={}",
            inserted.id, key, inserted.size
        );

        view.fetch(self.backend.as_ref()).await;
        Ok((inserted, key))
    }

    /// Delete the record and drop it from the local list
    ///
    /// The stored object is left in place.
    pub async fn delete(&self, view: &FileListView, id: &str) -> Result<()> {
        self.backend
            .delete_file(id)
            .await
            .map_err(AppError::mutation)?;

        let was_listed = view.remove(id);
        info!("File record deleted: id={}, was_listed={}", id, was_listed);
        Ok(())
    }

    async fn discard_orphan(&self, key: &str) {
        if !self.config.compensate_orphans {
            warn!("Object {} left in storage without a record", key);
            return;
        }

        match self.backend.remove_object(key).await {
            Ok(()) => info!("Removed orphaned object {}", key),
            Err(e) => warn!("Failed to remove orphaned object {}: {}", key, e),
        }
    }
}
