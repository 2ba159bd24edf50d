use chrono::{DateTime, FixedOffset, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::core::error::AppError;
use crate::features::files::dtos::{FileListDto, FileListVariant, FileRowDto};
use crate::features::files::models::FileRecord;
use crate::modules::backend::FileTable;
use crate::shared::constants::{BYTES_PER_MEGABYTE, CREATED_DATE_FORMAT, FILE_LINK_TARGET};

/// File list held by a mounted dashboard
///
/// The list is only changed by this view's own fetch and delete paths. Locks are
/// taken after the backend call returns, never across it.
pub struct FileListView {
    variant: FileListVariant,
    files: RwLock<Vec<FileRecord>>,
    error: RwLock<Option<AppError>>,
    uploading: AtomicBool,
}

/// Resets the uploading flag when the upload finishes, whatever the outcome
pub struct UploadingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl FileListView {
    pub fn new(variant: FileListVariant) -> Self {
        Self {
            variant,
            files: RwLock::new(Vec::new()),
            error: RwLock::new(None),
            uploading: AtomicBool::new(false),
        }
    }

    /// Load every record, newest first
    ///
    /// On failure the current list is kept and the reason lands in `error`.
    pub async fn fetch<T: FileTable + ?Sized>(&self, table: &T) {
        match table.select_files().await {
            Ok(records) => {
                tracing::debug!(
                    "{} loaded {} file(s)",
                    self.variant.title(),
                    records.len()
                );
                *self.files.write().unwrap_or_else(|e| e.into_inner()) = records;
                *self.error.write().unwrap_or_else(|e| e.into_inner()) = None;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch files: {}", e);
                *self.error.write().unwrap_or_else(|e| e.into_inner()) = Some(AppError::fetch(e));
            }
        }
    }

    /// Drop one record locally; returns whether it was present
    pub fn remove(&self, id: &str) -> bool {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        let before = files.len();
        files.retain(|record| record.id != id);
        files.len() != before
    }

    pub fn files(&self) -> Vec<FileRecord> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Last fetch failure, cleared by the next successful fetch
    pub fn error(&self) -> Option<AppError> {
        self.error
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Mark an upload as in flight until the guard drops
    ///
    /// This only drives the upload control; concurrent uploads are not rejected.
    pub fn begin_upload(&self) -> UploadingGuard<'_> {
        self.uploading.store(true, Ordering::SeqCst);
        UploadingGuard {
            flag: &self.uploading,
        }
    }

    pub fn render(&self, offset: FixedOffset) -> FileListDto {
        let read_only = self.variant == FileListVariant::ReadOnly;
        let files = self
            .files()
            .into_iter()
            .map(|record| FileRowDto {
                created_label: read_only.then(|| format_created_date(record.created_at, offset)),
                deletable: !read_only,
                size_label: format_size_mb(record.size),
                link_target: FILE_LINK_TARGET.to_string(),
                id: record.id,
                name: record.name,
                url: record.url,
            })
            .collect();

        FileListDto {
            variant: self.variant,
            title: self.variant.title().to_string(),
            error: self.error().map(|e| e.to_string()),
            uploading: self.is_uploading(),
            files,
        }
    }
}

/// Bytes as mebibytes with two decimals, e.g. `"1.00 MB"`
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MEGABYTE)
}

pub fn format_created_date(created_at: DateTime<Utc>, offset: FixedOffset) -> String {
    created_at
        .with_timezone(&offset)
        .format(CREATED_DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{FailOn, MemoryBackend};
    use chrono::TimeZone;

    fn sao_paulo() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size_mb(1_048_576), "1.00 MB");
        assert_eq!(format_size_mb(0), "0.00 MB");
        assert_eq!(format_size_mb(1_572_864), "1.50 MB");
        assert_eq!(format_size_mb(5_000), "0.00 MB");
        assert_eq!(format_size_mb(10_485), "0.01 MB");
    }

    #[test]
    fn test_format_created_date_uses_offset() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 1, 30, 0).unwrap();
        assert_eq!(format_created_date(created, sao_paulo()), "04/03/2024");
        assert_eq!(
            format_created_date(created, FixedOffset::east_opt(0).unwrap()),
            "05/03/2024"
        );
    }

    #[tokio::test]
    async fn test_fetch_orders_newest_first() {
        let backend = MemoryBackend::new();
        let older = backend.seed_file("older.pdf", 10);
        let newer = backend.seed_file("newer.pdf", 20);

        let view = FileListView::new(FileListVariant::ReadOnly);
        view.fetch(backend.as_ref()).await;

        let ids: Vec<String> = view.files().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_list_and_records_error() {
        let backend = MemoryBackend::new();
        backend.seed_file("a.pdf", 10);

        let view = FileListView::new(FileListVariant::ReadWrite);
        view.fetch(backend.as_ref()).await;
        assert_eq!(view.files().len(), 1);

        backend.seed_file("b.pdf", 10);
        backend.fail_on(FailOn::Select);
        view.fetch(backend.as_ref()).await;

        assert_eq!(view.files().len(), 1);
        assert!(matches!(
            view.error(),
            Some(AppError::Fetch(reason)) if reason == "select failed"
        ));

        backend.recover(FailOn::Select);
        view.fetch(backend.as_ref()).await;
        assert_eq!(view.files().len(), 2);
        assert!(view.error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_on_mount_leaves_empty_list() {
        let backend = MemoryBackend::new();
        backend.seed_file("a.pdf", 10);
        backend.fail_on(FailOn::Select);

        let view = FileListView::new(FileListVariant::ReadOnly);
        view.fetch(backend.as_ref()).await;

        assert!(view.files().is_empty());
        assert!(view.render(sao_paulo()).error.is_some());
    }

    #[tokio::test]
    async fn test_render_variants() {
        let backend = MemoryBackend::new();
        backend.seed_file("plano.pdf", 1_048_576);

        let read_only = FileListView::new(FileListVariant::ReadOnly);
        read_only.fetch(backend.as_ref()).await;
        let dto = read_only.render(sao_paulo());
        assert_eq!(dto.title, "Teacher Files");
        assert_eq!(dto.files[0].size_label, "1.00 MB");
        assert_eq!(dto.files[0].created_label.as_deref(), Some("01/03/2024"));
        assert_eq!(dto.files[0].link_target, "_blank");
        assert!(!dto.files[0].deletable);

        let read_write = FileListView::new(FileListVariant::ReadWrite);
        read_write.fetch(backend.as_ref()).await;
        let dto = read_write.render(sao_paulo());
        assert_eq!(dto.title, "Coordinator Panel");
        assert!(dto.files[0].created_label.is_none());
        assert!(dto.files[0].deletable);
    }

    #[test]
    fn test_uploading_flag_resets_on_drop() {
        let view = FileListView::new(FileListVariant::ReadWrite);
        assert!(!view.is_uploading());
        {
            let _guard = view.begin_upload();
            assert!(view.is_uploading());
        }
        assert!(!view.is_uploading());
    }

    #[test]
    fn test_remove_missing_record_is_noop() {
        let view = FileListView::new(FileListVariant::ReadWrite);
        assert!(!view.remove("missing"));
    }
}
