//! Upload Job Dispatcher: turns a batch of local files into a tracked job.
//!
//! Input checks run before any network traffic: an oversized file is
//! rejected client-side instead of burning upload bandwidth on a request
//! the server is guaranteed to refuse.

use std::sync::Arc;
use uuid::Uuid;

use plaza_core::models::{LocalFile, PostStatus, UploadJobHandle, WatermarkConfig};
use plaza_core::{MediaProcessingAdapter, PipelineConfig, UploadError, UploadObserver};

use crate::store::DraftPostStore;

pub struct UploadDispatcher {
    adapter: Arc<dyn MediaProcessingAdapter>,
    store: Arc<DraftPostStore>,
    observer: Arc<dyn UploadObserver>,
    config: PipelineConfig,
}

impl UploadDispatcher {
    pub fn new(
        adapter: Arc<dyn MediaProcessingAdapter>,
        store: Arc<DraftPostStore>,
        observer: Arc<dyn UploadObserver>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            adapter,
            store,
            observer,
            config,
        }
    }

    /// Submit one batch of files for a draft post.
    ///
    /// On success the post moves to `Uploading` and the observer is told the
    /// upload started. On submission failure no per-file tracking exists yet
    /// and the post stays `Draft`, so the caller may simply call
    /// `start_upload` again; recovery of an already-tracked job goes through
    /// the retry coordinator instead.
    #[tracing::instrument(skip(self, files, watermark), fields(file_count = files.len()))]
    pub async fn start_upload(
        &self,
        post_id: Uuid,
        files: Vec<LocalFile>,
        watermark: WatermarkConfig,
    ) -> Result<UploadJobHandle, UploadError> {
        let post = self
            .store
            .get(post_id)
            .await
            .ok_or_else(|| UploadError::InvalidState(format!("unknown post {}", post_id)))?;
        if post.status != PostStatus::Draft {
            return Err(UploadError::InvalidState(format!(
                "cannot start an upload for a {} post",
                post.status
            )));
        }

        self.validate_batch(&files, &watermark)?;

        let handle = match self
            .adapter
            .submit_upload(post_id, &files, &watermark)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    error = %e,
                    "Upload submission failed, post remains draft"
                );
                return Err(e);
            }
        };

        self.store.begin_upload(post_id).await?;
        tracing::info!(
            post_id = %post_id,
            upload_id = %handle.upload_id,
            total_files = handle.total_files,
            "Upload job started"
        );

        self.observer.upload_started(&handle).await;
        Ok(handle)
    }

    fn validate_batch(
        &self,
        files: &[LocalFile],
        watermark: &WatermarkConfig,
    ) -> Result<(), UploadError> {
        if files.is_empty() {
            return Err(UploadError::Validation(
                "upload requires at least one file".to_string(),
            ));
        }

        if files.len() > self.config.max_files_per_upload {
            return Err(UploadError::Validation(format!(
                "upload of {} files exceeds the limit of {}",
                files.len(),
                self.config.max_files_per_upload
            )));
        }

        for file in files {
            if file.size_bytes > self.config.max_file_size_bytes {
                return Err(UploadError::FileTooLarge {
                    file_name: file.file_name.clone(),
                    size_bytes: file.size_bytes,
                    max_bytes: self.config.max_file_size_bytes,
                });
            }
        }

        if !(0.0..=1.0).contains(&watermark.opacity) {
            return Err(UploadError::Validation(format!(
                "watermark opacity {} is outside 0.0..=1.0",
                watermark.opacity
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{local_file, new_draft, MockAdapter, MockBackend};
    use plaza_core::NoOpUploadObserver;

    async fn dispatcher_with(
        adapter: Arc<MockAdapter>,
        config: PipelineConfig,
    ) -> (UploadDispatcher, Arc<DraftPostStore>, Uuid) {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(DraftPostStore::new(backend, adapter.clone()));
        let post = store.create_draft(new_draft()).await.unwrap();
        let dispatcher =
            UploadDispatcher::new(adapter, store.clone(), Arc::new(NoOpUploadObserver), config);
        (dispatcher, store, post.id)
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_submission() {
        let adapter = Arc::new(MockAdapter::new());
        let (dispatcher, _store, post_id) =
            dispatcher_with(adapter.clone(), PipelineConfig::default()).await;

        let err = dispatcher
            .start_upload(post_id, vec![], WatermarkConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(adapter.submission_count(), 0);
    }

    #[tokio::test]
    async fn oversized_file_fails_fast() {
        let adapter = Arc::new(MockAdapter::new());
        let config = PipelineConfig {
            max_file_size_bytes: 8,
            ..PipelineConfig::default()
        };
        let (dispatcher, store, post_id) = dispatcher_with(adapter.clone(), config).await;

        let err = dispatcher
            .start_upload(
                post_id,
                vec![local_file("big.mp4", 16)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FILE_TOO_LARGE");
        // No network call was made and the post never left Draft.
        assert_eq!(adapter.submission_count(), 0);
        assert_eq!(store.get(post_id).await.unwrap().status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn submission_failure_leaves_post_in_draft() {
        let adapter = Arc::new(MockAdapter::new());
        adapter.fail_next_submission("service unavailable");
        let (dispatcher, store, post_id) =
            dispatcher_with(adapter.clone(), PipelineConfig::default()).await;

        let err = dispatcher
            .start_upload(
                post_id,
                vec![local_file("a.jpg", 4)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "ADAPTER_REJECTION");
        assert_eq!(store.get(post_id).await.unwrap().status, PostStatus::Draft);

        // The whole call is re-invocable once the adapter recovers.
        dispatcher
            .start_upload(
                post_id,
                vec![local_file("a.jpg", 4)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            store.get(post_id).await.unwrap().status,
            PostStatus::Uploading
        );
    }

    #[tokio::test]
    async fn successful_submission_moves_post_to_uploading() {
        let adapter = Arc::new(MockAdapter::new());
        let (dispatcher, store, post_id) =
            dispatcher_with(adapter.clone(), PipelineConfig::default()).await;

        let handle = dispatcher
            .start_upload(
                post_id,
                vec![local_file("a.jpg", 4), local_file("b.jpg", 4)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(handle.post_id, post_id);
        assert_eq!(handle.total_files, 2);
        assert_eq!(
            store.get(post_id).await.unwrap().status,
            PostStatus::Uploading
        );
    }

    #[tokio::test]
    async fn second_upload_for_uploading_post_is_rejected() {
        let adapter = Arc::new(MockAdapter::new());
        let (dispatcher, _store, post_id) =
            dispatcher_with(adapter.clone(), PipelineConfig::default()).await;

        dispatcher
            .start_upload(
                post_id,
                vec![local_file("a.jpg", 4)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap();
        let err = dispatcher
            .start_upload(
                post_id,
                vec![local_file("b.jpg", 4)],
                WatermarkConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
        assert_eq!(adapter.submission_count(), 1);
    }
}
