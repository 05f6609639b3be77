//! Retry Coordinator: resubmit failed files into an existing job.
//!
//! Retry is strictly scoped: only files the current job snapshot reports as
//! `Failed` may be resubmitted, and files already completed or still in
//! flight are untouched. The job keeps its identity; nothing here creates a
//! second job for the post.

use std::sync::Arc;
use uuid::Uuid;

use plaza_core::models::{FileStatus, PostStatus};
use plaza_core::{MediaProcessingAdapter, UploadError};

use crate::store::DraftPostStore;

pub struct RetryCoordinator {
    adapter: Arc<dyn MediaProcessingAdapter>,
    store: Arc<DraftPostStore>,
}

impl RetryCoordinator {
    pub fn new(adapter: Arc<dyn MediaProcessingAdapter>, store: Arc<DraftPostStore>) -> Self {
        Self { adapter, store }
    }

    /// Resubmit the named failed files. Every id must name a file the job
    /// currently reports as `Failed`; one bad id rejects the whole request
    /// before anything is resubmitted. A post sitting in `Failed` moves back
    /// to `Uploading` so a fresh polling loop can track the retried files.
    #[tracing::instrument(skip(self, file_ids), fields(file_count = file_ids.len()))]
    pub async fn retry_failed_files(
        &self,
        post_id: Uuid,
        file_ids: &[Uuid],
    ) -> Result<(), UploadError> {
        if file_ids.is_empty() {
            return Err(UploadError::InvalidRetryTarget(
                "retry requires at least one file id".to_string(),
            ));
        }

        let job = self.adapter.fetch_progress(post_id).await?;
        for file_id in file_ids {
            match job.file(*file_id) {
                None => {
                    return Err(UploadError::InvalidRetryTarget(format!(
                        "file {} is not part of this upload job",
                        file_id
                    )));
                }
                Some(state) if state.status != FileStatus::Failed => {
                    return Err(UploadError::InvalidRetryTarget(format!(
                        "file {} is {}, only failed files can be retried",
                        file_id, state.status
                    )));
                }
                Some(_) => {}
            }
        }

        self.adapter.retry_files(post_id, file_ids).await?;
        tracing::info!(
            post_id = %post_id,
            retried_files = file_ids.len(),
            "Failed files resubmitted"
        );

        // A post already marked Failed re-enters the uploading lifecycle;
        // a post still Uploading stays where it is.
        if let Some(post) = self.store.get(post_id).await {
            if post.status == PostStatus::Failed {
                self.store.begin_upload(post_id).await?;
            }
        }

        Ok(())
    }
}
