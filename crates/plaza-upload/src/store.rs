//! Draft Post Store: owns the post lifecycle.
//!
//! Each post record sits behind its own async mutex, so concurrent callers
//! for one post (auto-publish trigger racing a manual "publish now")
//! serialize and exactly one performs each transition, while posts stay
//! isolated from each other: a slow publish of one post never blocks
//! operations on another. The outer map lock is only ever held for a lookup
//! or insert, never across an await. The store holds only the post id as a
//! back-reference to any upload job; job state is read through the adapter
//! and never mutated here.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use validator::Validate;

use plaza_core::models::{DraftPost, NewDraftPost, PostStatus, UploadStatus};
use plaza_core::{MediaProcessingAdapter, PostBackend, UploadError};

pub struct DraftPostStore {
    backend: Arc<dyn PostBackend>,
    adapter: Arc<dyn MediaProcessingAdapter>,
    posts: Mutex<HashMap<Uuid, Arc<Mutex<DraftPost>>>>,
    failure_reasons: Mutex<HashMap<Uuid, String>>,
}

impl DraftPostStore {
    pub fn new(backend: Arc<dyn PostBackend>, adapter: Arc<dyn MediaProcessingAdapter>) -> Self {
        Self {
            backend,
            adapter,
            posts: Mutex::new(HashMap::new()),
            failure_reasons: Mutex::new(HashMap::new()),
        }
    }

    async fn entry(&self, post_id: Uuid) -> Result<Arc<Mutex<DraftPost>>, UploadError> {
        self.posts
            .lock()
            .await
            .get(&post_id)
            .cloned()
            .ok_or_else(|| UploadError::InvalidState(format!("unknown post {}", post_id)))
    }

    /// Create a draft post. Validates input before any network call.
    #[tracing::instrument(skip(self, draft), fields(board_id = %draft.board_id))]
    pub async fn create_draft(&self, draft: NewDraftPost) -> Result<DraftPost, UploadError> {
        draft.validate()?;

        let post = self.backend.create_draft(&draft).await?;
        tracing::info!(post_id = %post.id, status = %post.status, "Draft post created");

        self.posts
            .lock()
            .await
            .insert(post.id, Arc::new(Mutex::new(post.clone())));
        Ok(post)
    }

    /// Read accessor. Returns a snapshot; the live record may move on.
    pub async fn get(&self, post_id: Uuid) -> Option<DraftPost> {
        match self.entry(post_id).await {
            Ok(entry) => Some(entry.lock().await.clone()),
            Err(_) => None,
        }
    }

    /// Reason recorded by the last `mark_failed` for a post, if any.
    pub async fn failure_reason(&self, post_id: Uuid) -> Option<String> {
        self.failure_reasons.lock().await.get(&post_id).cloned()
    }

    /// Move a post into `Uploading`: from `Draft` when a job starts, or from
    /// `Failed` when a targeted retry resubmits files.
    pub async fn begin_upload(&self, post_id: Uuid) -> Result<(), UploadError> {
        let entry = self.entry(post_id).await?;
        let mut post = entry.lock().await;

        if !post.status.can_transition_to(PostStatus::Uploading) {
            return Err(UploadError::InvalidState(format!(
                "cannot start uploading from {}",
                post.status
            )));
        }

        tracing::info!(post_id = %post_id, from = %post.status, "Post is now uploading");
        post.status = PostStatus::Uploading;
        Ok(())
    }

    /// Publish a post. Idempotent: publishing an already-published post is a
    /// no-op success. A post with an open upload job that has not completed
    /// fails with `NotReady`; terminal `Cancelled` and `Failed` posts fail
    /// with `InvalidState`.
    #[tracing::instrument(skip(self))]
    pub async fn publish(&self, post_id: Uuid) -> Result<(), UploadError> {
        // The post's own lock is held across the adapter and backend calls:
        // this is what makes a concurrent auto-publish and manual publish of
        // the same post resolve to exactly one transition. Other posts use
        // their own locks and are unaffected.
        let entry = self.entry(post_id).await?;
        let mut post = entry.lock().await;

        match post.status {
            PostStatus::Published => {
                tracing::debug!(post_id = %post_id, "Publish no-op, already published");
                return Ok(());
            }
            PostStatus::Cancelled | PostStatus::Failed => {
                return Err(UploadError::InvalidState(format!(
                    "cannot publish a {} post",
                    post.status
                )));
            }
            PostStatus::Uploading => {
                let job = self.adapter.fetch_progress(post_id).await?;
                if job.status != UploadStatus::Completed {
                    return Err(UploadError::NotReady(format!(
                        "upload job is {} ({}%)",
                        job.status, job.overall_progress
                    )));
                }
            }
            PostStatus::Draft => {} // no attachments, immediate publish
        }

        self.backend.publish_post(post_id).await?;
        tracing::info!(post_id = %post_id, from = %post.status, "Post published");
        post.status = PostStatus::Published;
        Ok(())
    }

    /// Mark a post `Failed` after its upload job failed permanently.
    /// Uploaded files are not deleted; completed results stay addressable
    /// for manual recovery.
    pub async fn mark_failed(&self, post_id: Uuid, reason: &str) -> Result<(), UploadError> {
        let entry = self.entry(post_id).await?;
        let mut post = entry.lock().await;

        if !post.status.can_transition_to(PostStatus::Failed) {
            return Err(UploadError::InvalidState(format!(
                "cannot mark a {} post failed",
                post.status
            )));
        }

        tracing::warn!(post_id = %post_id, reason = %reason, "Post marked failed");
        post.status = PostStatus::Failed;
        drop(post);

        self.failure_reasons
            .lock()
            .await
            .insert(post_id, reason.to_string());
        Ok(())
    }

    /// Cancel a post from `Draft` or `Uploading`. An open upload job is
    /// abandoned on the processing side before the local transition.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, post_id: Uuid) -> Result<(), UploadError> {
        let entry = self.entry(post_id).await?;
        let mut post = entry.lock().await;

        if !post.status.can_transition_to(PostStatus::Cancelled) {
            return Err(UploadError::InvalidState(format!(
                "cannot cancel a {} post",
                post.status
            )));
        }

        if post.status == PostStatus::Uploading {
            self.adapter.abandon_upload(post_id).await?;
        }

        tracing::info!(post_id = %post_id, from = %post.status, "Post cancelled");
        post.status = PostStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAdapter, MockBackend};
    use async_trait::async_trait;
    use plaza_core::models::{FileStatus, LocalFile, UploadJob, UploadJobHandle, WatermarkConfig};
    use tokio::sync::Semaphore;

    /// Adapter whose `fetch_progress` parks on a gate until released,
    /// standing in for a slow processing service.
    struct GatedAdapter {
        inner: MockAdapter,
        entered: Semaphore,
        gate: Semaphore,
    }

    impl GatedAdapter {
        fn new() -> Self {
            Self {
                inner: MockAdapter::new(),
                entered: Semaphore::new(0),
                gate: Semaphore::new(0),
            }
        }

        async fn wait_until_blocked(&self) {
            self.entered.acquire().await.unwrap().forget();
        }

        fn release(&self) {
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl MediaProcessingAdapter for GatedAdapter {
        async fn submit_upload(
            &self,
            post_id: Uuid,
            files: &[LocalFile],
            watermark: &WatermarkConfig,
        ) -> Result<UploadJobHandle, UploadError> {
            self.inner.submit_upload(post_id, files, watermark).await
        }

        async fn fetch_progress(&self, post_id: Uuid) -> Result<UploadJob, UploadError> {
            self.entered.add_permits(1);
            self.gate.acquire().await.unwrap().forget();
            self.inner.fetch_progress(post_id).await
        }

        async fn retry_files(&self, post_id: Uuid, file_ids: &[Uuid]) -> Result<(), UploadError> {
            self.inner.retry_files(post_id, file_ids).await
        }

        async fn abandon_upload(&self, post_id: Uuid) -> Result<(), UploadError> {
            self.inner.abandon_upload(post_id).await
        }
    }

    fn new_draft() -> NewDraftPost {
        NewDraftPost {
            title: "Sunset photos".to_string(),
            content: "Taken last weekend".to_string(),
            board_id: Uuid::new_v4(),
            category_id: None,
        }
    }

    fn store_with(adapter: Arc<MockAdapter>) -> (Arc<DraftPostStore>, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(DraftPostStore::new(backend.clone(), adapter));
        (store, backend)
    }

    #[tokio::test]
    async fn create_draft_rejects_invalid_input() {
        let (store, backend) = store_with(Arc::new(MockAdapter::new()));
        let err = store
            .create_draft(NewDraftPost {
                title: String::new(),
                ..new_draft()
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(backend.created_count(), 0);
    }

    #[tokio::test]
    async fn publish_without_attachments_succeeds_from_draft() {
        let (store, backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();
        store.publish(post.id).await.unwrap();
        assert_eq!(store.get(post.id).await.unwrap().status, PostStatus::Published);
        assert_eq!(backend.publish_count(), 1);
    }

    #[tokio::test]
    async fn publish_is_idempotent() {
        let (store, backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();
        store.publish(post.id).await.unwrap();
        store.publish(post.id).await.unwrap();
        assert_eq!(backend.publish_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_publish_performs_one_transition() {
        let (store, backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();

        let (a, b) = tokio::join!(store.publish(post.id), store.publish(post.id));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(backend.publish_count(), 1);
    }

    #[tokio::test]
    async fn publish_while_job_incomplete_is_not_ready() {
        let adapter = Arc::new(MockAdapter::new());
        let (store, backend) = store_with(adapter.clone());
        let post = store.create_draft(new_draft()).await.unwrap();
        store.begin_upload(post.id).await.unwrap();

        adapter.push_progress(crate::testing::job(
            post.id,
            &[(FileStatus::Uploading, 40), (FileStatus::Queued, 0)],
        ));

        let err = store.publish(post.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_READY");
        assert_eq!(backend.publish_count(), 0);
        assert_eq!(store.get(post.id).await.unwrap().status, PostStatus::Uploading);
    }

    #[tokio::test]
    async fn cancel_abandons_open_job_and_blocks_publish() {
        let adapter = Arc::new(MockAdapter::new());
        let (store, _backend) = store_with(adapter.clone());
        let post = store.create_draft(new_draft()).await.unwrap();
        store.begin_upload(post.id).await.unwrap();

        store.cancel(post.id).await.unwrap();
        assert_eq!(adapter.abandoned(), vec![post.id]);
        assert_eq!(store.get(post.id).await.unwrap().status, PostStatus::Cancelled);

        let err = store.publish(post.id).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn cancel_from_terminal_state_is_rejected() {
        let (store, _backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();
        store.publish(post.id).await.unwrap();
        let err = store.cancel(post.id).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn mark_failed_records_reason() {
        let (store, _backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();
        store.begin_upload(post.id).await.unwrap();
        store.mark_failed(post.id, "2 of 3 files failed").await.unwrap();
        assert_eq!(store.get(post.id).await.unwrap().status, PostStatus::Failed);
        assert_eq!(
            store.failure_reason(post.id).await.as_deref(),
            Some("2 of 3 files failed")
        );
    }

    #[tokio::test]
    async fn slow_publish_of_one_post_does_not_block_others() {
        let adapter = Arc::new(GatedAdapter::new());
        let backend = Arc::new(MockBackend::new());
        let store = Arc::new(DraftPostStore::new(backend.clone(), adapter.clone()));

        let slow = store.create_draft(new_draft()).await.unwrap();
        store.begin_upload(slow.id).await.unwrap();
        adapter.inner.push_progress(crate::testing::job(
            slow.id,
            &[(FileStatus::Uploading, 40)],
        ));

        // This publish parks inside the adapter's progress read.
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.publish(slow.id).await }
        });
        adapter.wait_until_blocked().await;

        // A different post moves through its whole lifecycle while the slow
        // publish still holds its own post's lock.
        let other = store.create_draft(new_draft()).await.unwrap();
        store.publish(other.id).await.unwrap();
        assert_eq!(
            store.get(other.id).await.unwrap().status,
            PostStatus::Published
        );

        adapter.release();
        let err = pending.await.unwrap().unwrap_err();
        assert_eq!(err.error_code(), "NOT_READY");
        assert_eq!(store.get(slow.id).await.unwrap().status, PostStatus::Uploading);
    }

    #[tokio::test]
    async fn failed_post_can_resume_uploading() {
        let (store, _backend) = store_with(Arc::new(MockAdapter::new()));
        let post = store.create_draft(new_draft()).await.unwrap();
        store.begin_upload(post.id).await.unwrap();
        store.mark_failed(post.id, "boom").await.unwrap();
        store.begin_upload(post.id).await.unwrap();
        assert_eq!(store.get(post.id).await.unwrap().status, PostStatus::Uploading);
    }
}
