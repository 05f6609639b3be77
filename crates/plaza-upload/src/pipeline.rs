//! Pipeline facade: one object wiring the store, dispatcher, poller and
//! retry coordinator together, with the auto-publish trigger chained in
//! front of the caller's observer.

use std::sync::Arc;
use uuid::Uuid;

use plaza_core::models::{DraftPost, LocalFile, NewDraftPost, UploadJob, UploadJobHandle, WatermarkConfig};
use plaza_core::{
    MediaProcessingAdapter, PipelineConfig, PostBackend, UploadError, UploadObserver,
};

use crate::autopublish::AutoPublishTrigger;
use crate::dispatcher::UploadDispatcher;
use crate::poller::{PollerHandle, ProgressPoller};
use crate::retry::RetryCoordinator;
use crate::store::DraftPostStore;

pub struct UploadPipeline {
    adapter: Arc<dyn MediaProcessingAdapter>,
    store: Arc<DraftPostStore>,
    dispatcher: UploadDispatcher,
    poller: ProgressPoller,
    retry: RetryCoordinator,
    observer: Arc<AutoPublishTrigger>,
}

impl UploadPipeline {
    /// Wire up the pipeline. `observer` receives lifecycle events after the
    /// auto-publish trigger has applied its store transitions.
    pub fn new(
        adapter: Arc<dyn MediaProcessingAdapter>,
        backend: Arc<dyn PostBackend>,
        observer: Arc<dyn UploadObserver>,
        config: PipelineConfig,
    ) -> Self {
        let store = Arc::new(DraftPostStore::new(backend, adapter.clone()));
        let trigger = Arc::new(AutoPublishTrigger::new(store.clone(), observer));
        let dispatcher = UploadDispatcher::new(
            adapter.clone(),
            store.clone(),
            trigger.clone(),
            config.clone(),
        );
        let poller = ProgressPoller::new(adapter.clone(), config);
        let retry = RetryCoordinator::new(adapter.clone(), store.clone());

        Self {
            adapter,
            store,
            dispatcher,
            poller,
            retry,
            observer: trigger,
        }
    }

    pub fn store(&self) -> &Arc<DraftPostStore> {
        &self.store
    }

    pub async fn create_draft(&self, draft: NewDraftPost) -> Result<DraftPost, UploadError> {
        self.store.create_draft(draft).await
    }

    /// Submit a batch of files and start polling its progress. The returned
    /// poller handle ends when the job reaches a terminal state, the ceiling
    /// expires, or the loop is stopped.
    pub async fn start_upload(
        &self,
        post_id: Uuid,
        files: Vec<LocalFile>,
        watermark: WatermarkConfig,
    ) -> Result<(UploadJobHandle, PollerHandle), UploadError> {
        let handle = self.dispatcher.start_upload(post_id, files, watermark).await?;
        let poller = self.poller.spawn(post_id, self.observer.clone()).await;
        Ok((handle, poller))
    }

    /// One-off progress read outside the polling loop.
    pub async fn current_progress(&self, post_id: Uuid) -> Result<UploadJob, UploadError> {
        self.adapter.fetch_progress(post_id).await
    }

    /// Publish immediately. A post with no attachments publishes directly
    /// from `Draft`; with an incomplete job this is `NotReady`.
    pub async fn publish_now(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.store.publish(post_id).await
    }

    /// Resubmit failed files and resume polling for the post.
    pub async fn retry_failed_files(
        &self,
        post_id: Uuid,
        file_ids: &[Uuid],
    ) -> Result<PollerHandle, UploadError> {
        self.retry.retry_failed_files(post_id, file_ids).await?;
        Ok(self.poller.spawn(post_id, self.observer.clone()).await)
    }

    /// Cancel the post, abandon its job and stop any active polling loop.
    pub async fn cancel(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.store.cancel(post_id).await?;
        self.poller.stop(post_id).await;
        Ok(())
    }
}
