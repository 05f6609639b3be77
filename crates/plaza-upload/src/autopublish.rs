//! Auto-Publish Trigger: observer that completes the post lifecycle.
//!
//! Sits between the poller and whatever UI-facing observer the caller
//! injected. Store updates happen before the event is forwarded, so a
//! downstream observer that reacts to `terminal` already sees the post in
//! its final state.

use std::sync::Arc;

use async_trait::async_trait;

use plaza_core::models::{UploadJob, UploadJobHandle};
use plaza_core::{PollOutcome, UploadObserver};

use crate::store::DraftPostStore;

pub struct AutoPublishTrigger {
    store: Arc<DraftPostStore>,
    inner: Arc<dyn UploadObserver>,
}

impl AutoPublishTrigger {
    pub fn new(store: Arc<DraftPostStore>, inner: Arc<dyn UploadObserver>) -> Self {
        Self { store, inner }
    }

    async fn on_terminal(&self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Completed(job) => {
                // Publish races a manual "publish now"; the store serializes
                // them and losing the race is not an error here.
                if let Err(e) = self.store.publish(job.post_id).await {
                    tracing::warn!(
                        post_id = %job.post_id,
                        error = %e,
                        "Auto-publish after completed upload did not go through"
                    );
                }
            }
            PollOutcome::Failed(job) => {
                let reason = failure_summary(job);
                if let Err(e) = self.store.mark_failed(job.post_id, &reason).await {
                    tracing::warn!(
                        post_id = %job.post_id,
                        error = %e,
                        "Could not mark post failed after upload failure"
                    );
                }
            }
            PollOutcome::TimedOut { post_id, elapsed } => {
                // Deliberately no transition: the post stays Uploading so a
                // later progress read or manual publish can still resolve it.
                tracing::warn!(
                    post_id = %post_id,
                    elapsed_secs = elapsed.as_secs(),
                    "Upload polling timed out, post left in uploading state"
                );
            }
        }
    }
}

fn failure_summary(job: &UploadJob) -> String {
    let failed = job.failed_files();
    let names: Vec<&str> = failed.iter().map(|f| f.file_name.as_str()).collect();
    format!(
        "{} of {} files failed: {}",
        failed.len(),
        job.total_files,
        names.join(", ")
    )
}

#[async_trait]
impl UploadObserver for AutoPublishTrigger {
    async fn upload_started(&self, handle: &UploadJobHandle) {
        self.inner.upload_started(handle).await;
    }

    async fn progress(&self, job: &UploadJob) {
        self.inner.progress(job).await;
    }

    async fn terminal(&self, outcome: &PollOutcome) {
        self.on_terminal(outcome).await;
        self.inner.terminal(outcome).await;
    }
}
