//! Trait seams between the pipeline and its collaborators
//!
//! The media processing service and the post backend are external
//! collaborators reached over HTTP; the pipeline engine only depends on
//! these traits so tests can substitute scripted implementations. The
//! observer replaces what was once a pair of module-global loader callbacks:
//! it is injected explicitly wherever upload lifecycle events are produced.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::error::UploadError;
use crate::models::{
    DraftPost, LocalFile, NewDraftPost, UploadJob, UploadJobHandle, WatermarkConfig,
};

/// Contract with the external media processing service.
///
/// Submission returns immediately with a job handle while watermarking and
/// thumbnailing continue asynchronously; progress is pulled, never pushed.
/// Job state is owned by the service; this side never mutates it directly.
#[async_trait]
pub trait MediaProcessingAdapter: Send + Sync {
    /// Submit one batch of files for a post. One request carries all files
    /// plus the watermark configuration.
    async fn submit_upload(
        &self,
        post_id: Uuid,
        files: &[LocalFile],
        watermark: &WatermarkConfig,
    ) -> Result<UploadJobHandle, UploadError>;

    /// Idempotent read of per-file and aggregate progress for a post.
    async fn fetch_progress(&self, post_id: Uuid) -> Result<UploadJob, UploadError>;

    /// Resubmit only the named files into the existing job.
    async fn retry_files(&self, post_id: Uuid, file_ids: &[Uuid]) -> Result<(), UploadError>;

    /// Instruct the service to abandon the job for a cancelled post.
    async fn abandon_upload(&self, post_id: Uuid) -> Result<(), UploadError>;
}

/// Contract with the backend that owns post records.
#[async_trait]
pub trait PostBackend: Send + Sync {
    async fn create_draft(&self, draft: &NewDraftPost) -> Result<DraftPost, UploadError>;

    async fn publish_post(&self, post_id: Uuid) -> Result<(), UploadError>;
}

/// How one polling loop ended.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Every file completed; the job reached its terminal success state.
    Completed(UploadJob),
    /// At least one file failed permanently and none remain in flight.
    Failed(UploadJob),
    /// No terminal state within the configured ceiling. The post stays
    /// `Uploading` for manual recovery.
    TimedOut { post_id: Uuid, elapsed: Duration },
}

impl PollOutcome {
    pub fn post_id(&self) -> Uuid {
        match self {
            PollOutcome::Completed(job) | PollOutcome::Failed(job) => job.post_id,
            PollOutcome::TimedOut { post_id, .. } => *post_id,
        }
    }
}

/// Observer for upload lifecycle events.
///
/// Injected into the dispatcher and the poller; implementations drive UI
/// concerns (loading indicators, progress bars) or chain into the
/// auto-publish trigger.
#[async_trait]
pub trait UploadObserver: Send + Sync {
    /// The submission request was accepted and the job is now tracked.
    async fn upload_started(&self, handle: &UploadJobHandle);

    /// One successful progress read. Per job, `overall_progress` values are
    /// monotonically non-decreasing across calls.
    async fn progress(&self, job: &UploadJob);

    /// The polling loop ended. Fires at most once per loop; never fires
    /// after an explicit stop.
    async fn terminal(&self, outcome: &PollOutcome);
}

/// No-op implementation for callers with no UI concern.
pub struct NoOpUploadObserver;

#[async_trait]
impl UploadObserver for NoOpUploadObserver {
    async fn upload_started(&self, _handle: &UploadJobHandle) {}

    async fn progress(&self, _job: &UploadJob) {}

    async fn terminal(&self, _outcome: &PollOutcome) {}
}
