//! Scripted collaborators for tests.
//!
//! Hand-rolled doubles over the adapter and backend traits: progress reads
//! are scripted ahead of time and replayed in order, with the last job
//! repeated once the script runs out (a real service keeps answering the
//! same terminal state too).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;

use plaza_core::models::{
    DraftPost, FileStatus, FileUploadState, LocalFile, NewDraftPost, PostStatus, UploadJob,
    UploadJobHandle, WatermarkConfig,
};
use plaza_core::{
    aggregate, MediaProcessingAdapter, PollOutcome, PostBackend, UploadError, UploadObserver,
};

/// Build an upload job whose aggregate status and overall progress are
/// derived from the given per-file states.
pub fn job(post_id: Uuid, files: &[(FileStatus, u8)]) -> UploadJob {
    let files: std::collections::HashMap<_, _> = files
        .iter()
        .enumerate()
        .map(|(i, (status, progress))| {
            let file_id = Uuid::new_v4();
            let state = FileUploadState {
                file_id,
                file_name: format!("file-{}.jpg", i),
                size_bytes: 1024,
                mime_type: "image/jpeg".to_string(),
                status: *status,
                progress_percent: *progress,
                result_url: (*status == FileStatus::Completed)
                    .then(|| format!("https://cdn.example.com/file-{}.jpg", i)),
                thumbnail_url: None,
                error_message: (*status == FileStatus::Failed)
                    .then(|| "processing failed".to_string()),
            };
            (file_id, state)
        })
        .collect();

    let summary = aggregate(files.values());
    UploadJob {
        post_id,
        upload_id: None,
        total_files: files.len() as u32,
        overall_progress: summary.overall_progress,
        status: summary.status,
        files,
    }
}

pub fn local_file(name: &str, size_bytes: usize) -> LocalFile {
    LocalFile::new(name, "image/jpeg", Bytes::from(vec![0u8; size_bytes]))
}

pub fn new_draft() -> NewDraftPost {
    NewDraftPost {
        title: "Sunset photos".to_string(),
        content: "Taken last weekend".to_string(),
        board_id: Uuid::new_v4(),
        category_id: None,
    }
}

/// Scripted stand-in for the post backend.
pub struct MockBackend {
    created: AtomicU32,
    published: AtomicU32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            created: AtomicU32::new(0),
            published: AtomicU32::new(0),
        }
    }

    pub fn created_count(&self) -> u32 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn publish_count(&self) -> u32 {
        self.published.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostBackend for MockBackend {
    async fn create_draft(&self, draft: &NewDraftPost) -> Result<DraftPost, UploadError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(DraftPost {
            id: Uuid::new_v4(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            board_id: draft.board_id,
            category_id: draft.category_id,
            status: PostStatus::Draft,
            created_at: Utc::now(),
        })
    }

    async fn publish_post(&self, _post_id: Uuid) -> Result<(), UploadError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scripted stand-in for the media processing service.
pub struct MockAdapter {
    script: Mutex<VecDeque<Result<UploadJob, String>>>,
    last_job: Mutex<Option<UploadJob>>,
    fail_submission: Mutex<Option<String>>,
    submissions: AtomicU32,
    fetches: AtomicU32,
    retried: Mutex<Vec<Vec<Uuid>>>,
    abandoned: Mutex<Vec<Uuid>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last_job: Mutex::new(None),
            fail_submission: Mutex::new(None),
            submissions: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
            retried: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
        }
    }

    /// Queue one progress snapshot. Snapshots replay in order; once the
    /// queue drains, the last snapshot keeps being returned.
    pub fn push_progress(&self, job: UploadJob) {
        self.script.lock().unwrap().push_back(Ok(job));
    }

    /// Queue one failed progress read.
    pub fn push_error(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    /// Make the next submission fail with an adapter rejection.
    pub fn fail_next_submission(&self, message: &str) {
        *self.fail_submission.lock().unwrap() = Some(message.to_string());
    }

    pub fn submission_count(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// File id batches passed to `retry_files`, in call order.
    pub fn retried(&self) -> Vec<Vec<Uuid>> {
        self.retried.lock().unwrap().clone()
    }

    /// Post ids whose jobs were abandoned, in call order.
    pub fn abandoned(&self) -> Vec<Uuid> {
        self.abandoned.lock().unwrap().clone()
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProcessingAdapter for MockAdapter {
    async fn submit_upload(
        &self,
        post_id: Uuid,
        files: &[LocalFile],
        _watermark: &WatermarkConfig,
    ) -> Result<UploadJobHandle, UploadError> {
        if let Some(message) = self.fail_submission.lock().unwrap().take() {
            return Err(UploadError::AdapterRejection(message));
        }

        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(UploadJobHandle {
            upload_id: Uuid::new_v4(),
            post_id,
            total_files: files.len() as u32,
            estimated_duration: None,
        })
    }

    async fn fetch_progress(&self, _post_id: Uuid) -> Result<UploadJob, UploadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(job)) => {
                *self.last_job.lock().unwrap() = Some(job.clone());
                Ok(job)
            }
            Some(Err(message)) => Err(UploadError::transient(message)),
            None => self
                .last_job
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| UploadError::transient("no progress available")),
        }
    }

    async fn retry_files(&self, _post_id: Uuid, file_ids: &[Uuid]) -> Result<(), UploadError> {
        self.retried.lock().unwrap().push(file_ids.to_vec());

        // Mirror the service: retried files re-enter the queue, and later
        // progress reads report the job processing again.
        if let Some(job) = self.last_job.lock().unwrap().as_mut() {
            for file_id in file_ids {
                if let Some(state) = job.files.get_mut(file_id) {
                    state.status = FileStatus::Queued;
                    state.progress_percent = 0;
                    state.error_message = None;
                }
            }
            let summary = aggregate(job.files.values());
            job.status = summary.status;
            job.overall_progress = summary.overall_progress;
        }
        Ok(())
    }

    async fn abandon_upload(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.abandoned.lock().unwrap().push(post_id);
        Ok(())
    }
}

/// Observer that records every lifecycle event it sees.
pub struct RecordingObserver {
    started: Mutex<Vec<UploadJobHandle>>,
    updates: Mutex<Vec<u8>>,
    terminals: Mutex<Vec<PollOutcome>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            terminals: Mutex::new(Vec::new()),
        }
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// `overall_progress` values in the order they were observed.
    pub fn overall_updates(&self) -> Vec<u8> {
        self.updates.lock().unwrap().clone()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.lock().unwrap().len()
    }

    pub fn last_terminal(&self) -> Option<PollOutcome> {
        self.terminals.lock().unwrap().last().cloned()
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadObserver for RecordingObserver {
    async fn upload_started(&self, handle: &UploadJobHandle) {
        self.started.lock().unwrap().push(handle.clone());
    }

    async fn progress(&self, job: &UploadJob) {
        self.updates.lock().unwrap().push(job.overall_progress);
    }

    async fn terminal(&self, outcome: &PollOutcome) {
        self.terminals.lock().unwrap().push(outcome.clone());
    }
}
