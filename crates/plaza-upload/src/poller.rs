//! Progress Poller: pull loop over the processing service.
//!
//! One cooperative loop per post, timer-driven. Fetches are strictly
//! sequential, so observed `overall_progress` values never reorder; a new
//! fetch is only issued after the previous one resolves. Transient read
//! failures are logged and retried on the next tick, bounded by an overall
//! timeout ceiling. Stopping is cooperative: the flag is honored between
//! ticks, and a fetch already in flight completes with its result discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use plaza_core::models::UploadStatus;
use plaza_core::{MediaProcessingAdapter, PipelineConfig, PollOutcome, UploadObserver};

pub struct ProgressPoller {
    adapter: Arc<dyn MediaProcessingAdapter>,
    config: PipelineConfig,
    // Active loop per post. At most one loop per post: spawning again stops
    // the previous loop and waits for it to exit before the replacement
    // starts observing, so `terminal` can never fire twice for one post.
    active: Arc<Mutex<HashMap<Uuid, ActiveLoop>>>,
}

struct ActiveLoop {
    stop_tx: mpsc::Sender<()>,
    state: Arc<LoopState>,
}

/// Exit flag a takeover can wait on without owning the task's join handle.
struct LoopState {
    finished: AtomicBool,
    notify: Notify,
}

impl LoopState {
    fn new() -> Self {
        Self {
            finished: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn wait_finished(&self) {
        loop {
            let notified = self.notify.notified();
            if self.finished.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to one polling loop.
pub struct PollerHandle {
    post_id: Uuid,
    stop_tx: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    /// Request cooperative cancellation and wait for the loop to exit.
    /// No `terminal` callback fires after this returns.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        let _ = self.join.await;
    }

    /// Wait for the loop to end on its own (terminal state or timeout).
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

impl ProgressPoller {
    pub fn new(adapter: Arc<dyn MediaProcessingAdapter>, config: PipelineConfig) -> Self {
        Self {
            adapter,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start polling for one post until a terminal state, the timeout
    /// ceiling, or an explicit stop. If a loop is already active for this
    /// post it is taken over: the prior loop is stopped and has fully
    /// exited before the new one starts observing.
    pub async fn spawn(
        &self,
        post_id: Uuid,
        observer: Arc<dyn UploadObserver>,
    ) -> PollerHandle {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let state = Arc::new(LoopState::new());

        let prev = self.active.lock().await.insert(
            post_id,
            ActiveLoop {
                stop_tx: stop_tx.clone(),
                state: state.clone(),
            },
        );
        if let Some(prev) = prev {
            let _ = prev.stop_tx.try_send(());
            tracing::info!(post_id = %post_id, "Taking over active poller for post");
            // The registry lock is not held here; the old loop's cleanup can
            // proceed. Its terminal can no longer race ours.
            prev.state.wait_finished().await;
        }

        let adapter = self.adapter.clone();
        let interval = self.config.poll_interval();
        let timeout = self.config.poll_timeout();
        let registry = self.active.clone();
        let own_tx = stop_tx.clone();

        let join = tokio::spawn(async move {
            poll_loop(adapter, post_id, interval, timeout, observer, stop_rx).await;

            // Deregister, unless a takeover already replaced this entry.
            {
                let mut active = registry.lock().await;
                if let Some(current) = active.get(&post_id) {
                    if current.stop_tx.same_channel(&own_tx) {
                        active.remove(&post_id);
                    }
                }
            }
            state.mark_finished();
        });

        PollerHandle {
            post_id,
            stop_tx,
            join,
        }
    }

    /// Whether a loop is currently active for the post.
    pub async fn is_polling(&self, post_id: Uuid) -> bool {
        self.active.lock().await.contains_key(&post_id)
    }

    /// Stop the active loop for a post, if any, and wait for it to exit.
    /// No `terminal` callback fires after this returns.
    pub async fn stop(&self, post_id: Uuid) -> bool {
        let entry = self.active.lock().await.remove(&post_id);
        match entry {
            Some(entry) => {
                let _ = entry.stop_tx.try_send(());
                entry.state.wait_finished().await;
                true
            }
            None => false,
        }
    }
}

async fn poll_loop(
    adapter: Arc<dyn MediaProcessingAdapter>,
    post_id: Uuid,
    interval: Duration,
    timeout: Duration,
    observer: Arc<dyn UploadObserver>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let started = Instant::now();
    tracing::debug!(
        post_id = %post_id,
        interval_ms = interval.as_millis() as u64,
        timeout_secs = timeout.as_secs(),
        "Progress polling started"
    );

    loop {
        match adapter.fetch_progress(post_id).await {
            Ok(job) => {
                // A stop that arrived while the fetch was in flight wins;
                // the fetched result is discarded.
                if stop_rx.try_recv().is_ok() {
                    tracing::info!(post_id = %post_id, "Polling stopped, in-flight result discarded");
                    return;
                }

                observer.progress(&job).await;

                // Re-check after the observer ran: a stop or takeover that
                // arrived while `progress` was awaited wins over a terminal
                // snapshot, otherwise the replaced loop would fire its own
                // `terminal` on top of the replacement's.
                if stop_rx.try_recv().is_ok() {
                    tracing::info!(post_id = %post_id, "Polling stopped before terminal dispatch");
                    return;
                }

                match job.status {
                    UploadStatus::Completed => {
                        tracing::info!(post_id = %post_id, "Upload job completed");
                        observer.terminal(&PollOutcome::Completed(job)).await;
                        return;
                    }
                    UploadStatus::Failed => {
                        tracing::warn!(
                            post_id = %post_id,
                            failed_files = job.failed_files().len(),
                            "Upload job failed"
                        );
                        observer.terminal(&PollOutcome::Failed(job)).await;
                        return;
                    }
                    UploadStatus::Processing => {}
                }
            }
            Err(e) => {
                // Expected transient failure: log and try again next tick.
                tracing::warn!(
                    post_id = %post_id,
                    error = %e,
                    "Progress read failed, retrying next tick"
                );
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= timeout {
            if stop_rx.try_recv().is_ok() {
                tracing::info!(post_id = %post_id, "Polling stopped before terminal dispatch");
                return;
            }
            tracing::error!(
                post_id = %post_id,
                elapsed_secs = elapsed.as_secs(),
                "No terminal state within the polling ceiling"
            );
            observer
                .terminal(&PollOutcome::TimedOut { post_id, elapsed })
                .await;
            return;
        }

        tokio::select! {
            _ = stop_rx.recv() => {
                tracing::info!(post_id = %post_id, "Polling stopped");
                return;
            }
            _ = sleep(interval) => {}
        }
    }
}
