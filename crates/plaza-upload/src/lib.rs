//! Plaza upload pipeline engine
//!
//! Ties the draft-post lifecycle to the asynchronous media processing
//! service: dispatch a batch of files, poll per-file and aggregate progress,
//! retry failed files in place, and publish the post automatically once
//! every file completes.
//!
//! Data flow: [`UploadDispatcher`] -> processing service (fire-and-continue)
//! -> [`ProgressPoller`] (pull loop) -> [`AutoPublishTrigger`] ->
//! [`DraftPostStore`].

pub mod autopublish;
pub mod dispatcher;
pub mod pipeline;
pub mod poller;
pub mod retry;
pub mod store;
pub mod testing;

pub use autopublish::AutoPublishTrigger;
pub use dispatcher::UploadDispatcher;
pub use pipeline::UploadPipeline;
pub use poller::{PollerHandle, ProgressPoller};
pub use retry::RetryCoordinator;
pub use store::DraftPostStore;
