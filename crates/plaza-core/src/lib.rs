//! Plaza Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! trait seams shared by the Plaza upload-pipeline components. It performs
//! no I/O; the HTTP client and the pipeline engine build on top of it.

pub mod adapter;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;

// Re-export commonly used types
pub use adapter::{
    MediaProcessingAdapter, NoOpUploadObserver, PollOutcome, PostBackend, UploadObserver,
};
pub use config::PipelineConfig;
pub use error::UploadError;
pub use progress::{aggregate, completed_files, JobAggregate};
