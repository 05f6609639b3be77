//! Data models for the upload pipeline
//!
//! Organized by domain: `post` holds the draft-post lifecycle, `upload`
//! holds the upload job and per-file tracking state.

mod post;
mod upload;

// Re-export all models for convenient imports
pub use post::*;
pub use upload::*;
