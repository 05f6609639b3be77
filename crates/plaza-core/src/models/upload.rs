use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Aggregate status of one upload job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Processing => write!(f, "processing"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for UploadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(UploadStatus::Processing),
            "completed" => Ok(UploadStatus::Completed),
            "failed" => Ok(UploadStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid upload status: {}", s)),
        }
    }
}

/// Processing state of a single file within an upload job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    Queued,
    Uploading,
    Watermarking,
    Completed,
    Failed,
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Failed)
    }

    /// Non-terminal states: the processing service is still working on the file.
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileStatus::Queued => write!(f, "queued"),
            FileStatus::Uploading => write!(f, "uploading"),
            FileStatus::Watermarking => write!(f, "watermarking"),
            FileStatus::Completed => write!(f, "completed"),
            FileStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for FileStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(FileStatus::Queued),
            "uploading" => Ok(FileStatus::Uploading),
            "watermarking" => Ok(FileStatus::Watermarking),
            "completed" => Ok(FileStatus::Completed),
            "failed" => Ok(FileStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid file status: {}", s)),
        }
    }
}

/// Tracking state for one file in an upload job.
///
/// Keyed by `file_id`, a stable identifier issued at submission time;
/// filenames collide and get sanitized server-side, so they are never used
/// as keys. `progress_percent` is monotonically non-decreasing while the
/// status is non-terminal and frozen afterwards; `result_url` /
/// `thumbnail_url` are present only when `Completed`, `error_message` only
/// when `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadState {
    pub file_id: Uuid,
    pub file_name: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub mime_type: String,
    pub status: FileStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The tracked unit of work for one batch submission of files.
///
/// Owned by the processing service's bookkeeping; this side only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub post_id: Uuid,
    /// The progress endpoint does not echo the job id; it is carried by the
    /// submission handle and filled in here when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<Uuid>,
    pub total_files: u32,
    pub files: HashMap<Uuid, FileUploadState>,
    pub overall_progress: u8,
    pub status: UploadStatus,
}

impl UploadJob {
    pub fn file(&self, file_id: Uuid) -> Option<&FileUploadState> {
        self.files.get(&file_id)
    }

    /// Files currently in `Failed` state, candidates for a targeted retry.
    pub fn failed_files(&self) -> Vec<&FileUploadState> {
        self.files
            .values()
            .filter(|f| f.status == FileStatus::Failed)
            .collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Submission acknowledgement returned by the processing service.
///
/// Processing continues asynchronously after this is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJobHandle {
    pub upload_id: Uuid,
    pub post_id: Uuid,
    pub total_files: u32,
    /// Server-side estimate in seconds, advisory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u64>,
}

/// A file selected on the client, not yet submitted.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Placement of the watermark within the frame.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatermarkPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
    Center,
}

impl WatermarkPosition {
    /// Wire name used in the multipart submission form.
    pub fn wire_name(&self) -> &'static str {
        match self {
            WatermarkPosition::BottomRight => "BOTTOM_RIGHT",
            WatermarkPosition::BottomLeft => "BOTTOM_LEFT",
            WatermarkPosition::TopRight => "TOP_RIGHT",
            WatermarkPosition::TopLeft => "TOP_LEFT",
            WatermarkPosition::Center => "CENTER",
        }
    }
}

/// Watermark settings forwarded verbatim to the processing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkConfig {
    pub need_watermark: bool,
    pub position: WatermarkPosition,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            need_watermark: false,
            position: WatermarkPosition::default(),
            opacity: 0.5,
        }
    }
}
