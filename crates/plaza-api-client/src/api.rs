//! Domain methods for the Plaza API client.
//!
//! One method per wire operation of the upload pipeline, plus the trait
//! implementations that plug this client into the pipeline engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ApiClient;
use plaza_core::models::{
    DraftPost, FileUploadState, LocalFile, NewDraftPost, UploadJob, UploadJobHandle,
    UploadStatus, WatermarkConfig,
};
use plaza_core::{MediaProcessingAdapter, PostBackend, UploadError};

/// Wire shape of `GET /media/upload-progress/{postId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressData {
    pub post_id: Uuid,
    pub overall_progress: u8,
    pub status: UploadStatus,
    pub total_files: u32,
    pub completed_files: u32,
    pub files: Vec<FileUploadState>,
}

impl From<UploadProgressData> for UploadJob {
    fn from(data: UploadProgressData) -> Self {
        UploadJob {
            post_id: data.post_id,
            upload_id: None,
            total_files: data.total_files,
            files: data.files.into_iter().map(|f| (f.file_id, f)).collect(),
            overall_progress: data.overall_progress,
            status: data.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetryUploadRequest<'a> {
    failed_file_uuids: &'a [Uuid],
}

impl ApiClient {
    /// `POST /posts/draft`
    pub async fn create_draft(&self, draft: &NewDraftPost) -> Result<DraftPost, UploadError> {
        self.post_json("/posts/draft", draft).await
    }

    /// `PUT /posts/{postId}/publish`
    pub async fn publish_post(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.put_no_content(&format!("/posts/{}/publish", post_id))
            .await
    }

    /// `POST /media/upload-async`
    ///
    /// One multipart request carrying every file plus the watermark
    /// configuration. The service acknowledges immediately; processing
    /// continues asynchronously.
    pub async fn start_upload(
        &self,
        post_id: Uuid,
        files: &[LocalFile],
        watermark: &WatermarkConfig,
    ) -> Result<UploadJobHandle, UploadError> {
        let mut form = reqwest::multipart::Form::new()
            .text("postId", post_id.to_string())
            .text("needWatermark", watermark.need_watermark.to_string())
            .text("watermarkPosition", watermark.position.wire_name())
            .text("watermarkOpacity", watermark.opacity.to_string());

        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    UploadError::Validation(format!(
                        "Invalid MIME type {} for {}: {}",
                        file.mime_type, file.file_name, e
                    ))
                })?;
            form = form.part("files", part);
        }

        tracing::debug!(
            post_id = %post_id,
            file_count = files.len(),
            need_watermark = watermark.need_watermark,
            "Submitting upload batch"
        );

        self.post_multipart_envelope("/media/upload-async", form)
            .await
    }

    /// `GET /media/upload-progress/{postId}`
    pub async fn upload_progress(&self, post_id: Uuid) -> Result<UploadJob, UploadError> {
        let data: UploadProgressData = self
            .get_envelope(&format!("/media/upload-progress/{}", post_id))
            .await?;
        Ok(data.into())
    }

    /// `POST /media/retry-upload/{postId}`
    pub async fn retry_upload(
        &self,
        post_id: Uuid,
        failed_file_uuids: &[Uuid],
    ) -> Result<(), UploadError> {
        self.post_no_content(
            &format!("/media/retry-upload/{}", post_id),
            &RetryUploadRequest { failed_file_uuids },
        )
        .await
    }

    /// `DELETE /media/cancel-upload/{postId}`
    pub async fn cancel_upload(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.delete_no_content(&format!("/media/cancel-upload/{}", post_id))
            .await
    }
}

#[async_trait]
impl MediaProcessingAdapter for ApiClient {
    async fn submit_upload(
        &self,
        post_id: Uuid,
        files: &[LocalFile],
        watermark: &WatermarkConfig,
    ) -> Result<UploadJobHandle, UploadError> {
        self.start_upload(post_id, files, watermark).await
    }

    async fn fetch_progress(&self, post_id: Uuid) -> Result<UploadJob, UploadError> {
        self.upload_progress(post_id).await
    }

    async fn retry_files(&self, post_id: Uuid, file_ids: &[Uuid]) -> Result<(), UploadError> {
        self.retry_upload(post_id, file_ids).await
    }

    async fn abandon_upload(&self, post_id: Uuid) -> Result<(), UploadError> {
        self.cancel_upload(post_id).await
    }
}

#[async_trait]
impl PostBackend for ApiClient {
    async fn create_draft(&self, draft: &NewDraftPost) -> Result<DraftPost, UploadError> {
        ApiClient::create_draft(self, draft).await
    }

    async fn publish_post(&self, post_id: Uuid) -> Result<(), UploadError> {
        ApiClient::publish_post(self, post_id).await
    }
}
