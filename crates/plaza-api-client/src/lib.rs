//! HTTP client for the Plaza backend.
//!
//! Provides a minimal client with optional bearer auth, envelope-decoding
//! request helpers, and the domain methods of the upload pipeline (draft
//! creation, publish, multipart upload submission, progress polling, retry,
//! cancel). The pipeline engine consumes it through the trait seams defined
//! in `plaza_core::adapter`.

pub mod api;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use plaza_core::{PipelineConfig, UploadError};

/// Response envelope used by the media endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success=false` or a missing body into
    /// an adapter rejection carrying the server's message.
    pub fn into_data(self) -> Result<T, UploadError> {
        if !self.success {
            return Err(UploadError::AdapterRejection(
                self.message
                    .unwrap_or_else(|| "request rejected without message".to_string()),
            ));
        }
        self.data.ok_or_else(|| {
            UploadError::AdapterRejection("response envelope carried no data".to_string())
        })
    }
}

/// HTTP client for the Plaza backend with optional bearer auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Create a client from pipeline configuration (PLAZA_API_URL,
    /// PLAZA_API_TOKEN).
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.api_token.clone())
    }

    /// Create a client straight from the environment.
    pub fn from_env() -> Result<Self> {
        let config = PipelineConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn read_error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("status {}: {}", status, body)
    }

    /// GET request decoding an envelope-wrapped JSON payload. Transport
    /// failures and non-success statuses map to `TransientNetwork`; these
    /// reads are idempotent and retried by the poller.
    pub(crate) async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.get(&url));

        let response = request.send().await.map_err(UploadError::transient)?;
        if !response.status().is_success() {
            return Err(UploadError::TransientNetwork(
                Self::read_error_body(response).await,
            ));
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(UploadError::transient)?;
        envelope.into_data()
    }

    /// POST a JSON body and decode a plain JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.map_err(UploadError::transient)?;
        let status = response.status();
        if !status.is_success() {
            let detail = Self::read_error_body(response).await;
            return Err(match status.as_u16() {
                400 => UploadError::Validation(detail),
                _ => UploadError::AdapterRejection(detail),
            });
        }

        response.json().await.map_err(UploadError::transient)
    }

    /// POST multipart form and decode an envelope-wrapped response.
    pub(crate) async fn post_multipart_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));

        let response = request.send().await.map_err(UploadError::transient)?;
        let status = response.status();
        if !status.is_success() {
            let detail = Self::read_error_body(response).await;
            return Err(match status.as_u16() {
                400 => UploadError::Validation(detail),
                _ => UploadError::AdapterRejection(detail),
            });
        }

        let envelope: ApiEnvelope<T> = response.json().await.map_err(UploadError::transient)?;
        envelope.into_data()
    }

    /// POST with a JSON body expecting an empty (204) response.
    pub(crate) async fn post_no_content<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.map_err(UploadError::transient)?;
        let status = response.status();
        if !status.is_success() {
            let detail = Self::read_error_body(response).await;
            return Err(match status.as_u16() {
                400 => UploadError::InvalidRetryTarget(detail),
                404 => UploadError::InvalidState(detail),
                _ => UploadError::AdapterRejection(detail),
            });
        }
        Ok(())
    }

    /// PUT expecting an empty (204) response.
    pub(crate) async fn put_no_content(&self, path: &str) -> Result<(), UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.put(&url));

        let response = request.send().await.map_err(UploadError::transient)?;
        let status = response.status();
        if !status.is_success() {
            let detail = Self::read_error_body(response).await;
            return Err(match status.as_u16() {
                409 => UploadError::NotReady(detail),
                404 | 400 => UploadError::InvalidState(detail),
                _ => UploadError::AdapterRejection(detail),
            });
        }
        Ok(())
    }

    /// DELETE expecting an empty (204) response.
    pub(crate) async fn delete_no_content(&self, path: &str) -> Result<(), UploadError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.delete(&url));

        let response = request.send().await.map_err(UploadError::transient)?;
        let status = response.status();
        if !status.is_success() {
            let detail = Self::read_error_body(response).await;
            return Err(match status.as_u16() {
                404 | 400 => UploadError::InvalidState(detail),
                _ => UploadError::AdapterRejection(detail),
            });
        }
        Ok(())
    }
}

pub use api::UploadProgressData;
