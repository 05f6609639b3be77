//! Configuration module
//!
//! Environment-driven configuration for the upload pipeline: backend
//! endpoint, file-size ceiling, and polling cadence.

use std::env;
use std::time::Duration;

const MAX_FILE_SIZE_MB: u64 = 200;
const MAX_FILES_PER_UPLOAD: usize = 10;
const POLL_INTERVAL_MS: u64 = 2000;
const POLL_TIMEOUT_SECS: u64 = 600;

/// Pipeline configuration.
///
/// The poll interval is fixed rather than exponential: the cadence only
/// needs to track a human-perceptible progress bar. The timeout ceiling
/// defaults to 10 minutes.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub max_file_size_bytes: u64,
    pub max_files_per_upload: usize,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            api_base_url: env::var("PLAZA_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_token: env::var("PLAZA_API_TOKEN").ok().filter(|s| !s.is_empty()),
            max_file_size_bytes: env::var("MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_FILE_SIZE_MB)
                * 1024
                * 1024,
            max_files_per_upload: env::var("MAX_FILES_PER_UPLOAD")
                .unwrap_or_else(|_| MAX_FILES_PER_UPLOAD.to_string())
                .parse()
                .unwrap_or(MAX_FILES_PER_UPLOAD),
            poll_interval_ms: env::var("UPLOAD_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(POLL_INTERVAL_MS),
            poll_timeout_secs: env::var("UPLOAD_POLL_TIMEOUT_SECS")
                .unwrap_or_else(|_| POLL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(POLL_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "PLAZA_API_URL must be an http(s) URL, got {}",
                self.api_base_url
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_files_per_upload == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILES_PER_UPLOAD must be greater than 0"
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_POLL_INTERVAL_MS must be greater than 0"
            ));
        }

        if self.poll_timeout_secs * 1000 < self.poll_interval_ms {
            return Err(anyhow::anyhow!(
                "UPLOAD_POLL_TIMEOUT_SECS must be at least one poll interval"
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            api_token: None,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            max_files_per_upload: MAX_FILES_PER_UPLOAD,
            poll_interval_ms: POLL_INTERVAL_MS,
            poll_timeout_secs: POLL_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.poll_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = PipelineConfig {
            api_base_url: "ftp://example.com".to_string(),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let config = PipelineConfig {
            poll_interval_ms: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_timeout_below_interval() {
        let config = PipelineConfig {
            poll_interval_ms: 5000,
            poll_timeout_secs: 2,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
