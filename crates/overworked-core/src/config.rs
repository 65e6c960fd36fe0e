//! Configuration module
//!
//! Transfer client settings: which remote store to talk to, how to reach it,
//! and how files are chunked and fanned out.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_REQUEST_TIMEOUT_SECS,
    MAX_CHUNK_SIZE,
};
use crate::storage_types::StorageBackend;

/// What to do with a file whose upload failed after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialUploadPolicy {
    /// Ask the remote store to delete the partial record
    #[default]
    Delete,
    /// Keep the partial record and hand back a resumable session
    Keep,
}

impl FromStr for PartialUploadPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delete" => Ok(PartialUploadPolicy::Delete),
            "keep" => Ok(PartialUploadPolicy::Keep),
            _ => Err(anyhow::anyhow!("Invalid partial upload policy: {}", s)),
        }
    }
}

impl Display for PartialUploadPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PartialUploadPolicy::Delete => write!(f, "delete"),
            PartialUploadPolicy::Keep => write!(f, "keep"),
        }
    }
}

/// Transfer client configuration.
#[derive(Clone, Debug)]
pub struct TransferConfig {
    pub environment: String,
    pub storage_backend: StorageBackend,
    /// Base URL of the storage service (HTTP backend only)
    pub api_url: Option<String>,
    /// Identifier of the storage service instance, used as a path prefix
    pub service_id: Option<String>,
    /// Locally cached session token. Only a hint; always re-validated remotely.
    pub session_token: Option<String>,
    pub chunk_size: usize,
    pub max_concurrent_uploads: usize,
    pub request_timeout_secs: u64,
    pub partial_upload_policy: PartialUploadPolicy,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            environment: "development".to_string(),
            storage_backend: StorageBackend::Http,
            api_url: None,
            service_id: None,
            session_token: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            partial_upload_policy: PartialUploadPolicy::Delete,
        }
    }
}

impl TransferConfig {
    /// Load from the process environment (and `.env` when present), then validate.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup, then validate.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Http,
        };

        let chunk_size =
            parse_number(&lookup, "STORAGE_CHUNK_SIZE_BYTES")?.unwrap_or(DEFAULT_CHUNK_SIZE);
        let max_concurrent_uploads = parse_number(&lookup, "MAX_CONCURRENT_UPLOADS")?
            .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS);
        let request_timeout_secs = parse_number(&lookup, "STORAGE_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let partial_upload_policy = match lookup("PARTIAL_UPLOAD_POLICY") {
            Some(value) => value.parse()?,
            None => PartialUploadPolicy::Delete,
        };

        let config = TransferConfig {
            environment,
            storage_backend,
            api_url: non_empty(lookup("STORAGE_API_URL")),
            service_id: non_empty(lookup("STORAGE_SERVICE_ID")),
            session_token: non_empty(lookup("STORAGE_SESSION_TOKEN")),
            chunk_size,
            max_concurrent_uploads,
            request_timeout_secs,
            partial_upload_policy,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(anyhow::anyhow!(
                "STORAGE_CHUNK_SIZE_BYTES must be between 1 and {}",
                MAX_CHUNK_SIZE
            ));
        }

        if self.max_concurrent_uploads == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_UPLOADS must be at least 1"));
        }

        if self.storage_backend == StorageBackend::Http {
            match self.api_url.as_deref() {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => {}
                Some(_) => {
                    return Err(anyhow::anyhow!(
                        "STORAGE_API_URL must be an http:// or https:// URL"
                    ))
                }
                None => {
                    return Err(anyhow::anyhow!(
                        "STORAGE_API_URL must be set when using the http storage backend"
                    ))
                }
            }
        }

        Ok(())
    }

    /// Check if the client is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_concurrent_uploads(mut self, max: usize) -> Self {
        self.max_concurrent_uploads = max;
        self
    }

    pub fn with_partial_upload_policy(mut self, policy: PartialUploadPolicy) -> Self {
        self.partial_upload_policy = policy;
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Unset or blank is `None`; any other value must parse.
fn parse_number<T, F>(lookup: &F, key: &str) -> Result<Option<T>, anyhow::Error>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        None => Ok(None),
    }
}
