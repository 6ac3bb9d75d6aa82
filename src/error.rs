//! Error types for fetching and caching activity data.

use std::path::PathBuf;
use std::time::Duration;

/// Failures while collecting activity data.
///
/// Every variant that reaches a caller is fatal for the aggregation. Soft
/// failures (mailing feeds, archive pages, profile lookups) are logged and
/// absorbed inside the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    /// The request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success status.
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    /// The response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
    /// No response arrived within the configured timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: String, timeout: Duration },
    /// A required fetch for one group failed.
    #[error("failed to fetch activity for {repository}: {source}")]
    Group {
        repository: String,
        #[source]
        source: Box<ActivityError>,
    },
}

impl ActivityError {
    pub fn for_group(repository: &str, source: ActivityError) -> Self {
        ActivityError::Group {
            repository: repository.to_string(),
            source: Box::new(source),
        }
    }
}

/// Failures of the file-backed session store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize view model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no cache directory available on this platform")]
    NoCacheDir,
}

pub type Result<T, E = ActivityError> = std::result::Result<T, E>;
