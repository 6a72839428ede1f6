/// Tool cache: lookup, download and registration of fetched binaries
pub mod download;
pub mod local;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use download::HttpDownloader;
pub use local::LocalToolCache;

/// Errors raised by tool cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Unexpected HTTP response from {url}: {status}")]
    Http { url: String, status: StatusCode },

    #[error("Request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Destination file path {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("Invalid cache key {tool_name} {version}")]
    InvalidKey { tool_name: String, version: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether another attempt may succeed
    ///
    /// Transport failures, server errors, request timeouts and rate limiting
    /// are transient. Any other HTTP status is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Request { .. } => true,
            Self::DestinationExists(_) | Self::InvalidKey { .. } | Self::Io { .. } => false,
        }
    }
}

/// Download cache keyed by tool name and version
#[async_trait]
pub trait ToolCache: Send + Sync {
    /// Directory holding a previously cached tool, if any
    async fn find(&self, tool_name: &str, version: &str) -> Option<PathBuf>;

    /// Download a URL to a fresh temporary file and return its path
    async fn download_tool(&self, url: &str) -> Result<PathBuf, CacheError>;

    /// Copy a file into the cache as `target_file` and return the cache directory
    ///
    /// An existing entry for the same tool and version is replaced.
    async fn cache_file(
        &self,
        source: &Path,
        target_file: &str,
        tool_name: &str,
        version: &str,
    ) -> Result<PathBuf, CacheError>;
}

/// Normalise a version for use as a cache directory name
///
/// Semver-looking versions lose any leading `v` and `=` characters, so
/// `v1.25.0` and `1.25.0` share an entry. Anything else is used as given.
pub fn clean_version(version: &str) -> String {
    let trimmed = version.trim();
    let stripped = trimmed.trim_start_matches(&['=', 'v'][..]).trim();
    match semver::Version::parse(stripped) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Architecture name used in cache paths
pub fn host_arch() -> String {
    match std::env::consts::ARCH {
        "x86_64" => "x64".to_string(),
        "aarch64" => "arm64".to_string(),
        "x86" => "ia32".to_string(),
        other => other.to_string(),
    }
}
