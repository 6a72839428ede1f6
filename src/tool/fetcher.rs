/// Locating and fetching the kubectl binary
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::platform::Platform;
use crate::cache::{CacheError, ToolCache};
use crate::config::KubectlConfig;

/// Errors raised while producing a usable binary
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unable to download {tool} version {version}")]
    DownloadFailure {
        tool: String,
        version: String,
        #[source]
        source: CacheError,
    },

    #[error("Failed to cache {tool} version {version}")]
    Cache {
        tool: String,
        version: String,
        #[source]
        source: CacheError,
    },

    #[error("Failed to make {} executable", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ensures a given kubectl version is available locally
pub struct BinaryFetcher<'a, C: ToolCache> {
    cache: &'a C,
    config: &'a KubectlConfig,
}

impl<'a, C: ToolCache> BinaryFetcher<'a, C> {
    /// Create a new binary fetcher
    pub fn new(cache: &'a C, config: &'a KubectlConfig) -> Self {
        Self { cache, config }
    }

    /// Return the path of an executable binary for `version`
    ///
    /// A cache hit never touches the network. On a miss the binary is
    /// downloaded and registered in the cache before the path is returned.
    pub async fn ensure_binary(
        &self,
        version: &str,
        platform: Platform,
    ) -> Result<PathBuf, FetchError> {
        let tool = &self.config.tool_name;
        let binary_name = platform.binary_name(tool);

        let path = match self.cached_binary(version, &binary_name).await {
            Some(path) => path,
            None => self.download_binary(version, platform, &binary_name).await?,
        };

        make_executable(&path)?;
        Ok(path)
    }

    async fn cached_binary(&self, version: &str, binary_name: &str) -> Option<PathBuf> {
        let tool = &self.config.tool_name;
        let cached_dir = self.cache.find(tool, version).await?;
        let path = cached_dir.join(binary_name);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(
                "{} version {} cache entry at {} has no {}, fetching it again",
                tool,
                version,
                cached_dir.display(),
                binary_name
            );
            return None;
        }

        debug!(
            "{} version {} found in cache at {}",
            tool,
            version,
            cached_dir.display()
        );
        Some(path)
    }

    async fn download_binary(
        &self,
        version: &str,
        platform: Platform,
        binary_name: &str,
    ) -> Result<PathBuf, FetchError> {
        let tool = &self.config.tool_name;
        let url = self.config.download_urls.url_for(version, platform);
        info!("Downloading {} {} from {}", tool, version, url);

        let download_path =
            self.cache
                .download_tool(&url)
                .await
                .map_err(|source| FetchError::DownloadFailure {
                    tool: tool.clone(),
                    version: version.to_string(),
                    source,
                })?;

        let cached_dir = self
            .cache
            .cache_file(&download_path, binary_name, tool, version)
            .await
            .map_err(|source| FetchError::Cache {
                tool: tool.clone(),
                version: version.to_string(),
                source,
            })?;

        debug!(
            "{} version {} has been downloaded and cached at {}",
            tool,
            version,
            cached_dir.display()
        );
        Ok(cached_dir.join(binary_name))
    }
}

/// Grant read, write and execute permission to everyone
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777)).map_err(|source| {
        FetchError::Permissions {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> Result<(), FetchError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|source| FetchError::Permissions {
            path: path.to_path_buf(),
            source,
        })
}
