/// HTTP downloader with retries for transient failures
use anyhow::Context;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::CacheError;
use crate::config::DownloadSettings;
use crate::utils::retry::RetryConfig;

/// Streams remote files to disk
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    settings: DownloadSettings,
}

impl HttpDownloader {
    /// Create a new downloader
    pub fn new(settings: DownloadSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("kubectl-action/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, settings })
    }

    /// Download `url` into `dest`, retrying transient failures
    ///
    /// A partially written file is removed if the download ultimately fails.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<(), CacheError> {
        let retry = RetryConfig::new(
            self.settings.max_attempts,
            self.settings.min_backoff(),
            self.settings.max_backoff(),
            format!("Download of {}", url),
        );

        let result = retry
            .run(|| self.download_once(url, dest), CacheError::is_retryable)
            .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }

        result
    }

    async fn download_once(&self, url: &str, dest: &Path) -> Result<(), CacheError> {
        debug!("GET {}", url);

        let request_error = |source| CacheError::Request {
            url: url.to_string(),
            source,
        };

        let mut response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CacheError::Http {
                url: url.to_string(),
                status,
            });
        }

        let write_error =
            |source| CacheError::io(format!("Failed to write {}", dest.display()), source);

        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            file.write_all(&chunk).await.map_err(write_error)?;
        }
        file.flush().await.map_err(write_error)?;

        debug!("Downloaded {} to {}", url, dest.display());
        Ok(())
    }
}
