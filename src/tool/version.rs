/// Resolution of requested kubectl versions to concrete ones
use tracing::debug;

use crate::actions;
use crate::cache::ToolCache;
use crate::config::KubectlConfig;

/// Sentinel asking for the current stable release
pub const LATEST: &str = "latest";

/// Whether a requested version is the `latest` sentinel
pub fn is_latest(requested: &str) -> bool {
    requested.trim().eq_ignore_ascii_case(LATEST)
}

/// Turns requested versions into concrete ones
pub struct VersionResolver<'a, C: ToolCache> {
    cache: &'a C,
    config: &'a KubectlConfig,
}

impl<'a, C: ToolCache> VersionResolver<'a, C> {
    /// Create a new version resolver
    pub fn new(cache: &'a C, config: &'a KubectlConfig) -> Self {
        Self { cache, config }
    }

    /// Resolve a requested version
    ///
    /// `latest` is looked up from the stable marker. Every other value is
    /// returned trimmed. This never fails: when the marker cannot be read,
    /// the configured fallback version is used instead.
    pub async fn resolve(&self, requested: &str) -> String {
        if is_latest(requested) {
            debug!("getting latest version of {}", self.config.tool_name);
            self.latest_version().await
        } else {
            requested.trim().to_string()
        }
    }

    async fn latest_version(&self) -> String {
        match self.fetch_stable_marker().await {
            Ok(content) => {
                let version = match content.trim() {
                    "" => self.config.fallback_version.clone(),
                    version => version.to_string(),
                };
                debug!("got latest version of {}: {}", self.config.tool_name, version);
                version
            }
            Err(e) => {
                debug!("stable version lookup failed: {:#}", e);
                actions::warning(&format!(
                    "failed to get latest version of {}",
                    self.config.tool_name
                ));
                self.config.fallback_version.clone()
            }
        }
    }

    async fn fetch_stable_marker(&self) -> anyhow::Result<String> {
        let path = self
            .cache
            .download_tool(&self.config.stable_version_url)
            .await?;
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(content)
    }
}
