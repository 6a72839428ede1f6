/// Configuration management for kubectl-action
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::tool::platform::Platform;

/// Placeholder substituted with the concrete version in download URL templates
pub const VERSION_PLACEHOLDER: &str = "{version}";

const DEFAULT_TOOL_NAME: &str = "kubectl";
const DEFAULT_FALLBACK_VERSION: &str = "v1.15.0";
const DEFAULT_STABLE_VERSION_URL: &str =
    "https://storage.googleapis.com/kubernetes-release/release/stable.txt";

/// Main kubectl-action configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    /// Tool name used for the cache key and the binary file name
    pub tool_name: String,

    /// Version used when "latest" cannot be resolved
    pub fallback_version: String,

    /// Plaintext marker holding the current stable version
    pub stable_version_url: String,

    /// Binary download URL templates
    pub download_urls: DownloadUrls,

    /// Download retry settings
    pub download: DownloadSettings,
}

/// Per-platform download URL templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadUrls {
    pub linux: String,
    pub darwin: String,
    pub windows: String,
}

/// Retry behaviour for transient download failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Lower bound of the randomised backoff between attempts
    pub min_backoff_secs: u64,

    /// Upper bound of the randomised backoff between attempts
    pub max_backoff_secs: u64,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            fallback_version: DEFAULT_FALLBACK_VERSION.to_string(),
            stable_version_url: DEFAULT_STABLE_VERSION_URL.to_string(),
            download_urls: DownloadUrls::default(),
            download: DownloadSettings::default(),
        }
    }
}

impl Default for DownloadUrls {
    fn default() -> Self {
        let base = "https://storage.googleapis.com/kubernetes-release/release/{version}/bin";
        Self {
            linux: format!("{}/linux/amd64/kubectl", base),
            darwin: format!("{}/darwin/amd64/kubectl", base),
            windows: format!("{}/windows/amd64/kubectl.exe", base),
        }
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_secs: 10,
            max_backoff_secs: 20,
        }
    }
}

impl DownloadUrls {
    /// Template for the given platform
    pub fn template(&self, platform: Platform) -> &str {
        match platform {
            Platform::Linux => &self.linux,
            Platform::Darwin => &self.darwin,
            Platform::Windows => &self.windows,
        }
    }

    /// Download URL for a concrete version on the given platform
    pub fn url_for(&self, version: &str, platform: Platform) -> String {
        self.template(platform).replace(VERSION_PLACEHOLDER, version)
    }
}

impl DownloadSettings {
    pub fn min_backoff(&self) -> Duration {
        Duration::from_secs(self.min_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }
}

impl KubectlConfig {
    /// Load configuration from a YAML file
    ///
    /// Fields missing from the file keep their built-in defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: KubectlConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tool_name.trim().is_empty() {
            anyhow::bail!("tool_name cannot be empty");
        }

        let fallback = self.fallback_version.trim();
        if fallback.is_empty() || fallback.eq_ignore_ascii_case("latest") {
            anyhow::bail!("fallback_version must be a concrete version");
        }

        self.validate_url(&self.stable_version_url)?;

        for platform in [Platform::Linux, Platform::Darwin, Platform::Windows] {
            let template = self.download_urls.template(platform);
            if !template.contains(VERSION_PLACEHOLDER) {
                anyhow::bail!(
                    "Download URL template for {} is missing {}: {}",
                    platform,
                    VERSION_PLACEHOLDER,
                    template
                );
            }
            self.validate_url(&template.replace(VERSION_PLACEHOLDER, "v0.0.0"))?;
        }

        if self.download.max_attempts == 0 {
            anyhow::bail!("download.max_attempts must be at least 1");
        }

        if self.download.min_backoff_secs > self.download.max_backoff_secs {
            anyhow::bail!("download.min_backoff_secs cannot exceed download.max_backoff_secs");
        }

        Ok(())
    }

    /// Validate that a string parses as an absolute URL
    fn validate_url(&self, raw: &str) -> anyhow::Result<()> {
        url::Url::parse(raw).map_err(|e| anyhow::anyhow!("Invalid URL {}: {}", raw, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = KubectlConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tool_name, "kubectl");
        assert_eq!(config.fallback_version, "v1.15.0");
    }

    #[test]
    fn test_url_for_each_platform() {
        let urls = DownloadUrls::default();
        assert_eq!(
            urls.url_for("v1.25.0", Platform::Linux),
            "https://storage.googleapis.com/kubernetes-release/release/v1.25.0/bin/linux/amd64/kubectl"
        );
        assert_eq!(
            urls.url_for("v1.25.0", Platform::Darwin),
            "https://storage.googleapis.com/kubernetes-release/release/v1.25.0/bin/darwin/amd64/kubectl"
        );
        assert_eq!(
            urls.url_for("v1.25.0", Platform::Windows),
            "https://storage.googleapis.com/kubernetes-release/release/v1.25.0/bin/windows/amd64/kubectl.exe"
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = KubectlConfig::default();
        config.fallback_version = "LATEST".to_string();
        assert!(config.validate().is_err());

        let mut config = KubectlConfig::default();
        config.download_urls.darwin = "https://example.com/kubectl".to_string();
        assert!(config.validate().is_err());

        let mut config = KubectlConfig::default();
        config.stable_version_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = KubectlConfig::default();
        config.download.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
fallback_version: v1.28.3
download:
  max_attempts: 5
"#;
        let config: KubectlConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_version, "v1.28.3");
        assert_eq!(config.download.max_attempts, 5);
        assert_eq!(config.download.min_backoff_secs, 10);
        assert_eq!(config.tool_name, "kubectl");
        assert!(config.download_urls.linux.contains("/bin/linux/amd64/"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubectl-action.yaml");
        std::fs::write(
            &path,
            "stable_version_url: https://mirror.example.com/stable.txt\n",
        )
        .unwrap();

        let config = KubectlConfig::from_file(&path).unwrap();
        assert_eq!(
            config.stable_version_url,
            "https://mirror.example.com/stable.txt"
        );
    }
}
