/// Tool cache backed by the runner's tool cache directory
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::{clean_version, host_arch, CacheError, HttpDownloader, ToolCache};

/// Filesystem tool cache
///
/// Entries live at `<root>/<tool>/<version>/<arch>` and only count as present
/// once the sibling `<arch>.complete` marker has been written.
pub struct LocalToolCache {
    root: PathBuf,
    temp_dir: PathBuf,
    arch: String,
    downloader: HttpDownloader,
}

impl LocalToolCache {
    /// Create a new tool cache
    pub fn new(root: PathBuf, temp_dir: PathBuf, downloader: HttpDownloader) -> Self {
        Self {
            root,
            temp_dir,
            arch: host_arch(),
            downloader,
        }
    }

    /// Cache directory for a tool version, if both form plain path segments
    fn tool_path(&self, tool_name: &str, version: &str) -> Option<PathBuf> {
        let version = clean_version(version);
        if !is_plain_segment(tool_name) || !is_plain_segment(&version) {
            return None;
        }
        Some(self.root.join(tool_name).join(version).join(&self.arch))
    }

    fn marker_path(tool_path: &Path) -> PathBuf {
        let mut marker = OsString::from(tool_path.as_os_str());
        marker.push(".complete");
        PathBuf::from(marker)
    }

    fn temp_file_name() -> String {
        format!("{:032x}", rand::random::<u128>())
    }
}

/// A single normal path component that stays inside its parent
fn is_plain_segment(segment: &str) -> bool {
    if segment.contains(&['/', '\\'][..]) {
        return false;
    }
    let components: Vec<Component> = Path::new(segment).components().collect();
    matches!(components.as_slice(), [Component::Normal(name)] if *name == OsStr::new(segment))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn remove_if_present(path: &Path) -> Result<(), CacheError> {
    let result = if tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(CacheError::io(
            format!("Failed to remove {}", path.display()),
            e,
        )),
        _ => Ok(()),
    }
}

#[async_trait]
impl ToolCache for LocalToolCache {
    async fn find(&self, tool_name: &str, version: &str) -> Option<PathBuf> {
        if tool_name.is_empty() || version.is_empty() {
            return None;
        }

        let Some(tool_path) = self.tool_path(tool_name, version) else {
            debug!("Ignoring invalid cache key {} {}", tool_name, version);
            return None;
        };
        if exists(&tool_path).await && exists(&Self::marker_path(&tool_path)).await {
            debug!("Found tool in cache {} {} {}", tool_name, version, self.arch);
            Some(tool_path)
        } else {
            debug!("Unable to locate {} {} {} in cache", tool_name, version, self.arch);
            None
        }
    }

    async fn download_tool(&self, url: &str) -> Result<PathBuf, CacheError> {
        tokio::fs::create_dir_all(&self.temp_dir)
            .await
            .map_err(|e| {
                CacheError::io(
                    format!("Failed to create {}", self.temp_dir.display()),
                    e,
                )
            })?;

        let dest = self.temp_dir.join(Self::temp_file_name());
        if exists(&dest).await {
            return Err(CacheError::DestinationExists(dest));
        }

        debug!("Downloading {} to {}", url, dest.display());
        self.downloader.download(url, &dest).await?;
        Ok(dest)
    }

    async fn cache_file(
        &self,
        source: &Path,
        target_file: &str,
        tool_name: &str,
        version: &str,
    ) -> Result<PathBuf, CacheError> {
        debug!(
            "Caching tool {} {} {} from {}",
            tool_name,
            version,
            self.arch,
            source.display()
        );

        let tool_path = self
            .tool_path(tool_name, version)
            .ok_or_else(|| CacheError::InvalidKey {
                tool_name: tool_name.to_string(),
                version: version.to_string(),
            })?;
        let marker = Self::marker_path(&tool_path);

        remove_if_present(&tool_path).await?;
        remove_if_present(&marker).await?;

        tokio::fs::create_dir_all(&tool_path).await.map_err(|e| {
            CacheError::io(format!("Failed to create {}", tool_path.display()), e)
        })?;

        let dest = tool_path.join(target_file);
        tokio::fs::copy(source, &dest).await.map_err(|e| {
            CacheError::io(
                format!("Failed to copy {} to {}", source.display(), dest.display()),
                e,
            )
        })?;

        tokio::fs::write(&marker, b"").await.map_err(|e| {
            CacheError::io(format!("Failed to write {}", marker.display()), e)
        })?;

        debug!("Finished caching tool at {}", tool_path.display());
        Ok(tool_path)
    }
}
