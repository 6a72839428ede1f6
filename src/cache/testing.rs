/// Test doubles for the tool cache and a minimal HTTP server
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::{CacheError, ToolCache};

/// HTTP server answering every request with the same status and body
pub(crate) struct TestServer {
    addr: std::net::SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub(crate) async fn start(status: u16, body: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let head = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { addr, hits }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// In-memory tool cache serving canned responses
pub(crate) struct FakeToolCache {
    dir: tempfile::TempDir,
    responses: Mutex<HashMap<String, Result<Vec<u8>, StatusCode>>>,
    entries: Mutex<HashMap<(String, String), PathBuf>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeToolCache {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            responses: Mutex::new(HashMap::new()),
            entries: Mutex::new(HashMap::new()),
            downloads: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` for `url`
    pub(crate) fn serve(&self, url: &str, body: &[u8]) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_vec()));
    }

    /// Answer `url` with an HTTP error
    pub(crate) fn fail(&self, url: &str, status: StatusCode) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(status));
    }

    pub(crate) fn downloaded_urls(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    pub(crate) fn download_count(&self) -> usize {
        self.downloads.lock().unwrap().len()
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }
}

#[async_trait]
impl ToolCache for FakeToolCache {
    async fn find(&self, tool_name: &str, version: &str) -> Option<PathBuf> {
        self.entries
            .lock()
            .unwrap()
            .get(&(tool_name.to_string(), version.to_string()))
            .cloned()
    }

    async fn download_tool(&self, url: &str) -> Result<PathBuf, CacheError> {
        self.downloads.lock().unwrap().push(url.to_string());

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Err(StatusCode::NOT_FOUND));

        match response {
            Ok(body) => {
                let dest = self
                    .dir
                    .path()
                    .join(format!("download-{}", self.download_count()));
                std::fs::write(&dest, body).map_err(|e| CacheError::io("write download", e))?;
                Ok(dest)
            }
            Err(status) => Err(CacheError::Http {
                url: url.to_string(),
                status,
            }),
        }
    }

    async fn cache_file(
        &self,
        source: &Path,
        target_file: &str,
        tool_name: &str,
        version: &str,
    ) -> Result<PathBuf, CacheError> {
        let dir = self.dir.path().join("cache").join(tool_name).join(version);
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::io("create cache dir", e))?;
        std::fs::copy(source, dir.join(target_file))
            .map_err(|e| CacheError::io("copy into cache", e))?;

        self.entries
            .lock()
            .unwrap()
            .insert((tool_name.to_string(), version.to_string()), dir.clone());
        Ok(dir)
    }
}
