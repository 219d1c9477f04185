//! Transports that turn a resolved asset URL into raw bytes.
//!
//! `HttpSource` talks to the static file server. `DirSource` serves the same
//! layout straight from a local directory, which is how the game runs without
//! a server and how fixtures are served in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use kaboom_core::path::decode_segment;
use url::Url;

use crate::error::FetchError;

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the raw bytes behind `url`. Only transport failures are reported
    /// here; decoding is the fetcher's job.
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError>;

    fn describe(&self) -> String;
}

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetSource for HttpSource {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let network = |reason: String| FetchError::Network {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("HTTP {status}")));
        }
        let body = response.bytes().await.map_err(|e| network(e.to_string()))?;
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        "http".to_string()
    }
}

/// Serves assets from `root`, mapping the URL path below `origin` onto disk.
pub struct DirSource {
    root: PathBuf,
    origin: Url,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>, origin: Url) -> Self {
        Self {
            root: root.into(),
            origin,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn disk_path(&self, url: &Url) -> Result<PathBuf, FetchError> {
        let outside = || FetchError::Network {
            url: url.to_string(),
            reason: format!("URL is outside origin '{}'", self.origin),
        };
        let relative = url
            .as_str()
            .strip_prefix(self.origin.as_str().trim_end_matches('/'))
            .ok_or_else(outside)?;

        let mut path = self.root.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            let decoded = decode_segment(segment).map_err(|reason| FetchError::Network {
                url: url.to_string(),
                reason,
            })?;
            if decoded == ".." || decoded.contains(['/', '\\']) {
                return Err(outside());
            }
            path.push(decoded);
        }
        Ok(path)
    }
}

#[async_trait]
impl AssetSource for DirSource {
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let path = self.disk_path(url)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}
