// src/fetch/mod.rs

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt, path::PathBuf};
use tracing::{debug, instrument};
use url::Url;

use crate::config::DataPaths;

/// The three static files the map is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Index,
    Geometry,
    Rates,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Index => "index",
            Resource::Geometry => "geometry",
            Resource::Rates => "rates",
        }
    }

    fn path<'a>(&self, paths: &'a DataPaths) -> &'a str {
        match self {
            Resource::Index => &paths.index,
            Resource::Geometry => &paths.geometry,
            Resource::Rates => &paths.rates,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where raw payloads come from. Implementations only move bytes; parsing
/// happens in the store.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, resource: Resource) -> Result<String>;
}

/// Fetches data files relative to a backend base URL.
pub struct HttpSource {
    client: Client,
    base: Url,
    paths: DataPaths,
}

impl HttpSource {
    pub fn new(client: Client, base: &Url, paths: DataPaths) -> Self {
        // `Url::join` drops the last segment unless the base ends in '/'
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            client,
            base,
            paths,
        }
    }

    pub fn url(&self, resource: Resource) -> Result<Url> {
        let path = resource.path(&self.paths);
        self.base
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("joining {} onto {}", path, self.base))
    }
}

#[async_trait]
impl DataSource for HttpSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, resource: Resource) -> Result<String> {
        let url = self.url(resource)?;
        debug!("Fetching text from {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }
}

/// Reads data files from a local directory laid out like the backend.
pub struct DirSource {
    dir: PathBuf,
    paths: DataPaths,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>, paths: DataPaths) -> Self {
        Self {
            dir: dir.into(),
            paths,
        }
    }

    pub fn path(&self, resource: Resource) -> PathBuf {
        self.dir
            .join(resource.path(&self.paths).trim_start_matches('/'))
    }
}

#[async_trait]
impl DataSource for DirSource {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, resource: Resource) -> Result<String> {
        let path = self.path(resource);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }
}
