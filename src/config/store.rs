//! Immutable Routing Configuration Snapshot

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::{MimeTypes, ServerConfig};

/// Validated settings consumed by the routing engine.
///
/// Built once before the listener binds and shared read-only
/// across every worker.
#[derive(Clone, Debug)]
pub struct Configuration {
    server_name: Option<String>,
    root: Option<PathBuf>,
    shares: BTreeMap<String, PathBuf>,
    indexes: Vec<String>,
    auto_index: bool,
    mime_types: MimeTypes,
    max_uri_length: usize,
}

impl Configuration {
    /// Validate server settings and load the referenced MIME tables.
    pub fn build(config: &ServerConfig) -> Result<Self> {
        config.validate().context("invalid configuration")?;
        let paths: Vec<PathBuf> = config
            .mime_types
            .iter()
            .map(|path| config.resolve_path(path))
            .collect();
        let mime_types = MimeTypes::load(&paths)?;
        Ok(Self {
            server_name: config.name.clone().filter(|n| !n.is_empty()),
            root: config.root.path().map(Path::to_path_buf),
            shares: config
                .shares()
                .map(|(name, path)| (name.clone(), path.clone()))
                .collect(),
            indexes: config.index.clone(),
            auto_index: config.auto_index,
            mime_types,
            max_uri_length: config.max_uri_length(),
        })
    }

    #[inline]
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Catch-all root directory, `None` when running with a virtual root.
    #[inline]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Configured shares ordered by name.
    #[inline]
    pub fn shares(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.shares.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    #[inline]
    pub fn share_path(&self, name: &str) -> Option<&Path> {
        self.shares.get(name).map(PathBuf::as_path)
    }

    #[inline]
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    #[inline]
    pub fn auto_index(&self) -> bool {
        self.auto_index
    }

    #[inline]
    pub fn mime_types(&self) -> &MimeTypes {
        &self.mime_types
    }

    #[inline]
    pub fn max_uri_length(&self) -> usize {
        self.max_uri_length
    }
}

/// Hand assembled configuration for tests.
#[cfg(test)]
#[derive(Default)]
pub struct Builder {
    root: Option<PathBuf>,
    shares: BTreeMap<String, PathBuf>,
    indexes: Vec<String>,
    auto_index: bool,
    mime_types: Vec<(String, String)>,
    max_uri_length: Option<usize>,
}

#[cfg(test)]
impl Builder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
    pub fn share(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.shares.insert(name.to_owned(), path.into());
        self
    }
    pub fn index(mut self, name: &str) -> Self {
        self.indexes.push(name.to_owned());
        self
    }
    pub fn auto_index(mut self, auto_index: bool) -> Self {
        self.auto_index = auto_index;
        self
    }
    pub fn mime(mut self, ext: &str, mime: &str) -> Self {
        self.mime_types.push((ext.to_owned(), mime.to_owned()));
        self
    }
    pub fn max_uri_length(mut self, len: usize) -> Self {
        self.max_uri_length = Some(len);
        self
    }
    pub fn build(self) -> Configuration {
        Configuration {
            server_name: None,
            root: self.root,
            shares: self.shares,
            indexes: self.indexes,
            auto_index: self.auto_index,
            mime_types: self.mime_types.into_iter().collect(),
            max_uri_length: self
                .max_uri_length
                .unwrap_or(super::DEFAULT_MAX_URI_LENGTH),
        }
    }
}
