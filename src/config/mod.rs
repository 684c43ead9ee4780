//! Configuration Serializer/Deserializer Types

use std::{
    collections::BTreeMap,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, de::Error};

pub mod mime;
pub mod store;

pub use mime::MimeTypes;
pub use store::Configuration;

/// Default cap on the length of a request URI.
pub const DEFAULT_MAX_URI_LENGTH: usize = 2048;

const MAX_THREADS: usize = 32768;

/// Read server configuration from a config file.
pub fn read_config(path: &PathBuf) -> Result<ServerConfig> {
    if !path.exists() {
        return Err(anyhow!("config: {path:?} does not exist"));
    }
    let s = std::fs::read_to_string(path).context("failed to read config")?;
    let mut config: ServerConfig = serde_yaml::from_str(&s).context("invalid config")?;
    config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(config)
}

/// Server specific configuration settings.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Server name advertised in the `Server` response header.
    pub name: Option<String>,
    /// Listener binding configuration.
    pub listen: ListenCfg,
    /// Worker pool sizing.
    pub threads: ThreadsCfg,
    /// Idle keep-alive timeout for client connections.
    ///
    /// Example: `5s`
    pub keep_alive: Option<Duration>,
    /// Catch-all root directory or `virtual` to list shares at `/`.
    ///
    /// Default is `virtual`
    pub root: RootDir,
    /// Named mount points mapping a top-level uri segment to a directory.
    pub shares: BTreeMap<String, PathBuf>,
    /// Index filenames tried in order when a directory is requested.
    pub index: Vec<String>,
    /// Generate listings for directories without an index file.
    ///
    /// Default is false
    pub auto_index: bool,
    /// MIME table files (`type ext1 ext2 ...`), later files win.
    ///
    /// Relative paths are resolved against the config file directory.
    pub mime_types: Vec<PathBuf>,
    /// Maximum accepted length of a request uri.
    ///
    /// Default is 2048
    pub max_uri_length: Option<usize>,
    /// Request logging configuration.
    pub logging: LoggingCfg,
    /// Directory used to resolve relative configuration paths.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Server listener bindings configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenCfg {
    /// Host address server will bind to.
    pub address: String,
    /// Port server will bind to.
    pub port: u16,
    /// Maximum number of pending connections.
    pub backlog: u32,
}

impl Default for ListenCfg {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_owned(),
            port: 80,
            backlog: 64,
        }
    }
}

impl ListenCfg {
    #[inline]
    pub fn address(&self) -> (String, u16) {
        (self.address.clone(), self.port)
    }
}

impl From<SocketAddr> for ListenCfg {
    fn from(value: SocketAddr) -> Self {
        Self {
            address: value.ip().to_string(),
            port: value.port(),
            ..Default::default()
        }
    }
}

/// Worker pool sizing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThreadsCfg {
    /// Minimum number of workers.
    pub min: usize,
    /// Maximum number of workers.
    pub max: usize,
    /// Maximum number of connections queued per worker.
    pub max_queued: usize,
}

impl Default for ThreadsCfg {
    fn default() -> Self {
        Self {
            min: 2,
            max: 16,
            max_queued: 64,
        }
    }
}

/// Logging controls.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingCfg {
    /// Disable per-request log lines.
    pub disable: bool,
    /// Enable the actix access log in addition to request lines.
    pub access_log: bool,
}

/// Catch-all root directory setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RootDir {
    /// No catch-all, `/` lists the configured shares.
    #[default]
    Virtual,
    /// Directory serving every uri not claimed by a share.
    Path(PathBuf),
}

impl RootDir {
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Virtual => None,
            Self::Path(path) => Some(path),
        }
    }
}

impl FromStr for RootDir {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "virtual" => Self::Virtual,
            path => Self::Path(PathBuf::from(path)),
        })
    }
}

/// Time duration parsed from human-readable format.
///
/// Example: `1h5m2s`
#[derive(Clone, Debug)]
pub struct Duration(pub std::time::Duration);

impl FromStr for Duration {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(humantime::parse_duration(s)?))
    }
}

macro_rules! de_fromstr {
    ($s:ident) => {
        impl<'de> Deserialize<'de> for $s {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: String = Deserialize::deserialize(deserializer)?;
                $s::from_str(&s).map_err(D::Error::custom)
            }
        }
    };
}

de_fromstr!(Duration);
de_fromstr!(RootDir);

/// Check a share or index name is a single plain path segment.
pub fn valid_segment_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

impl ServerConfig {
    /// Shares with both a name and a path.
    ///
    /// Blank entries are ignored rather than rejected.
    pub fn shares(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.shares
            .iter()
            .filter(|(name, path)| !name.is_empty() && !path.as_os_str().is_empty())
    }

    #[inline]
    pub fn max_uri_length(&self) -> usize {
        self.max_uri_length.unwrap_or(DEFAULT_MAX_URI_LENGTH)
    }

    /// Resolve a configuration relative path against [`ServerConfig::base_dir`].
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match path.is_absolute() {
            true => path.to_path_buf(),
            false => self.base_dir.join(path),
        }
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.listen.port == 0 {
            bail!("invalid port setting - must have a value between 1 and 65535");
        }
        if self.listen.backlog == 0 {
            bail!("invalid backlog setting - must be at least 1");
        }
        let threads = &self.threads;
        if threads.min < 1 || threads.min > MAX_THREADS {
            bail!("invalid threads.min setting - must have a value between 1 and {MAX_THREADS}");
        }
        if threads.max < threads.min || threads.max > MAX_THREADS {
            bail!(
                "invalid threads.max setting - must have a value between threads.min and {MAX_THREADS}"
            );
        }
        if threads.max_queued < 1 || threads.max_queued > MAX_THREADS {
            bail!(
                "invalid threads.max_queued setting - must have a value between 1 and {MAX_THREADS}"
            );
        }
        if self.max_uri_length() == 0 {
            bail!("invalid max_uri_length setting - must be at least 1");
        }
        if let Some(root) = self.root.path() {
            if !root.is_absolute() {
                bail!("{root:?} is not an absolute path");
            }
        }
        for (name, path) in self.shares() {
            if !valid_segment_name(name) {
                bail!("{name:?} is not a valid share name");
            }
            if !path.is_absolute() {
                bail!("{path:?} is not an absolute path");
            }
        }
        for index in self.index.iter() {
            if !valid_segment_name(index) || Path::new(index).is_absolute() {
                bail!("{index:?} is not a valid index filename");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ServerConfig {
        serde_yaml::from_str(yaml).expect("valid yaml")
    }

    #[test]
    fn defaults() {
        let config = parse("{}");
        assert_eq!(config.listen.address, "0.0.0.0");
        assert_eq!(config.listen.port, 80);
        assert_eq!(config.listen.backlog, 64);
        assert_eq!(config.threads.min, 2);
        assert_eq!(config.threads.max, 16);
        assert_eq!(config.root, RootDir::Virtual);
        assert!(!config.auto_index);
        assert_eq!(config.max_uri_length(), DEFAULT_MAX_URI_LENGTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_document() {
        let config = parse(
            r#"
name: indigo
listen:
  address: 127.0.0.1
  port: 8080
keep_alive: 5s
root: /srv/www
shares:
  music: /srv/music
  docs: /home/docs
index: [index.html, index.htm]
auto_index: true
mime_types: [mime.types]
"#,
        );
        assert_eq!(config.name.as_deref(), Some("indigo"));
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.keep_alive.as_ref().map(|d| d.0.as_secs()), Some(5));
        assert_eq!(config.root.path(), Some(Path::new("/srv/www")));
        assert_eq!(config.shares.len(), 2);
        assert_eq!(config.index, vec!["index.html", "index.htm"]);
        assert!(config.auto_index);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_yaml::from_str::<ServerConfig>("colour: blue").is_err());
    }

    #[test]
    fn virtual_root_keyword() {
        assert_eq!(parse("root: virtual").root, RootDir::Virtual);
        assert_eq!(parse("root: ''").root, RootDir::Virtual);
    }

    #[test]
    fn rejects_relative_paths() {
        assert!(parse("root: srv/www").validate().is_err());
        assert!(parse("shares: { music: music }").validate().is_err());
    }

    #[test]
    fn rejects_bad_share_names() {
        assert!(parse("shares: { 'a/b': /srv }").validate().is_err());
        assert!(parse("shares: { '..': /srv }").validate().is_err());
        assert!(parse("shares: { 'a\\b': /srv }").validate().is_err());
    }

    #[test]
    fn skips_blank_shares() {
        let config = parse("shares: { music: '', '': /srv }");
        assert_eq!(config.shares().count(), 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_ranges() {
        assert!(parse("listen: { port: 0 }").validate().is_err());
        assert!(parse("threads: { min: 0 }").validate().is_err());
        assert!(parse("threads: { min: 8, max: 4 }").validate().is_err());
        assert!(parse("threads: { max_queued: 40000 }").validate().is_err());
        assert!(parse("max_uri_length: 0").validate().is_err());
    }

    #[test]
    fn rejects_bad_index_names() {
        assert!(parse("index: ['']").validate().is_err());
        assert!(parse("index: [/etc/passwd]").validate().is_err());
        assert!(parse("index: [a/index.html]").validate().is_err());
        assert!(parse("index: ['.']").validate().is_err());
        assert!(parse("index: ['..']").validate().is_err());
        assert!(parse("index: [index.html, .index]").validate().is_ok());
    }
}
