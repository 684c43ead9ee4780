//! CLI actions and [`ServerConfig`] compilation

use std::{
    collections::BTreeMap,
    net::ToSocketAddrs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::*;

/// A simple web server for static content.
#[derive(Debug, Parser)]
#[clap(name = "indigo", version)]
pub struct Cli {
    /// Log requests if enabled
    #[clap(short, long, default_value = "true")]
    pub log: Option<bool>,
    /// Command for indigo to run
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Starts indigo from a config file and blocks indefinitely
    Run(RunCmd),
    /// Serve a root directory and shares without a config file
    Serve(ServeCmd),
}

impl Default for Command {
    #[inline]
    fn default() -> Self {
        Self::Run(RunCmd::default())
    }
}

#[derive(Args, Debug)]
pub struct RunCmd {
    /// Path of configuration to load (default: ./config.yaml).
    #[clap(short, long, default_value = "./config.yaml")]
    pub config: PathBuf,
}

impl Default for RunCmd {
    fn default() -> Self {
        Self {
            config: PathBuf::from("./config.yaml"),
        }
    }
}

#[derive(Args, Debug)]
pub struct ServeCmd {
    /// The address to which to bind the listener
    #[clap(short, long, default_value = "localhost:8000")]
    pub listen: String,
    /// Catch-all root directory (default: virtual root listing shares)
    #[clap(short, long)]
    pub root: Option<PathBuf>,
    /// Share a directory under a top-level name (`name=path`)
    #[clap(short, long)]
    pub share: Vec<Share>,
    /// Index files tried in order when a directory is requested
    #[clap(short, long)]
    pub index: Vec<String>,
    /// List directories that have no index file
    #[clap(short, long)]
    pub auto_index: bool,
    /// MIME type tables to load, later files win
    #[clap(short, long)]
    pub mime_types: Vec<PathBuf>,
    /// Open server in browser
    #[clap(long)]
    pub open: bool,
}

/// Share name and directory parsed from `name=path`.
#[derive(Clone, Debug)]
pub struct Share(pub String, pub PathBuf);

impl FromStr for Share {
    type Err = std::io::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, path) = s
            .trim()
            .split_once('=')
            .ok_or(std::io::Error::other("share must be name=path"))?;
        Ok(Self(name.trim().to_owned(), PathBuf::from(path.trim())))
    }
}

/// Build configuration based on cli settings.
pub fn build_config(cli: Cli) -> Result<ServerConfig> {
    let mut config = match cli.command.unwrap_or_default() {
        Command::Run(cmd) => run_cmd(cmd),
        Command::Serve(cmd) => serve_cmd(cmd),
    }?;
    config.logging.disable |= !cli.log.unwrap_or(true);
    Ok(config)
}

/// Read config specified in [`RunCmd`]
fn run_cmd(cmd: RunCmd) -> Result<ServerConfig> {
    read_config(&cmd.config)
}

/// Convert string into [`ListenCfg`]
#[inline]
fn convert_addr(addr: &str) -> Result<ListenCfg> {
    Ok(addr
        .to_socket_addrs()?
        .next()
        .context("address did not resolve")?
        .into())
}

#[inline]
fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path {path:?}"))
}

/// Serve config generation
fn serve_cmd(cmd: ServeCmd) -> Result<ServerConfig> {
    if cmd.open {
        let _ = open::that(format!("http://{}", cmd.listen))
            .inspect_err(|err| log::error!("failed to open browser: {err:?}"));
    }
    let root = match cmd.root {
        Some(root) => RootDir::Path(absolute(&root)?),
        None => RootDir::Virtual,
    };
    let shares = cmd
        .share
        .into_iter()
        .map(|Share(name, path)| Ok((name, absolute(&path)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    Ok(ServerConfig {
        listen: convert_addr(&cmd.listen).context("invalid listen address")?,
        root,
        shares,
        index: cmd.index,
        auto_index: cmd.auto_index,
        mime_types: cmd.mime_types,
        base_dir: std::env::current_dir().context("failed to read working directory")?,
        ..Default::default()
    })
}
