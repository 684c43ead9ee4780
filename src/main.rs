use std::{io::IsTerminal, sync::Arc};

use actix_web::{
    App, HttpServer,
    http::header,
    middleware::{Condition, DefaultHeaders, Logger},
};
use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod config;
mod file_server;

use crate::config::Configuration;
use crate::file_server::FileServer;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .format_target(false)
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("indigo"), log::LevelFilter::Info)
        .filter(
            Some("actix_web::middleware::logger"),
            log::LevelFilter::Info,
        )
        .parse_env("INDIGO_LOG")
        .init();

    let cli = cli::Cli::parse();
    let config = cli::build_config(cli)?;
    let store = Arc::new(Configuration::build(&config)?);
    log::info!(
        "serving {} shares with {} root, {} mime types",
        store.shares().count(),
        match store.root() {
            Some(_) => "catch-all",
            None => "virtual",
        },
        store.mime_types().len(),
    );
    if store.mime_types().is_empty() {
        log::warn!("no mime types loaded, every file is served as application/octet-stream");
    }

    // request lines are only echoed when running in the foreground
    let log_requests = !config.logging.disable && std::io::stdout().is_terminal();
    let access_log = config.logging.access_log;

    let mut server = HttpServer::new(move || {
        let mut headers = DefaultHeaders::new();
        if let Some(name) = store.server_name() {
            headers = headers.add((header::SERVER, name.to_owned()));
        }
        App::new()
            .wrap(Condition::new(access_log, Logger::default()))
            .wrap(headers)
            .service(FileServer::new(store.clone()).log_requests(log_requests))
    })
    .workers(config.threads.max)
    .backlog(config.listen.backlog)
    .max_connections(config.threads.max_queued);

    if let Some(keep_alive) = config.keep_alive.as_ref() {
        server = server.keep_alive(keep_alive.0);
    }

    let addr = config.listen.address();
    log::info!("spawning listener {addr:?}");
    server = server
        .bind(addr.clone())
        .with_context(|| format!("failed to bind {addr:?}"))?;

    log::info!("server listening and ready!");
    server.run().await.context("server spawn failed")
}
