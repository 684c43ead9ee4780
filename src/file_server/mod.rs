//! Share-Aware Static File Server

use std::{fs, io, path::PathBuf};

use actix_web::http::StatusCode;

use crate::config::Configuration;

mod error;
mod factory;
mod index;
mod render;
mod resolve;
mod service;
mod uri;

pub use factory::FileServer;

use index::DirectoryEntry;
use resolve::Resolution;
use uri::UriPath;

/// Result of routing a single request.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    ServeFile(PathBuf),
    ServeListing {
        uri: String,
        entries: Vec<DirectoryEntry>,
    },
    RedirectToDirectory(String),
    VirtualRootListing(Vec<DirectoryEntry>),
    NotFound,
    Forbidden,
    BadRequest,
    MethodNotAllowed,
    UriTooLong,
    NotImplemented,
    InternalError,
}

impl Outcome {
    /// Classify a failed filesystem access.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::Forbidden,
            // path syntax the platform cannot express
            io::ErrorKind::InvalidInput => Self::NotImplemented,
            _ => Self::InternalError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ServeFile(_) | Self::ServeListing { .. } | Self::VirtualRootListing(_) => {
                StatusCode::OK
            }
            Self::RedirectToDirectory(_) => StatusCode::MOVED_PERMANENTLY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UriTooLong => StatusCode::URI_TOO_LONG,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Route a validated uri to its outcome.
///
/// Blocks on filesystem access.
pub fn route(uri: &UriPath, config: &Configuration) -> Outcome {
    let path = match resolve::resolve(uri, config) {
        Resolution::VirtualRoot => return index::list_shares(config),
        Resolution::ShareNotFound => return Outcome::NotFound,
        Resolution::Path(path) => path,
    };
    let meta = match fs::metadata(&path) {
        Ok(meta) => meta,
        Err(err) => {
            log::debug!("cannot access {path:?}: {err}");
            return Outcome::from_io(&err);
        }
    };
    match (meta.is_dir(), uri.is_directory()) {
        (true, true) => index::index_or_list(&path, &uri.display(), config),
        (true, false) => Outcome::RedirectToDirectory(uri.to_directory().encoded()),
        // trailing slash demands a directory
        (false, true) => Outcome::NotFound,
        (false, false) => Outcome::ServeFile(path),
    }
}
