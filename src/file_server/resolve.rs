//! Share and Root Path Resolution

use std::path::{Path, PathBuf};

use super::uri::UriPath;
use crate::config::Configuration;

/// Where a validated uri points within the virtual namespace.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// `/` without a catch-all root, listing the shares themselves.
    VirtualRoot,
    /// No share matched and no catch-all root is configured.
    ShareNotFound,
    /// Candidate filesystem path beneath a share or the root.
    Path(PathBuf),
}

/// Map a uri onto the filesystem.
///
/// The first segment selects a share, falling back to the catch-all root
/// with every segment appended. Segments are trusted to be plain filenames.
pub fn resolve(uri: &UriPath, config: &Configuration) -> Resolution {
    if uri.is_root() && config.root().is_none() {
        return Resolution::VirtualRoot;
    }
    let segments = uri.segments();
    if let Some(share) = segments.first().and_then(|name| config.share_path(name)) {
        return Resolution::Path(join(share, &segments[1..]));
    }
    match config.root() {
        Some(root) => Resolution::Path(join(root, segments)),
        None => Resolution::ShareNotFound,
    }
}

#[inline]
fn join(base: &Path, segments: &[String]) -> PathBuf {
    segments
        .iter()
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}
