//! Index File Lookup and Directory Listings

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::Outcome;
use crate::config::Configuration;

/// Single row of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn new(name: &str, is_directory: bool) -> Self {
        Self {
            name: name.to_owned(),
            is_directory,
        }
    }

    /// Name as shown in listings, with a trailing `/` for directories.
    pub fn label(&self) -> String {
        match self.is_directory {
            true => format!("{}/", self.name),
            false => self.name.clone(),
        }
    }
}

#[inline]
fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// First configured index name that exists as a regular file in `dir`.
pub fn find_index(dir: &Path, indexes: &[String]) -> Option<PathBuf> {
    indexes
        .iter()
        .map(|index| dir.join(index))
        .find(|path| match fs::metadata(path) {
            Ok(meta) => meta.is_file(),
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    log::trace!("skipping index candidate {path:?}: {err}");
                }
                false
            }
        })
}

/// Visible entries of `dir`, sorted by name.
///
/// Entries that fail to stat are dropped; only failing to open
/// the directory itself is an error.
pub fn list_directory(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries: Vec<DirectoryEntry> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let entry = entry
                .inspect_err(|err| log::debug!("skipping entry in {dir:?}: {err}"))
                .ok()?;
            let name = entry.file_name().into_string().ok()?;
            if is_hidden(&name) {
                return None;
            }
            // follow symlinks so linked directories list as directories
            let meta = fs::metadata(entry.path())
                .inspect_err(|err| log::debug!("skipping entry {name:?} in {dir:?}: {err}"))
                .ok()?;
            Some(DirectoryEntry::new(&name, meta.is_dir()))
        })
        .collect();
    entries.sort();
    Ok(entries)
}

/// Serve the directory's index file or, when enabled, a listing.
pub fn index_or_list(dir: &Path, uri: &str, config: &Configuration) -> Outcome {
    if let Some(index) = find_index(dir, config.indexes()) {
        return Outcome::ServeFile(index);
    }
    if !config.auto_index() {
        return Outcome::NotFound;
    }
    match list_directory(dir) {
        Ok(entries) => Outcome::ServeListing {
            uri: uri.to_owned(),
            entries,
        },
        Err(err) => {
            log::warn!("failed to list {dir:?}: {err}");
            Outcome::from_io(&err)
        }
    }
}

/// Listing of configured shares for the virtual root.
///
/// Shares whose target cannot be read or is hidden are left out.
pub fn list_shares(config: &Configuration) -> Outcome {
    let entries = config
        .shares()
        .filter(|(name, path)| {
            let hidden_target = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_hidden);
            !is_hidden(name) && !hidden_target
        })
        .filter_map(|(name, path)| match fs::metadata(path) {
            Ok(meta) => Some(DirectoryEntry::new(name, meta.is_dir())),
            Err(err) => {
                log::debug!("omitting share {name:?} at {path:?}: {err}");
                None
            }
        })
        .collect();
    Outcome::VirtualRootListing(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::Builder;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join(".env"), "secret").unwrap();
        dir
    }

    #[test]
    fn index_order_wins() {
        let dir = tree();
        fs::write(dir.path().join("index.htm"), "htm").unwrap();
        fs::write(dir.path().join("index.html"), "html").unwrap();

        let indexes = ["index.html".to_owned(), "index.htm".to_owned()];
        assert_eq!(
            find_index(dir.path(), &indexes),
            Some(dir.path().join("index.html"))
        );
        let indexes = ["default.html".to_owned(), "index.htm".to_owned()];
        assert_eq!(
            find_index(dir.path(), &indexes),
            Some(dir.path().join("index.htm"))
        );
    }

    #[test]
    fn index_must_be_a_file() {
        let dir = tree();
        fs::create_dir(dir.path().join("index.html")).unwrap();
        assert_eq!(find_index(dir.path(), &["index.html".to_owned()]), None);
    }

    #[test]
    fn lists_visible_entries_sorted() {
        let dir = tree();
        let entries = list_directory(dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::new("a.txt", false),
                DirectoryEntry::new("b.txt", false),
                DirectoryEntry::new("sub", true),
            ]
        );
        assert_eq!(entries[2].label(), "sub/");
    }

    #[test]
    fn listing_missing_directory_fails() {
        let dir = tree();
        assert!(list_directory(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn index_or_list_prefers_index() {
        let dir = tree();
        fs::write(dir.path().join("index.html"), "home").unwrap();
        let config = Builder::default()
            .index("index.html")
            .auto_index(true)
            .build();
        assert_eq!(
            index_or_list(dir.path(), "/", &config),
            Outcome::ServeFile(dir.path().join("index.html"))
        );
    }

    #[test]
    fn index_or_list_without_auto_index() {
        let dir = tree();
        let config = Builder::default().index("index.html").build();
        assert_eq!(index_or_list(dir.path(), "/", &config), Outcome::NotFound);
    }

    #[test]
    fn index_or_list_generates_listing() {
        let dir = tree();
        let config = Builder::default().auto_index(true).build();
        match index_or_list(dir.path(), "/files/", &config) {
            Outcome::ServeListing { uri, entries } => {
                assert_eq!(uri, "/files/");
                assert_eq!(entries.len(), 3);
            }
            outcome => panic!("unexpected outcome {outcome:?}"),
        }
    }

    #[test]
    fn lists_shares() {
        let dir = tree();
        let config = Builder::default()
            .share("zeta", dir.path().join("sub"))
            .share("alpha", dir.path().join("a.txt"))
            .share("missing", dir.path().join("missing"))
            .share("dotted", dir.path().join(".git"))
            .share(".secret", dir.path().join("sub"))
            .build();
        assert_eq!(
            list_shares(&config),
            Outcome::VirtualRootListing(vec![
                DirectoryEntry::new("alpha", false),
                DirectoryEntry::new("zeta", true),
            ])
        );
    }
}
