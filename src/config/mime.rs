//! Extension to MIME-Type Table

use std::{collections::HashMap, path::PathBuf};

use anyhow::{Context, Result};

/// Content type served when no extension mapping matches.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Lower-case file extension (no dot) to MIME type mapping.
#[derive(Clone, Debug, Default)]
pub struct MimeTypes(HashMap<String, String>);

impl MimeTypes {
    /// Parse a `type ext1 ext2 ...` table, merging into the current mappings.
    ///
    /// Text after `#` is ignored and lines with fewer than two tokens are skipped.
    pub fn parse(&mut self, text: &str) {
        for line in text.lines() {
            let line = line.split_once('#').map(|(l, _)| l).unwrap_or(line);
            let mut tokens = line.split([' ', '\t', '\r']).filter(|t| !t.is_empty());
            let Some(mime) = tokens.next() else {
                continue;
            };
            for ext in tokens {
                self.0.insert(ext.to_lowercase(), mime.to_owned());
            }
        }
    }

    /// Load every table in order, later tables overriding earlier ones.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut table = Self::default();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read mime types: {path:?}"))?;
            table.parse(&text);
            log::debug!("loaded mime types from {path:?}");
        }
        Ok(table)
    }

    /// Find the MIME type for an extension, ignoring case.
    pub fn lookup(&self, ext: &str) -> &str {
        self.0
            .get(&ext.to_lowercase())
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for MimeTypes {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(ext, mime)| (ext.to_lowercase(), mime))
                .collect(),
        )
    }
}
