//! Request Validation and Uri Path Parsing

use std::path::{Component, Path};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use super::error::RequestError;

/// Methods longer than this are not echoed into the log.
pub const MAX_LOGGED_METHOD: usize = 32;

/// Characters escaped when a segment is written back into a uri.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode a single path segment.
#[inline]
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Validated, percent-decoded request path.
///
/// Always rooted and never contains `.` or `..` segments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UriPath {
    segments: Vec<String>,
    directory: bool,
}

impl UriPath {
    /// Parse the path portion of a raw request uri.
    ///
    /// Query strings are dropped and empty segments collapse.
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let path = raw.split_once('?').map(|(p, _)| p).unwrap_or(raw);
        if !path.starts_with('/') {
            return Err(RequestError::NotAbsolute);
        }
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            directory: path.ends_with('/'),
            segments,
        })
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True when the uri ended with a trailing slash.
    #[inline]
    pub fn is_directory(&self) -> bool {
        self.directory
    }

    /// True for exactly `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.directory && self.segments.is_empty()
    }

    /// Same path with a trailing slash.
    pub fn to_directory(&self) -> Self {
        Self {
            segments: self.segments.clone(),
            directory: true,
        }
    }

    /// Decoded form used in listing titles.
    pub fn display(&self) -> String {
        self.join(|s| s.to_owned())
    }

    /// Percent-encoded form used in `Location` headers.
    pub fn encoded(&self) -> String {
        self.join(encode_segment)
    }

    fn join(&self, f: impl Fn(&str) -> String) -> String {
        let mut uri = String::from("/");
        uri.push_str(
            &self
                .segments
                .iter()
                .map(|s| f(s))
                .collect::<Vec<_>>()
                .join("/"),
        );
        if self.directory && !self.segments.is_empty() {
            uri.push('/');
        }
        uri
    }
}

/// Every `%` must start a two digit hex escape.
fn check_escapes(raw: &str) -> Result<(), RequestError> {
    let valid = raw.match_indices('%').all(|(i, _)| {
        raw.as_bytes()
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    match valid {
        true => Ok(()),
        false => Err(RequestError::BadEscape(raw.to_owned())),
    }
}

fn parse_segment(raw: &str) -> Result<String, RequestError> {
    check_escapes(raw)?;
    let segment = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| RequestError::NotValidUtf8)?;
    if segment == "." || segment == ".." {
        return Err(RequestError::DotSegment(segment.into_owned()));
    }
    if let Some(c) = segment.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(RequestError::BadChar(c));
    }
    // drive prefixes and other platform specific components
    let mut components = Path::new(&*segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(segment.into_owned()),
        _ => Err(RequestError::BadSegment(segment.into_owned())),
    }
}

/// Outcome of request validation.
#[derive(Debug)]
pub struct Validated {
    pub path: Result<UriPath, RequestError>,
    /// False when the request line is too large or garbled to log verbatim.
    pub loggable: bool,
}

/// Check method and uri shape before any filesystem access.
pub fn validate(method: &str, raw_uri: &str, max_uri_length: usize) -> Validated {
    let loggable = method.len() <= MAX_LOGGED_METHOD && raw_uri.len() <= max_uri_length;
    let path = if method != "GET" {
        Err(RequestError::MethodNotAllowed)
    } else if raw_uri.len() > max_uri_length {
        Err(RequestError::UriTooLong(max_uri_length))
    } else {
        UriPath::parse(raw_uri)
    };
    Validated { path, loggable }
}
