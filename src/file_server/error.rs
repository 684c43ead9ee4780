//! Request Rejection Errors

use derive_more::Display;

use super::Outcome;

#[derive(Debug, PartialEq, Eq, Display)]
#[non_exhaustive]
pub enum RequestError {
    /// Only `GET` is served.
    #[display("method not allowed")]
    MethodNotAllowed,

    /// Request uri is longer than the configured limit.
    #[display("uri exceeds {_0} characters")]
    UriTooLong(usize),

    /// Request uri path does not begin with `/`.
    #[display("uri path is not absolute")]
    NotAbsolute,

    /// Segment is a `.` or `..` relative reference.
    #[display("segment is a relative reference: ('{_0}')")]
    DotSegment(String),

    /// Segment contained the wrapped invalid character.
    #[display("segment contained invalid character ('{}')", _0.escape_default())]
    BadChar(char),

    /// Segment is not a plain filename on this platform.
    #[display("segment is not a plain filename: ('{_0}')")]
    BadSegment(String),

    /// Segment holds a `%` not followed by two hex digits.
    #[display("segment contains a malformed percent-escape: ('{_0}')")]
    BadEscape(String),

    /// Path is not a valid UTF-8 string after percent-decoding.
    #[display("path is not a valid UTF-8 string after percent-decoding")]
    NotValidUtf8,
}

impl RequestError {
    /// Routing outcome reported for the rejected request.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::MethodNotAllowed => Outcome::MethodNotAllowed,
            Self::UriTooLong(_) => Outcome::UriTooLong,
            _ => Outcome::BadRequest,
        }
    }
}
