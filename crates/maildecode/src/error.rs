//! Error types for message decoding.

use std::fmt;

use crate::walker::MultipartKind;

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The parsing stage an [`Error`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Header framing or structured header field parsing.
    Header,
    /// `Content-Type` / `Content-Transfer-Encoding` syntax.
    MediaType,
    /// Reading or decoding body content.
    Decode,
    /// Assigning a part to a body, attachment or embedded file.
    Classification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "header normalization"),
            Self::MediaType => write!(f, "media type parsing"),
            Self::Decode => write!(f, "body decoding"),
            Self::Classification => write!(f, "classification"),
        }
    }
}

/// Message decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The header block could not be split into fields.
    #[error("Malformed header block: {0}")]
    Header(String),

    /// Malformed `Content-Type`, `Content-Disposition` or
    /// `Content-Transfer-Encoding` value.
    #[error("Invalid media type {value:?}: {reason}")]
    MediaType {
        /// The offending header value.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Well-formed but unhandled transfer encoding.
    #[error("Unsupported transfer encoding: {0}")]
    UnsupportedEncoding(String),

    /// Content did not match its declared transfer encoding.
    #[error("Invalid {encoding} content: {reason}")]
    Decode {
        /// The declared transfer encoding.
        encoding: String,
        /// Decoder failure description.
        reason: String,
    },

    /// An address header did not follow RFC 5322 mailbox syntax.
    #[error("Invalid address in {field} header {value:?}: {reason}")]
    AddressParse {
        /// Header name.
        field: String,
        /// Raw header value.
        value: String,
        /// Parser failure description.
        reason: String,
    },

    /// A date header matched none of the accepted formats.
    #[error("Invalid date in {field} header: {value:?}")]
    DateParse {
        /// Header name.
        field: String,
        /// Raw header value.
        value: String,
    },

    /// The message's own content type is not one we can dispatch on.
    #[error("Unknown top level mime type: {0}")]
    UnknownTopLevelType(String),

    /// A part's content type is not allowed where it appears.
    #[error("Can't process {kind} inner mime type: {content_type}")]
    UnknownPartType {
        /// Offending content type.
        content_type: String,
        /// Enclosing multipart kind.
        kind: MultipartKind,
    },

    /// Multipart content type without a `boundary` parameter.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// The multipart body does not follow RFC 2046 framing.
    #[error("Invalid multipart structure: {0}")]
    Multipart(String),

    /// Multipart nesting is deeper than the configured limit.
    #[error("Multipart nesting exceeds limit of {0}")]
    DepthLimitExceeded(usize),

    /// The input is larger than the configured limit in bytes.
    #[error("Message exceeds limit of {0} bytes")]
    MessageTooLarge(usize),
}

impl Error {
    pub(crate) fn media_type(value: &str, reason: impl Into<String>) -> Self {
        Self::MediaType {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the stage of parsing that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Header(_)
            | Self::AddressParse { .. }
            | Self::DateParse { .. }
            | Self::MessageTooLarge(_) => Stage::Header,
            Self::MediaType { .. } | Self::MissingBoundary => Stage::MediaType,
            Self::Io(_)
            | Self::UnsupportedEncoding(_)
            | Self::Decode { .. }
            | Self::Multipart(_) => Stage::Decode,
            Self::UnknownTopLevelType(_)
            | Self::UnknownPartType { .. }
            | Self::DepthLimitExceeded(_) => Stage::Classification,
        }
    }
}
