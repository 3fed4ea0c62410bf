use std::fmt;
use std::io;

use http::StatusCode;
use thiserror::Error;

/// Error returned by the [`tokio_util::codec::Decoder`] adapter.
///
/// The decoder trait requires an error type that can carry I/O failures of the
/// underlying transport, so the parse failure is wrapped here.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("parse error: {source}")]
    Parse {
        #[from]
        source: ParseError,
    },

    #[error("response head completed but no request context was supplied")]
    MissingRequestContext,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Terminal parse failure.
///
/// Once a parser has produced a `ParseError` it keeps returning the same value;
/// the byte stream can no longer be trusted and the connection must be closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed {production}: {reason}")]
    MalformedSyntax { production: Production, reason: String },

    #[error("{limit} too large, current: {current} exceed the limit {max}")]
    LimitExceeded { limit: Limit, current: u64, max: u64 },

    #[error("conflicting message framing: {reason}")]
    ConflictingFraming { reason: String },

    #[error("invalid framing value: {reason}")]
    InvalidFramingValue { reason: String },
}

/// Field-less classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A byte violated the grammar of a production.
    MalformedSyntax,
    /// A configured maximum was surpassed (resource exhaustion).
    ///
    /// This includes a chunk-size that decodes but is above `max_chunk_size`.
    /// A chunk-size too large for a `u64` is [`ErrorKind::InvalidFramingValue`].
    /// Once a line or section is longer than its limit, a malformed byte after
    /// that point is not reported.
    LimitExceeded,
    /// Transfer-Encoding and Content-Length disagree about the body length.
    ConflictingFraming,
    /// Content-Length or chunk-size could not be decoded.
    InvalidFramingValue,
}

impl ParseError {
    pub fn malformed<S: ToString>(production: Production, reason: S) -> Self {
        Self::MalformedSyntax { production, reason: reason.to_string() }
    }

    pub fn limit_exceeded(limit: Limit, current: u64, max: u64) -> Self {
        Self::LimitExceeded { limit, current, max }
    }

    pub fn conflicting_framing<S: ToString>(reason: S) -> Self {
        Self::ConflictingFraming { reason: reason.to_string() }
    }

    pub fn invalid_framing_value<S: ToString>(reason: S) -> Self {
        Self::InvalidFramingValue { reason: reason.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSyntax { .. } => ErrorKind::MalformedSyntax,
            Self::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::ConflictingFraming { .. } => ErrorKind::ConflictingFraming,
            Self::InvalidFramingValue { .. } => ErrorKind::InvalidFramingValue,
        }
    }

    /// Returns true if the failure was caused by a configured limit rather than by bad syntax.
    #[inline]
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, Self::LimitExceeded { .. })
    }

    /// The status code a server should answer a failed *request* with.
    ///
    /// - over-long start-line: `414 URI Too Long`
    /// - header line, header count or head size: `431 Request Header Fields Too Large`
    /// - chunk size: `413 Payload Too Large`
    /// - everything else: `400 Bad Request`
    pub fn status_hint(&self) -> StatusCode {
        match self {
            Self::LimitExceeded { limit: Limit::StartLine, .. } => StatusCode::URI_TOO_LONG,
            Self::LimitExceeded { limit: Limit::ChunkSize, .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::LimitExceeded { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// A named unit of the HTTP/1.1 grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    Method,
    RequestTarget,
    HttpVersion,
    StatusCode,
    ReasonPhrase,
    HeaderName,
    HeaderValue,
    Crlf,
    ChunkSizeLine,
    ChunkData,
    TrailerField,
    LastChunk,
    MessageBody,
}

impl Production {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::RequestTarget => "request-target",
            Self::HttpVersion => "HTTP-version",
            Self::StatusCode => "status-code",
            Self::ReasonPhrase => "reason-phrase",
            Self::HeaderName => "header-name",
            Self::HeaderValue => "header-value",
            Self::Crlf => "CRLF",
            Self::ChunkSizeLine => "chunk-size",
            Self::ChunkData => "chunk-data",
            Self::TrailerField => "trailer-field",
            Self::LastChunk => "last-chunk",
            Self::MessageBody => "message-body",
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The configured maximum a [`ParseError::LimitExceeded`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    StartLine,
    HeaderLine,
    HeaderCount,
    HeadSize,
    ChunkSize,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartLine => "start line",
            Self::HeaderLine => "header line",
            Self::HeaderCount => "header count",
            Self::HeadSize => "head size",
            Self::ChunkSize => "chunk size",
        };
        f.write_str(name)
    }
}
