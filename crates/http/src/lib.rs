//! An incremental, non-blocking HTTP/1.1 message parser
//!
//! This crate parses HTTP/1.1 requests and responses from bytes that arrive in
//! arbitrary pieces, as they do from a socket. It never performs I/O and never
//! blocks: the caller feeds whatever it has received and asks the parser to
//! advance, and the parser reports either the next event or that it needs more
//! input.
//!
//! # Features
//!
//! - Request and response parsing, including chunked transfer coding and trailers
//! - Identical results however the input is fragmented
//! - Zero-copy output: header names, values and body chunks share the received buffer
//! - Strict framing: conflicting `Transfer-Encoding`/`Content-Length`, bare LF
//!   and obsolete line folding are rejected
//! - Configurable limits, reported apart from syntax errors
//! - A [`tokio_util::codec::Decoder`] adapter
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::{Advance, ParserConfig, ProtocolParser};
//!
//! let mut parser = ProtocolParser::request(ParserConfig::default());
//!
//! parser.feed(b"GET /index.html HTTP/1.1\r\nHost: 127.0.");
//! assert_eq!(parser.advance(), Advance::NeedMoreInput);
//!
//! parser.feed(b"0.1:8080\r\nAccept: */*\r\n\r\n");
//! let head = match parser.advance() {
//!     Advance::HeadReady(head) => head.into_request().unwrap(),
//!     other => panic!("unexpected {other:?}"),
//! };
//! assert_eq!(head.uri().path(), "/index.html");
//! assert_eq!(head.headers().get("host").unwrap(), "127.0.0.1:8080");
//! assert_eq!(parser.advance(), Advance::Done);
//! ```
//!
//! # Architecture
//!
//! - [`codec`]: the parser, its configuration, the byte cursor and the decoder adapter
//! - [`protocol`]: message heads, header fields, payload items and errors
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: terminal parse failure, classified by [`protocol::ErrorKind`]
//! - [`protocol::HttpError`]: error of the decoder adapter, also carrying I/O errors
//!
//! A failed parser keeps returning the same error. The connection can no longer
//! be trusted; [`protocol::ParseError::status_hint`] suggests the status to
//! answer a failed request with before closing it.
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - No message serialization
//! - Default maximum start line and header line: 8KB
//! - Default maximum number of headers: 64

pub mod codec;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
