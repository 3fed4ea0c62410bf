//! HTTP/1.1 message decoding
//!
//! This module holds the incremental parser and the pieces it is built from.
//!
//! # Architecture
//!
//! - [`ByteCursor`]: accumulates received bytes and hands out consumed prefixes
//!   as shared [`Bytes`](bytes::Bytes) without copying
//! - production matchers: one pure function per grammar production, reporting
//!   `Complete`, `Incomplete` or `Invalid` for the start of a buffer
//! - framing: decides from a completed head how its body ends
//! - [`ProtocolParser`]: the state machine driving the matchers, see
//!   [`ProtocolParser::advance`]
//! - [`MessageDecoder`]: a [`tokio_util::codec::Decoder`] for use with
//!   `FramedRead`
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::{Advance, ParserConfig, ProtocolParser};
//! use micro_h1::protocol::PayloadSize;
//!
//! let mut parser = ProtocolParser::request(ParserConfig::default());
//! for piece in [&b"GET /a HT"[..], b"TP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n", b"3\r\nabc\r\n0\r\n\r\n"] {
//!     parser.feed(piece);
//! }
//!
//! let Advance::HeadReady(head) = parser.advance() else { panic!() };
//! assert_eq!(head.payload_size(), PayloadSize::Chunked);
//! assert_eq!(parser.advance(), Advance::BodyChunkReady("abc".into()));
//! assert_eq!(parser.advance(), Advance::Done);
//! ```

mod config;
mod cursor;
mod framing;
mod matcher;
mod message_decoder;
mod parser;

pub use config::{
    DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_HEAD_SIZE, DEFAULT_MAX_HEADER_COUNT, DEFAULT_MAX_HEADER_LINE_LENGTH,
    DEFAULT_MAX_START_LINE_LENGTH, ParserConfig,
};
pub use cursor::{ByteCursor, RangeError};
pub use message_decoder::MessageDecoder;
pub use parser::{Advance, ParserState, ProtocolParser};
