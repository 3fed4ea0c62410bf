//! [`tokio_util::codec::Decoder`] adapter over [`ProtocolParser`].
//!
//! Lets the parser sit under a [`FramedRead`](tokio_util::codec::FramedRead):
//! every message comes out as one [`Message::Header`], zero or more
//! [`PayloadItem::Chunk`]s and a final [`PayloadItem::Eof`].
//!
//! # Example
//!
//! ```
//! use futures::StreamExt;
//! use micro_h1::codec::MessageDecoder;
//! use micro_h1::protocol::Message;
//! use tokio_util::codec::FramedRead;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let input: &[u8] = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
//! let mut framed = FramedRead::new(input, MessageDecoder::request());
//!
//! let Some(Ok(Message::Header(head))) = framed.next().await else { panic!() };
//! assert_eq!(head.headers().get("host").unwrap(), "example.com");
//! assert!(matches!(framed.next().await, Some(Ok(Message::Payload(_)))));
//! assert!(framed.next().await.is_none());
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::{Advance, ParserConfig, ProtocolParser};
use crate::protocol::{HttpError, Message, MessageHead, PayloadItem, RequestContext};

/// Streams parsed messages out of a transport buffer.
///
/// Buffered bytes are moved into the parser on each call, so the transport's
/// buffer is always left empty. Errors are final: a `FramedRead` yields no
/// items after the first one.
#[derive(Debug)]
pub struct MessageDecoder {
    parser: ProtocolParser,
}

impl MessageDecoder {
    /// Decoder for requests with the default configuration.
    pub fn request() -> Self {
        Self::new(ProtocolParser::request(ParserConfig::default()))
    }

    /// Decoder for responses with the default configuration.
    ///
    /// A response head cannot be completed without the request it answers.
    /// Set it with [`MessageDecoder::set_request_context`] before polling:
    /// the decoder otherwise returns [`HttpError::MissingRequestContext`], and
    /// a [`FramedRead`](tokio_util::codec::FramedRead) ends its stream after
    /// any error. To parse several responses, use [`MessageDecoder::new`] with
    /// a parser that already holds the context, or set the next one after each `Eof`.
    pub fn response() -> Self {
        Self::new(ProtocolParser::response(ParserConfig::default()))
    }

    pub fn new(parser: ProtocolParser) -> Self {
        Self { parser }
    }

    /// The underlying parser, e.g. to read trailers after the `Eof` item.
    pub fn parser(&self) -> &ProtocolParser {
        &self.parser
    }

    /// See [`ProtocolParser::set_request_context`].
    pub fn set_request_context(&mut self, context: RequestContext) {
        self.parser.set_request_context(context);
    }

    fn next_message(&mut self) -> Result<Option<Message<MessageHead>>, HttpError> {
        let message = match self.parser.advance() {
            Advance::NeedMoreInput => None,
            Advance::NeedRequestContext => return Err(HttpError::MissingRequestContext),
            Advance::HeadReady(head) => Some(Message::Header(head)),
            Advance::BodyChunkReady(bytes) => Some(Message::Payload(PayloadItem::Chunk(bytes))),
            Advance::Done => Some(Message::Payload(PayloadItem::Eof)),
            Advance::Failed(e) => return Err(e.into()),
        };
        Ok(message)
    }
}

impl Decoder for MessageDecoder {
    type Item = Message<MessageHead>;
    type Error = HttpError;

    /// # Returns
    ///
    /// - `Ok(Some(Message::Header(_)))`: a message head is complete
    /// - `Ok(Some(Message::Payload(_)))`: a body chunk, or the end of the body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the input is malformed, or a response needs its request context
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            trace!(len = src.len(), "feeding received bytes");
            self.parser.feed_bytes(src.split());
        }
        self.next_message()
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.parser.finish();
        self.decode(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorKind, ParseError};
    use bytes::Bytes;
    use http::{Method, StatusCode};

    #[test]
    fn yields_head_chunks_and_eof() {
        let mut decoder = MessageDecoder::request();
        let mut buf = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 6\r\n\r\nabc"[..]);

        let head = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(head.is_header());
        assert!(buf.is_empty());

        let chunk = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.into_payload_item().unwrap().into_bytes().unwrap(), Bytes::from_static(b"abc"));
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"def");
        let chunk = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(chunk.into_payload_item().unwrap().as_bytes().unwrap(), "def");

        let eof = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(eof.into_payload_item().unwrap().is_eof());
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.parser().consumed(), 44);
    }

    #[test]
    fn parse_errors_are_wrapped() {
        let mut decoder = MessageDecoder::request();
        let mut buf = BytesMut::from(&b"GET / HTTP/3.0\r\n\r\n"[..]);

        match decoder.decode(&mut buf) {
            Err(HttpError::Parse { source }) => assert_eq!(source.kind(), ErrorKind::MalformedSyntax),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn eof_inside_a_message_is_an_error() {
        let mut decoder = MessageDecoder::request();
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        match decoder.decode_eof(&mut buf) {
            Err(HttpError::Parse { source: ParseError::MalformedSyntax { .. } }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn response_without_context_is_an_error() {
        let mut decoder = MessageDecoder::response();
        let mut buf = BytesMut::from(&b"HTTP/1.1 204 No Content\r\n\r\n"[..]);
        assert!(matches!(decoder.decode(&mut buf), Err(HttpError::MissingRequestContext)));

        decoder.set_request_context(RequestContext::new(Method::DELETE));
        let Some(Message::Header(head)) = decoder.decode(&mut buf).unwrap() else {
            panic!("expected the response head");
        };
        assert_eq!(head.as_response().unwrap().status(), StatusCode::NO_CONTENT);
        assert!(decoder.decode(&mut buf).unwrap().unwrap().into_payload_item().unwrap().is_eof());
    }

    #[test]
    fn trailers_are_readable_after_eof() {
        let mut decoder = MessageDecoder::request();
        let input = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\nX-Sum: 7\r\n\r\n";
        let mut buf = BytesMut::from(&input[..]);

        assert!(decoder.decode(&mut buf).unwrap().unwrap().is_header());
        assert!(decoder.decode(&mut buf).unwrap().unwrap().into_payload_item().unwrap().is_eof());
        assert_eq!(decoder.parser().trailers().get("x-sum").unwrap(), "7");
    }
}
