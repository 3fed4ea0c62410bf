#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use indoc::indoc;
use micro_h1::codec::{Advance, ParserConfig, ProtocolParser};
use micro_h1::protocol::{Headers, MessageHead, ParseError};

/// A completely parsed message, with the body reassembled from its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub head: MessageHead,
    pub body: Vec<u8>,
    pub trailers: Headers,
    /// Bytes consumed between the end of the previous message and the end of this one
    pub consumed: u64,
}

/// Converts a fixture written with LF line ends to the CRLF wire format.
pub fn crlf(message: &str) -> Vec<u8> {
    message.replace('\n', "\r\n").into_bytes()
}

/// Valid request streams used by the fragmentation tests.
pub fn request_fixtures() -> Vec<Vec<u8>> {
    vec![
        crlf(indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##}),
        crlf(indoc! {r##"
        POST /submit?debug=1 HTTP/1.1
        Host: example.com
        Content-Type:   application/json
        Content-Length: 18

        {"name":"hello"}
        "##}),
        crlf(indoc! {r##"
        POST /upload HTTP/1.1
        Transfer-Encoding: gzip, chunked

        4;ext="a b"
        Wiki
        5
        pedia
        e
         in

        chunks.
        0
        Checksum: 42

        "##}),
        // pipelined: a body-less request, a Content-Length one and a chunked one
        crlf(indoc! {r##"
        GET /a HTTP/1.1
        Host: x

        PUT /b HTTP/1.0
        Content-Length: 3

        abcDELETE /c HTTP/1.1
        Transfer-Encoding: chunked

        3
        xyz
        0

        "##}),
    ]
}

/// Feeds `pieces` one at a time, draining the parser after each, then signals
/// the end of input. Asserts that waiting for input never consumes anything.
pub fn parse_pieces<'a>(
    mut parser: ProtocolParser,
    pieces: impl IntoIterator<Item = &'a [u8]>,
) -> Result<Vec<Parsed>, ParseError> {
    let mut messages = Vec::new();
    let mut current: Option<(MessageHead, Vec<u8>)> = None;
    let mut consumed_at_done = 0;

    let mut drain = |parser: &mut ProtocolParser| -> Result<(), ParseError> {
        loop {
            let before = parser.consumed();
            match parser.advance() {
                Advance::NeedMoreInput => {
                    assert_eq!(parser.consumed(), before, "NeedMoreInput must not consume");
                    return Ok(());
                }
                Advance::NeedRequestContext => panic!("fixtures are requests"),
                Advance::HeadReady(head) => {
                    assert!(current.is_none(), "head before the previous message was done");
                    current = Some((head, Vec::new()));
                }
                Advance::BodyChunkReady(chunk) => {
                    assert!(!chunk.is_empty(), "body chunks are never empty");
                    let (_, body) = current.as_mut().expect("body chunk without a head");
                    body.extend_from_slice(&chunk);
                }
                Advance::Done => {
                    let (head, body) = current.take().expect("done without a head");
                    let consumed = parser.consumed() - consumed_at_done;
                    consumed_at_done = parser.consumed();
                    messages.push(Parsed { head, body, trailers: parser.trailers().clone(), consumed });
                }
                Advance::Failed(e) => return Err(e),
            }
        }
    };

    for piece in pieces {
        parser.feed(piece);
        drain(&mut parser)?;
    }
    parser.finish();
    drain(&mut parser)?;

    Ok(messages)
}

pub fn parse_request_pieces<'a>(pieces: impl IntoIterator<Item = &'a [u8]>) -> Result<Vec<Parsed>, ParseError> {
    parse_pieces(ProtocolParser::request(ParserConfig::default()), pieces)
}

pub fn parse_request(message: &[u8]) -> Result<Vec<Parsed>, ParseError> {
    parse_request_pieces([message])
}

/// Deterministic xorshift generator, enough to pick split points.
#[derive(Debug)]
pub struct SplitRng(u64);

impl SplitRng {
    pub fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    pub fn next_below(&mut self, bound: usize) -> usize {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 % bound as u64) as usize
    }

    /// Splits `message` into random pieces of 1 to `max_piece` bytes.
    pub fn split<'a>(&mut self, message: &'a [u8], max_piece: usize) -> Vec<&'a [u8]> {
        let mut pieces = Vec::new();
        let mut rest = message;
        while !rest.is_empty() {
            let len = (self.next_below(max_piece) + 1).min(rest.len());
            let (piece, tail) = rest.split_at(len);
            pieces.push(piece);
            rest = tail;
        }
        pieces
    }
}
