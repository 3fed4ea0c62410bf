//! The incremental HTTP/1.1 message parser.
//!
//! [`ProtocolParser`] owns the unconsumed bytes of one connection and a state
//! machine over the grammar productions. Input is pushed with
//! [`ProtocolParser::feed`]; [`ProtocolParser::advance`] runs the machine as far
//! as the buffered bytes allow and reports the next event. The parser performs
//! no I/O: running out of input is the [`Advance::NeedMoreInput`] return value.
//!
//! ```text
//! START -> HEAD_LINE -> HEADERS -+-> DONE
//!                                +-> BODY_CONTENT_LENGTH -> DONE
//!                                +-> BODY_UNTIL_CLOSE -> DONE (on finish)
//!                                +-> BODY_CHUNK_SIZE <-> BODY_CHUNK_DATA
//!                                        |
//!                                        +-> BODY_CHUNK_TRAILER -> DONE
//! ```

use std::fmt;

use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode, Uri, Version};
use tracing::{debug, trace};

use crate::codec::config::ParserConfig;
use crate::codec::cursor::ByteCursor;
use crate::codec::framing::{request_payload_size, response_payload_size};
use crate::codec::matcher::{
    ChunkData, FieldIndex, FieldSection, Match, RequestLine, StatusLine, match_chunk_data, match_chunk_size_line,
    match_crlf, match_field_line, match_request_line, match_status_line,
};
use crate::ensure;
use crate::protocol::{
    HeaderField, Headers, Limit, MessageHead, ParseError, PayloadSize, Production, RequestContext, RequestHead,
    ResponseHead,
};

/// Where the parser is within the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    /// Between messages
    Start,
    /// Reading the request-line or status-line
    HeadLine,
    /// Reading header fields
    Headers,
    BodyContentLength,
    /// Reading a response body delimited by the end of input
    BodyUntilClose,
    BodyChunkSize,
    BodyChunkData,
    BodyChunkTrailer,
    /// The message is complete
    Done,
    /// A parse error occurred; permanent
    Error,
}

impl fmt::Display for ParserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::HeadLine => "HEAD_LINE",
            Self::Headers => "HEADERS",
            Self::BodyContentLength => "BODY_CONTENT_LENGTH",
            Self::BodyUntilClose => "BODY_UNTIL_CLOSE",
            Self::BodyChunkSize => "BODY_CHUNK_SIZE",
            Self::BodyChunkData => "BODY_CHUNK_DATA",
            Self::BodyChunkTrailer => "BODY_CHUNK_TRAILER",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Event reported by [`ProtocolParser::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The buffered bytes are exhausted; feed more and call again. Nothing was consumed.
    NeedMoreInput,
    /// A response head is complete but its framing depends on the request it
    /// answers. Supply it with [`ProtocolParser::set_request_context`] and call again.
    NeedRequestContext,
    /// Start-line and header fields are complete.
    HeadReady(MessageHead),
    /// The next piece of the body, in order. Chunked framing is already removed.
    BodyChunkReady(Bytes),
    /// The current message is complete. The following call starts the next message.
    Done,
    /// The input is malformed or exceeded a limit. Every later call returns the same error.
    Failed(ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Request,
    Response,
}

#[derive(Debug)]
enum StartLine {
    Request { method: Method, uri: Uri, version: Version },
    Status { version: Version, status: StatusCode, reason: Bytes },
}

/// Incremental parser for the messages of one connection.
///
/// A parser reads either requests or responses. It is meant to be owned by the
/// connection task and is neither shared nor synchronized.
///
/// ```
/// use micro_h1::codec::{Advance, ProtocolParser, ParserConfig};
///
/// let mut parser = ProtocolParser::request(ParserConfig::default());
/// parser.feed(b"POST /echo HTTP/1.1\r\nContent-Le");
/// assert_eq!(parser.advance(), Advance::NeedMoreInput);
///
/// parser.feed(b"ngth: 5\r\n\r\nhello");
/// let Advance::HeadReady(head) = parser.advance() else { panic!() };
/// assert_eq!(head.as_request().unwrap().uri().path(), "/echo");
/// assert_eq!(parser.advance(), Advance::BodyChunkReady("hello".into()));
/// assert_eq!(parser.advance(), Advance::Done);
/// ```
#[derive(Debug)]
pub struct ProtocolParser {
    role: Role,
    config: ParserConfig,
    cursor: ByteCursor,
    state: ParserState,
    /// Set by [`ProtocolParser::finish`]: no more input will arrive
    eof: bool,
    context: Option<RequestContext>,

    start_line: Option<StartLine>,
    headers: Headers,
    /// Bytes of the current head, or of the current trailer section, consumed so far
    section_size: usize,
    /// Body bytes still owed by the current Content-Length body or chunk
    remaining: u64,
    trailers: Headers,

    done_reported: bool,
    error: Option<ParseError>,
}

impl ProtocolParser {
    /// Creates a parser reading requests, as a server does.
    pub fn request(config: ParserConfig) -> Self {
        Self::new(Role::Request, config)
    }

    /// Creates a parser reading responses, as a client does.
    ///
    /// Responses can only be framed knowing the request they answer; see
    /// [`ProtocolParser::set_request_context`].
    pub fn response(config: ParserConfig) -> Self {
        Self::new(Role::Response, config)
    }

    fn new(role: Role, config: ParserConfig) -> Self {
        Self {
            role,
            config,
            cursor: ByteCursor::new(),
            state: ParserState::Start,
            eof: false,
            context: None,
            start_line: None,
            headers: Headers::new(),
            section_size: 0,
            remaining: 0,
            trailers: Headers::new(),
            done_reported: false,
            error: None,
        }
    }

    /// Appends received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.cursor.append(bytes);
    }

    /// Appends a received buffer without copying it when nothing is buffered.
    pub fn feed_bytes(&mut self, bytes: BytesMut) {
        self.cursor.extend(bytes);
    }

    /// Signals the end of input.
    ///
    /// Afterwards a message cut short fails with a
    /// [`MalformedSyntax`](ParseError::MalformedSyntax) error, a close-delimited
    /// body ends with [`Advance::Done`], and a connection closed between
    /// messages keeps answering [`Advance::NeedMoreInput`].
    pub fn finish(&mut self) {
        self.eof = true;
    }

    /// Describes the request the next response answers.
    ///
    /// An informational (1xx) response leaves the context in place for the
    /// final response; any other response uses it up.
    pub fn set_request_context(&mut self, context: RequestContext) {
        self.context = Some(context);
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Number of received bytes not consumed yet.
    pub fn buffered(&self) -> usize {
        self.cursor.len()
    }

    /// Number of bytes consumed since construction or the last [`reset`](ProtocolParser::reset).
    pub fn consumed(&self) -> u64 {
        self.cursor.total_consumed()
    }

    /// Trailer fields of the chunked message just completed; empty otherwise.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    /// Returns the parser to its freshly constructed state, dropping buffered
    /// bytes, the request context and any error.
    pub fn reset(&mut self) {
        *self = Self::new(self.role, self.config.clone());
    }

    /// Runs the state machine over the buffered bytes until it has an event to report.
    pub fn advance(&mut self) -> Advance {
        if let Some(e) = &self.error {
            return Advance::Failed(e.clone());
        }

        match self.step() {
            Ok(advance) => advance,
            Err(e) => {
                debug!(cause = %e, state = %self.state, consumed = self.consumed(), "parse failed");
                self.state = ParserState::Error;
                self.error = Some(e.clone());
                Advance::Failed(e)
            }
        }
    }

    fn step(&mut self) -> Result<Advance, ParseError> {
        loop {
            let advance = match self.state {
                ParserState::Start => self.read_start()?,
                ParserState::HeadLine => self.read_head_line()?,
                ParserState::Headers => self.read_header()?,
                ParserState::BodyContentLength => self.read_length_body()?,
                ParserState::BodyUntilClose => self.read_until_close_body()?,
                ParserState::BodyChunkSize => self.read_chunk_size()?,
                ParserState::BodyChunkData => self.read_chunk_data()?,
                ParserState::BodyChunkTrailer => self.read_trailer()?,
                ParserState::Done => self.read_done(),
                ParserState::Error => {
                    // advance() returns the stored error before stepping
                    return Err(ParseError::malformed(Production::MessageBody, "parser is in the error state"));
                }
            };

            if let Some(advance) = advance {
                return Ok(advance);
            }
        }
    }

    fn transition(&mut self, next: ParserState) {
        trace!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    /// Consumes `n` matched bytes and hands them out.
    fn take(&mut self, n: usize) -> Bytes {
        let taken = self.cursor.split_to(n);
        debug_assert!(taken.is_ok(), "matched past the buffered input");
        taken.unwrap_or_default()
    }

    fn skip(&mut self, n: usize) {
        let skipped = self.cursor.consume(n);
        debug_assert!(skipped.is_ok(), "matched past the buffered input");
    }

    /// Outcome of an `Incomplete` match: either wait for input or, after the
    /// end of input, fail with a truncation error.
    fn incomplete(&self, production: Production) -> Result<Option<Advance>, ParseError> {
        ensure!(!self.eof, ParseError::malformed(production, "input ended before the message was complete"));
        Ok(Some(Advance::NeedMoreInput))
    }

    /// Fails once the current section would grow past `max_head_size`; reports `max + 1`.
    fn check_section_size(&self, len: usize) -> Result<(), ParseError> {
        let max = self.config.max_head_size();
        ensure!(
            self.section_size.saturating_add(len) <= max,
            ParseError::limit_exceeded(Limit::HeadSize, (max as u64).saturating_add(1), max as u64)
        );
        Ok(())
    }

    /// Buffered input cut one byte past what the current section may still grow by.
    ///
    /// Bytes past the size limit are never matched, so a line running over it
    /// fails with the limit even if a malformed byte follows.
    fn section_view(&self) -> &[u8] {
        let budget = self.config.max_head_size().saturating_sub(self.section_size).saturating_add(1);
        let view = self.cursor.peek_from(0);
        &view[..view.len().min(budget)]
    }

    fn read_start(&mut self) -> Result<Option<Advance>, ParseError> {
        if self.role == Role::Request {
            // empty lines before a request-line are ignored
            while let Some(b'\r' | b'\n') = self.cursor.peek_from(0).first() {
                match match_crlf(self.cursor.peek_from(0), self.config.strict_crlf()) {
                    Match::Complete { len, .. } => self.skip(len),
                    Match::Incomplete => return self.incomplete(Production::Crlf),
                    Match::Invalid(e) => return Err(e),
                }
            }
        }

        if self.cursor.is_empty() {
            return Ok(Some(Advance::NeedMoreInput));
        }

        self.transition(ParserState::HeadLine);
        Ok(None)
    }

    fn read_head_line(&mut self) -> Result<Option<Advance>, ParseError> {
        let max = self.config.max_start_line_length();
        let strict = self.config.strict_crlf();

        let start_line = match self.role {
            Role::Request => match match_request_line(self.section_view(), max, strict) {
                Match::Complete { len, value } => self.request_line(len, value)?,
                Match::Incomplete => return self.head_line_incomplete(Production::Method),
                Match::Invalid(e) => return Err(e),
            },
            Role::Response => match match_status_line(self.section_view(), max, strict) {
                Match::Complete { len, value } => self.status_line(len, value)?,
                Match::Incomplete => return self.head_line_incomplete(Production::HttpVersion),
                Match::Invalid(e) => return Err(e),
            },
        };

        trace!(?start_line, "start line parsed");
        self.start_line = Some(start_line);
        self.transition(ParserState::Headers);
        Ok(None)
    }

    fn head_line_incomplete(&self, production: Production) -> Result<Option<Advance>, ParseError> {
        self.check_section_size(self.cursor.len())?;
        self.incomplete(production)
    }

    fn request_line(&mut self, len: usize, line: RequestLine) -> Result<StartLine, ParseError> {
        self.check_section_size(len)?;
        let bytes = self.take(len);
        self.section_size = len;

        let method = Method::from_bytes(&bytes[line.method]).map_err(|e| ParseError::malformed(Production::Method, e))?;
        let uri = Uri::from_maybe_shared(bytes.slice(line.target))
            .map_err(|e| ParseError::malformed(Production::RequestTarget, e))?;

        Ok(StartLine::Request { method, uri, version: line.version })
    }

    fn status_line(&mut self, len: usize, line: StatusLine) -> Result<StartLine, ParseError> {
        self.check_section_size(len)?;
        let bytes = self.take(len);
        self.section_size = len;

        Ok(StartLine::Status { version: line.version, status: line.status, reason: bytes.slice(line.reason) })
    }

    fn read_header(&mut self) -> Result<Option<Advance>, ParseError> {
        let max_line = self.config.max_header_line_length();
        let strict = self.config.strict_crlf();

        match match_field_line(self.section_view(), max_line, strict, FieldSection::Header) {
            Match::Complete { len, value: Some(index) } => {
                let field = self.field(len, index, self.headers.len())?;
                self.headers.append(field);
                Ok(None)
            }
            Match::Complete { len, value: None } => self.end_of_head(len),
            Match::Incomplete => {
                self.check_section_size(self.cursor.len())?;
                self.incomplete(Production::HeaderName)
            }
            Match::Invalid(e) => Err(e),
        }
    }

    /// Consumes one matched field line, enforcing the count and size limits of its section.
    fn field(&mut self, len: usize, index: FieldIndex, count: usize) -> Result<HeaderField, ParseError> {
        let max_count = self.config.max_header_count();
        ensure!(
            count < max_count,
            ParseError::limit_exceeded(Limit::HeaderCount, (count + 1) as u64, max_count as u64)
        );
        self.check_section_size(len)?;

        let line = self.take(len);
        self.section_size += len;
        trace!(len, name = ?line.slice(index.name.clone()), "field line parsed");
        Ok(HeaderField::new(line.slice(index.name), line.slice(index.value)))
    }

    fn end_of_head(&mut self, len: usize) -> Result<Option<Advance>, ParseError> {
        self.check_section_size(len)?;

        let Some(start_line) = self.start_line.take() else {
            return Err(ParseError::malformed(Production::HeaderName, "header section without a start line"));
        };

        let status = match &start_line {
            StartLine::Request { .. } => None,
            StartLine::Status { status, .. } => Some(*status),
        };

        let payload_size = match status {
            None => request_payload_size(&self.headers)?,
            Some(status) => {
                let Some(context) = &self.context else {
                    // the blank line stays buffered until the context arrives
                    self.start_line = Some(start_line);
                    return Ok(Some(Advance::NeedRequestContext));
                };
                let payload_size = response_payload_size(status, &self.headers, context)?;
                if !status.is_informational() {
                    self.context = None;
                }
                payload_size
            }
        };

        self.skip(len);
        let headers = std::mem::take(&mut self.headers);
        let head = match start_line {
            StartLine::Request { method, uri, version } => {
                MessageHead::Request(RequestHead::new(method, uri, version, headers, payload_size))
            }
            StartLine::Status { version, status, reason } => {
                MessageHead::Response(ResponseHead::new(version, status, reason, headers, payload_size))
            }
        };

        debug!(
            size = self.section_size + len,
            fields = head.headers().len(),
            payload_size = ?head.payload_size(),
            "head parsed"
        );

        let next = match head.payload_size() {
            size if size.is_empty() => ParserState::Done,
            PayloadSize::Length(length) => {
                self.remaining = length;
                ParserState::BodyContentLength
            }
            PayloadSize::Chunked => ParserState::BodyChunkSize,
            PayloadSize::UntilClose => ParserState::BodyUntilClose,
            PayloadSize::Empty => ParserState::Done,
        };
        self.transition(next);
        Ok(Some(Advance::HeadReady(head)))
    }

    fn read_length_body(&mut self) -> Result<Option<Advance>, ParseError> {
        if self.cursor.is_empty() {
            return self.incomplete(Production::MessageBody);
        }

        // capped by the buffered length, so it fits in usize
        let len = self.remaining.min(self.cursor.len() as u64) as usize;
        let chunk = self.take(len);
        self.remaining -= len as u64;
        trace!(len, remaining = self.remaining, "body bytes read");

        if self.remaining == 0 {
            self.transition(ParserState::Done);
        }
        Ok(Some(Advance::BodyChunkReady(chunk)))
    }

    fn read_until_close_body(&mut self) -> Result<Option<Advance>, ParseError> {
        if !self.cursor.is_empty() {
            let chunk = self.take(self.cursor.len());
            trace!(len = chunk.len(), "body bytes read");
            return Ok(Some(Advance::BodyChunkReady(chunk)));
        }

        if self.eof {
            self.transition(ParserState::Done);
            return Ok(None);
        }
        Ok(Some(Advance::NeedMoreInput))
    }

    fn read_chunk_size(&mut self) -> Result<Option<Advance>, ParseError> {
        let max_line = self.config.max_header_line_length();
        let strict = self.config.strict_crlf();

        match match_chunk_size_line(self.cursor.peek_from(0), max_line, strict) {
            Match::Complete { len, value: size } => {
                let max = self.config.max_chunk_size();
                ensure!(size <= max, ParseError::limit_exceeded(Limit::ChunkSize, size, max));
                self.skip(len);
                trace!(size, "chunk size parsed");

                if size == 0 {
                    self.section_size = 0;
                    self.transition(ParserState::BodyChunkTrailer);
                } else {
                    self.remaining = size;
                    self.transition(ParserState::BodyChunkData);
                }
                Ok(None)
            }
            Match::Incomplete => self.incomplete(Production::ChunkSizeLine),
            Match::Invalid(e) => Err(e),
        }
    }

    fn read_chunk_data(&mut self) -> Result<Option<Advance>, ParseError> {
        match match_chunk_data(self.cursor.peek_from(0), self.remaining, self.config.strict_crlf()) {
            Match::Complete { len, value: ChunkData { data, terminated } } => {
                let chunk = if data > 0 { Some(self.take(data)) } else { None };
                self.remaining -= data as u64;

                if terminated {
                    self.skip(len - data);
                    self.transition(ParserState::BodyChunkSize);
                }

                match chunk {
                    Some(chunk) => {
                        trace!(len = data, remaining = self.remaining, "chunk data read");
                        Ok(Some(Advance::BodyChunkReady(chunk)))
                    }
                    None => Ok(None),
                }
            }
            Match::Incomplete => self.incomplete(Production::ChunkData),
            Match::Invalid(e) => Err(e),
        }
    }

    fn read_trailer(&mut self) -> Result<Option<Advance>, ParseError> {
        let max_line = self.config.max_header_line_length();
        let strict = self.config.strict_crlf();

        match match_field_line(self.section_view(), max_line, strict, FieldSection::Trailer) {
            Match::Complete { len, value: Some(index) } => {
                let field = self.field(len, index, self.trailers.len())?;
                self.trailers.append(field);
                Ok(None)
            }
            Match::Complete { len, value: None } => {
                self.check_section_size(len)?;
                self.skip(len);
                trace!(fields = self.trailers.len(), "trailer section parsed");
                self.transition(ParserState::Done);
                Ok(None)
            }
            Match::Incomplete => {
                self.check_section_size(self.cursor.len())?;
                self.incomplete(Production::TrailerField)
            }
            Match::Invalid(e) => Err(e),
        }
    }

    fn read_done(&mut self) -> Option<Advance> {
        if !self.done_reported {
            self.done_reported = true;
            return Some(Advance::Done);
        }

        // the message was reported complete, start the next one
        self.done_reported = false;
        self.section_size = 0;
        self.remaining = 0;
        self.trailers = Headers::new();
        self.transition(ParserState::Start);
        None
    }
}
