//! Matchers for the chunked transfer coding.
//!
//! ```text
//! chunk      = chunk-size [ chunk-ext ] CRLF chunk-data CRLF
//! chunk-size = 1*HEXDIG
//! chunk-ext  = *( BWS ";" BWS chunk-ext-name [ BWS "=" BWS chunk-ext-val ] )
//! ```
//!
//! Extensions are validated and then dropped.

use crate::codec::matcher::{Match, bounded, describe, is_tchar, is_vchar, is_ws, match_line_end};
use crate::protocol::{Limit, ParseError, Production};
use ChunkSizeState::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkSizeState {
    /// Reading hex digits
    Digits,
    /// After the size or a complete extension: BWS, `;` or the line end
    AfterItem,
    /// After `;`, before the extension name
    BeforeExtName,
    ExtName,
    /// After the extension name: BWS, `=`, `;` or the line end
    AfterExtName,
    /// After `=`, before the extension value
    BeforeExtValue,
    /// Token extension value
    ExtValue,
    /// Inside a quoted-string extension value
    Quoted,
    /// After a backslash inside a quoted-string
    QuotedEscape,
}

/// Matches a chunk-size line and returns the decoded size.
///
/// The caller checks the size against its configured maximum. A size that does
/// not fit in a `u64` is an [`InvalidFramingValue`](ParseError::InvalidFramingValue).
pub(crate) fn match_chunk_size_line(view: &[u8], max_line: usize, strict: bool) -> Match<u64> {
    bounded(view, max_line, Limit::HeaderLine, |window| chunk_size_line(window, strict))
}

fn chunk_size_line(view: &[u8], strict: bool) -> Match<u64> {
    let mut state = Digits;
    let mut size: u64 = 0;
    let mut digits = 0usize;

    for (i, &b) in view.iter().enumerate() {
        let production = if digits > 0 && size == 0 { Production::LastChunk } else { Production::ChunkSizeLine };
        let unexpected =
            || Match::Invalid(ParseError::malformed(production, format!("unexpected {} at offset {i}", describe(b))));

        if b == b'\r' || b == b'\n' {
            return match state {
                Digits if digits == 0 => Match::Invalid(ParseError::malformed(production, "missing chunk size")),
                Digits | AfterItem | ExtName | AfterExtName | ExtValue => {
                    match_line_end(&view[i..], strict, production).map(|len, ()| (i + len, size))
                }
                BeforeExtName => Match::Invalid(ParseError::malformed(production, "missing chunk extension name")),
                BeforeExtValue => Match::Invalid(ParseError::malformed(production, "missing chunk extension value")),
                Quoted | QuotedEscape => {
                    Match::Invalid(ParseError::malformed(production, "unterminated quoted-string"))
                }
            };
        }

        state = match state {
            Digits => match b {
                b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                    let digit = u64::from(hex_value(b));
                    size = match size.checked_mul(16).and_then(|size| size.checked_add(digit)) {
                        Some(size) => size,
                        None => return Match::Invalid(ParseError::invalid_framing_value("chunk size overflows u64")),
                    };
                    digits += 1;
                    Digits
                }
                _ if digits == 0 => return Match::Invalid(ParseError::malformed(production, "missing chunk size")),
                b';' => BeforeExtName,
                _ if is_ws(b) => AfterItem,
                _ => return unexpected(),
            },
            AfterItem => match b {
                b';' => BeforeExtName,
                _ if is_ws(b) => AfterItem,
                _ => return unexpected(),
            },
            BeforeExtName => match b {
                _ if is_ws(b) => BeforeExtName,
                _ if is_tchar(b) => ExtName,
                _ => return unexpected(),
            },
            ExtName => match b {
                _ if is_tchar(b) => ExtName,
                b'=' => BeforeExtValue,
                b';' => BeforeExtName,
                _ if is_ws(b) => AfterExtName,
                _ => return unexpected(),
            },
            AfterExtName => match b {
                b'=' => BeforeExtValue,
                b';' => BeforeExtName,
                _ if is_ws(b) => AfterExtName,
                _ => return unexpected(),
            },
            BeforeExtValue => match b {
                b'"' => Quoted,
                _ if is_ws(b) => BeforeExtValue,
                _ if is_tchar(b) => ExtValue,
                _ => return unexpected(),
            },
            ExtValue => match b {
                _ if is_tchar(b) => ExtValue,
                b';' => BeforeExtName,
                _ if is_ws(b) => AfterItem,
                _ => return unexpected(),
            },
            Quoted => match b {
                b'"' => AfterItem,
                b'\\' => QuotedEscape,
                _ if is_ws(b) || is_vchar(b) => Quoted,
                _ => return unexpected(),
            },
            QuotedEscape => match b {
                _ if is_ws(b) || is_vchar(b) => Quoted,
                _ => return unexpected(),
            },
        };
    }
    Match::Incomplete
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b + 10 - b'a',
        _ => b + 10 - b'A',
    }
}

/// Progress through the data of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkData {
    /// Number of data bytes at the start of the match, terminator excluded.
    pub(crate) data: usize,
    /// Whether the CRLF after the last data byte is part of the match.
    pub(crate) terminated: bool,
}

/// Matches as much of a chunk's remaining data as is buffered.
///
/// `remaining` counts the data bytes still owed by the current chunk. Unlike
/// the line matchers this one completes on partial data, so the body can be
/// handed out as it arrives; `terminated` is only set once the data and its
/// CRLF are both present. With `remaining == 0` just the CRLF is matched.
pub(crate) fn match_chunk_data(view: &[u8], remaining: u64, strict: bool) -> Match<ChunkData> {
    if remaining > 0 && view.is_empty() {
        return Match::Incomplete;
    }

    let available = view.len() as u64;
    if available < remaining {
        return Match::Complete { len: view.len(), value: ChunkData { data: view.len(), terminated: false } };
    }

    // remaining <= view.len(), so it fits in usize
    let data = remaining as usize;
    match match_line_end(&view[data..], strict, Production::ChunkData) {
        Match::Complete { len, .. } => Match::Complete { len: data + len, value: ChunkData { data, terminated: true } },
        Match::Incomplete if data > 0 => Match::Complete { len: data, value: ChunkData { data, terminated: false } },
        Match::Incomplete => Match::Incomplete,
        Match::Invalid(e) => Match::Invalid(e),
    }
}
