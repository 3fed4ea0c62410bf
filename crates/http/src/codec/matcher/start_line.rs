//! Matchers for the request-line and the status-line.
//!
//! ```text
//! request-line = method SP request-target SP HTTP-version CRLF
//! status-line  = HTTP-version SP status-code SP [ reason-phrase ] CRLF
//! ```

use std::ops::Range;

use http::{StatusCode, Version};

use crate::codec::matcher::{Match, bounded, describe, is_target_char, is_tchar, is_vchar, match_line_end, try_match};
use crate::protocol::{Limit, ParseError, Production};

/// Byte ranges of a matched request-line, relative to the matched view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestLine {
    pub(crate) method: Range<usize>,
    pub(crate) target: Range<usize>,
    pub(crate) version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusLine {
    pub(crate) version: Version,
    pub(crate) status: StatusCode,
    pub(crate) reason: Range<usize>,
}

/// What ends the HTTP-version: a space in a status-line, the line end in a request-line.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Terminator {
    Space,
    LineEnd { strict: bool },
}

pub(crate) fn match_request_line(view: &[u8], max_len: usize, strict: bool) -> Match<RequestLine> {
    bounded(view, max_len, Limit::StartLine, |window| request_line(window, strict))
}

pub(crate) fn match_status_line(view: &[u8], max_len: usize, strict: bool) -> Match<StatusLine> {
    bounded(view, max_len, Limit::StartLine, |window| status_line(window, strict))
}

fn request_line(view: &[u8], strict: bool) -> Match<RequestLine> {
    let (method_len, method) = try_match!(match_method(view));

    let offset = method_len;
    let (target_len, target) = try_match!(match_request_target(&view[offset..]));

    let offset = offset + target_len;
    let (version_len, version) = try_match!(match_http_version(&view[offset..], Terminator::LineEnd { strict }));

    let target = shift(target, method_len);
    Match::Complete { len: offset + version_len, value: RequestLine { method, target, version } }
}

fn status_line(view: &[u8], strict: bool) -> Match<StatusLine> {
    let (version_len, version) = try_match!(match_http_version(view, Terminator::Space));

    let offset = version_len;
    let (status_len, (status, reason_follows)) = try_match!(match_status_code(&view[offset..], strict));

    let offset = offset + status_len;
    if !reason_follows {
        return Match::Complete { len: offset, value: StatusLine { version, status, reason: offset..offset } };
    }

    let (reason_len, reason) = try_match!(match_reason_phrase(&view[offset..], strict));
    let reason = shift(reason, offset);
    Match::Complete { len: offset + reason_len, value: StatusLine { version, status, reason } }
}

/// `method = token`, terminated by a single SP.
pub(crate) fn match_method(view: &[u8]) -> Match<Range<usize>> {
    match_space_terminated(view, Production::Method, is_tchar)
}

/// `request-target`, terminated by a single SP.
///
/// Only checks the character class; the target is validated as a URI when
/// the head is assembled.
pub(crate) fn match_request_target(view: &[u8]) -> Match<Range<usize>> {
    match_space_terminated(view, Production::RequestTarget, is_target_char)
}

fn match_space_terminated(view: &[u8], production: Production, allowed: fn(u8) -> bool) -> Match<Range<usize>> {
    for (i, &b) in view.iter().enumerate() {
        if allowed(b) {
            continue;
        }

        if b != b' ' {
            let reason = format!("unexpected {} at offset {i}", describe(b));
            return Match::Invalid(ParseError::malformed(production, reason));
        }
        if i == 0 {
            return Match::Invalid(ParseError::malformed(production, "empty field"));
        }
        return Match::Complete { len: i + 1, value: 0..i };
    }
    Match::Incomplete
}

/// `HTTP-version = "HTTP/" DIGIT "." DIGIT`.
///
/// HTTP/1.0 maps to [`Version::HTTP_10`]; HTTP/1.1 and later minor versions map
/// to [`Version::HTTP_11`]. Any other major version is rejected.
pub(crate) fn match_http_version(view: &[u8], terminator: Terminator) -> Match<Version> {
    const PREFIX: &[u8] = b"HTTP/";
    const VERSION_LEN: usize = 8;

    for (i, &b) in view.iter().take(VERSION_LEN).enumerate() {
        let valid = match i {
            0..=4 => b == PREFIX[i],
            5 | 7 => b.is_ascii_digit(),
            _ => b == b'.',
        };
        if !valid {
            return Match::Invalid(ParseError::malformed(
                Production::HttpVersion,
                format!("unexpected {} at offset {i}", describe(b)),
            ));
        }
    }

    let Some(&[major, _, minor]) = view.get(5..VERSION_LEN) else {
        return Match::Incomplete;
    };
    let version = match (major, minor) {
        (b'1', b'0') => Version::HTTP_10,
        (b'1', _) => Version::HTTP_11,
        _ => {
            return Match::Invalid(ParseError::malformed(
                Production::HttpVersion,
                format!("unsupported version HTTP/{}.{}", major as char, minor as char),
            ));
        }
    };

    let rest = &view[VERSION_LEN..];
    match terminator {
        Terminator::Space => match rest.first() {
            None => Match::Incomplete,
            Some(b' ') => Match::Complete { len: VERSION_LEN + 1, value: version },
            Some(&b) => Match::Invalid(ParseError::malformed(
                Production::HttpVersion,
                format!("expected SP after version, found {}", describe(b)),
            )),
        },
        Terminator::LineEnd { strict } => {
            match_line_end(rest, strict, Production::HttpVersion).map(|len, ()| (VERSION_LEN + len, version))
        }
    }
}

/// `status-code = 3DIGIT`, followed by SP, or directly by the line end when the
/// reason-phrase is left out. The flag tells whether a reason-phrase follows.
pub(crate) fn match_status_code(view: &[u8], strict: bool) -> Match<(StatusCode, bool)> {
    const CODE_LEN: usize = 3;

    for (i, &b) in view.iter().take(CODE_LEN).enumerate() {
        if !b.is_ascii_digit() {
            return Match::Invalid(ParseError::malformed(
                Production::StatusCode,
                format!("unexpected {} at offset {i}", describe(b)),
            ));
        }
    }
    let Some(digits) = view.get(..CODE_LEN) else {
        return Match::Incomplete;
    };

    let status = match StatusCode::from_bytes(digits) {
        Ok(status) => status,
        Err(e) => return Match::Invalid(ParseError::malformed(Production::StatusCode, e)),
    };

    match view.get(CODE_LEN) {
        None => Match::Incomplete,
        Some(b' ') => Match::Complete { len: CODE_LEN + 1, value: (status, true) },
        Some(b'\r' | b'\n') => match_line_end(&view[CODE_LEN..], strict, Production::StatusCode)
            .map(|len, ()| (CODE_LEN + len, (status, false))),
        Some(&b) => Match::Invalid(ParseError::malformed(
            Production::StatusCode,
            format!("expected SP after status code, found {}", describe(b)),
        )),
    }
}

/// `reason-phrase = *( HTAB / SP / VCHAR / obs-text )`, terminated by the line end.
pub(crate) fn match_reason_phrase(view: &[u8], strict: bool) -> Match<Range<usize>> {
    for (i, &b) in view.iter().enumerate() {
        if is_vchar(b) || b == b' ' || b == b'\t' {
            continue;
        }
        if b == b'\r' || b == b'\n' {
            return match_line_end(&view[i..], strict, Production::ReasonPhrase).map(|len, ()| (i + len, 0..i));
        }
        return Match::Invalid(ParseError::malformed(
            Production::ReasonPhrase,
            format!("unexpected {} at offset {i}", describe(b)),
        ));
    }
    Match::Incomplete
}

fn shift(range: Range<usize>, offset: usize) -> Range<usize> {
    range.start + offset..range.end + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;

    fn production_of<T>(outcome: Match<T>) -> Production {
        match outcome {
            Match::Invalid(ParseError::MalformedSyntax { production, .. }) => production,
            _ => panic!("expected a syntax error"),
        }
    }

    #[test]
    fn request_line_ranges() {
        let view = b"GET /index.html?a=1 HTTP/1.1\r\nHost: x\r\n";
        let Match::Complete { len, value } = match_request_line(view, 8192, true) else {
            panic!("request line should be complete");
        };

        assert_eq!(len, 30);
        assert_eq!(&view[value.method], b"GET");
        assert_eq!(&view[value.target], b"/index.html?a=1");
        assert_eq!(value.version, Version::HTTP_11);
    }

    #[test]
    fn request_line_prefixes_are_incomplete() {
        let line = b"POST /submit HTTP/1.0\r\n";
        for end in 0..line.len() {
            assert_eq!(match_request_line(&line[..end], 8192, true), Match::Incomplete, "prefix of {end} bytes");
        }
        assert!(matches!(match_request_line(line, 8192, true), Match::Complete { .. }));
    }

    #[test]
    fn method_is_a_token() {
        assert_eq!(match_method(b"PATCH /"), Match::Complete { len: 6, value: 0..5 });
        assert_eq!(match_method(b"M-SEARCH"), Match::Incomplete);
        assert_eq!(production_of(match_method(b" GET")), Production::Method);
        assert_eq!(production_of(match_method(b"GE(T /")), Production::Method);
        assert_eq!(production_of(match_method(b"GET\r\n")), Production::Method);
    }

    #[test]
    fn target_stops_at_space() {
        let view = b"whatever-you%C2%ABwant%C2%BB left-over";
        assert_eq!(match_request_target(view), Match::Complete { len: 29, value: 0..28 });
        assert_eq!(production_of(match_request_target(b"valid-target\xC2\xABnext token")), Production::RequestTarget);
    }

    #[test]
    fn version_parsing() {
        let line_end = Terminator::LineEnd { strict: true };
        assert_eq!(match_http_version(b"HTTP/1.1\r\n", line_end), Match::Complete { len: 10, value: Version::HTTP_11 });
        assert_eq!(match_http_version(b"HTTP/1.0\r\n", line_end), Match::Complete { len: 10, value: Version::HTTP_10 });
        assert_eq!(
            match_http_version(b"HTTP/1.9 ", Terminator::Space),
            Match::Complete { len: 9, value: Version::HTTP_11 }
        );

        // byte by byte stays incomplete
        let version = b"HTTP/1.1\r\n";
        for end in 0..version.len() {
            assert_eq!(match_http_version(&version[..end], line_end), Match::Incomplete);
        }

        assert_eq!(production_of(match_http_version(b"HTTP/1-1", line_end)), Production::HttpVersion);
        assert_eq!(production_of(match_http_version(b"http/1.1", line_end)), Production::HttpVersion);
        assert_eq!(production_of(match_http_version(b"HTTP/1.X", line_end)), Production::HttpVersion);
        assert_eq!(production_of(match_http_version(b"HTTP/2.0\r\n", line_end)), Production::HttpVersion);
        assert_eq!(production_of(match_http_version(b"HTTP/1.1\n", line_end)), Production::HttpVersion);
        assert_eq!(
            match_http_version(b"HTTP/1.1\n", Terminator::LineEnd { strict: false }),
            Match::Complete { len: 9, value: Version::HTTP_11 }
        );
    }

    #[test]
    fn status_line_with_and_without_reason() {
        let view = b"HTTP/1.1 404 Not Found\r\n";
        let Match::Complete { len, value } = match_status_line(view, 8192, true) else {
            panic!("status line should be complete");
        };
        assert_eq!(len, view.len());
        assert_eq!(value.status, StatusCode::NOT_FOUND);
        assert_eq!(&view[value.reason], b"Not Found");

        let view = b"HTTP/1.1 204 \r\n";
        let Match::Complete { value, .. } = match_status_line(view, 8192, true) else {
            panic!("empty reason should be accepted");
        };
        assert!(value.reason.is_empty());

        let Match::Complete { len, value } = match_status_line(b"HTTP/1.0 200\r\n", 8192, true) else {
            panic!("missing reason should be accepted");
        };
        assert_eq!(len, 14);
        assert_eq!(value.version, Version::HTTP_10);
    }

    #[test]
    fn status_code_must_be_three_digits() {
        assert_eq!(production_of(match_status_code(b"2x0 OK", true)), Production::StatusCode);
        assert_eq!(production_of(match_status_code(b"2000 OK", true)), Production::StatusCode);
        assert_eq!(production_of(match_status_code(b"099 ", true)), Production::StatusCode);
        assert_eq!(match_status_code(b"20", true), Match::Incomplete);
    }

    #[test]
    fn reason_rejects_control_characters() {
        assert_eq!(production_of(match_reason_phrase(b"O\x01K\r\n", true)), Production::ReasonPhrase);
        assert_eq!(match_reason_phrase(b"OK\r\n", true), Match::Complete { len: 4, value: 0..2 });
    }

    #[test]
    fn start_line_limit() {
        let line = b"GET /0123456789 HTTP/1.1";
        // 24 bytes of line, no terminator yet
        assert_eq!(match_request_line(line, 24, true), Match::Incomplete);
        let Match::Invalid(e) = match_request_line(line, 23, true) else {
            panic!("one byte over the limit must fail");
        };
        assert_eq!(e.kind(), ErrorKind::LimitExceeded);

        let mut terminated = line.to_vec();
        terminated.extend_from_slice(b"\r\n");
        assert!(matches!(match_request_line(&terminated, 24, true), Match::Complete { .. }));
    }
}
