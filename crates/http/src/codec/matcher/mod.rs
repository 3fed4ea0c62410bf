//! Production matchers.
//!
//! One function per grammar production. Each takes the unconsumed input view
//! and reports whether it starts with a complete instance of the production,
//! could still become one, or never can. Matchers keep no state: calling one
//! again on the same bytes, or on the same bytes plus more, gives the same
//! answer for the part already seen. All progress lives in the parser.

use crate::protocol::{Limit, ParseError, Production};

mod chunk;
mod header;
mod start_line;

pub(crate) use chunk::{ChunkData, match_chunk_data, match_chunk_size_line};
pub(crate) use header::{FieldIndex, FieldSection, match_field_line};
pub(crate) use start_line::{RequestLine, StatusLine, match_request_line, match_status_line};

/// Outcome of matching one production against the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Match<T> {
    /// `len` bytes, terminator included, form a valid instance decoded as `value`.
    Complete { len: usize, value: T },
    /// Valid so far, the terminator has not arrived yet. Nothing may be consumed.
    Incomplete,
    /// The input can never form this production.
    Invalid(ParseError),
}

impl<T> Match<T> {
    pub(crate) fn map<U>(self, f: impl FnOnce(usize, T) -> (usize, U)) -> Match<U> {
        match self {
            Match::Complete { len, value } => {
                let (len, value) = f(len, value);
                Match::Complete { len, value }
            }
            Match::Incomplete => Match::Incomplete,
            Match::Invalid(e) => Match::Invalid(e),
        }
    }
}

/// Unwraps a `Complete` outcome into `(len, value)`, returning any other outcome as-is.
macro_rules! try_match {
    ($outcome:expr) => {
        match $outcome {
            Match::Complete { len, value } => (len, value),
            Match::Incomplete => return Match::Incomplete,
            Match::Invalid(e) => return Match::Invalid(e),
        }
    };
}

pub(crate) use try_match;

const fn class(chars: &[u8]) -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < chars.len() {
        table[chars[i] as usize] = true;
        i += 1;
    }
    table
}

/// `tchar` from RFC 9110 §5.6.2.
static TCHAR: [bool; 256] = class(b"!#$%&'*+-.^_`|~0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ");

/// Bytes allowed in a request-target: unreserved, reserved and `%`.
static TARGET_CHAR: [bool; 256] =
    class(b":/?#[]@!$&'()*+,;=-._~%0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ");

#[inline]
pub(crate) fn is_tchar(b: u8) -> bool {
    TCHAR[b as usize]
}

#[inline]
pub(crate) fn is_target_char(b: u8) -> bool {
    TARGET_CHAR[b as usize]
}

/// VCHAR or obs-text.
#[inline]
pub(crate) fn is_vchar(b: u8) -> bool {
    matches!(b, 0x21..=0x7e | 0x80..=0xff)
}

/// Horizontal whitespace: SP or HTAB.
#[inline]
pub(crate) fn is_ws(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Describes an unexpected byte for error messages.
pub(crate) fn describe(b: u8) -> String {
    match b {
        b'\r' => "CR".to_owned(),
        b'\n' => "LF".to_owned(),
        0x21..=0x7e => format!("'{}'", b as char),
        _ => format!("0x{b:02x}"),
    }
}

/// Matches a line terminator: CRLF, or a bare LF when `strict` is off.
pub(crate) fn match_line_end(view: &[u8], strict: bool, production: Production) -> Match<()> {
    match view.first() {
        None => Match::Incomplete,
        Some(b'\r') => match view.get(1) {
            None => Match::Incomplete,
            Some(b'\n') => Match::Complete { len: 2, value: () },
            Some(_) => Match::Invalid(ParseError::malformed(production, "CR not followed by LF")),
        },
        Some(b'\n') if !strict => Match::Complete { len: 1, value: () },
        Some(b'\n') => Match::Invalid(ParseError::malformed(production, "bare LF line terminator")),
        Some(&b) => Match::Invalid(ParseError::malformed(production, format!("expected CRLF, found {}", describe(b)))),
    }
}

/// Matches the CRLF production.
pub(crate) fn match_crlf(view: &[u8], strict: bool) -> Match<()> {
    match_line_end(view, strict, Production::Crlf)
}

/// Runs a line matcher under a maximum line length.
///
/// The length of a line excludes its terminator. The matcher only ever sees
/// the first `max + 2` bytes, so an unterminated line is never scanned past
/// its limit. A line whose first `max + 1` bytes are valid but unterminated is
/// over the limit, whatever follows; the error then reports `max + 1`.
pub(crate) fn bounded<T>(view: &[u8], max: usize, limit: Limit, matcher: impl Fn(&[u8]) -> Match<T>) -> Match<T> {
    let window = &view[..view.len().min(max.saturating_add(2))];
    let over = || Match::Invalid(ParseError::limit_exceeded(limit, (max as u64).saturating_add(1), max as u64));

    match matcher(window) {
        Match::Complete { len, value } => {
            if content_length(&window[..len]) > max {
                return over();
            }
            Match::Complete { len, value }
        }
        Match::Incomplete => {
            // a trailing CR may still become the terminator
            let seen = window.len() - usize::from(window.last() == Some(&b'\r'));
            if seen > max {
                return over();
            }
            Match::Incomplete
        }
        Match::Invalid(e) => {
            // the offending byte sits right past the limit, after a prefix that is already too long
            let past_limit = window.len() > max.saturating_add(1) && window[max] != b'\r';
            if past_limit && matches!(matcher(&window[..=max]), Match::Incomplete) {
                return over();
            }
            Match::Invalid(e)
        }
    }
}

fn content_length(line: &[u8]) -> usize {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;

    #[test]
    fn character_classes() {
        for b in b"!#$%&'*+-.^_`|~azAZ09" {
            assert!(is_tchar(*b), "{}", *b as char);
        }
        for b in b"\"(),/:;<=>?@[\\]{} \t\r\n" {
            assert!(!is_tchar(*b), "{}", *b as char);
        }

        assert!(is_target_char(b'%'));
        assert!(is_target_char(b'/'));
        assert!(!is_target_char(b' '));
        assert!(!is_target_char(0xc2));
        assert!(is_vchar(0xc2));
        assert!(!is_vchar(0x7f));
    }

    #[test]
    fn line_end_is_strict_by_default() {
        assert_eq!(match_crlf(b"\r\nrest", true), Match::Complete { len: 2, value: () });
        assert_eq!(match_crlf(b"\r", true), Match::Incomplete);
        assert_eq!(match_crlf(b"", true), Match::Incomplete);
        assert!(matches!(match_crlf(b"\nrest", true), Match::Invalid(_)));
        assert!(matches!(match_crlf(b"\rx", true), Match::Invalid(_)));
        assert_eq!(match_crlf(b"\nrest", false), Match::Complete { len: 1, value: () });
    }

    #[test]
    fn bounded_classifies_overlong_lines_as_limits() {
        let line = |w: &[u8]| match w.iter().position(|b| *b == b'\r') {
            Some(i) => match_crlf(&w[i..], true).map(|len, ()| (i + len, ())),
            None => Match::Incomplete,
        };

        assert_eq!(bounded(b"abcd\r\n", 4, Limit::StartLine, line), Match::Complete { len: 6, value: () });
        assert_eq!(bounded(b"abcd", 4, Limit::StartLine, line), Match::Incomplete);
        assert_eq!(bounded(b"abcd\r", 4, Limit::StartLine, line), Match::Incomplete);

        match bounded(b"abcde", 4, Limit::StartLine, line) {
            Match::Invalid(e) => {
                assert_eq!(e.kind(), ErrorKind::LimitExceeded);
                assert_eq!(e, ParseError::limit_exceeded(Limit::StartLine, 5, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(bounded(b"abcde\r\n", 4, Limit::StartLine, line), Match::Invalid(_)));
    }

    #[test]
    fn bounded_limit_wins_over_a_bad_byte_past_it() {
        // a line of letters, '!' is not allowed
        let line = |w: &[u8]| {
            for (i, &b) in w.iter().enumerate() {
                if b == b'!' {
                    return Match::Invalid(ParseError::malformed(Production::HeaderValue, "bang"));
                }
                if b == b'\r' {
                    return match_crlf(&w[i..], true).map(|len, ()| (i + len, ()));
                }
            }
            Match::Incomplete
        };
        let limit = ParseError::limit_exceeded(Limit::HeaderLine, 5, 4);

        // within the limit the syntax error stands
        assert_eq!(bounded(b"abcd!", 4, Limit::HeaderLine, line).kind_of(), Some(ErrorKind::MalformedSyntax));
        assert_eq!(bounded(b"abc!xyz", 4, Limit::HeaderLine, line).kind_of(), Some(ErrorKind::MalformedSyntax));

        // past it the limit wins, as it does when the line arrives in pieces
        assert_eq!(bounded(b"abcde!", 4, Limit::HeaderLine, line), Match::Invalid(limit.clone()));
        assert_eq!(bounded(b"abcde", 4, Limit::HeaderLine, line), Match::Invalid(limit.clone()));
        assert_eq!(bounded(b"abcdefgh", 4, Limit::HeaderLine, line), Match::Invalid(limit));

        // a CR at the limit may still end the line, so what follows it decides
        assert_eq!(bounded(b"abcd\r!", 4, Limit::HeaderLine, line).kind_of(), Some(ErrorKind::MalformedSyntax));
    }

    impl<T> Match<T> {
        fn kind_of(&self) -> Option<ErrorKind> {
            match self {
                Match::Invalid(e) => Some(e.kind()),
                _ => None,
            }
        }
    }
}
