//! Matchers for field lines in the header and trailer sections.
//!
//! ```text
//! field-line  = field-name ":" OWS field-value OWS CRLF
//! field-name  = token
//! field-value = *( VCHAR / obs-text / SP / HTAB )
//! ```

use std::ops::Range;

use crate::codec::matcher::{Match, bounded, describe, is_tchar, is_vchar, is_ws, match_crlf, match_line_end, try_match};
use crate::protocol::{Limit, ParseError, Production};

/// Position of one field within its matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldIndex {
    pub(crate) name: Range<usize>,
    /// The value with surrounding whitespace trimmed, possibly empty.
    pub(crate) value: Range<usize>,
}

/// Which section a field line belongs to; decides the production errors name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldSection {
    Header,
    Trailer,
}

impl FieldSection {
    fn name_production(self) -> Production {
        match self {
            FieldSection::Header => Production::HeaderName,
            FieldSection::Trailer => Production::TrailerField,
        }
    }

    fn value_production(self) -> Production {
        match self {
            FieldSection::Header => Production::HeaderValue,
            FieldSection::Trailer => Production::TrailerField,
        }
    }
}

/// Matches either one field line or the blank line closing the section.
///
/// The blank line yields `None`.
pub(crate) fn match_field_line(
    view: &[u8],
    max_line: usize,
    strict: bool,
    section: FieldSection,
) -> Match<Option<FieldIndex>> {
    match view.first() {
        None => Match::Incomplete,
        Some(b'\r' | b'\n') => match_crlf(view, strict).map(|len, ()| (len, None)),
        Some(_) => bounded(view, max_line, Limit::HeaderLine, |window| field_line(window, strict, section))
            .map(|len, field| (len, Some(field))),
    }
}

fn field_line(view: &[u8], strict: bool, section: FieldSection) -> Match<FieldIndex> {
    let (name_len, name) = try_match!(match_header_name(view, section));
    let (value_len, value) = try_match!(match_header_value(&view[name_len..], strict, section));

    let value = value.start + name_len..value.end + name_len;
    Match::Complete { len: name_len + value_len, value: FieldIndex { name, value } }
}

/// `field-name ":"`. The returned length includes the colon.
pub(crate) fn match_header_name(view: &[u8], section: FieldSection) -> Match<Range<usize>> {
    let production = section.name_production();

    for (i, &b) in view.iter().enumerate() {
        if is_tchar(b) {
            continue;
        }

        return match b {
            b' ' | b'\t' if i == 0 => {
                Match::Invalid(ParseError::malformed(production, "obsolete line folding is not allowed"))
            }
            b':' if i == 0 => Match::Invalid(ParseError::malformed(production, "empty field name")),
            b':' => Match::Complete { len: i + 1, value: 0..i },
            b' ' | b'\t' => {
                Match::Invalid(ParseError::malformed(production, "whitespace between field name and colon"))
            }
            b'\r' | b'\n' => Match::Invalid(ParseError::malformed(production, "missing colon")),
            _ => Match::Invalid(ParseError::malformed(production, format!("unexpected {} at offset {i}", describe(b)))),
        };
    }
    Match::Incomplete
}

/// `OWS field-value OWS` up to and including the line end.
pub(crate) fn match_header_value(view: &[u8], strict: bool, section: FieldSection) -> Match<Range<usize>> {
    let production = section.value_production();

    let mut start = None;
    let mut end = 0;
    for (i, &b) in view.iter().enumerate() {
        if is_ws(b) {
            continue;
        }
        if is_vchar(b) {
            start.get_or_insert(i);
            end = i + 1;
            continue;
        }
        if b == b'\r' || b == b'\n' {
            let start = start.unwrap_or(i);
            let end = end.max(start);
            return match_line_end(&view[i..], strict, production).map(|len, ()| (i + len, start..end));
        }
        return Match::Invalid(ParseError::malformed(production, format!("unexpected {} at offset {i}", describe(b))));
    }
    Match::Incomplete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ErrorKind;

    fn field(view: &[u8]) -> Match<Option<FieldIndex>> {
        match_field_line(view, 8192, true, FieldSection::Header)
    }

    fn reason_of<T: std::fmt::Debug>(outcome: Match<T>) -> (Production, String) {
        match outcome {
            Match::Invalid(ParseError::MalformedSyntax { production, reason }) => (production, reason),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn value_is_trimmed() {
        let view = b"Content-Type:  text/plain; q=1 \t\r\nnext";
        let Match::Complete { len, value: Some(index) } = field(view) else {
            panic!("field line should be complete");
        };

        assert_eq!(len, 34);
        assert_eq!(&view[index.name], b"Content-Type");
        assert_eq!(&view[index.value], b"text/plain; q=1");
    }

    #[test]
    fn empty_value() {
        let view = b"X-Empty:\r\n";
        let Match::Complete { len, value: Some(index) } = field(view) else {
            panic!("empty value should be accepted");
        };
        assert_eq!(len, view.len());
        assert!(index.value.is_empty());

        let view = b"X-Blank:   \r\n";
        let Match::Complete { value: Some(index), .. } = field(view) else {
            panic!("whitespace-only value should be accepted");
        };
        assert!(index.value.is_empty());
    }

    #[test]
    fn blank_line_ends_the_section() {
        assert_eq!(field(b"\r\nbody"), Match::Complete { len: 2, value: None });
        assert_eq!(field(b"\r"), Match::Incomplete);
        assert_eq!(field(b""), Match::Incomplete);
    }

    #[test]
    fn prefixes_are_incomplete() {
        let line = b"Host: example.com\r\n";
        for end in 0..line.len() {
            assert_eq!(field(&line[..end]), Match::Incomplete, "prefix of {end} bytes");
        }
    }

    #[test]
    fn obs_text_is_kept_as_is() {
        let view = b"X-Name: caf\xc3\xa9\r\n";
        let Match::Complete { value: Some(index), .. } = field(view) else {
            panic!("obs-text should be accepted");
        };
        assert_eq!(&view[index.value], b"caf\xc3\xa9");
    }

    #[test]
    fn folding_is_rejected() {
        let (production, reason) = reason_of(field(b" continued\r\n"));
        assert_eq!(production, Production::HeaderName);
        assert!(reason.contains("folding"));

        let (production, _) = reason_of(match_field_line(b"\tmore\r\n", 8192, true, FieldSection::Trailer));
        assert_eq!(production, Production::TrailerField);
    }

    #[test]
    fn malformed_names() {
        assert_eq!(reason_of(field(b"Host : x\r\n")).0, Production::HeaderName);
        assert_eq!(reason_of(field(b": x\r\n")).0, Production::HeaderName);
        assert_eq!(reason_of(field(b"Ho\"st: x\r\n")).0, Production::HeaderName);
        assert!(reason_of(field(b"NoColon\r\n")).1.contains("colon"));
    }

    #[test]
    fn malformed_values() {
        assert_eq!(reason_of(field(b"Host: a\x00b\r\n")).0, Production::HeaderValue);
        assert_eq!(reason_of(field(b"Host: a\x7fb\r\n")).0, Production::HeaderValue);
        assert_eq!(reason_of(field(b"Host: a\rb\r\n")).0, Production::HeaderValue);
        assert_eq!(reason_of(field(b"Host: a\n")).0, Production::HeaderValue);
    }

    #[test]
    fn lenient_line_ends() {
        let outcome = match_field_line(b"Host: a\n", 8192, false, FieldSection::Header);
        assert!(matches!(outcome, Match::Complete { len: 8, value: Some(_) }));
        assert_eq!(match_field_line(b"\n", 8192, false, FieldSection::Header), Match::Complete { len: 1, value: None });
    }

    #[test]
    fn line_limit() {
        let line = b"X-Long: 0123456789\r\n";
        // 18 bytes of content
        assert!(matches!(match_field_line(line, 18, true, FieldSection::Header), Match::Complete { .. }));

        let Match::Invalid(e) = match_field_line(line, 17, true, FieldSection::Header) else {
            panic!("one byte over the limit must fail");
        };
        assert_eq!(e, ParseError::limit_exceeded(Limit::HeaderLine, 18, 17));
        assert_eq!(e.kind(), ErrorKind::LimitExceeded);
    }
}
