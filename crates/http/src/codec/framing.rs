//! Message body framing.
//!
//! Decides from a completed head how the end of the body is found, following
//! RFC 9112 §6.3 with the strict choices: Transfer-Encoding together with
//! Content-Length is rejected instead of letting one override the other.

use http::{Method, StatusCode};
use tracing::debug;

use crate::ensure;
use crate::protocol::{Headers, ParseError, PayloadSize, RequestContext};

const CHUNKED: &[u8] = b"chunked";

/// Framing of a request body.
pub(crate) fn request_payload_size(headers: &Headers) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length
    let payload_size = match (transfer_coding(headers)?, content_length(headers)?) {
        (Some(_), Some(_)) => {
            return Err(ParseError::conflicting_framing("transfer-encoding and content-length both present"));
        }
        (Some(TransferCoding::Chunked), None) => PayloadSize::Chunked,
        (Some(TransferCoding::Other), None) => {
            return Err(ParseError::invalid_framing_value("request transfer-encoding must end with chunked"));
        }
        (None, Some(length)) => PayloadSize::Length(length),
        (None, None) => PayloadSize::Empty,
    };

    debug!(?payload_size, "request framing decided");
    Ok(payload_size)
}

/// Framing of a response body to a request described by `context`.
pub(crate) fn response_payload_size(
    status: StatusCode,
    headers: &Headers,
    context: &RequestContext,
) -> Result<PayloadSize, ParseError> {
    if !has_body(status, context) {
        debug!(%status, method = %context.method(), "response has no body");
        return Ok(PayloadSize::Empty);
    }

    let payload_size = match (transfer_coding(headers)?, content_length(headers)?) {
        (Some(_), Some(_)) => {
            return Err(ParseError::conflicting_framing("transfer-encoding and content-length both present"));
        }
        (Some(TransferCoding::Chunked), None) => PayloadSize::Chunked,
        (Some(TransferCoding::Other), None) => PayloadSize::UntilClose,
        (None, Some(length)) => PayloadSize::Length(length),
        (None, None) => PayloadSize::UntilClose,
    };

    debug!(?payload_size, %status, "response framing decided");
    Ok(payload_size)
}

fn has_body(status: StatusCode, context: &RequestContext) -> bool {
    if !context.expect_body() || *context.method() == Method::HEAD {
        return false;
    }
    if status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return false;
    }
    !(*context.method() == Method::CONNECT && status.is_success())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferCoding {
    /// `chunked` is the final coding
    Chunked,
    /// some other final coding
    Other,
}

/// Classifies the Transfer-Encoding list, all field lines combined.
///
/// `chunked` may only be applied once, and only as the final coding.
fn transfer_coding(headers: &Headers) -> Result<Option<TransferCoding>, ParseError> {
    let Some(value) = headers.combined("transfer-encoding") else {
        return Ok(None);
    };

    let codings: Vec<&[u8]> = list_elements(&value).collect();
    let Some((last, rest)) = codings.split_last() else {
        return Err(ParseError::invalid_framing_value("empty transfer-encoding"));
    };

    ensure!(
        !rest.iter().any(|coding| coding.eq_ignore_ascii_case(CHUNKED)),
        ParseError::invalid_framing_value("chunked must be the final transfer coding")
    );

    if last.eq_ignore_ascii_case(CHUNKED) {
        Ok(Some(TransferCoding::Chunked))
    } else {
        Ok(Some(TransferCoding::Other))
    }
}

/// Parses every Content-Length value; a list form such as `5, 5` is accepted if
/// all members agree.
fn content_length(headers: &Headers) -> Result<Option<u64>, ParseError> {
    let mut length = None;

    for value in headers.get_all("content-length") {
        let mut found_any = false;
        for element in list_elements(value) {
            found_any = true;
            let parsed = parse_length(element)?;
            match length {
                Some(previous) if previous != parsed => {
                    return Err(ParseError::conflicting_framing(format!(
                        "content-length values disagree: {previous} and {parsed}"
                    )));
                }
                _ => length = Some(parsed),
            }
        }
        ensure!(found_any, ParseError::invalid_framing_value("empty content-length"));
    }

    Ok(length)
}

fn parse_length(element: &[u8]) -> Result<u64, ParseError> {
    let invalid = || {
        ParseError::invalid_framing_value(format!("content-length {:?} is not a u64", String::from_utf8_lossy(element)))
    };

    ensure!(!element.is_empty() && element.iter().all(u8::is_ascii_digit), invalid());

    element
        .iter()
        .try_fold(0u64, |length, b| length.checked_mul(10)?.checked_add(u64::from(b - b'0')))
        .ok_or_else(invalid)
}

/// Non-empty, whitespace trimmed elements of a comma separated list.
fn list_elements(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value.split(|b| *b == b',').map(<[u8]>::trim_ascii).filter(|element| !element.is_empty())
}
