//! Response head produced by the parser, and the request context that
//! decides whether a response carries a body.

use std::borrow::Cow;

use bytes::Bytes;
use http::{Method, Response, StatusCode, Version};

use crate::protocol::{Headers, PayloadSize};

/// Status-line and header section of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    version: Version,
    status: StatusCode,
    reason: Bytes,
    headers: Headers,
    payload_size: PayloadSize,
}

impl ResponseHead {
    pub(crate) fn new(
        version: Version,
        status: StatusCode,
        reason: Bytes,
        headers: Headers,
        payload_size: PayloadSize,
    ) -> Self {
        Self { version, status, reason, headers, payload_size }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason-phrase as received; may be empty.
    pub fn reason(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.reason)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// Converts the head into a bodyless [`http::Response`].
    pub fn to_http_response(&self) -> Result<Response<()>, http::Error> {
        let mut response = Response::builder().status(self.status).version(self.version).body(())?;
        *response.headers_mut() = self.headers.to_header_map()?;
        Ok(response)
    }
}

/// What the response parser needs to know about the request a response answers.
///
/// Whether a response has a body cannot be told from the response alone: the
/// answer to a `HEAD` request never has one, a successful `CONNECT` turns the
/// connection into a tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: Method,
    expect_body: bool,
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self { method, expect_body: true }
    }

    /// Marks the response as bodyless regardless of its headers.
    pub fn without_body(mut self) -> Self {
        self.expect_body = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn expect_body(&self) -> bool {
        self.expect_body
    }
}

impl From<Method> for RequestContext {
    fn from(method: Method) -> Self {
        Self::new(method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::headers::headers_of;

    #[test]
    fn converts_to_http_response() {
        let head = ResponseHead::new(
            Version::HTTP_11,
            StatusCode::NOT_FOUND,
            Bytes::from_static(b"Not Found"),
            headers_of(&[("Content-Length", "0"), ("Server", "micro")]),
            PayloadSize::Empty,
        );

        let response = head.to_http_response().unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.version(), Version::HTTP_11);
        assert_eq!(response.headers().get(http::header::SERVER).unwrap(), "micro");
        assert_eq!(head.reason(), "Not Found");
    }

    #[test]
    fn context_from_method() {
        let context = RequestContext::from(Method::HEAD);
        assert_eq!(context.method(), &Method::HEAD);
        assert!(context.expect_body());
        assert!(!context.without_body().expect_body());
    }
}
