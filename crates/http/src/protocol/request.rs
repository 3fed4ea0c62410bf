//! Request head produced by the parser.
//!
//! The method and target are stored in their `http` crate forms; the header
//! fields keep the casing and order they had on the wire.

use http::{Method, Request, Uri, Version};

use crate::protocol::{Headers, PayloadSize};

/// Start-line and header section of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: Method,
    uri: Uri,
    version: Version,
    headers: Headers,
    payload_size: PayloadSize,
}

impl RequestHead {
    pub(crate) fn new(method: Method, uri: Uri, version: Version, headers: Headers, payload_size: PayloadSize) -> Self {
        Self { method, uri, version, headers, payload_size }
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns a reference to the request target.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The body framing chosen for this request.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// Returns true if the client waits for `100 Continue` before sending the body.
    pub fn expects_continue(&self) -> bool {
        self.headers.get_all("expect").any(|value| value.trim_ascii().eq_ignore_ascii_case(b"100-continue"))
    }

    /// Converts the head into a bodyless [`http::Request`].
    pub fn to_http_request(&self) -> Result<Request<()>, http::Error> {
        let mut request =
            Request::builder().method(self.method.clone()).uri(self.uri.clone()).version(self.version).body(())?;
        *request.headers_mut() = self.headers.to_header_map()?;
        Ok(request)
    }
}
