//! Protocol types produced by the parser.
//!
//! Everything in this module is plain data: the parser in [`crate::codec`]
//! builds these values as productions complete and hands them out once they
//! are immutable.
//!
//! - **Message heads**: [`RequestHead`], [`ResponseHead`] and the [`MessageHead`]
//!   enum over both
//! - **Headers**: [`Headers`], a case-preserving, case-insensitive multi-map
//! - **Payload**: [`PayloadItem`] (body chunks and EOF) and [`PayloadSize`]
//!   (the framing selected for a body)
//! - **Framing input**: [`RequestContext`], what a response parser must know
//!   about the request it answers
//! - **Errors**: [`ParseError`] with its [`ErrorKind`], plus [`HttpError`]
//!   for the transport adapter

mod message;
pub use message::Message;
pub use message::MessageHead;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod headers;
pub use headers::HeaderField;
pub use headers::Headers;

mod request;
pub use request::RequestHead;

mod response;
pub use response::RequestContext;
pub use response::ResponseHead;

mod error;
pub use error::ErrorKind;
pub use error::HttpError;
pub use error::Limit;
pub use error::ParseError;
pub use error::Production;

#[cfg(test)]
pub(crate) use headers::headers_of;
