use bytes::{Buf, Bytes};
use http::Version;

use crate::protocol::{Headers, RequestHead, ResponseHead};

/// Item produced by the streaming decoder: either a message head or a payload item.
///
/// The generic parameter `T` is the head type, `Data` the type of the payload
/// data (defaults to `Bytes`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T, Data: Buf = Bytes> {
    /// Contains the head of the message
    Header(T),
    /// Contains a chunk of payload data or EOF marker
    Payload(PayloadItem<Data>),
}

/// Represents an item in the HTTP message payload stream.
///
/// The body of a message is a finite sequence of `Chunk`s terminated by a single `Eof`.
/// Every chunk is handed out exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// How the end of a message body is found.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Payload delimited by the connection closing (responses only)
    UntilClose,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if no body bytes follow the head
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty | PayloadSize::Length(0))
    }
}

/// The immutable head of a parsed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageHead {
    Request(RequestHead),
    Response(ResponseHead),
}

impl MessageHead {
    pub fn version(&self) -> Version {
        match self {
            MessageHead::Request(head) => head.version(),
            MessageHead::Response(head) => head.version(),
        }
    }

    pub fn headers(&self) -> &Headers {
        match self {
            MessageHead::Request(head) => head.headers(),
            MessageHead::Response(head) => head.headers(),
        }
    }

    /// The framing selected for the body that follows this head.
    pub fn payload_size(&self) -> PayloadSize {
        match self {
            MessageHead::Request(head) => head.payload_size(),
            MessageHead::Response(head) => head.payload_size(),
        }
    }

    pub fn as_request(&self) -> Option<&RequestHead> {
        match self {
            MessageHead::Request(head) => Some(head),
            MessageHead::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&ResponseHead> {
        match self {
            MessageHead::Request(_) => None,
            MessageHead::Response(head) => Some(head),
        }
    }

    pub fn into_request(self) -> Option<RequestHead> {
        match self {
            MessageHead::Request(head) => Some(head),
            MessageHead::Response(_) => None,
        }
    }

    pub fn into_response(self) -> Option<ResponseHead> {
        match self {
            MessageHead::Request(_) => None,
            MessageHead::Response(head) => Some(head),
        }
    }
}

impl<T> Message<T> {
    /// Returns true if this message contains payload data
    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    /// Returns true if this message contains header information
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// Converts the message into a PayloadItem if it contains payload data
    ///
    /// Returns None if the message contains header information
    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Header(_) => None,
            Message::Payload(payload_item) => Some(payload_item),
        }
    }
}

impl<D: Buf> PayloadItem<D> {
    /// Returns true if this item represents the end of the payload stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}

impl PayloadItem {
    /// Returns a reference to the contained bytes if this is a Chunk
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the PayloadItem and returns the contained bytes if this is a Chunk
    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_size_predicates() {
        assert!(PayloadSize::Chunked.is_chunked());
        assert!(!PayloadSize::Chunked.is_empty());
        assert!(!PayloadSize::Length(5).is_chunked());
        assert!(PayloadSize::Length(0).is_empty());
        assert!(PayloadSize::Empty.is_empty());
        assert!(!PayloadSize::UntilClose.is_empty());
    }

    #[test]
    fn payload_item_accessors() {
        let chunk: PayloadItem = PayloadItem::Chunk(Bytes::from_static(b"abc"));
        assert!(chunk.is_chunk());
        assert!(!chunk.is_eof());
        assert_eq!(chunk.as_bytes(), Some(&Bytes::from_static(b"abc")));

        let eof: PayloadItem = PayloadItem::Eof;
        assert!(eof.is_eof());
        assert!(!eof.is_chunk());
        assert_eq!(eof.into_bytes(), None);

        let message: Message<()> = Message::Payload(chunk);
        assert!(message.is_payload());
        assert_eq!(message.into_payload_item().and_then(PayloadItem::into_bytes), Some(Bytes::from_static(b"abc")));
        assert!(Message::<()>::Header(()).is_header());
    }
}
