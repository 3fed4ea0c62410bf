//! Accumulating buffer of not-yet-consumed input.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Returned when a caller tries to consume more bytes than are buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("can't consume {requested} bytes, only {available} available")]
pub struct RangeError {
    pub requested: usize,
    pub available: usize,
}

/// Owns the bytes received on one connection that the parser has not consumed yet.
///
/// Consuming moves the start of the underlying [`BytesMut`] forward, so
/// discarding a prefix never copies the remaining bytes. Bytes are never
/// reordered, and only [`ByteCursor::reset`] drops unconsumed ones.
#[derive(Debug, Default)]
pub struct ByteCursor {
    buf: BytesMut,
    consumed: u64,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), consumed: 0 }
    }

    /// Copies `bytes` to the tail.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Moves an owned buffer to the tail, without copying when the cursor is empty.
    pub fn extend(&mut self, bytes: BytesMut) {
        if self.buf.is_empty() {
            self.buf = bytes;
        } else {
            self.buf.unsplit(bytes);
        }
    }

    /// Read-only view from `offset` to the tail; empty if `offset` is past the tail.
    pub fn peek_from(&self, offset: usize) -> &[u8] {
        self.buf.get(offset..).unwrap_or_default()
    }

    /// Discards the first `n` bytes.
    pub fn consume(&mut self, n: usize) -> Result<(), RangeError> {
        self.check(n)?;
        self.buf.advance(n);
        self.consumed += n as u64;
        Ok(())
    }

    /// Consumes the first `n` bytes and returns them as a shared, zero-copy buffer.
    pub fn split_to(&mut self, n: usize) -> Result<Bytes, RangeError> {
        self.check(n)?;
        self.consumed += n as u64;
        Ok(self.buf.split_to(n).freeze())
    }

    /// Number of buffered, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total number of bytes consumed since construction or the last reset.
    pub fn total_consumed(&self) -> u64 {
        self.consumed
    }

    /// Drops every buffered byte and the consumed counter.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.consumed = 0;
    }

    fn check(&self, n: usize) -> Result<(), RangeError> {
        if n > self.buf.len() {
            return Err(RangeError { requested: n, available: self.buf.len() });
        }
        Ok(())
    }
}
