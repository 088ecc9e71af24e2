//! Length-based re-framing of the reply byte stream.
//!
//! The serial link delivers bytes in whatever pieces the UART and driver
//! happen to produce. Replies on this protocol carry no terminator, so the
//! only way to cut the stream back into replies is by length: the session
//! tells the framer how many bytes the next reply has, pushes everything it
//! reads, and pops one complete chunk.

use bytes::{Bytes, BytesMut};

/// Cuts an incoming byte stream into fixed-size chunks.
#[derive(Debug)]
pub struct ReplyFramer {
    chunk_size: usize,
    buf: BytesMut,
}

impl ReplyFramer {
    /// Create a framer delivering `chunk_size`-byte chunks.
    pub fn new(chunk_size: usize) -> Self {
        ReplyFramer {
            chunk_size,
            buf: BytesMut::with_capacity(chunk_size),
        }
    }

    /// Current chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Detach from the current chunk size and attach with a new one.
    ///
    /// Any partially assembled chunk is discarded. Returns the number of
    /// bytes thrown away.
    pub fn attach(&mut self, chunk_size: usize) -> usize {
        let discarded = self.reset();
        self.chunk_size = chunk_size;
        self.buf.reserve(chunk_size);
        discarded
    }

    /// Append bytes read from the link.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes still missing before a full chunk is available.
    pub fn remaining(&self) -> usize {
        self.chunk_size.saturating_sub(self.buf.len())
    }

    /// Take one complete chunk, if enough bytes have been pushed.
    pub fn next_chunk(&mut self) -> Option<Bytes> {
        if self.chunk_size == 0 || self.buf.len() < self.chunk_size {
            return None;
        }
        Some(self.buf.split_to(self.chunk_size).freeze())
    }

    /// Drop all buffered bytes, returning how many there were.
    pub fn reset(&mut self) -> usize {
        let n = self.buf.len();
        self.buf.clear();
        n
    }

    /// Bytes buffered but not yet delivered as a chunk.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
