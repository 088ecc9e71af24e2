//! Transport trait for radio communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a transceiver:
//! a duplex byte channel that accepts writes and delivers whatever bytes the
//! radio sends back. Protocol engines operate on a `Transport` rather than a
//! serial port directly, so they can be driven by real hardware
//! (`catlink-transport`) or by the scripted `MockTransport` from
//! `catlink-test-harness`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous duplex byte channel to a radio.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the radio.
    ///
    /// Completes once all bytes have been handed to the underlying link.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the radio into `buf`.
    ///
    /// Returns the number of bytes read. Waits up to `timeout`; returns
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrives.
    /// A zero `timeout` only returns bytes that are already available.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport. Later `send()`/`receive()` calls return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
