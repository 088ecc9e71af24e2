//! Mock transport for deterministic testing of protocol engines.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/reply pairs. A reply may be immediate, delayed (to model a radio
//! answering after the engine gave up), or absent altogether (to model a
//! radio that is switched off). Time is measured with `tokio::time`, so tests
//! running on a paused clock see exact timings.
//!
//! Clones share state: keep one clone for assertions and hand the other to
//! the session under test.
//!
//! # Example
//!
//! ```
//! use catlink_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // When the engine sends "read frequency and mode", answer 145.750.00 MHz FM.
//! mock.expect(&[0x00, 0x00, 0x00, 0x00, 0x03], &[0x14, 0x57, 0x50, 0x00, 0x08]);
//! // A silent radio: the read receiver status query gets no answer.
//! mock.expect_silence(&[0x00, 0x00, 0x00, 0x00, 0xE7]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;

/// A pre-loaded request/reply pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// Pieces of the reply, each readable the given time after the request.
    /// Empty means no reply at all.
    pieces: Vec<(Duration, Vec<u8>)>,
}

/// Reply bytes that are (or will become) readable.
#[derive(Debug)]
struct PendingReply {
    bytes: Vec<u8>,
    cursor: usize,
    ready_at: Instant,
}

#[derive(Debug)]
struct MockState {
    expectations: VecDeque<Expectation>,
    pending: VecDeque<PendingReply>,
    connected: bool,
    sent_log: Vec<Vec<u8>>,
    receive_calls: usize,
}

/// A mock [`Transport`] for testing protocol engines without hardware.
///
/// Expectations are consumed in order. Each `send()` is recorded and matched
/// against the next expectation; its reply is queued behind any reply that
/// has not been read yet, just like bytes sitting in a UART buffer.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                pending: VecDeque::new(),
                connected: true,
                sent_log: Vec::new(),
                receive_calls: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the original failure.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, request: &[u8], pieces: Vec<(Duration, Vec<u8>)>) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            pieces,
        });
    }

    /// Expect `request` and make `response` readable immediately.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.expect_delayed(request, response, Duration::ZERO);
    }

    /// Expect `request` and make `response` readable `delay` later.
    pub fn expect_delayed(&self, request: &[u8], response: &[u8], delay: Duration) {
        self.expect_in_pieces(request, &[(delay, response)]);
    }

    /// Expect `request` and deliver the reply in pieces, each readable at its
    /// offset from the request. Models a slow UART handing over a reply a few
    /// bytes at a time.
    pub fn expect_in_pieces(&self, request: &[u8], pieces: &[(Duration, &[u8])]) {
        let pieces = pieces
            .iter()
            .filter(|(_, bytes)| !bytes.is_empty())
            .map(|(delay, bytes)| (*delay, bytes.to_vec()))
            .collect();
        self.push(request, pieces);
    }

    /// Expect `request` and never answer it.
    pub fn expect_silence(&self, request: &[u8]) {
        self.push(request, Vec::new());
    }

    /// All data sent through this transport, one element per `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Number of times `receive()` has been called.
    pub fn receive_calls(&self) -> usize {
        self.state().receive_calls
    }

    /// Number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Set the connected state. When `false`, `send()` and `receive()`
    /// return [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// What `receive()` should do once the state lock is released.
enum Step {
    Read(usize),
    WaitUntil(Instant),
    TimeOut,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());

        let Some(expectation) = state.expectations.pop_front() else {
            return Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            )));
        }
        let sent_at = Instant::now();
        for (delay, bytes) in expectation.pieces {
            state.pending.push_back(PendingReply {
                bytes,
                cursor: 0,
                ready_at: sent_at + delay,
            });
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let deadline = Instant::now() + timeout;
        {
            let mut state = self.state();
            if !state.connected {
                return Err(Error::NotConnected);
            }
            state.receive_calls += 1;
        }
        loop {
            let step = {
                let mut state = self.state();
                let now = Instant::now();
                let step = match state.pending.front_mut() {
                    Some(reply) if reply.ready_at <= now => {
                        let remaining = &reply.bytes[reply.cursor..];
                        let n = remaining.len().min(buf.len());
                        buf[..n].copy_from_slice(&remaining[..n]);
                        reply.cursor += n;
                        Step::Read(n)
                    }
                    Some(reply) if reply.ready_at <= deadline => {
                        Step::WaitUntil(reply.ready_at)
                    }
                    _ => Step::TimeOut,
                };
                if state
                    .pending
                    .front()
                    .is_some_and(|reply| reply.cursor >= reply.bytes.len())
                {
                    state.pending.pop_front();
                }
                step
            };

            match step {
                Step::Read(n) => return Ok(n),
                Step::WaitUntil(at) => tokio::time::sleep_until(at).await,
                Step::TimeOut => {
                    tokio::time::sleep_until(deadline).await;
                    return Err(Error::Timeout);
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}
