//! CatSession: the request/reply engine on top of a [`Transport`].
//!
//! Every operation follows the same shape: build a 5-byte frame, write it,
//! and (for queries) race one length-framed reply against a fixed
//! [`REPLY_TIMEOUT`]. The transport, the reply framer and the session
//! counters live behind a single async mutex, so exactly one exchange is in
//! flight at a time and concurrent callers queue in arrival order.
//!
//! A radio that does not answer is an expected condition, not an error:
//! queries resolve to [`CatOutcome::NoReply`]. A reply that turns up after
//! its deadline is dropped; the bytes are drained, logged and counted
//! before the next query is written.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;

use crate::codec::to_hex_string;
use crate::commands::{self, CommandFrame, FRAME_LEN};
use crate::decode::{self, FrequencyAndMode, ReceiverStatus, TransmitterStatus};
use crate::framer::ReplyFramer;
use crate::policy::WritePolicy;

/// How long a query waits for its reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(1000);

/// After a query went unanswered, the next drain keeps reading until the
/// link has been silent this long, to catch a reply that is still on its way.
pub const QUIET_PERIOD: Duration = Duration::from_millis(50);

/// Result of an operation that reached the protocol layer.
///
/// Hard failures (transport errors, malformed replies) are reported through
/// `Result::Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatOutcome<T> {
    /// The operation completed.
    Done(T),
    /// The radio did not answer within [`REPLY_TIMEOUT`].
    NoReply,
    /// The requested frequency (10 Hz units) is outside every receivable
    /// range. Nothing was written.
    UnreachableFrequency(u32),
}

impl<T> CatOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, CatOutcome::Done(_))
    }

    /// The completed value, if any.
    pub fn done(self) -> Option<T> {
        match self {
            CatOutcome::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CatOutcome<U> {
        match self {
            CatOutcome::Done(value) => CatOutcome::Done(f(value)),
            CatOutcome::NoReply => CatOutcome::NoReply,
            CatOutcome::UnreachableFrequency(freq) => CatOutcome::UnreachableFrequency(freq),
        }
    }

    /// Like [`map`](Self::map), for conversions that can fail.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<CatOutcome<U>> {
        Ok(match self {
            CatOutcome::Done(value) => CatOutcome::Done(f(value)?),
            CatOutcome::NoReply => CatOutcome::NoReply,
            CatOutcome::UnreachableFrequency(freq) => CatOutcome::UnreachableFrequency(freq),
        })
    }
}

/// Running counters for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames written to the radio.
    pub exchanges: u64,
    /// Queries that ended in [`CatOutcome::NoReply`].
    pub timeouts: u64,
    /// Late or unsolicited reply bytes thrown away.
    pub stale_bytes_dropped: u64,
}

/// Everything that must only be touched by one exchange at a time.
struct Link {
    transport: Box<dyn Transport>,
    framer: ReplyFramer,
    stats: SessionStats,
    /// The last query ended in `NoReply`.
    reply_overdue: bool,
}

impl Link {
    fn count_dropped(&mut self, dropped: usize, reason: &'static str) {
        if dropped > 0 {
            warn!(dropped, reason, "discarding reply bytes");
            self.stats.stale_bytes_dropped += dropped as u64;
        }
    }

    /// Empty the framer and read off whatever is already waiting on the
    /// link, typically the tail of a reply that missed its deadline. If the
    /// previous query went unanswered, wait for [`QUIET_PERIOD`] of silence.
    async fn drain_stale(&mut self) -> Result<()> {
        let mut dropped = self.framer.reset();
        let wait = if std::mem::take(&mut self.reply_overdue) {
            QUIET_PERIOD
        } else {
            Duration::ZERO
        };
        let mut buf = [0u8; 64];
        loop {
            match self.transport.receive(&mut buf, wait).await {
                Ok(0) | Err(Error::Timeout) => break,
                Ok(n) => {
                    trace!(bytes = %to_hex_string(&buf[..n]), "stale rx");
                    dropped += n;
                }
                Err(e) => return Err(e),
            }
        }
        self.count_dropped(dropped, "stale");
        Ok(())
    }

    /// Read until the framer yields one chunk. Never asks the transport for
    /// more than the chunk still needs, so no bytes of a following reply are
    /// consumed.
    async fn read_chunk(&mut self, deadline: Instant) -> Result<Bytes> {
        loop {
            if let Some(chunk) = self.framer.next_chunk() {
                return Ok(chunk);
            }
            let mut buf = vec![0u8; self.framer.remaining()];
            let wait = deadline.saturating_duration_since(Instant::now());
            let n = self.transport.receive(&mut buf, wait).await?;
            if n == 0 {
                return Err(Error::ConnectionLost);
            }
            trace!(bytes = %to_hex_string(&buf[..n]), "rx");
            self.framer.push(&buf[..n]);
        }
    }

    async fn exchange(
        &mut self,
        frame: &CommandFrame,
        expected_len: usize,
    ) -> Result<CatOutcome<Bytes>> {
        if expected_len == 0 {
            trace!(bytes = %to_hex_string(frame.as_bytes()), "tx");
            self.transport.send(frame.as_bytes()).await?;
            self.stats.exchanges += 1;
            return Ok(CatOutcome::Done(Bytes::new()));
        }

        if self.framer.chunk_size() != expected_len {
            let discarded = self.framer.attach(expected_len);
            self.count_dropped(discarded, "reframe");
        }
        self.drain_stale().await?;

        trace!(bytes = %to_hex_string(frame.as_bytes()), "tx");
        self.transport.send(frame.as_bytes()).await?;
        self.stats.exchanges += 1;

        let deadline = Instant::now() + REPLY_TIMEOUT;
        match tokio::time::timeout_at(deadline, self.read_chunk(deadline)).await {
            Ok(Ok(chunk)) => Ok(CatOutcome::Done(chunk)),
            Ok(Err(Error::Timeout)) | Err(_) => {
                self.stats.timeouts += 1;
                self.reply_overdue = true;
                let partial = self.framer.reset();
                self.count_dropped(partial, "incomplete");
                debug!(opcode = ?frame.opcode(), "no reply within timeout");
                Ok(CatOutcome::NoReply)
            }
            Ok(Err(e)) => {
                self.framer.reset();
                Err(e)
            }
        }
    }
}

/// A connected FT-817 class radio.
///
/// Constructed via [`Ft817Builder`](crate::builder::Ft817Builder). All
/// methods take `&self`; share the session behind an `Arc` to use it from
/// several tasks.
pub struct CatSession {
    link: Mutex<Link>,
    policy: Arc<dyn WritePolicy>,
    port_name: Option<String>,
    baud_rate: Option<u32>,
}

impl CatSession {
    /// Called by [`Ft817Builder`](crate::builder::Ft817Builder); use the
    /// builder instead.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        policy: Arc<dyn WritePolicy>,
        port_name: Option<String>,
        baud_rate: Option<u32>,
    ) -> Self {
        CatSession {
            link: Mutex::new(Link {
                transport,
                framer: ReplyFramer::new(FRAME_LEN),
                stats: SessionStats::default(),
                reply_overdue: false,
            }),
            policy,
            port_name,
            baud_rate,
        }
    }

    /// Serial device path, if the session was opened on one.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn baud_rate(&self) -> Option<u32> {
        self.baud_rate
    }

    /// Replace the reply framer with one delivering `byte_length`-byte
    /// chunks. A partially assembled reply is discarded.
    ///
    /// Typed operations reconfigure framing themselves; this is only needed
    /// when driving [`exchange`](Self::exchange) by hand.
    pub async fn configure_reply_framing(&self, byte_length: usize) -> Result<()> {
        if byte_length == 0 {
            return Err(Error::InvalidParameter(
                "reply length must be at least one byte".into(),
            ));
        }
        let mut link = self.link.lock().await;
        let discarded = link.framer.attach(byte_length);
        link.count_dropped(discarded, "reframe");
        debug!(byte_length, "reply framing configured");
        Ok(())
    }

    /// Current reply chunk size.
    pub async fn reply_framing(&self) -> usize {
        self.link.lock().await.framer.chunk_size()
    }

    /// Write `frame` and wait for an `expected_len`-byte reply.
    ///
    /// With `expected_len == 0` the frame is written and an empty buffer is
    /// returned without reading. Write frames sent this way bypass the
    /// [`WritePolicy`]; use [`send_frame`](Self::send_frame) for that.
    pub async fn exchange(
        &self,
        frame: &CommandFrame,
        expected_len: usize,
    ) -> Result<CatOutcome<Bytes>> {
        let mut link = self.link.lock().await;
        link.exchange(frame, expected_len).await
    }

    /// Send any frame with its opcode's reply length, consulting the write
    /// policy for write frames.
    pub async fn send_frame(&self, frame: CommandFrame) -> Result<CatOutcome<Bytes>> {
        let mut link = self.link.lock().await;
        if frame.opcode().is_write() {
            self.policy.before_write(&frame).await?;
        }
        link.exchange(&frame, frame.reply_len()).await
    }

    async fn write(&self, frame: CommandFrame) -> Result<CatOutcome<()>> {
        Ok(self.send_frame(frame).await?.map(|_| ()))
    }

    async fn query<T>(
        &self,
        frame: CommandFrame,
        decoder: impl FnOnce(&[u8]) -> Result<T>,
    ) -> Result<CatOutcome<T>> {
        self.send_frame(frame).await?.try_map(|buf| decoder(&buf[..]))
    }

    /// Snapshot of the session counters.
    pub async fn stats(&self) -> SessionStats {
        self.link.lock().await.stats
    }

    /// Close the underlying transport.
    pub async fn close(&self) -> Result<()> {
        self.link.lock().await.transport.close().await
    }

    // -----------------------------------------------------------------
    // Typed operations
    // -----------------------------------------------------------------

    /// Tune to `freq_10hz` (10 Hz units).
    ///
    /// Resolves to [`CatOutcome::UnreachableFrequency`] without touching the
    /// link if the radio cannot receive that frequency. The radio does not
    /// acknowledge this command.
    pub async fn set_frequency(&self, freq_10hz: u32) -> Result<CatOutcome<()>> {
        debug!(freq_10hz, "setting frequency");
        let frame = match commands::build_set_frequency_frame(freq_10hz) {
            Ok(frame) => frame,
            Err(Error::UnreachableFrequency(freq)) => {
                debug!(freq, "frequency outside receive ranges, not sent");
                return Ok(CatOutcome::UnreachableFrequency(freq));
            }
            Err(e) => return Err(e),
        };
        self.write(frame).await
    }

    pub async fn get_freq_and_mode(&self) -> Result<CatOutcome<FrequencyAndMode>> {
        debug!("reading frequency and mode");
        self.query(
            commands::build_read_frequency_and_mode_frame(),
            decode::decode_frequency_and_mode,
        )
        .await
    }

    pub async fn get_receiver_status(&self) -> Result<CatOutcome<ReceiverStatus>> {
        debug!("reading receiver status");
        self.query(
            commands::build_read_receiver_status_frame(),
            decode::decode_receiver_status,
        )
        .await
    }

    /// Read PTT, SWR and split flags. See [`TransmitterStatus`] for which
    /// flags can be trusted while receiving.
    pub async fn get_transmitter_status(&self) -> Result<CatOutcome<TransmitterStatus>> {
        debug!("reading transmitter status");
        self.query(
            commands::build_read_transmitter_status_frame(),
            decode::decode_transmitter_status,
        )
        .await
    }

    /// Select an operating mode by its mode byte (see
    /// [`MODES`](crate::tables::MODES)).
    pub async fn set_mode(&self, mode_code: u8) -> Result<CatOutcome<()>> {
        debug!(mode_code, "setting mode");
        self.write(commands::build_set_mode_frame(mode_code)?).await
    }

    pub async fn set_ptt(&self, on: bool) -> Result<CatOutcome<()>> {
        debug!(on, "setting PTT");
        self.write(commands::build_ptt_frame(on)).await
    }

    pub async fn set_split(&self, on: bool) -> Result<CatOutcome<()>> {
        debug!(on, "setting split");
        self.write(commands::build_split_frame(on)).await
    }

    /// Swap VFO A and VFO B.
    pub async fn toggle_vfo(&self) -> Result<CatOutcome<()>> {
        debug!("toggling VFO");
        self.write(commands::build_toggle_vfo_frame()).await
    }

    /// Lock or unlock the front panel.
    pub async fn set_lock(&self, on: bool) -> Result<CatOutcome<()>> {
        debug!(on, "setting lock");
        self.write(commands::build_lock_frame(on)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::DEFAULT_FREQUENCY;
    use crate::policy::AllowAllWrites;
    use async_trait::async_trait;
    use catlink_test_harness::MockTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const READ_FREQ_MODE: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0x03];
    const READ_RX_STATUS: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0xE7];
    const READ_TX_STATUS: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0xF7];

    /// Helper to build a CatSession around a MockTransport.
    fn make_test_session(mock: MockTransport) -> CatSession {
        CatSession::new(Box::new(mock), Arc::new(AllowAllWrites), None, None)
    }

    fn make_session_with_policy(
        mock: MockTransport,
        policy: Arc<dyn WritePolicy>,
    ) -> CatSession {
        CatSession::new(Box::new(mock), policy, None, None)
    }

    // ---------------------------------------------------------------
    // Set frequency
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn set_frequency_writes_bcd_and_never_reads() {
        let mock = MockTransport::new();
        mock.expect(&[0x14, 0x57, 0x50, 0x00, 0x01], &[]);
        let session = make_test_session(mock.clone());

        let outcome = session.set_frequency(DEFAULT_FREQUENCY).await.unwrap();
        assert_eq!(outcome, CatOutcome::Done(()));
        assert_eq!(mock.sent_data(), vec![vec![0x14, 0x57, 0x50, 0x00, 0x01]]);
        assert_eq!(mock.receive_calls(), 0);
        assert_eq!(session.stats().await.exchanges, 1);
    }

    #[tokio::test]
    async fn set_unreachable_frequency_writes_nothing() {
        let mock = MockTransport::new();
        let session = make_test_session(mock.clone());

        let outcome = session.set_frequency(30_000_000).await.unwrap();
        assert_eq!(outcome, CatOutcome::UnreachableFrequency(30_000_000));
        assert!(mock.sent_data().is_empty());
        assert_eq!(session.stats().await.exchanges, 0);
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn get_freq_and_mode_decodes_reply() {
        let mock = MockTransport::new();
        mock.expect(&READ_FREQ_MODE, &[0x14, 0x57, 0x50, 0x00, 0x03]);
        let session = make_test_session(mock.clone());

        let fm = session.get_freq_and_mode().await.unwrap().done().unwrap();
        assert_eq!(fm.frequency, "14575000");
        assert_eq!((fm.mhzs, fm.khzs, fm.hzs), (145, 750, 0));
        assert_eq!(fm.mode_id, "03");
        assert_eq!(fm.mode_name, "CWR");
    }

    #[tokio::test]
    async fn get_receiver_status_decodes_reply() {
        let mock = MockTransport::new();
        mock.expect(&READ_RX_STATUS, &[0x0C]);
        let session = make_test_session(mock);

        let status = session.get_receiver_status().await.unwrap().done().unwrap();
        assert!(!status.squelched);
        assert_eq!(status.smeter_reading, "S9+30dB");
        assert_eq!(session.reply_framing().await, 1);
    }

    #[tokio::test]
    async fn get_transmitter_status_decodes_reply() {
        let mock = MockTransport::new();
        mock.expect(&READ_TX_STATUS, &[0xE0]);
        let session = make_test_session(mock);

        let status = session
            .get_transmitter_status()
            .await
            .unwrap()
            .done()
            .unwrap();
        assert!(!status.ptt_active);
        assert_eq!(status.high_swr_if_transmitting(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_radio_resolves_to_no_reply_after_timeout() {
        let mock = MockTransport::new();
        mock.expect_silence(&READ_RX_STATUS);
        let session = make_test_session(mock);

        let start = Instant::now();
        let outcome = session.get_receiver_status().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(outcome, CatOutcome::NoReply);
        assert!(elapsed >= REPLY_TIMEOUT);
        assert!(elapsed < REPLY_TIMEOUT + Duration::from_millis(50));

        let stats = session.stats().await;
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.exchanges, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_is_drained_before_next_query() {
        let mock = MockTransport::new();
        mock.expect_delayed(&READ_RX_STATUS, &[0x09], Duration::from_millis(1500));
        mock.expect(&READ_RX_STATUS, &[0x05]);
        let session = make_test_session(mock);

        assert_eq!(
            session.get_receiver_status().await.unwrap(),
            CatOutcome::NoReply
        );

        // Let the late byte land in the receive buffer.
        tokio::time::sleep(Duration::from_millis(600)).await;

        let status = session.get_receiver_status().await.unwrap().done().unwrap();
        assert_eq!(status.smeter_reading, "S5");
        assert_eq!(session.stats().await.stale_bytes_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_landing_just_after_timeout_is_not_taken_as_next_answer() {
        let mock = MockTransport::new();
        mock.expect_delayed(&READ_RX_STATUS, &[0x0F], Duration::from_millis(1010));
        mock.expect(&READ_RX_STATUS, &[0x01]);
        let session = make_test_session(mock);

        assert_eq!(
            session.get_receiver_status().await.unwrap(),
            CatOutcome::NoReply
        );
        let status = session.get_receiver_status().await.unwrap().done().unwrap();
        assert_eq!(status.smeter_reading, "S1");
        assert_eq!(session.stats().await.stale_bytes_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_period_only_follows_a_timeout() {
        let mock = MockTransport::new();
        mock.expect(&READ_RX_STATUS, &[0x02]);
        mock.expect(&READ_RX_STATUS, &[0x03]);
        let session = make_test_session(mock);

        let start = Instant::now();
        session.get_receiver_status().await.unwrap();
        session.get_receiver_status().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn short_reply_is_discarded_as_incomplete() {
        let mock = MockTransport::new();
        mock.expect(&READ_FREQ_MODE, &[0x14, 0x57]);
        mock.expect(&READ_RX_STATUS, &[0x09]);
        let session = make_test_session(mock);

        assert_eq!(
            session.get_freq_and_mode().await.unwrap(),
            CatOutcome::NoReply
        );
        let stats = session.stats().await;
        assert_eq!(stats.stale_bytes_dropped, 2);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(session.link.lock().await.framer.pending(), 0);

        let status = session.get_receiver_status().await.unwrap().done().unwrap();
        assert_eq!(status.smeter_reading, "S9");
        assert_eq!(session.stats().await.stale_bytes_dropped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_arriving_in_pieces_is_reassembled() {
        let mock = MockTransport::new();
        mock.expect_in_pieces(
            &READ_FREQ_MODE,
            &[
                (Duration::from_millis(5), &[0x14]),
                (Duration::from_millis(20), &[0x57, 0x50]),
                (Duration::from_millis(60), &[0x00, 0x08]),
            ],
        );
        let session = make_test_session(mock.clone());

        let fm = session.get_freq_and_mode().await.unwrap().done().unwrap();
        assert_eq!(fm.frequency, "14575000");
        assert_eq!(fm.mode_name, "FM");
        assert!(mock.receive_calls() >= 3);

        let stats = session.stats().await;
        assert_eq!(stats.timeouts, 0);
        assert_eq!(stats.stale_bytes_dropped, 0);
        assert_eq!(session.link.lock().await.framer.pending(), 0);
    }

    #[tokio::test]
    async fn framer_is_clean_after_exchange() {
        let mock = MockTransport::new();
        mock.expect(&READ_FREQ_MODE, &[0x43, 0x21, 0x00, 0x00, 0x01]);
        mock.expect(&READ_RX_STATUS, &[0x80]);
        let session = make_test_session(mock);

        session.get_freq_and_mode().await.unwrap();
        {
            let link = session.link.lock().await;
            assert_eq!(link.framer.chunk_size(), 5);
            assert_eq!(link.framer.pending(), 0);
        }

        session.get_receiver_status().await.unwrap();
        let link = session.link.lock().await;
        assert_eq!(link.framer.chunk_size(), 1);
        assert_eq!(link.framer.pending(), 0);
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let mock = MockTransport::new();
        mock.expect(&READ_FREQ_MODE, &[0x14, 0xA7, 0x50, 0x00, 0x03]);
        let session = make_test_session(mock);

        let result = session.get_freq_and_mode().await;
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[tokio::test]
    async fn transport_errors_propagate() {
        let mock = MockTransport::new();
        mock.set_connected(false);
        let session = make_test_session(mock);

        let result = session.get_receiver_status().await;
        assert!(matches!(result, Err(Error::NotConnected)));
        assert_eq!(session.stats().await.exchanges, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_queries_are_serialized() {
        let mock = MockTransport::new();
        mock.expect_delayed(&READ_RX_STATUS, &[0x03], Duration::from_millis(200));
        mock.expect(&READ_TX_STATUS, &[0x80]);
        let session = Arc::new(make_test_session(mock.clone()));

        let (rx, tx) = tokio::join!(
            session.get_receiver_status(),
            session.get_transmitter_status()
        );

        assert_eq!(rx.unwrap().done().unwrap().smeter_reading, "S3");
        assert!(!tx.unwrap().done().unwrap().ptt_active);
        assert_eq!(
            mock.sent_data(),
            vec![READ_RX_STATUS.to_vec(), READ_TX_STATUS.to_vec()]
        );
    }

    // ---------------------------------------------------------------
    // Framing and raw exchange
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn configure_reply_framing_rejects_zero() {
        let session = make_test_session(MockTransport::new());
        assert!(matches!(
            session.configure_reply_framing(0).await,
            Err(Error::InvalidParameter(_))
        ));
        session.configure_reply_framing(1).await.unwrap();
        assert_eq!(session.reply_framing().await, 1);
    }

    #[tokio::test]
    async fn exchange_with_zero_length_skips_read() {
        let mock = MockTransport::new();
        mock.expect(&[0, 0, 0, 0, 0x81], &[]);
        let session = make_test_session(mock.clone());

        let frame = commands::build_toggle_vfo_frame();
        let outcome = session.exchange(&frame, 0).await.unwrap();
        assert_eq!(outcome, CatOutcome::Done(Bytes::new()));
        assert_eq!(mock.receive_calls(), 0);
    }

    #[tokio::test]
    async fn send_frame_uses_opcode_reply_length() {
        let mock = MockTransport::new();
        mock.expect(&READ_TX_STATUS, &[0x7F]);
        let session = make_test_session(mock);

        let frame = CommandFrame::try_from(READ_TX_STATUS).unwrap();
        let reply = session.send_frame(frame).await.unwrap().done().unwrap();
        assert_eq!(&reply[..], &[0x7F]);
    }

    // ---------------------------------------------------------------
    // Other writes
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn write_operations_send_expected_frames() {
        let mock = MockTransport::new();
        mock.expect(&[0x01, 0, 0, 0, 0x07], &[]);
        mock.expect(&[0, 0, 0, 0, 0x08], &[]);
        mock.expect(&[0, 0, 0, 0, 0x88], &[]);
        mock.expect(&[0, 0, 0, 0, 0x02], &[]);
        mock.expect(&[0, 0, 0, 0, 0x81], &[]);
        mock.expect(&[0, 0, 0, 0, 0x00], &[]);
        let session = make_test_session(mock.clone());

        assert!(session.set_mode(0x01).await.unwrap().is_done());
        assert!(session.set_ptt(true).await.unwrap().is_done());
        assert!(session.set_ptt(false).await.unwrap().is_done());
        assert!(session.set_split(true).await.unwrap().is_done());
        assert!(session.toggle_vfo().await.unwrap().is_done());
        assert!(session.set_lock(true).await.unwrap().is_done());

        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.receive_calls(), 0);
    }

    #[tokio::test]
    async fn set_mode_rejects_report_only_modes() {
        let mock = MockTransport::new();
        let session = make_test_session(mock.clone());
        assert!(matches!(
            session.set_mode(0x88).await,
            Err(Error::InvalidParameter(_))
        ));
        assert!(mock.sent_data().is_empty());
    }

    // ---------------------------------------------------------------
    // Write policy
    // ---------------------------------------------------------------

    #[derive(Default)]
    struct CountingPolicy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WritePolicy for CountingPolicy {
        async fn before_write(&self, _frame: &CommandFrame) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct DenyWrites;

    #[async_trait]
    impl WritePolicy for DenyWrites {
        async fn before_write(&self, frame: &CommandFrame) -> Result<()> {
            Err(Error::InvalidParameter(format!(
                "writes disabled ({:?})",
                frame.opcode()
            )))
        }
    }

    #[tokio::test]
    async fn policy_sees_writes_only() {
        let mock = MockTransport::new();
        mock.expect(&[0x14, 0x57, 0x50, 0x00, 0x01], &[]);
        mock.expect(&READ_RX_STATUS, &[0x01]);
        let policy = Arc::new(CountingPolicy::default());
        let session = make_session_with_policy(mock, policy.clone());

        session.set_frequency(DEFAULT_FREQUENCY).await.unwrap();
        session.get_receiver_status().await.unwrap();
        assert_eq!(policy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn denied_write_is_not_sent() {
        let mock = MockTransport::new();
        let session = make_session_with_policy(mock.clone(), Arc::new(DenyWrites));

        let result = session.set_frequency(DEFAULT_FREQUENCY).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert!(mock.sent_data().is_empty());
    }

    #[test]
    fn outcome_helpers() {
        let done: CatOutcome<u8> = CatOutcome::Done(3);
        assert!(done.is_done());
        assert_eq!(done.clone().map(|v| v * 2), CatOutcome::Done(6));
        assert_eq!(done.done(), Some(3));

        let none: CatOutcome<u8> = CatOutcome::NoReply;
        assert_eq!(none.clone().done(), None);
        assert_eq!(none.map(|v| v * 2), CatOutcome::NoReply);

        let unreachable: CatOutcome<u8> = CatOutcome::UnreachableFrequency(1);
        let mapped = unreachable.try_map(|v| Ok(u32::from(v))).unwrap();
        assert_eq!(mapped, CatOutcome::UnreachableFrequency(1));
    }
}
