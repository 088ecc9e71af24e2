//! Reply decoders.
//!
//! Replies carry no framing of their own; their length is fixed by the
//! command that asked for them:
//!
//! | Command                | Reply | Layout                                      |
//! |------------------------|-------|---------------------------------------------|
//! | read frequency + mode  | 5     | `F1 F2 F3 F4 MODE`, frequency as BCD digits |
//! | read receiver status   | 1     | bit 7 squelch, bits 0-3 S-meter             |
//! | read transmitter status| 1     | bits 7/6/5 PTT, high SWR, split (active-low)|
//!
//! A reply of the wrong length means the transport handed over a broken
//! chunk and is reported as [`Error::Transport`], not as a decode failure.

use catlink_core::{Error, Result};

use crate::codec::{hex_byte_to_bits, to_hex_string};
use crate::tables::mode_name_by_id;

/// Decoded reply to the read-frequency-and-mode command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyAndMode {
    /// All eight frequency digits, e.g. `"14575000"` for 145.750.00 MHz.
    pub frequency: String,
    /// First three digits (`145`).
    pub mhzs: u32,
    /// Next three digits (`750`).
    pub khzs: u32,
    /// Last two digits, the 10 Hz and 100 Hz places (`0`).
    pub hzs: u32,
    /// Two hex characters of the mode byte, e.g. `"08"`.
    pub mode_id: String,
    /// Resolved mode name, or `mode_id` itself for unknown modes.
    pub mode_name: String,
}

impl FrequencyAndMode {
    /// The frequency in 10 Hz units, suitable for passing back to
    /// set-frequency.
    pub fn frequency_10hz(&self) -> u32 {
        self.mhzs * 100_000 + self.khzs * 100 + self.hzs
    }
}

/// Decoded reply to the read-receiver-status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverStatus {
    /// The squelch is closed (no signal).
    pub squelched: bool,
    /// `"S0"`..`"S9"`, then `"S9+10dB"`..`"S9+60dB"`.
    pub smeter_reading: String,
}

/// Decoded reply to the read-transmitter-status command.
///
/// Only [`ptt_active`](Self::ptt_active) is reliable on its own. The radio
/// leaves `high_swr` and `split_on` floating while receiving, so they must not
/// be acted on unless `ptt_active` is true; the accessor methods enforce
/// that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitterStatus {
    pub ptt_active: bool,
    pub high_swr: bool,
    pub split_on: bool,
}

impl TransmitterStatus {
    /// High-SWR flag, or `None` when the radio is not transmitting.
    pub fn high_swr_if_transmitting(&self) -> Option<bool> {
        self.ptt_active.then_some(self.high_swr)
    }

    /// Split flag, or `None` when the radio is not transmitting.
    pub fn split_if_transmitting(&self) -> Option<bool> {
        self.ptt_active.then_some(self.split_on)
    }
}

fn expect_len(buf: &[u8], expected: usize, what: &str) -> Result<()> {
    if buf.len() != expected {
        return Err(Error::Transport(format!(
            "{what} reply is {} bytes, expected {expected}",
            buf.len()
        )));
    }
    Ok(())
}

fn parse_digits(digits: &str) -> Result<u32> {
    digits
        .parse()
        .map_err(|_| Error::Format(format!("{digits:?} is not a decimal field")))
}

/// Decode a 5-byte frequency/mode reply.
///
/// # Example
///
/// ```
/// use catlink_ft817::decode::decode_frequency_and_mode;
///
/// let fm = decode_frequency_and_mode(&[0x14, 0x57, 0x50, 0x00, 0x08]).unwrap();
/// assert_eq!(fm.frequency, "14575000");
/// assert_eq!((fm.mhzs, fm.khzs, fm.hzs), (145, 750, 0));
/// assert_eq!(fm.mode_name, "FM");
/// ```
pub fn decode_frequency_and_mode(buf: &[u8]) -> Result<FrequencyAndMode> {
    expect_len(buf, 5, "frequency/mode")?;

    let hex = to_hex_string(buf);
    let (frequency, mode_id) = hex.split_at(8);
    if !frequency.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format(format!(
            "frequency field {frequency:?} contains non-BCD digits"
        )));
    }

    Ok(FrequencyAndMode {
        frequency: frequency.to_string(),
        mhzs: parse_digits(&frequency[0..3])?,
        khzs: parse_digits(&frequency[3..6])?,
        hzs: parse_digits(&frequency[6..8])?,
        mode_id: mode_id.to_string(),
        mode_name: mode_name_by_id(mode_id),
    })
}

/// Render a 4-bit S-meter value. Values above 9 are 10 dB steps over S9.
pub fn smeter_reading(s: u8) -> String {
    if s <= 9 {
        format!("S{s}")
    } else {
        format!("S9+{}dB", (u32::from(s) - 9) * 10)
    }
}

/// Decode a 1-byte receiver status reply.
pub fn decode_receiver_status(buf: &[u8]) -> Result<ReceiverStatus> {
    expect_len(buf, 1, "receiver status")?;
    let bits = hex_byte_to_bits(&to_hex_string(buf))?;
    Ok(ReceiverStatus {
        squelched: bits.is_set(7),
        smeter_reading: smeter_reading(bits.low_nibble()),
    })
}

/// Decode a 1-byte transmitter status reply.
///
/// All three flags are active-low: a cleared bit means the condition holds,
/// so an all-zero byte reads as transmitting into a high SWR with split on.
pub fn decode_transmitter_status(buf: &[u8]) -> Result<TransmitterStatus> {
    expect_len(buf, 1, "transmitter status")?;
    let bits = hex_byte_to_bits(&to_hex_string(buf))?;
    Ok(TransmitterStatus {
        ptt_active: !bits.is_set(7),
        high_swr: !bits.is_set(6),
        split_on: !bits.is_set(5),
    })
}
