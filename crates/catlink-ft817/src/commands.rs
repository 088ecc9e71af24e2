//! 5-byte CAT command frames.
//!
//! Every command is exactly five bytes: four parameter bytes followed by an
//! opcode.
//!
//! ```text
//! [P1] [P2] [P3] [P4] [OPCODE]
//! ```
//!
//! For set-frequency the parameters are the eight frequency digits (10 Hz
//! units) packed as BCD pairs, MHz first: 145.750.00 MHz is
//! `14 57 50 00 01`. Read commands pad the parameters with zeros.
//!
//! All functions here are pure; sending frames is the session's job.

use catlink_core::{Error, Result};

use crate::codec::decimal_pair_to_hex;
use crate::tables::{is_settable_mode, is_valid_rx_frequency};

/// Length of every command frame.
pub const FRAME_LEN: usize = 5;

/// Frequency used when the caller does not pick one: 145.750.00 MHz.
pub const DEFAULT_FREQUENCY: u32 = 14_575_000;

/// Command opcodes (byte 4 of a frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    LockOn = 0x00,
    SetFrequency = 0x01,
    SplitOn = 0x02,
    ReadFrequencyAndMode = 0x03,
    SetMode = 0x07,
    PttOn = 0x08,
    LockOff = 0x80,
    ToggleVfo = 0x81,
    SplitOff = 0x82,
    PttOff = 0x88,
    ReadReceiverStatus = 0xE7,
    ReadTransmitterStatus = 0xF7,
}

impl Opcode {
    /// Number of reply bytes the radio sends for this opcode. Zero means the
    /// command is fire-and-forget.
    pub fn reply_len(self) -> usize {
        match self {
            Opcode::ReadFrequencyAndMode => 5,
            Opcode::ReadReceiverStatus | Opcode::ReadTransmitterStatus => 1,
            _ => 0,
        }
    }

    /// Whether the command changes radio state.
    pub fn is_write(self) -> bool {
        self.reply_len() == 0
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0x00 => Opcode::LockOn,
            0x01 => Opcode::SetFrequency,
            0x02 => Opcode::SplitOn,
            0x03 => Opcode::ReadFrequencyAndMode,
            0x07 => Opcode::SetMode,
            0x08 => Opcode::PttOn,
            0x80 => Opcode::LockOff,
            0x81 => Opcode::ToggleVfo,
            0x82 => Opcode::SplitOff,
            0x88 => Opcode::PttOff,
            0xE7 => Opcode::ReadReceiverStatus,
            0xF7 => Opcode::ReadTransmitterStatus,
            other => {
                return Err(Error::Protocol(format!("unknown opcode 0x{other:02X}")));
            }
        })
    }
}

/// A complete command frame. Always exactly [`FRAME_LEN`] bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; FRAME_LEN],
    opcode: Opcode,
}

impl CommandFrame {
    fn new(params: [u8; 4], opcode: Opcode) -> Self {
        let [p1, p2, p3, p4] = params;
        CommandFrame {
            bytes: [p1, p2, p3, p4, opcode as u8],
            opcode,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Reply length expected for this frame's opcode.
    pub fn reply_len(&self) -> usize {
        self.opcode.reply_len()
    }
}

impl TryFrom<[u8; FRAME_LEN]> for CommandFrame {
    type Error = Error;

    /// Accept raw bytes only if byte 4 is a known opcode.
    fn try_from(bytes: [u8; FRAME_LEN]) -> Result<Self> {
        let opcode = Opcode::try_from(bytes[4])?;
        Ok(CommandFrame { bytes, opcode })
    }
}

/// Pack a frequency (10 Hz units) into four BCD bytes, MHz first.
///
/// The frequency is written as eight zero-padded decimal digits and split
/// into pairs: `14575000` becomes `"14" "57" "50" "00"`.
pub fn frequency_to_bcd(freq_10hz: u32) -> Result<[u8; 4]> {
    let digits = format!("{freq_10hz:08}");
    if digits.len() != 8 {
        return Err(Error::Format(format!(
            "frequency {freq_10hz} does not fit in eight digits"
        )));
    }
    Ok([
        decimal_pair_to_hex(&digits[0..2])?,
        decimal_pair_to_hex(&digits[2..4])?,
        decimal_pair_to_hex(&digits[4..6])?,
        decimal_pair_to_hex(&digits[6..8])?,
    ])
}

/// Build a set-frequency frame (`P1..P4 = BCD frequency`, opcode `0x01`).
///
/// Returns [`Error::UnreachableFrequency`] if the radio cannot receive
/// `freq_10hz`.
///
/// # Example
///
/// ```
/// use catlink_ft817::commands::{build_set_frequency_frame, DEFAULT_FREQUENCY};
///
/// let frame = build_set_frequency_frame(DEFAULT_FREQUENCY).unwrap();
/// assert_eq!(frame.as_bytes(), &[0x14, 0x57, 0x50, 0x00, 0x01]);
/// ```
pub fn build_set_frequency_frame(freq_10hz: u32) -> Result<CommandFrame> {
    if !is_valid_rx_frequency(freq_10hz) {
        return Err(Error::UnreachableFrequency(freq_10hz));
    }
    Ok(CommandFrame::new(
        frequency_to_bcd(freq_10hz)?,
        Opcode::SetFrequency,
    ))
}

/// `00 00 00 00 03`; the radio answers with 5 bytes.
pub fn build_read_frequency_and_mode_frame() -> CommandFrame {
    CommandFrame::new([0; 4], Opcode::ReadFrequencyAndMode)
}

/// `00 00 00 00 E7`; the radio answers with 1 byte.
pub fn build_read_receiver_status_frame() -> CommandFrame {
    CommandFrame::new([0; 4], Opcode::ReadReceiverStatus)
}

/// `00 00 00 00 F7`; the radio answers with 1 byte.
pub fn build_read_transmitter_status_frame() -> CommandFrame {
    CommandFrame::new([0; 4], Opcode::ReadTransmitterStatus)
}

/// Build a set-mode frame (`P1 = mode code`, opcode `0x07`).
pub fn build_set_mode_frame(mode_code: u8) -> Result<CommandFrame> {
    if !is_settable_mode(mode_code) {
        return Err(Error::InvalidParameter(format!(
            "mode 0x{mode_code:02X} cannot be selected over CAT"
        )));
    }
    Ok(CommandFrame::new([mode_code, 0, 0, 0], Opcode::SetMode))
}

pub fn build_ptt_frame(on: bool) -> CommandFrame {
    let opcode = if on { Opcode::PttOn } else { Opcode::PttOff };
    CommandFrame::new([0; 4], opcode)
}

pub fn build_split_frame(on: bool) -> CommandFrame {
    let opcode = if on { Opcode::SplitOn } else { Opcode::SplitOff };
    CommandFrame::new([0; 4], opcode)
}

pub fn build_toggle_vfo_frame() -> CommandFrame {
    CommandFrame::new([0; 4], Opcode::ToggleVfo)
}

/// Front-panel lock. Note the inverted opcodes: `0x00` locks, `0x80` unlocks.
pub fn build_lock_frame(on: bool) -> CommandFrame {
    let opcode = if on { Opcode::LockOn } else { Opcode::LockOff };
    CommandFrame::new([0; 4], opcode)
}
