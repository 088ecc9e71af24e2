//! FT-817 style binary CAT protocol engine for catlink.
//!
//! This crate drives radios that speak the 5-byte binary CAT protocol
//! (Yaesu FT-817, FT-818, FT-857 and FT-897 families). It provides:
//!
//! - **Codec** ([`codec`]) -- BCD packing, hex rendering and bit-pattern
//!   inspection shared by the frame builders and decoders.
//! - **Frame builders** ([`commands`]) -- construct the 5-byte command frames
//!   (set frequency, read frequency/mode, read RX/TX status, mode, PTT,
//!   split, VFO and lock).
//! - **Decoders** ([`decode`]) -- turn fixed-length replies into typed values.
//! - **Tables** ([`tables`]) -- receivable frequency ranges and mode names.
//! - **Session** ([`session`]) -- the request/reply engine with reply
//!   timeout, stale-byte draining and one-exchange-at-a-time locking
//!   ([`CatSession`]).
//! - **Builder** ([`builder`]) -- fluent construction of a [`CatSession`]
//!   on a serial port or a caller-provided transport ([`Ft817Builder`]).
//!
//! # Example
//!
//! ```
//! use catlink_ft817::commands::{build_set_frequency_frame, DEFAULT_FREQUENCY};
//! use catlink_ft817::decode::decode_receiver_status;
//!
//! // Tune to 145.750.00 MHz
//! let frame = build_set_frequency_frame(DEFAULT_FREQUENCY).unwrap();
//! assert_eq!(frame.as_bytes(), &[0x14, 0x57, 0x50, 0x00, 0x01]);
//!
//! // A receiver status reply: squelch open, S-meter at 9 + 20 dB
//! let status = decode_receiver_status(&[0x0B]).unwrap();
//! assert!(!status.squelched);
//! assert_eq!(status.smeter_reading, "S9+20dB");
//! ```

pub mod builder;
pub mod codec;
pub mod commands;
pub mod decode;
pub mod framer;
pub mod policy;
pub mod session;
pub mod tables;

pub use builder::Ft817Builder;
pub use commands::{CommandFrame, DEFAULT_FREQUENCY, Opcode};
pub use decode::{FrequencyAndMode, ReceiverStatus, TransmitterStatus};
pub use policy::{AllowAllWrites, WritePolicy};
pub use session::{CatOutcome, CatSession, QUIET_PERIOD, REPLY_TIMEOUT, SessionStats};
