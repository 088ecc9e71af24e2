//! Transport implementations for catlink.
//!
//! Provides [`SerialTransport`], the [`Transport`](catlink_core::Transport)
//! implementation for USB virtual COM ports and RS-232 CAT cables, plus
//! [`available_ports`] for port enumeration.

pub mod serial;

pub use serial::{
    DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits, available_ports,
};
