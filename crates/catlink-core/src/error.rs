//! Error types for catlink.
//!
//! Every fallible operation across the workspace returns [`Result<T>`], which
//! uses [`Error`] as the error type. Note that a radio that simply does not
//! answer is *not* an error at the protocol-engine level: the engine reports
//! it as a "no reply" outcome. [`Error::Timeout`] only travels between a
//! transport and the engine that consumes it.

/// The error type for all catlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session could not be constructed from the supplied settings
    /// (for example, no serial device path was given).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed hex or decimal input reached the binary codec.
    ///
    /// Well-formed frames never produce this; seeing it means a logic fault
    /// upstream or a reply carrying non-BCD digits.
    #[error("format error: {0}")]
    Format(String),

    /// The requested frequency is outside every receivable range.
    ///
    /// Frame builders return this; sessions turn it into a typed
    /// "unreachable" outcome without writing anything to the radio.
    #[error("frequency {0} (10 Hz units) is not receivable")]
    UnreachableFrequency(u32),

    /// A transport-level error (serial port, short reply).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unexpected opcode, unexpected reply shape).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An invalid parameter was passed to an operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timed out waiting for bytes from the transport.
    #[error("timeout waiting for response")]
    Timeout,

    /// No connection to the radio has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the radio was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
