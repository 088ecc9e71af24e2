//! Ft817Builder -- fluent builder for constructing [`CatSession`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial line parameters and the write policy before the port is opened.
//!
//! # Example
//!
//! ```no_run
//! use catlink_ft817::builder::Ft817Builder;
//!
//! # async fn example() -> catlink_core::Result<()> {
//! let session = Ft817Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(9600)
//!     .build()
//!     .await?;
//! let outcome = session.get_freq_and_mode().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;
use catlink_transport::{SerialConfig, SerialTransport};

use crate::policy::{AllowAllWrites, WritePolicy};
use crate::session::CatSession;

/// Fluent builder for [`CatSession`].
///
/// Defaults: 4800 baud, 8 data bits, 2 stop bits, no parity, no flow
/// control, every write allowed.
pub struct Ft817Builder {
    serial_port: Option<String>,
    serial_config: SerialConfig,
    write_policy: Arc<dyn WritePolicy>,
}

impl Ft817Builder {
    pub fn new() -> Self {
        Ft817Builder {
            serial_port: None,
            serial_config: SerialConfig::default(),
            write_policy: Arc::new(AllowAllWrites),
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate (default 4800). Must match the radio's CAT
    /// RATE menu setting.
    pub fn baud_rate(mut self, rate: u32) -> Self {
        self.serial_config.baud_rate = rate;
        self
    }

    /// Replace all serial line settings at once.
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// Install a hook consulted before every state-changing frame.
    pub fn write_policy(mut self, policy: Arc<dyn WritePolicy>) -> Self {
        self.write_policy = policy;
        self
    }

    /// Open the serial port and build a [`CatSession`] on it.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<CatSession> {
        let port = self.serial_port.clone().ok_or_else(|| {
            Error::Configuration("serial_port is required for build()".into())
        })?;
        if self.serial_config.baud_rate == 0 {
            return Err(Error::Configuration("baud rate must be non-zero".into()));
        }

        let baud = self.serial_config.baud_rate;
        let transport = SerialTransport::open_with_config(&port, self.serial_config).await?;
        info!(port = %port, baud, "CAT session opened");
        Ok(CatSession::new(
            Box::new(transport),
            self.write_policy,
            Some(port),
            Some(baud),
        ))
    }

    /// Build a [`CatSession`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `catlink-test-harness`) and for callers that manage the link
    /// themselves.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> CatSession {
        CatSession::new(transport, self.write_policy, self.serial_port, None)
    }
}

impl Default for Ft817Builder {
    fn default() -> Self {
        Self::new()
    }
}
