//! Serial port transport for CAT control.
//!
//! [`SerialTransport`] implements the [`Transport`] trait over a USB virtual
//! COM port or a physical RS-232 CAT cable.
//!
//! Radios speaking the 5-byte binary CAT protocol (FT-817/857/897 family)
//! default to 4800 baud with 8 data bits, no parity and **two** stop bits;
//! [`SerialConfig::default()`] matches that. The line-setting enums are the
//! ones `tokio-serial` uses, re-exported from this crate.
//!
//! # Example
//!
//! ```no_run
//! use catlink_transport::SerialTransport;
//! use catlink_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> catlink_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 4800).await?;
//!
//! // Read receiver status; the radio answers with one byte.
//! transport.send(&[0x00, 0x00, 0x00, 0x00, 0xE7]).await?;
//! let mut status = [0u8; 1];
//! transport.receive(&mut status, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, trace, warn};

use catlink_core::error::{Error, Result};
use catlink_core::transport::Transport;

pub use tokio_serial::{DataBits, FlowControl, Parity, StopBits};

/// Serial line settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Must match the radio's CAT RATE menu (4800, 9600 or 38400).
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baud_rate: 4800,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::Two,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialConfig {
    /// Default line settings at the given baud rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        SerialConfig {
            baud_rate,
            ..Default::default()
        }
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Result<Vec<String>> {
    tokio_serial::available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .map_err(|e| Error::Transport(format!("cannot enumerate serial ports: {e}")))
}

/// A CAT link over a serial port.
pub struct SerialTransport {
    stream: Option<SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open `port` at `baud_rate` with the default 8N2 line settings.
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::with_baud_rate(baud_rate)).await
    }

    /// Open `port` with explicit line settings.
    ///
    /// DTR and RTS are driven low after opening, since many interface cables
    /// wire one of them to PTT. Bytes left in the input buffer from before
    /// the port was opened are discarded.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        debug!(port, ?config, "opening serial port");

        let mut stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                error!(port, error = %e, "cannot open serial port");
                Error::Transport(format!("cannot open serial port {port}: {e}"))
            })?;

        for (line, result) in [
            ("DTR", stream.write_data_terminal_ready(false)),
            ("RTS", stream.write_request_to_send(false)),
        ] {
            if let Err(e) = result {
                warn!(port, line, error = %e, "cannot de-assert control line");
            }
        }
        if let Err(e) = stream.clear(ClearBuffer::Input) {
            warn!(port, error = %e, "cannot clear input buffer");
        }

        info!(port, baud_rate = config.baud_rate, "serial port open");
        Ok(SerialTransport {
            stream: Some(stream),
            port_name: port.to_string(),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn stream(&mut self) -> Result<&mut SerialStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

/// A vanished USB adapter shows up as a broken pipe or a zero-length read.
fn link_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected | io::ErrorKind::UnexpectedEof => {
            Error::ConnectionLost
        }
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!(port = %self.port_name, ?data, "serial tx");
        let stream = self.stream()?;
        stream.write_all(data).await.map_err(link_error)?;
        stream.flush().await.map_err(link_error)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream()?;
        let n = tokio::time::timeout(timeout, stream.read(buf))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(link_error)?;
        trace!(port = %self.port_name, data = ?&buf[..n], "serial rx");
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        if let Err(e) = stream.flush().await {
            warn!(port = %self.port_name, error = %e, "flush before close failed");
        }
        info!(port = %self.port_name, "serial port closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
