//! catlink-core: Core traits and error definitions for catlink.
//!
//! This crate defines the pieces shared by every catlink crate: the
//! [`Transport`] byte-channel abstraction and the [`Error`] / [`Result`]
//! types. Protocol engines and transports depend on it; applications
//! usually reach it through re-exports.

pub mod error;
pub mod helpers;
pub mod transport;

pub use error::{Error, Result};
pub use helpers::format_freq_10hz;
pub use transport::Transport;
