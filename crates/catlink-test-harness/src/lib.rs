//! catlink-test-harness: Test utilities and mock transports for catlink.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! protocol engines without requiring a real radio.

pub mod mock_serial;

pub use mock_serial::MockTransport;
