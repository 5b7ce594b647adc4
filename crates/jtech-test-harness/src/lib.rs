//! jtech-test-harness: Test utilities and mock transports for the J-Tech
//! matrix clients.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the protocol engine without a real matrix, and [`MockTcpServer`] for
//! end-to-end tests that go through real TCP sockets.

pub mod mock_tcp;
pub mod mock_transport;

pub use mock_tcp::MockTcpServer;
pub use mock_transport::{MockEvent, MockLog, MockTransport};
