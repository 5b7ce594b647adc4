//! Transport traits for matrix communication.
//!
//! The matrix speaks a plain request/response text protocol over one TCP
//! stream. [`Transport`] abstracts that stream for the async client and
//! [`BlockingTransport`] does the same for the thread-blocking client.
//!
//! The protocol engine in the `jtech` crate operates on these traits rather
//! than on sockets directly, so it can be driven by the real TCP transports
//! in `jtech-transport` or by `MockTransport` from `jtech-test-harness`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a matrix.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the matrix.
    ///
    /// Completes once all bytes have been handed to the underlying stream.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the matrix into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits up to `timeout` for
    /// data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing arrives within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

/// Thread-blocking byte-level transport to a matrix.
///
/// Same contract as [`Transport`], with every call blocking the calling
/// thread instead of suspending a task.
pub trait BlockingTransport: Send {
    /// Send raw bytes to the matrix.
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes into `buf`, waiting up to `timeout`.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
