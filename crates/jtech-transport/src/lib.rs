//! Transport implementations for J-Tech matrix control.
//!
//! This crate provides concrete implementations of the transport traits from
//! `jtech-core`:
//!
//! - [`TcpTransport`]: tokio TCP stream, implements [`Transport`](jtech_core::Transport)
//! - [`BlockingTcpTransport`]: `std::net` TCP stream, implements
//!   [`BlockingTransport`](jtech_core::BlockingTransport)
//!
//! Both map socket failures onto the same [`Error`] variants so the two
//! matrix clients report identical errors for identical situations.

use std::time::Duration;

use jtech_core::error::Error;

pub mod blocking;
pub mod tcp;

pub use blocking::BlockingTcpTransport;
pub use tcp::TcpTransport;

/// Default connection timeout (5 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
pub(crate) fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Transport(format!("connection refused: {}", addr))
        }
        _ => Error::Io(e),
    }
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
pub(crate) fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
