//! JtechBuilder -- fluent builder for connecting to a matrix.
//!
//! Collects the host, port and timeouts, opens the TCP connection, and
//! drains the greeting the matrix sends on connect so that the first
//! command's reply is not polluted by it.
//!
//! # Example
//!
//! ```no_run
//! use jtech::builder::JtechBuilder;
//! use jtech::Matrix;
//! use std::time::Duration;
//!
//! # async fn example() -> jtech::Result<()> {
//! let matrix = JtechBuilder::new()
//!     .host("192.168.1.50")
//!     .command_timeout(Duration::from_secs(3))
//!     .build()
//!     .await?;
//! matrix.set_zone_source(1, 4).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::info;

use jtech_core::error::{Error, Result};
use jtech_core::transport::{BlockingTransport, Transport};
use jtech_transport::{BlockingTcpTransport, DEFAULT_CONNECT_TIMEOUT, TcpTransport};

use crate::blocking::BlockingJtechMatrix;
use crate::client::JtechMatrix;

/// TCP port the matrix's control server listens on.
pub const DEFAULT_PORT: u16 = 80;

/// Default deadline for each command's reply.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Fluent builder for [`JtechMatrix`] and [`BlockingJtechMatrix`].
///
/// Only the host is required; see the module docs for an example.
#[derive(Debug, Clone)]
pub struct JtechBuilder {
    host: Option<String>,
    port: u16,
    command_timeout: Duration,
    connect_timeout: Duration,
    read_greeting: bool,
}

impl JtechBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        JtechBuilder {
            host: None,
            port: DEFAULT_PORT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_greeting: true,
        }
    }

    /// Set the matrix's hostname or IP address.
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the TCP port (default: 80).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the deadline for each reply, measured from when the command is
    /// sent (default: 2s). Also bounds the wait for the greeting.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the TCP connect timeout (default: 5s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether to read and discard the greeting after connecting
    /// (default: true).
    ///
    /// Turn this off only for a peer that sends nothing on connect;
    /// otherwise the greeting is read as the first command's reply.
    pub fn read_greeting(mut self, enabled: bool) -> Self {
        self.read_greeting = enabled;
        self
    }

    /// The `host:port` string to connect to. IPv6 literals are bracketed.
    fn address(&self) -> Result<String> {
        let host = self
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidParameter("host is required for build()".into()))?;
        if host.contains(':') && !host.starts_with('[') {
            Ok(format!("[{host}]:{}", self.port))
        } else {
            Ok(format!("{host}:{}", self.port))
        }
    }

    /// Build a [`JtechMatrix`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `jtech-test-harness`). The greeting is still consumed unless
    /// [`read_greeting(false)`](Self::read_greeting) was set.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<JtechMatrix> {
        let matrix = JtechMatrix::new(transport, self.command_timeout);
        if self.read_greeting {
            matrix.discard_greeting().await?;
        }
        Ok(matrix)
    }

    /// Connect over TCP and build a [`JtechMatrix`].
    ///
    /// Requires that [`host()`](Self::host) has been called.
    pub async fn build(self) -> Result<JtechMatrix> {
        let addr = self.address()?;
        let transport = TcpTransport::connect_with_timeout(&addr, self.connect_timeout).await?;
        info!(%addr, "connected to matrix");
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build a [`BlockingJtechMatrix`] with a caller-provided transport.
    pub fn build_blocking_with_transport(
        self,
        transport: Box<dyn BlockingTransport>,
    ) -> Result<BlockingJtechMatrix> {
        let matrix = BlockingJtechMatrix::new(transport, self.command_timeout);
        if self.read_greeting {
            matrix.discard_greeting()?;
        }
        Ok(matrix)
    }

    /// Connect over TCP and build a [`BlockingJtechMatrix`].
    ///
    /// Blocks the calling thread; do not call from inside an async task.
    pub fn build_blocking(self) -> Result<BlockingJtechMatrix> {
        let addr = self.address()?;
        let transport = BlockingTcpTransport::connect_with_timeout(&addr, self.connect_timeout)?;
        info!(%addr, "connected to matrix");
        self.build_blocking_with_transport(Box::new(transport))
    }
}

impl Default for JtechBuilder {
    fn default() -> Self {
        Self::new()
    }
}
