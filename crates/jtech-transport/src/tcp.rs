//! Async TCP transport for matrix communication.
//!
//! [`TcpTransport`] implements the [`Transport`] trait on top of a tokio
//! `TcpStream`. The matrix listens on a single TCP port (80 on stock
//! firmware) and exchanges carriage-return terminated ASCII frames.
//!
//! # Example
//!
//! ```no_run
//! use jtech_transport::TcpTransport;
//! use jtech_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> jtech_core::Result<()> {
//! let mut link = TcpTransport::connect("10.0.0.7:80").await?;
//! link.send(b"Status1.\r").await?;
//!
//! let mut chunk = [0u8; 2048];
//! let n = link.receive(&mut chunk, Duration::from_secs(2)).await?;
//! println!("{}", chunk[..n].escape_ascii());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

use jtech_core::error::{Error, Result};
use jtech_core::transport::Transport;

use crate::{DEFAULT_CONNECT_TIMEOUT, map_connect_error, map_io_error};

/// Async TCP connection to a matrix.
#[derive(Debug)]
pub struct TcpTransport {
    /// `None` once closed.
    stream: Option<TcpStream>,
    /// `host:port` label used in log output.
    peer: String,
}

impl TcpTransport {
    /// Open a connection to `host:port`, waiting at most
    /// [`DEFAULT_CONNECT_TIMEOUT`].
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Open a connection to `host:port`, giving up after `timeout` with
    /// [`Error::Timeout`].
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        debug!(peer = addr, timeout_ms = timeout.as_millis(), "opening matrix connection");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!(peer = addr, error = %e, "matrix connection failed");
                return Err(map_connect_error(e, addr));
            }
            Err(_) => {
                error!(peer = addr, "matrix did not accept the connection in time");
                return Err(Error::Timeout);
            }
        };

        // Command frames are tiny.
        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = addr, error = %e, "could not disable Nagle's algorithm");
        }

        info!(peer = addr, "matrix connection open");
        Ok(Self::from_stream(stream, addr.to_string()))
    }

    /// Adopt a stream that is already connected. `peer` only labels logs.
    pub fn from_stream(stream: TcpStream, peer: String) -> Self {
        TcpTransport {
            stream: Some(stream),
            peer,
        }
    }

    /// The `host:port` this transport talks to.
    pub fn addr(&self) -> &str {
        &self.peer
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!(peer = %self.peer, frame = %data.escape_ascii(), "tx");
        let stream = self.stream()?;
        let written = async {
            stream.write_all(data).await?;
            stream.flush().await
        }
        .await;

        written.map_err(|e| {
            error!(peer = %self.peer, error = %e, "write to matrix failed");
            map_io_error(e)
        })
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream()?;
        let read = tokio::time::timeout(timeout, stream.read(buf)).await;

        match read {
            Err(_) => Err(Error::Timeout),
            Ok(Err(e)) => {
                error!(peer = %self.peer, error = %e, "read from matrix failed");
                Err(map_io_error(e))
            }
            Ok(Ok(0)) => {
                warn!(peer = %self.peer, "matrix closed the connection");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                trace!(peer = %self.peer, chunk = %buf[..n].escape_ascii(), "rx");
                Ok(n)
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        if let Err(e) = stream.shutdown().await {
            debug!(peer = %self.peer, error = %e, "shutdown on close failed");
        }
        info!(peer = %self.peer, "matrix connection closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
