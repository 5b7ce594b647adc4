//! Blocking TCP transport for matrix communication.
//!
//! [`BlockingTcpTransport`] implements [`BlockingTransport`] on a
//! `std::net::TcpStream`. Receive timeouts are applied per call through the
//! socket read timeout, so a single transport can serve callers with
//! different deadlines.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use jtech_core::error::{Error, Result};
use jtech_core::transport::BlockingTransport;

use crate::{DEFAULT_CONNECT_TIMEOUT, map_connect_error, map_io_error};

/// Thread-blocking TCP transport to a matrix.
#[derive(Debug)]
pub struct BlockingTcpTransport {
    stream: Option<TcpStream>,
    peer: String,
}

impl BlockingTcpTransport {
    /// Connect to a `host:port` endpoint using the default timeout.
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Connect to a `host:port` endpoint, giving up after `timeout`.
    ///
    /// Every address `addr` resolves to is tried in turn; the error from the
    /// last attempt is returned if none of them accepts.
    pub fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        debug!(peer = addr, timeout_ms = timeout.as_millis(), "opening matrix connection");

        let candidates = addr
            .to_socket_addrs()
            .map_err(|e| Error::Transport(format!("cannot resolve {addr}: {e}")))?;

        let mut last_err = None;
        let mut connected = None;
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }

        let stream = match (connected, last_err) {
            (Some(stream), _) => stream,
            (None, Some(e)) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                error!(peer = addr, "matrix did not accept the connection in time");
                return Err(Error::Timeout);
            }
            (None, Some(e)) => {
                error!(peer = addr, error = %e, "matrix connection failed");
                return Err(map_connect_error(e, addr));
            }
            (None, None) => {
                return Err(Error::Transport(format!("no addresses found for {addr}")));
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!(peer = addr, error = %e, "could not disable Nagle's algorithm");
        }

        info!(peer = addr, "matrix connection open");
        Ok(Self::from_stream(stream, addr.to_string()))
    }

    /// Adopt a stream that is already connected. `peer` only labels logs.
    pub fn from_stream(stream: TcpStream, peer: String) -> Self {
        BlockingTcpTransport {
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

impl BlockingTransport for BlockingTcpTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        trace!(peer = %self.peer, frame = %data.escape_ascii(), "tx");
        let stream = self.stream()?;
        let written = match stream.write_all(data) {
            Ok(()) => stream.flush(),
            Err(e) => Err(e),
        };

        written.map_err(|e| {
            error!(peer = %self.peer, error = %e, "write to matrix failed");
            map_io_error(e)
        })
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream()?;

        // The socket rejects a zero read timeout, and a spent deadline is a timeout anyway.
        if timeout.is_zero() {
            return Err(Error::Timeout);
        }
        stream.set_read_timeout(Some(timeout))?;

        match stream.read(buf) {
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(Error::Timeout)
            }
            Err(e) => {
                error!(peer = %self.peer, error = %e, "read from matrix failed");
                Err(map_io_error(e))
            }
            Ok(0) => {
                warn!(peer = %self.peer, "matrix closed the connection");
                Err(Error::ConnectionLost)
            }
            Ok(n) => {
                trace!(peer = %self.peer, chunk = %buf[..n].escape_ascii(), "rx");
                Ok(n)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!(peer = %self.peer, error = %e, "shutdown on close failed");
        }
        info!(peer = %self.peer, "matrix connection closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
