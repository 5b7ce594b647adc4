//! One request/response cycle on a transport.
//!
//! [`exchange`] and [`exchange_blocking`] send a frame and read until
//! [`ReplyBuffer`] reports a complete reply, with the whole read bounded by a
//! single deadline. They do no locking of their own; the matrix clients call
//! them while holding the connection lock.
//!
//! On any error the partial reply is dropped. Bytes of that reply may still
//! arrive later and will be read as the start of the next reply.

use std::time::Duration;

use tracing::{debug, trace};

use jtech_core::error::{Error, Result};
use jtech_core::transport::{BlockingTransport, Transport};

use crate::protocol::{RECV_CHUNK, ReplyBuffer};

/// Send `frame` and read its reply, suspending at every I/O step.
///
/// The reply must complete within `timeout` of the frame being sent,
/// otherwise the cycle fails with [`Error::Timeout`].
pub async fn exchange(
    transport: &mut dyn Transport,
    frame: &[u8],
    skip: usize,
    timeout: Duration,
) -> Result<String> {
    debug!(frame = %frame.escape_ascii(), skip, "sending command");
    transport.send(frame).await?;

    let deadline = tokio::time::Instant::now() + timeout;
    let mut chunk = [0u8; RECV_CHUNK];
    let mut reply = ReplyBuffer::new(skip);

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            debug!(received = reply.len(), "reply deadline expired");
            return Err(Error::Timeout);
        }

        let n = match tokio::time::timeout(remaining, transport.receive(&mut chunk, remaining))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                debug!(received = reply.len(), "reply deadline expired");
                return Err(Error::Timeout);
            }
        };

        trace!(chunk = %chunk[..n].escape_ascii(), "reply chunk");
        if reply.push(&chunk[..n])? {
            let text = reply.into_text();
            debug!(reply = %text.escape_debug(), "reply complete");
            return Ok(text);
        }
    }
}

/// Send `frame` and read its reply, blocking the calling thread.
///
/// Same framing and deadline rules as [`exchange`].
pub fn exchange_blocking(
    transport: &mut dyn BlockingTransport,
    frame: &[u8],
    skip: usize,
    timeout: Duration,
) -> Result<String> {
    debug!(frame = %frame.escape_ascii(), skip, "sending command");
    transport.send(frame)?;

    let deadline = std::time::Instant::now() + timeout;
    let mut chunk = [0u8; RECV_CHUNK];
    let mut reply = ReplyBuffer::new(skip);

    loop {
        let remaining = deadline.saturating_duration_since(std::time::Instant::now());
        if remaining.is_zero() {
            debug!(received = reply.len(), "reply deadline expired");
            return Err(Error::Timeout);
        }

        let n = transport.receive(&mut chunk, remaining)?;

        trace!(chunk = %chunk[..n].escape_ascii(), "reply chunk");
        if reply.push(&chunk[..n])? {
            let text = reply.into_text();
            debug!(reply = %text.escape_debug(), "reply complete");
            return Ok(text);
        }
    }
}

/// Read and discard the banner the matrix sends when a client connects.
///
/// A single read is made; whatever it returns is the greeting.
pub async fn discard_greeting(transport: &mut dyn Transport, timeout: Duration) -> Result<()> {
    let mut chunk = [0u8; RECV_CHUNK];
    let n = transport.receive(&mut chunk, timeout).await?;
    debug!(greeting = %chunk[..n].escape_ascii(), "discarded connection greeting");
    Ok(())
}

/// Blocking counterpart of [`discard_greeting`].
pub fn discard_greeting_blocking(
    transport: &mut dyn BlockingTransport,
    timeout: Duration,
) -> Result<()> {
    let mut chunk = [0u8; RECV_CHUNK];
    let n = transport.receive(&mut chunk, timeout)?;
    debug!(greeting = %chunk[..n].escape_ascii(), "discarded connection greeting");
    Ok(())
}
