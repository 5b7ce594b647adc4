//! J-Tech matrix text protocol: framing constants and reply accumulation.
//!
//! Every command and every reply is ASCII text terminated by a single
//! carriage return (`0x0D`).
//!
//! # Command format
//!
//! ```text
//! <body>.<CR>
//! ```
//!
//! The body is command specific (`Status1`, `3@`, `2B5`, `4All`, see
//! [`commands`](crate::commands)); every body ends with a full stop.
//!
//! # Reply framing
//!
//! Replies carry no length or request id. A reply is complete once a chunk
//! read from the socket contains the terminator *and* the text accumulated
//! so far is longer than a per-command minimum (the "skip" length). The
//! minimum stops an early CR inside a multi-line status report from being
//! taken as the end of the reply.

use bytes::{BufMut, BytesMut};

use jtech_core::error::{Error, Result};

/// Terminator byte ending every command and reply frame.
pub const TERMINATOR: u8 = b'\r';

/// Size of one socket read.
pub const RECV_CHUNK: usize = 2048;

/// Minimum reply length before a CR is trusted on a status query.
///
/// A full status report is two routing lines; the first line alone is
/// shorter than this.
pub const STATUS_SKIP: usize = 20;

/// Minimum reply length for set commands, whose acks are a single line.
pub const SET_SKIP: usize = 0;

/// Largest reply accepted before the exchange is abandoned.
pub const MAX_REPLY: usize = 8192;

/// Encode a command body into a terminated frame.
///
/// # Example
///
/// ```
/// use jtech::protocol::encode_frame;
///
/// assert_eq!(encode_frame("Status1."), b"Status1.\r");
/// ```
pub fn encode_frame(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + 1);
    buf.put_slice(body.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Accumulates the chunks of one reply and decides when it is complete.
///
/// Shared by the async and the blocking client so both frame replies
/// identically.
#[derive(Debug)]
pub struct ReplyBuffer {
    text: String,
    skip: usize,
}

impl ReplyBuffer {
    /// An empty buffer for a reply that must be longer than `skip` bytes.
    pub fn new(skip: usize) -> Self {
        ReplyBuffer {
            text: String::new(),
            skip,
        }
    }

    /// Append one received chunk.
    ///
    /// Returns `Ok(true)` once the reply is complete: this chunk contains a
    /// terminator and the accumulated text is longer than the skip length.
    /// A terminator seen in an earlier chunk does not count.
    ///
    /// Fails with [`Error::Protocol`] on a non-ASCII byte or when the reply
    /// grows past [`MAX_REPLY`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<bool> {
        if let Some(&byte) = chunk.iter().find(|b| !b.is_ascii()) {
            return Err(Error::Protocol(format!(
                "non-ASCII byte 0x{byte:02X} in reply"
            )));
        }
        self.text.extend(chunk.iter().copied().map(char::from));

        if self.text.len() > MAX_REPLY {
            return Err(Error::Protocol(format!(
                "reply exceeds {MAX_REPLY} bytes without completing"
            )));
        }

        Ok(chunk.contains(&TERMINATOR) && self.text.len() > self.skip)
    }

    /// Number of bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The accumulated reply text.
    pub fn into_text(self) -> String {
        self.text
    }
}
