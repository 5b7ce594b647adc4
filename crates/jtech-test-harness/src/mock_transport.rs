//! Mock transport for deterministic testing of the matrix clients.
//!
//! [`MockTransport`] implements both [`Transport`] and [`BlockingTransport`]
//! with pre-loaded request/response pairs, so the same script can drive the
//! async and the blocking client.
//!
//! # Example
//!
//! ```
//! use jtech_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! mock.greeting(b"Welcome to HDMI Matrix\r");
//! // When the client sends this request, answer with this reply.
//! mock.expect(b"1@.\r", b"01 Open.\r");
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use jtech_core::error::{Error, Result};
use jtech_core::transport::{BlockingTransport, Transport};

/// One scripted frame and the reply the mock hands back for it.
#[derive(Debug, Clone)]
struct Expectation {
    /// Frame the client must send, byte for byte.
    request: Vec<u8>,
    /// Reply handed out after the frame arrives.
    response: Vec<u8>,
}

/// One entry of the traffic log kept by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// Bytes passed to one `send()` call.
    Sent(Vec<u8>),
    /// Bytes handed out by one `receive()` call.
    Received(Vec<u8>),
}

/// Shared, cloneable view of a [`MockTransport`]'s traffic log.
///
/// The transport is usually moved into a client; keep a `MockLog` from
/// [`MockTransport::log`] to inspect the traffic afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockLog(Arc<Mutex<Vec<MockEvent>>>);

impl MockLog {
    /// A snapshot of every event recorded so far, in order.
    pub fn events(&self) -> Vec<MockEvent> {
        self.0.lock().clone()
    }

    /// Every frame passed to `send()`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.0
            .lock()
            .iter()
            .filter_map(|event| match event {
                MockEvent::Sent(data) => Some(data.clone()),
                MockEvent::Received(_) => None,
            })
            .collect()
    }

    fn push(&self, event: MockEvent) {
        self.0.lock().push(event);
    }
}

/// A mock transport for testing the matrix clients without hardware.
///
/// The script is consumed front to back. Each `send()` is logged and
/// matched against the next scripted frame; the paired reply is then handed
/// out by the following `receive()` calls, at most
/// [`chunk_size`](MockTransport::chunk_size) bytes at a time.
///
/// `receive()` with nothing pending returns [`Error::Timeout`] immediately,
/// which is how a silent device looks to the client.
#[derive(Debug)]
pub struct MockTransport {
    /// Queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Match a sent frame against any queued expectation, not just the first.
    unordered: bool,
    /// The response data pending for the next `receive()` calls.
    pending_response: Option<Vec<u8>>,
    /// How many bytes of the pending response have been handed out.
    response_cursor: usize,
    /// Largest number of bytes returned by one `receive()`.
    chunk_size: usize,
    /// Pause before each `receive()` that returns data.
    reply_delay: Duration,
    /// Sleep out the caller's timeout before reporting a silent device.
    wait_out_timeouts: bool,
    connected: bool,
    log: MockLog,
}

impl MockTransport {
    /// An empty script, connected.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            unordered: false,
            pending_response: None,
            response_cursor: 0,
            chunk_size: usize::MAX,
            reply_delay: Duration::ZERO,
            wait_out_timeouts: false,
            connected: true,
            log: MockLog::default(),
        }
    }

    /// Queue bytes the matrix sends unprompted right after connecting.
    ///
    /// They are returned by the first `receive()` calls, before any
    /// request has been sent.
    pub fn greeting(&mut self, data: &[u8]) {
        self.pending_response = Some(data.to_vec());
        self.response_cursor = 0;
    }

    /// Script one exchange: when `request` is sent, reply with `response`.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Accept queued requests in any order instead of strictly in sequence.
    ///
    /// Useful when several tasks race to send and the winner is not known
    /// up front.
    pub fn unordered(&mut self, unordered: bool) {
        self.unordered = unordered;
    }

    /// Split every response into pieces of at most `size` bytes.
    pub fn chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    /// Sleep for `delay` before each `receive()` that returns data.
    ///
    /// The async implementation sleeps on the tokio timer, the blocking one
    /// parks the thread.
    pub fn reply_delay(&mut self, delay: Duration) {
        self.reply_delay = delay;
    }

    /// When nothing is pending, make `receive()` wait the full timeout it
    /// was given before failing with [`Error::Timeout`], like a real socket.
    ///
    /// Off by default, so silent-device tests finish instantly.
    pub fn wait_out_timeouts(&mut self, enabled: bool) {
        self.wait_out_timeouts = enabled;
    }

    /// Whether a `receive()` now would sit out its timeout.
    fn stalls(&self) -> bool {
        self.wait_out_timeouts
            && self.connected
            && self
                .pending_response
                .as_ref()
                .is_none_or(|r| self.response_cursor >= r.len())
    }

    /// A handle on the traffic log that outlives the transport.
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    /// Every frame passed to `send()`, in order.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.log.sent()
    }

    /// How many scripted exchanges have not happened yet.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Force the connection state. While disconnected every I/O call fails
    /// with [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn record_send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.log.push(MockEvent::Sent(data.to_vec()));

        let position = if self.unordered {
            self.expectations.iter().position(|e| e.request == data)
        } else {
            Some(0)
        };

        match position.and_then(|i| self.expectations.remove(i)) {
            Some(expectation) if expectation.request == data => {
                self.pending_response = Some(expectation.response);
                self.response_cursor = 0;
                Ok(())
            }
            Some(expectation) => Err(Error::Protocol(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            ))),
            None => Err(Error::Protocol(format!(
                "no expectation matches {:?}",
                String::from_utf8_lossy(data)
            ))),
        }
    }

    /// Whether the next `receive()` will hand out data.
    fn has_pending(&self) -> bool {
        self.connected && self.pending_response.is_some()
    }

    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        let Some(response) = self.pending_response.as_ref() else {
            return Err(Error::Timeout);
        };

        let remaining = &response[self.response_cursor..];
        if remaining.is_empty() {
            self.pending_response = None;
            self.response_cursor = 0;
            return Err(Error::Timeout);
        }

        let n = remaining.len().min(buf.len()).min(self.chunk_size);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.log.push(MockEvent::Received(remaining[..n].to_vec()));
        self.response_cursor += n;
        if self.response_cursor >= response.len() {
            self.pending_response = None;
            self.response_cursor = 0;
        }
        Ok(n)
    }

    fn shut(&mut self) {
        self.connected = false;
        self.pending_response = None;
        self.response_cursor = 0;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.record_send(data)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.has_pending() && !self.reply_delay.is_zero() {
            tokio::time::sleep(self.reply_delay).await;
        } else if self.stalls() {
            tokio::time::sleep(timeout).await;
        }
        self.next_chunk(buf)
    }

    async fn close(&mut self) -> Result<()> {
        self.shut();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl BlockingTransport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.record_send(data)
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if self.has_pending() && !self.reply_delay.is_zero() {
            std::thread::sleep(self.reply_delay);
        } else if self.stalls() {
            std::thread::sleep(timeout);
        }
        self.next_chunk(buf)
    }

    fn close(&mut self) -> Result<()> {
        self.shut();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"Status1.\r", b"AV: 02->01\r");

        Transport::send(&mut mock, b"Status1.\r").await.unwrap();

        let mut buf = [0u8; 64];
        let n = Transport::receive(&mut mock, &mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"AV: 02->01\r");
    }

    #[tokio::test]
    async fn greeting_is_returned_before_any_send() {
        let mut mock = MockTransport::new();
        mock.greeting(b"Welcome\r");

        let mut buf = [0u8; 64];
        let n = Transport::receive(&mut mock, &mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"Welcome\r");
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"1@.\r", b"01 Open.\r");

        let result = Transport::send(&mut mock, b"1$.\r").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = Transport::send(&mut mock, b"1All.\r").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn receive_without_send_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 64];
        let result = Transport::receive(&mut mock, &mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::Timeout));
    }

    #[tokio::test]
    async fn close_disconnects() {
        let mut mock = MockTransport::new();
        assert!(Transport::is_connected(&mock));

        Transport::close(&mut mock).await.unwrap();
        assert!(!Transport::is_connected(&mock));

        let result = Transport::send(&mut mock, b"1@.\r").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn set_connected_false_rejects_io() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);

        let result = Transport::send(&mut mock, b"1@.\r").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));

        let mut buf = [0u8; 8];
        let result = Transport::receive(&mut mock, &mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn chunked_receive() {
        let mut mock = MockTransport::new();
        mock.chunk_size(4);
        mock.expect(b"1All.\r", b"01 To All.\r");
        Transport::send(&mut mock, b"1All.\r").await.unwrap();

        let mut buf = [0u8; 64];
        let mut got = Vec::new();
        while let Ok(n) = Transport::receive(&mut mock, &mut buf, Duration::from_millis(10)).await {
            assert!(n <= 4);
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, b"01 To All.\r");
    }

    #[tokio::test]
    async fn unordered_matches_any_queued_request() {
        let mut mock = MockTransport::new();
        mock.unordered(true);
        mock.expect(b"1@.\r", b"01 Open.\r");
        mock.expect(b"2$.\r", b"02 Closed.\r");

        Transport::send(&mut mock, b"2$.\r").await.unwrap();
        let mut buf = [0u8; 64];
        let n = Transport::receive(&mut mock, &mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"02 Closed.\r");
        assert_eq!(mock.remaining_expectations(), 1);
    }

    #[tokio::test]
    async fn log_records_traffic_in_order() {
        let mut mock = MockTransport::new();
        let log = mock.log();
        mock.expect(b"1@.\r", b"01 Open.\r");

        Transport::send(&mut mock, b"1@.\r").await.unwrap();
        let mut buf = [0u8; 64];
        Transport::receive(&mut mock, &mut buf, Duration::from_millis(10))
            .await
            .unwrap();

        assert_eq!(
            log.events(),
            vec![
                MockEvent::Sent(b"1@.\r".to_vec()),
                MockEvent::Received(b"01 Open.\r".to_vec()),
            ]
        );
    }

    #[test]
    fn blocking_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"8B1.\r", b"AV:08->01\r");

        BlockingTransport::send(&mut mock, b"8B1.\r").unwrap();
        let mut buf = [0u8; 64];
        let n = BlockingTransport::receive(&mut mock, &mut buf, Duration::from_millis(10)).unwrap();
        assert_eq!(&buf[..n], b"AV:08->01\r");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn silent_receive_can_wait_out_timeout() {
        let mut mock = MockTransport::new();
        mock.wait_out_timeouts(true);

        let started = std::time::Instant::now();
        let mut buf = [0u8; 8];
        let result = Transport::receive(&mut mock, &mut buf, Duration::from_millis(60)).await;
        assert!(matches!(result, Err(Error::Timeout)));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn blocking_silent_receive_can_wait_out_timeout() {
        let mut mock = MockTransport::new();
        mock.wait_out_timeouts(true);

        let started = std::time::Instant::now();
        let mut buf = [0u8; 8];
        let result = BlockingTransport::receive(&mut mock, &mut buf, Duration::from_millis(60));
        assert!(matches!(result, Err(Error::Timeout)));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn blocking_reply_delay_parks_thread() {
        let mut mock = MockTransport::new();
        mock.reply_delay(Duration::from_millis(30));
        mock.expect(b"1$.\r", b"01 Closed.\r");

        BlockingTransport::send(&mut mock, b"1$.\r").unwrap();
        let started = std::time::Instant::now();
        let mut buf = [0u8; 64];
        BlockingTransport::receive(&mut mock, &mut buf, Duration::from_secs(1)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
