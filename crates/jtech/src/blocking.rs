//! BlockingJtechMatrix -- the thread-blocking [`BlockingMatrix`]
//! implementation.
//!
//! Same wire behaviour as [`JtechMatrix`](crate::client::JtechMatrix), for
//! callers without an async runtime. The connection sits behind a
//! `parking_lot` mutex held for the whole send/receive cycle, so threads
//! sharing one client never interleave their exchanges.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use jtech_core::error::Result;
use jtech_core::matrix::BlockingMatrix;
use jtech_core::transport::BlockingTransport;
use jtech_core::types::ZoneStatus;

use crate::commands;
use crate::protocol::{SET_SKIP, STATUS_SKIP};
use crate::reader;
use crate::status;

/// A connected matrix controlled from synchronous code.
///
/// Constructed via
/// [`JtechBuilder::build_blocking`](crate::builder::JtechBuilder::build_blocking).
pub struct BlockingJtechMatrix {
    transport: Mutex<Box<dyn BlockingTransport>>,
    command_timeout: Duration,
}

impl BlockingJtechMatrix {
    pub(crate) fn new(transport: Box<dyn BlockingTransport>, command_timeout: Duration) -> Self {
        BlockingJtechMatrix {
            transport: Mutex::new(transport),
            command_timeout,
        }
    }

    pub(crate) fn discard_greeting(&self) -> Result<()> {
        let mut transport = self.transport.lock();
        reader::discard_greeting_blocking(&mut **transport, self.command_timeout)
    }

    fn execute(&self, frame: &[u8], skip: usize) -> Result<String> {
        let mut transport = self.transport.lock();
        reader::exchange_blocking(&mut **transport, frame, skip, self.command_timeout)
    }

    /// The deadline applied to each reply.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Whether the underlying transport is still open.
    pub fn is_connected(&self) -> bool {
        self.transport.lock().is_connected()
    }

    /// Close the connection.
    pub fn close(&self) -> Result<()> {
        self.transport.lock().close()
    }
}

impl BlockingMatrix for BlockingJtechMatrix {
    fn zone_status(&self, zone: i32) -> Result<Option<ZoneStatus>> {
        debug!(zone, "querying zone status");
        let reply = self.execute(&commands::cmd_zone_status(zone), STATUS_SKIP)?;
        let status = status::parse_zone_status(zone, &reply);
        if status.is_none() {
            debug!(zone, reply = %reply.escape_debug(), "unrecognised status reply");
        }
        Ok(status)
    }

    fn set_zone_power(&self, zone: i32, power: bool) -> Result<()> {
        debug!(zone, power, "setting zone power");
        self.execute(&commands::cmd_set_zone_power(zone, power), SET_SKIP)?;
        Ok(())
    }

    fn set_zone_source(&self, zone: i32, source: i32) -> Result<()> {
        debug!(zone, source, "setting zone source");
        self.execute(&commands::cmd_set_zone_source(zone, source), SET_SKIP)?;
        Ok(())
    }

    fn set_all_zone_source(&self, source: i32) -> Result<()> {
        debug!(source, "setting source for all zones");
        self.execute(&commands::cmd_set_all_zone_source(source), SET_SKIP)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use jtech_core::error::Error;
    use jtech_test_harness::{MockEvent, MockTransport};

    fn make_test_matrix(mock: MockTransport) -> BlockingJtechMatrix {
        BlockingJtechMatrix::new(Box::new(mock), Duration::from_millis(500))
    }

    #[test]
    fn zone_status_on() {
        let mut mock = MockTransport::new();
        mock.expect(b"Status2.\r", b"AV: 05->02\r\nIR: 06->02\r");
        let matrix = make_test_matrix(mock);

        assert_eq!(
            matrix.zone_status(2).unwrap(),
            Some(ZoneStatus::on(2, 5, Some(6)))
        );
    }

    #[test]
    fn zone_status_off() {
        let mut mock = MockTransport::new();
        mock.expect(b"Status7.\r", b"AV:OFF->07\r\nIR:OFF->07\r");
        let matrix = make_test_matrix(mock);

        assert_eq!(matrix.zone_status(7).unwrap(), Some(ZoneStatus::off(7)));
    }

    #[test]
    fn zone_status_garbage_is_none() {
        let mut mock = MockTransport::new();
        mock.expect(b"Status1.\r", b"Command error, please check it!\r");
        let matrix = make_test_matrix(mock);

        assert_eq!(matrix.zone_status(1).unwrap(), None);
    }

    #[test]
    fn set_commands_send_expected_frames() {
        let mut mock = MockTransport::new();
        let log = mock.log();
        mock.expect(b"3@.\r", b"03 Open.\r");
        mock.expect(b"3$.\r", b"03 Closed.\r");
        mock.expect(b"8B3.\r", b"AV:08->03\r");
        mock.expect(b"1All.\r", b"01 To All.\r");
        let matrix = make_test_matrix(mock);

        matrix.set_zone_power(3, true).unwrap();
        matrix.set_zone_power(3, false).unwrap();
        matrix.set_zone_source(3, 100).unwrap();
        matrix.set_all_zone_source(-4).unwrap();

        assert_eq!(
            log.sent(),
            vec![
                b"3@.\r".to_vec(),
                b"3$.\r".to_vec(),
                b"8B3.\r".to_vec(),
                b"1All.\r".to_vec(),
            ]
        );
    }

    #[test]
    fn timeout_releases_connection() {
        let mut mock = MockTransport::new();
        mock.expect(b"2@.\r", b"02 Op");
        mock.expect(b"2$.\r", b"02 Closed.\r");
        let matrix = make_test_matrix(mock);

        assert!(matches!(matrix.set_zone_power(2, true), Err(Error::Timeout)));
        matrix.set_zone_power(2, false).unwrap();
    }

    #[test]
    fn partial_reply_runs_into_deadline() {
        let mut mock = MockTransport::new();
        mock.wait_out_timeouts(true);
        mock.expect(b"4B1.\r", b"AV:04");
        mock.expect(b"1@.\r", b"01 Open.\r");
        let matrix = BlockingJtechMatrix::new(Box::new(mock), Duration::from_millis(150));

        let started = std::time::Instant::now();
        assert!(matches!(matrix.set_zone_source(1, 4), Err(Error::Timeout)));
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert!(started.elapsed() < Duration::from_secs(2));

        matrix.set_zone_power(1, true).unwrap();
    }

    #[test]
    fn threads_do_not_interleave() {
        let mut mock = MockTransport::new();
        let log = mock.log();
        mock.unordered(true);
        mock.chunk_size(4);
        mock.reply_delay(Duration::from_millis(2));
        for zone in 1..=4 {
            mock.expect(
                format!("{zone}@.\r").as_bytes(),
                format!("0{zone} Open.\r").as_bytes(),
            );
        }
        let matrix = Arc::new(make_test_matrix(mock));

        let handles: Vec<_> = (1..=4)
            .map(|zone| {
                let matrix = Arc::clone(&matrix);
                thread::spawn(move || matrix.set_zone_power(zone, true))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // Each request is followed by exactly its own reply.
        let mut current: Option<(Vec<u8>, Vec<u8>)> = None;
        let mut cycles = Vec::new();
        for event in log.events() {
            match event {
                MockEvent::Sent(frame) => {
                    if let Some(done) = current.take() {
                        cycles.push(done);
                    }
                    current = Some((frame, Vec::new()));
                }
                MockEvent::Received(chunk) => {
                    current.as_mut().unwrap().1.extend_from_slice(&chunk);
                }
            }
        }
        cycles.extend(current);

        assert_eq!(cycles.len(), 4);
        for (frame, reply) in cycles {
            let zone = frame[0] - b'0';
            assert_eq!(reply, format!("0{zone} Open.\r").into_bytes());
        }
    }

    #[test]
    fn close_then_not_connected() {
        let matrix = make_test_matrix(MockTransport::new());
        assert!(matrix.is_connected());
        matrix.close().unwrap();
        assert!(!matrix.is_connected());
        assert!(matches!(matrix.zone_status(1), Err(Error::NotConnected)));
    }

    #[test]
    fn usable_as_dyn_blocking_matrix() {
        let mut mock = MockTransport::new();
        mock.expect(b"5All.\r", b"05 To All.\r");
        let matrix: Box<dyn BlockingMatrix> = Box::new(make_test_matrix(mock));
        matrix.set_all_zone_source(5).unwrap();
    }
}
