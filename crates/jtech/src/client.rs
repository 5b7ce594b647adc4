//! JtechMatrix -- the async [`Matrix`] implementation.
//!
//! The connection is a single byte stream with no request ids, so two
//! exchanges whose bytes interleave would corrupt both replies. Every
//! operation therefore runs its whole send/receive cycle while holding the
//! transport's async mutex; other callers wait (suspended, not blocking a
//! thread) until the cycle ends, however it ends.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use jtech_core::error::Result;
use jtech_core::matrix::Matrix;
use jtech_core::transport::Transport;
use jtech_core::types::ZoneStatus;

use crate::commands;
use crate::protocol::{SET_SKIP, STATUS_SKIP};
use crate::reader;
use crate::status;

/// A connected matrix controlled from async code.
///
/// Constructed via [`JtechBuilder`](crate::builder::JtechBuilder). Share it
/// between tasks behind an `Arc`; operations are serialized internally.
pub struct JtechMatrix {
    transport: Mutex<Box<dyn Transport>>,
    command_timeout: Duration,
}

impl JtechMatrix {
    /// Create a new `JtechMatrix` around an open transport.
    ///
    /// This is called by [`JtechBuilder`](crate::builder::JtechBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(transport: Box<dyn Transport>, command_timeout: Duration) -> Self {
        JtechMatrix {
            transport: Mutex::new(transport),
            command_timeout,
        }
    }

    /// Read and drop the greeting the matrix sends on connect.
    pub(crate) async fn discard_greeting(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        reader::discard_greeting(&mut **transport, self.command_timeout).await
    }

    /// Run one command/reply cycle with the connection locked.
    async fn execute(&self, frame: &[u8], skip: usize) -> Result<String> {
        let mut transport = self.transport.lock().await;
        reader::exchange(&mut **transport, frame, skip, self.command_timeout).await
    }

    /// The deadline applied to each reply.
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Whether the underlying transport is still open.
    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Close the connection. Later operations fail with
    /// [`NotConnected`](jtech_core::Error::NotConnected).
    pub async fn close(&self) -> Result<()> {
        self.transport.lock().await.close().await
    }
}

#[async_trait]
impl Matrix for JtechMatrix {
    async fn zone_status(&self, zone: i32) -> Result<Option<ZoneStatus>> {
        debug!(zone, "querying zone status");
        let reply = self
            .execute(&commands::cmd_zone_status(zone), STATUS_SKIP)
            .await?;
        let status = status::parse_zone_status(zone, &reply);
        if status.is_none() {
            debug!(zone, reply = %reply.escape_debug(), "unrecognised status reply");
        }
        Ok(status)
    }

    async fn set_zone_power(&self, zone: i32, power: bool) -> Result<()> {
        debug!(zone, power, "setting zone power");
        self.execute(&commands::cmd_set_zone_power(zone, power), SET_SKIP)
            .await?;
        Ok(())
    }

    async fn set_zone_source(&self, zone: i32, source: i32) -> Result<()> {
        debug!(zone, source, "setting zone source");
        self.execute(&commands::cmd_set_zone_source(zone, source), SET_SKIP)
            .await?;
        Ok(())
    }

    async fn set_all_zone_source(&self, source: i32) -> Result<()> {
        debug!(source, "setting source for all zones");
        self.execute(&commands::cmd_set_all_zone_source(source), SET_SKIP)
            .await?;
        Ok(())
    }
}
