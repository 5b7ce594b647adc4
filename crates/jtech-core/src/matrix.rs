//! The matrix contract -- the four operations every client offers.
//!
//! [`Matrix`] is the async flavour and [`BlockingMatrix`] the thread-blocking
//! one. The method set, argument meaning, and results are identical; only the
//! calling convention differs. Implementations serialize every operation on
//! their connection, so a shared client can be used from many tasks or
//! threads at once without replies getting mixed up.
//!
//! # Arguments
//!
//! - `zone` is an output number (1-8 on current hardware). It is sent to the
//!   matrix exactly as given; the client does not range-check it.
//! - `source` is an input number. Values outside 1-8 are clamped before
//!   being sent.
//!
//! # Errors
//!
//! A [`Timeout`](crate::Error::Timeout) leaves the connection in an unknown
//! position within the reply stream. Callers that see one should assume later
//! replies may be out of step and reconnect if that matters to them. Nothing
//! in the client retries or reconnects on its own.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ZoneStatus;

/// Asynchronous interface to a matrix switcher.
#[async_trait]
pub trait Matrix: Send + Sync {
    /// Query the routing state of one zone.
    ///
    /// Returns `Ok(None)` when the reply does not look like any known
    /// status report.
    async fn zone_status(&self, zone: i32) -> Result<Option<ZoneStatus>>;

    /// Switch a zone on (`true`) or off (`false`).
    async fn set_zone_power(&self, zone: i32, power: bool) -> Result<()>;

    /// Route `source` to `zone`.
    async fn set_zone_source(&self, zone: i32, source: i32) -> Result<()>;

    /// Route `source` to every zone.
    async fn set_all_zone_source(&self, source: i32) -> Result<()>;
}

/// Thread-blocking interface to a matrix switcher.
///
/// See [`Matrix`] for the meaning of each operation.
pub trait BlockingMatrix: Send + Sync {
    /// Query the routing state of one zone.
    fn zone_status(&self, zone: i32) -> Result<Option<ZoneStatus>>;

    /// Switch a zone on (`true`) or off (`false`).
    fn set_zone_power(&self, zone: i32, power: bool) -> Result<()>;

    /// Route `source` to `zone`.
    fn set_zone_source(&self, zone: i32, source: i32) -> Result<()>;

    /// Route `source` to every zone.
    fn set_all_zone_source(&self, source: i32) -> Result<()>;
}
