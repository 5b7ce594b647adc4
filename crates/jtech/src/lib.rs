//! # jtech -- control client for J-Tech HDMI matrix switchers
//!
//! The matrix accepts CR-terminated ASCII commands on a TCP port and answers
//! each with a CR-terminated reply. This crate encodes the commands, frames
//! and parses the replies, and keeps concurrent callers from interleaving on
//! the single connection.
//!
//! ## Quick Start
//!
//! ```no_run
//! use jtech::{JtechBuilder, Matrix};
//!
//! #[tokio::main]
//! async fn main() -> jtech::Result<()> {
//!     let matrix = JtechBuilder::new().host("192.168.1.50").build().await?;
//!
//!     matrix.set_zone_power(1, true).await?;
//!     matrix.set_zone_source(1, 3).await?;
//!     if let Some(status) = matrix.zone_status(1).await? {
//!         println!("{status}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Without an async runtime, use
//! [`build_blocking`](JtechBuilder::build_blocking) and the
//! [`BlockingMatrix`] trait instead; the operations are identical.
//!
//! ## Crates
//!
//! | Crate                | Purpose                                      |
//! |----------------------|----------------------------------------------|
//! | `jtech-core`         | Traits, [`ZoneStatus`], [`Error`]            |
//! | `jtech-transport`    | Async and blocking TCP transports            |
//! | `jtech-test-harness` | Mock transport and scripted TCP server       |
//! | **`jtech`**          | Protocol engine, clients, builder            |
//!
//! ## Timeouts
//!
//! Each reply must arrive within the command timeout (2s by default). On
//! [`Error::Timeout`] the exchange is abandoned but the connection stays
//! open; the matrix's late reply may then be read as part of the next
//! command's reply. Reconnect if that matters to you.

pub mod blocking;
pub mod builder;
pub mod client;
pub mod commands;
pub mod protocol;
pub mod reader;
pub mod status;

pub use jtech_core::*;

pub use blocking::BlockingJtechMatrix;
pub use builder::JtechBuilder;
pub use client::JtechMatrix;
