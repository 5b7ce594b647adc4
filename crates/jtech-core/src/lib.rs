//! jtech-core: Core traits, types, and error definitions for J-Tech HDMI
//! matrix control.
//!
//! This crate defines the abstractions shared by the async and blocking
//! clients. Applications can depend on these types without pulling in the
//! TCP transports or the protocol engine.
//!
//! # Key types
//!
//! - [`Matrix`] / [`BlockingMatrix`] -- the four matrix operations
//! - [`Transport`] / [`BlockingTransport`] -- byte-level communication channel
//! - [`ZoneStatus`] -- the state of one output zone
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod matrix;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use jtech_core::*`.
pub use error::{Error, Result};
pub use matrix::{BlockingMatrix, Matrix};
pub use transport::{BlockingTransport, Transport};
pub use types::ZoneStatus;
