//! Error types for the J-Tech matrix client.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Both the blocking and the async matrix
//! report failures through the same enum, so callers can share handling code.
//!
//! An unparseable status reply is deliberately *not* an error: the status
//! query returns `Ok(None)` for that case.

/// The error type for all matrix operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The connection to the matrix could not be established.
    #[error("transport error: {0}")]
    Transport(String),

    /// The matrix sent bytes the client cannot interpret as a reply frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a terminated reply (or for the connection).
    ///
    /// The reply may still arrive later, so the connection should be
    /// considered out of step with the device after this error.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed while configuring the client.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The transport has been closed.
    #[error("not connected")]
    NotConnected,

    /// The matrix closed or reset the connection.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("connection refused: 10.0.0.7:80".into());
        assert_eq!(
            e.to_string(),
            "transport error: connection refused: 10.0.0.7:80"
        );
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("non-ASCII byte 0xFF in reply".into());
        assert_eq!(e.to_string(), "protocol error: non-ASCII byte 0xFF in reply");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("host is required".into());
        assert_eq!(e.to_string(), "invalid parameter: host is required");
    }

    #[test]
    fn error_display_connection_state() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
