//! Mock TCP server for end-to-end testing over real sockets.
//!
//! [`MockTcpServer`] is a scripted stand-in for the matrix: it accepts one
//! connection, optionally writes a greeting, then answers each expected
//! request with its canned reply.
//!
//! # Example
//!
//! ```
//! use jtech_test_harness::MockTcpServer;
//!
//! # async fn example() -> jtech_core::Result<()> {
//! let mut server = MockTcpServer::new().await?;
//! server.greeting(b"Welcome to HDMI Matrix\r");
//! server.expect(b"Status1.\r", b"AV: 02->01\r\nIR: 02->01\r");
//!
//! let addr = server.addr().to_string();
//! server.start();
//! // ... connect a client to `addr` and test ...
//! server.wait().await.map_err(jtech_core::Error::Protocol)?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use jtech_core::error::{Error, Result};

/// Outcome of the scripted session; `Err` describes the first deviation.
type Session = std::result::Result<(), String>;

/// One scripted step: wait for `request`, answer with `reply`.
#[derive(Debug, Clone)]
struct Step {
    request: Vec<u8>,
    reply: Vec<u8>,
}

/// A scripted TCP peer that behaves like a matrix.
///
/// The server listens on a random port on localhost. Once
/// [`start`](MockTcpServer::start) is called it accepts a single connection,
/// sends the greeting (if any), and walks the script in order. A request
/// that does not match ends the session with an error reported by
/// [`wait`](MockTcpServer::wait).
pub struct MockTcpServer {
    local: String,
    listener: Option<TcpListener>,
    greeting: Option<Vec<u8>>,
    script: VecDeque<Step>,
    session: Option<JoinHandle<Session>>,
}

impl MockTcpServer {
    /// Bind a new mock server on `127.0.0.1` with a random port.
    ///
    /// Connections are accepted by the kernel right away but are not
    /// served until [`start`](MockTcpServer::start) is called.
    pub async fn new() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| Error::Transport(format!("mock matrix cannot listen: {e}")))?;
        let local = listener.local_addr()?.to_string();

        Ok(MockTcpServer {
            local,
            listener: Some(listener),
            greeting: None,
            script: VecDeque::new(),
            session: None,
        })
    }

    /// Bytes written to the client as soon as it connects.
    pub fn greeting(&mut self, data: &[u8]) {
        self.greeting = Some(data.to_vec());
    }

    /// Append a scripted step: when `request` arrives, write `response`.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.script.push_back(Step {
            request: request.to_vec(),
            reply: response.to_vec(),
        });
    }

    /// The `host:port` address the server is listening on.
    pub fn addr(&self) -> &str {
        &self.local
    }

    /// Start serving the script in a background task.
    ///
    /// Calling `start` a second time has no effect.
    pub fn start(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let greeting = self.greeting.take();
        let script: Vec<Step> = self.script.drain(..).collect();

        self.session = Some(tokio::spawn(async move {
            let (mut sock, _) = listener
                .accept()
                .await
                .map_err(|e| format!("accept: {e}"))?;

            if let Some(greeting) = greeting {
                reply(&mut sock, &greeting)
                    .await
                    .map_err(|e| format!("greeting: {e}"))?;
            }

            for (step, Step { request, reply: answer }) in script.into_iter().enumerate() {
                let mut got = vec![0u8; request.len()];
                sock.read_exact(&mut got).await.map_err(|e| {
                    format!("step {step}: waiting for {:?}: {e}", request.escape_ascii().to_string())
                })?;

                if got != request {
                    return Err(format!(
                        "step {step}: request mismatch: expected {:?}, got {:?}",
                        request.escape_ascii().to_string(),
                        got.escape_ascii().to_string()
                    ));
                }

                reply(&mut sock, &answer)
                    .await
                    .map_err(|e| format!("step {step}: reply: {e}"))?;
            }

            Ok(())
        }));
    }

    /// Wait for the session to finish and return any deviation it found.
    pub async fn wait(self) -> Session {
        match self.session {
            Some(session) => session
                .await
                .map_err(|e| format!("mock matrix task failed: {e}"))?,
            None => Ok(()),
        }
    }
}

async fn reply(sock: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    sock.write_all(data).await?;
    sock.flush().await
}
