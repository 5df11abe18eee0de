//! A minimal JSON-Lines-over-stdio `CoordinatorStream`.
//!
//! The wire protocol and transport to a real remote coordinator are
//! explicitly someone else's job; this is the one concrete implementation
//! this binary ships so `fuzzymonkey fuzz` has somewhere to send bytes: one
//! JSON object per line on stdout, one expected per line on stdin.

use async_trait::async_trait;
use fuzzymonkey_core::runtime::{ClientMessage, CoordinatorStream, ServerMessage, TransportError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};

/// Speaks the coordinator protocol as newline-delimited JSON over the
/// process's own stdin/stdout.
pub struct StdioCoordinatorStream {
    stdin: BufReader<Stdin>,
    stdout: Stdout,
}

impl StdioCoordinatorStream {
    /// Builds a stream over the process's stdin/stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdioCoordinatorStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoordinatorStream for StdioCoordinatorStream {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        let mut line = serde_json::to_string(&message).map_err(|_| TransportError::Closed)?;
        line.push('\n');
        self.stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|_| TransportError::Closed)?;
        self.stdout.flush().await.map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<ServerMessage, TransportError> {
        let mut line = String::new();
        let read = self
            .stdin
            .read_line(&mut line)
            .await
            .map_err(|_| TransportError::Closed)?;
        if read == 0 {
            return Err(TransportError::Closed);
        }
        serde_json::from_str(line.trim_end()).map_err(|_| TransportError::Closed)
    }
}
