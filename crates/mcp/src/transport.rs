//! MCP transport layer.
//!
//! `McpTransport` moves newline-delimited JSON messages; `StdioTransport`
//! is the production implementation (stdin/stdout -- which is why all
//! logging in the server goes to stderr), `ChannelTransport` backs tests.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::McpError;

/// Trait for MCP message transport.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Read the next JSON-RPC message line. Returns `None` when the
    /// transport is closed.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    /// Write a JSON-RPC message line.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;
}

/// Stdio-based transport using newline-delimited JSON.
pub struct StdioTransport {
    reader: BufReader<tokio::io::Stdin>,
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-memory transport for tests, backed by a channel pair.
pub struct ChannelTransport {
    rx: tokio::sync::mpsc::Receiver<String>,
    tx: tokio::sync::mpsc::Sender<String>,
}

impl ChannelTransport {
    /// Create two connected transports: messages sent on one are received
    /// by the other.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = tokio::sync::mpsc::channel(32);
        let (tx_b, rx_a) = tokio::sync::mpsc::channel(32);
        (Self { rx: rx_a, tx: tx_a }, Self { rx: rx_b, tx: tx_b })
    }
}

#[async_trait]
impl McpTransport for ChannelTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx.send(message.to_string()).await.map_err(|e| {
            McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_pair_exchanges_messages() {
        let (mut a, mut b) = ChannelTransport::pair();

        a.send("ping").await.unwrap();
        assert_eq!(b.receive().await.unwrap(), Some("ping".to_string()));

        b.send("pong").await.unwrap();
        assert_eq!(a.receive().await.unwrap(), Some("pong".to_string()));
    }

    #[tokio::test]
    async fn dropped_peer_closes_transport() {
        let (mut a, b) = ChannelTransport::pair();
        drop(b);
        assert_eq!(a.receive().await.unwrap(), None);
    }
}
