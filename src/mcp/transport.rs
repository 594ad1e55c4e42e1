//! Line-delimited transport for MCP messages.
//!
//! Framing follows the MCP stdio transport:
//!
//! - Messages are UTF-8 encoded JSON-RPC, one per line
//! - Messages must not contain embedded newlines
//! - stderr is reserved for logging, never protocol traffic
//!
//! The transport is generic over the byte streams so the same server can run
//! on stdin/stdout or on an in-memory pipe.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::protocol::OutgoingMessage;

/// Transport over stdin/stdout.
pub type StdioTransport = Transport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

/// Reads JSON-RPC lines from `R` and writes replies to `W`.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
    /// Bytes of a line whose read was interrupted.
    partial: Vec<u8>,
}

impl StdioTransport {
    /// Creates a transport bound to the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over arbitrary streams.
    pub const fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            partial: Vec::new(),
        }
    }

    /// Reads the next message line as raw bytes, without its terminator.
    ///
    /// Returns `None` once the input is closed. Decoding is left to the
    /// caller so a line that is not UTF-8 can be rejected on its own.
    ///
    /// Cancel safe: bytes read before the future is dropped are kept and
    /// returned by the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let read = self.reader.read_until(b'\n', &mut self.partial).await?;
        if read == 0 && self.partial.is_empty() {
            return Ok(None);
        }

        let mut line = std::mem::take(&mut self.partial);
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Serialises a message and writes it as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn send(&mut self, message: &OutgoingMessage) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // serde_json escapes newlines inside strings, so compact output is
        // always a single line.
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}
