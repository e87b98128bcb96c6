//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP over stdio uses newline-delimited JSON. Stdout carries protocol
//! messages only; logs go to stderr.

use std::io::{self, BufRead, Write};

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// A blank line, skipped by the server loop
    Empty,
}

/// Transport for reading/writing JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Create a transport with custom reader/writer.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read a single JSON-RPC message from the transport.
    ///
    /// Returns `Ok(None)` at end of input.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();

        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let line = line.trim();
        if line.is_empty() {
            return Ok(Some(IncomingMessage::Empty));
        }

        tracing::debug!(message = line, "Received");

        // Requests carry an id, notifications don't
        if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(line) {
            return Ok(Some(IncomingMessage::Request(request)));
        }
        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(line) {
            return Ok(Some(IncomingMessage::Notification(notification)));
        }

        tracing::warn!(message = line, "Failed to parse message");
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid JSON-RPC message: {}", line),
        ))
    }

    /// Write a JSON-RPC response to the transport.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        tracing::debug!(bytes = json.len(), "Sending response");

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}
