//! MCP (Model Context Protocol) server for Azure Boards.
//!
//! This crate implements a tools-only MCP server over stdio that exposes
//! Azure Boards work items, attachments, and comments to AI assistants.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

pub use handlers::ToolHandler;
pub use server::McpServer;
