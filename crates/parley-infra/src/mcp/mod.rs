//! MCP tool protocol client.

pub mod client;
pub mod protocol;

pub use client::McpClient;
