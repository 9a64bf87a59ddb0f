//! Infrastructure for Parley.
//!
//! Concrete implementations of the parley-core trait seams: vendor chat
//! backends over HTTP, the MCP JSON-RPC tool client, file-based session
//! persistence, and configuration loading.

pub mod config;
pub mod llm;
pub mod mcp;
pub mod store;
