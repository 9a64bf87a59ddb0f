//! Tool-calling agent loop.

pub mod directive;
pub mod runner;
pub mod tool_server;

pub use runner::AgentLoop;
pub use tool_server::{BoxToolServer, ToolServer};
