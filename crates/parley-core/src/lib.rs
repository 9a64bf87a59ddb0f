//! Business logic for Parley.
//!
//! Defines the trait seams (chat backend, session store, tool server) and
//! the three engines that use them: the history compression engine, the
//! multi-round dialog orchestrator, and the tool-calling agent loop.
//! Concrete I/O implementations live in parley-infra; this crate never
//! touches the network or the filesystem.

pub mod agent;
pub mod compress;
pub mod dialog;
pub mod llm;
pub mod session;
