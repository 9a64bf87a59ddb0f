//! Anthropic Messages API backend.

mod client;
mod types;

pub use client::AnthropicBackend;
