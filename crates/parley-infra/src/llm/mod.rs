//! Vendor chat backend implementations.

pub mod anthropic;
pub mod openai_compat;

pub use anthropic::AnthropicBackend;
pub use openai_compat::OpenAiCompatBackend;
