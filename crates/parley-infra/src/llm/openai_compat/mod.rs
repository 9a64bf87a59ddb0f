//! OpenAI-compatible chat backend.

mod client;
mod types;

pub use client::OpenAiCompatBackend;
