//! Multi-round dialog orchestration.

pub mod prompt;
pub mod service;

pub use service::DialogService;
