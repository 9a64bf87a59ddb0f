//! Chat backend abstraction.

pub mod backend;
pub mod box_backend;
pub mod registry;

pub use backend::ChatBackend;
pub use box_backend::BoxChatBackend;
pub use registry::BackendRegistry;
