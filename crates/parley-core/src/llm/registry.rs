//! Backend registry for runtime vendor lookup.
//!
//! A simple name-indexed registry of boxed chat backends. Requests carry a
//! vendor identifier; the orchestrators resolve it here.

use std::collections::HashMap;

use parley_types::error::DialogError;

use super::box_backend::BoxChatBackend;

/// Registry of available chat backends, indexed by vendor name.
pub struct BackendRegistry {
    backends: HashMap<String, BoxChatBackend>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a backend under the given vendor name.
    ///
    /// If a backend with this name already exists, it is replaced.
    pub fn register(&mut self, name: impl Into<String>, backend: BoxChatBackend) {
        self.backends.insert(name.into(), backend);
    }

    /// Look up a backend by vendor name.
    pub fn get(&self, name: &str) -> Option<&BoxChatBackend> {
        self.backends.get(name)
    }

    /// Resolve a vendor identifier or fail with `UnknownVendor`.
    pub fn resolve(&self, name: &str) -> Result<&BoxChatBackend, DialogError> {
        self.backends
            .get(name)
            .ok_or_else(|| DialogError::UnknownVendor(name.to_string()))
    }

    /// List all registered vendor names.
    pub fn list_names(&self) -> Vec<&str> {
        self.backends.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
