//! Shared domain types for Parley.
//!
//! Pure data shapes with no I/O: conversation messages, the dialog session
//! entity, tool protocol types, typed errors, and configuration structs.

pub mod api;
pub mod config;
pub mod dialog;
pub mod error;
pub mod llm;
pub mod tool;
