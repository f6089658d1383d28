//! Core editor types: errors and facade configuration

pub mod config;
pub mod errors;

pub use config::{default_editor_options, FacadeConfig, DEFAULT_EXTENSION_ROOT};
pub use errors::{EditorError, Result};
