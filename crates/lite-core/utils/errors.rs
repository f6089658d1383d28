//! Core error type for engine-level operations
//!
//! Provides the `CoreError` enum returned by the engine seam and the lookup
//! tables. Follows the same rules as the rest of the workspace:
//! - Use `thiserror` for structured error handling (no `anyhow`)
//! - Carry enough context to explain the failure without a debugger

use core::fmt;
use thiserror::Error;

/// Main error type for lite-core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A text model was used after being disposed
    #[error("Model disposed: {uri}")]
    ModelDisposed { uri: String },

    /// A widget was used after being disposed
    #[error("Widget disposed: {id}")]
    WidgetDisposed { id: u64 },

    /// Widget member was called with unusable arguments
    #[error("Invalid arguments for '{member}': {message}")]
    InvalidArguments { member: String, message: String },

    /// Widget does not define the requested member
    #[error("Unknown widget member: {member}")]
    UnknownMember { member: String },

    /// Operation requires a model but the widget has none
    #[error("Widget {id} has no model attached")]
    NoModel { id: u64 },

    /// Operation is not available for this kind of widget
    #[error("Operation '{operation}' is not supported by {kind} editors")]
    UnsupportedOperation { operation: String, kind: String },

    /// Engine configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CoreError {
    /// Create an invalid arguments error
    pub fn invalid_arguments<T: fmt::Display>(member: &str, message: T) -> Self {
        Self::InvalidArguments {
            member: member.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an unknown member error
    pub fn unknown_member(member: &str) -> Self {
        Self::UnknownMember {
            member: member.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config<T: fmt::Display>(message: T) -> Self {
        Self::Config(message.to_string())
    }

    /// Check if error is recoverable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidArguments { .. }
            | Self::UnknownMember { .. }
            | Self::NoModel { .. }
            | Self::UnsupportedOperation { .. }
            | Self::Config(_) => true,
            Self::ModelDisposed { .. } | Self::WidgetDisposed { .. } => false,
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = core::result::Result<T, CoreError>;
