//! Error types for the lite-editor crate
//!
//! Provides the main `EditorError` enum that wraps `CoreError` from lite-core
//! and adds the composition-layer failure cases. Same rules as core:
//! - Use thiserror for structured error handling (no anyhow)
//! - Configuration misuse fails the call that violates the contract
//! - Naming conflicts are never errors, they are logged

use core::fmt;
use lite_core::utils::errors::CoreError;
use thiserror::Error;

/// Main error type for lite-editor operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Errors from lite-core
    #[error(transparent)]
    Core(CoreError),

    /// `create_instance` was called without a mount target
    #[error("Editor requires a mount target to attach to")]
    MissingMountTarget,

    /// `use` was called without an extension definition
    #[error("Extension definition is missing")]
    MissingExtensionDefinition,

    /// Definition cannot produce a named extension object
    #[error("Invalid extension definition: {message}")]
    InvalidExtensionDefinition { message: String },

    /// Something other than a definition or a group of definitions was supplied
    #[error("Extension definition must be a definition or a list of definitions, got {found}")]
    InvalidExtensionDefinitionType { found: String },

    /// `unuse` was called without a target
    #[error("No extension given to unuse")]
    MissingTargetForUnuse,

    /// The registry shared by the facade is gone
    #[error("Extension registry is not available")]
    MissingExtensionRegistry,

    /// `unuse` targeted an extension the registry does not hold
    #[error("Extension is not registered: {name}")]
    ExtensionNotRegistered { name: String },

    /// No dispatch tier defines the member
    #[error("Unknown instance member: {member}")]
    UnknownMember { member: String },

    /// Member was called with unusable arguments
    #[error("Invalid arguments for '{member}': {message}")]
    InvalidArguments { member: String, message: String },

    /// Default extension bundle could not be resolved
    #[error("Extension bundle not found: {path}")]
    BundleNotFound { path: String },

    /// Failure raised by an extension's own code
    #[error("Extension error: {extension}: {message}")]
    ExtensionError { extension: String, message: String },

    /// Instance operation after its widget was disposed
    #[error("Editor instance {id} is disposed")]
    InstanceDisposed { id: u64 },

    /// Event handler failure
    #[error("Event channel error: {message}")]
    EventChannelError { message: String },

    /// Facade configuration could not be read
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EditorError {
    /// Create an invalid extension definition error
    pub fn invalid_definition<T: fmt::Display>(message: T) -> Self {
        Self::InvalidExtensionDefinition {
            message: message.to_string(),
        }
    }

    /// Create an invalid arguments error
    pub fn invalid_arguments<T: fmt::Display>(member: &str, message: T) -> Self {
        Self::InvalidArguments {
            member: member.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an extension error
    pub fn extension<T: fmt::Display>(extension: &str, message: T) -> Self {
        Self::ExtensionError {
            extension: extension.to_string(),
            message: message.to_string(),
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
            Self::Core(core_err) => core_err.is_recoverable(),
            Self::ExtensionNotRegistered { .. }
            | Self::UnknownMember { .. }
            | Self::InvalidArguments { .. }
            | Self::BundleNotFound { .. }
            | Self::ExtensionError { .. }
            | Self::EventChannelError { .. } => true,
            Self::MissingMountTarget
            | Self::MissingExtensionDefinition
            | Self::InvalidExtensionDefinition { .. }
            | Self::InvalidExtensionDefinitionType { .. }
            | Self::MissingTargetForUnuse
            | Self::MissingExtensionRegistry
            | Self::InstanceDisposed { .. }
            | Self::Config(_) => false,
        }
    }

    /// Check if this is a contract violation by the caller
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingMountTarget
                | Self::MissingExtensionDefinition
                | Self::InvalidExtensionDefinition { .. }
                | Self::InvalidExtensionDefinitionType { .. }
                | Self::MissingTargetForUnuse
                | Self::MissingExtensionRegistry
        )
    }

    /// Get the underlying core error if this wraps one
    #[must_use]
    pub const fn as_core_error(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core_err) => Some(core_err),
            _ => None,
        }
    }
}

/// Result type alias for editor operations
pub type Result<T> = core::result::Result<T, EditorError>;

impl From<CoreError> for EditorError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}
