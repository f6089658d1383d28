//! Built-in extensions for the lite editor
//!
//! This module provides the extensions served by the default bundle loader:
//! - Line highlighting (`base`)
//! - Read-only toggling (`read_only`)
//!
//! Definition handles are created once per process and shared.

pub mod base;
pub mod read_only;

pub use base::{BaseExtension, LineRange};
pub use read_only::ReadOnlyExtension;

use super::{definition_of, DefinitionRef};
use once_cell::sync::Lazy;

static BASE_DEFINITION: Lazy<DefinitionRef> = Lazy::new(definition_of::<BaseExtension>);
static READ_ONLY_DEFINITION: Lazy<DefinitionRef> = Lazy::new(definition_of::<ReadOnlyExtension>);

/// Definition of [`BaseExtension`]
#[must_use]
pub fn base_definition() -> DefinitionRef {
    BASE_DEFINITION.clone()
}

/// Definition of [`ReadOnlyExtension`]
#[must_use]
pub fn read_only_definition() -> DefinitionRef {
    READ_ONLY_DEFINITION.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn builtin_definitions_are_stable() {
        assert!(Arc::ptr_eq(&base_definition(), &base_definition()));
        assert_eq!(base_definition().name(), Some("BaseExtension"));
        assert_eq!(read_only_definition().name(), Some("ReadOnlyExtension"));
    }
}
