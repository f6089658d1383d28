//! Extension records
//!
//! A record is one use of a definition: the definition handle, the setup
//! options it was used with, the object instantiated from them and the
//! object's API, computed on first access and cached.

use super::{Api, DefinitionRef, Extension, SetupOptions};
use crate::core::{EditorError, Result};
use core::fmt;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// An instantiated extension definition
pub struct ExtensionRecord {
    definition: DefinitionRef,
    setup_options: SetupOptions,
    object: Arc<dyn Extension>,
    name: String,
    api: OnceCell<Api>,
}

impl fmt::Debug for ExtensionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRecord")
            .field("name", &self.name)
            .field("setup_options", &self.setup_options)
            .field("api", &self.api.get().map(|api| api.names().collect::<Vec<_>>()))
            .finish_non_exhaustive()
    }
}

impl ExtensionRecord {
    /// Instantiate `definition` with `setup_options`
    ///
    /// The name comes from the definition, falling back to the object's own
    /// name. A definition that yields neither is invalid, as is one whose
    /// factory refuses the options.
    pub fn new(definition: DefinitionRef, setup_options: SetupOptions) -> Result<Self> {
        let object: Arc<dyn Extension> = definition
            .instantiate(&setup_options)
            .map_err(|err| match err {
                EditorError::InvalidExtensionDefinition { .. } => err,
                other => EditorError::invalid_definition(other),
            })?
            .into();

        let name = definition
            .name()
            .or_else(|| object.name())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .ok_or_else(|| EditorError::invalid_definition("extension has no name"))?;

        Ok(Self {
            definition,
            setup_options,
            object,
            name,
            api: OnceCell::new(),
        })
    }

    /// Name the record is registered under
    #[must_use]
    pub fn extension_name(&self) -> &str {
        &self.name
    }

    /// Definition the record was built from
    #[must_use]
    pub fn definition(&self) -> &DefinitionRef {
        &self.definition
    }

    /// Options the record was set up with
    #[must_use]
    pub fn setup_options(&self) -> &SetupOptions {
        &self.setup_options
    }

    /// The instantiated extension object
    #[must_use]
    pub fn object(&self) -> &Arc<dyn Extension> {
        &self.object
    }

    /// Members the extension provides
    pub fn api(&self) -> &Api {
        self.api.get_or_init(|| self.object.provides())
    }

    /// Whether `options` deep-equal the record's setup options
    #[must_use]
    pub fn same_setup(&self, options: &SetupOptions) -> bool {
        self.setup_options == *options
    }

    /// Whether the record was built from the same definition
    #[must_use]
    pub fn same_definition(&self, definition: &DefinitionRef) -> bool {
        super::same_definition(&self.definition, definition)
    }

    /// Same definition and deep-equal options
    #[must_use]
    pub fn is_equivalent(&self, definition: &DefinitionRef, options: &SetupOptions) -> bool {
        self.same_definition(definition) && self.same_setup(options)
    }
}
