//! Facade configuration
//!
//! Everything a page sets once for all the editors it creates: default
//! engine options, the user's color scheme, where default extension bundles
//! live and the namespace used for model URIs. Loaded from JSON with serde;
//! every field is optional.

use crate::core::errors::{EditorError, Result};
use lite_core::{EngineOptions, URI_PREFIX};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Root bundle specifiers without a slash are resolved under
pub const DEFAULT_EXTENSION_ROOT: &str = "~/editor";

/// Configuration shared by every instance a facade creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacadeConfig {
    /// Engine options applied to every widget, overridable per instance
    pub editor_options: EngineOptions,
    /// User color scheme; unknown schemes fall back to the default theme
    pub color_scheme: Option<String>,
    /// Directory bare bundle specifiers resolve into
    pub extension_root: String,
    /// Namespace prefix of model URIs
    pub uri_prefix: String,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            editor_options: default_editor_options(),
            color_scheme: None,
            extension_root: DEFAULT_EXTENSION_ROOT.to_string(),
            uri_prefix: URI_PREFIX.to_string(),
        }
    }
}

impl FacadeConfig {
    /// Parse a configuration from JSON; missing fields keep their defaults
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(EditorError::config)
    }

    /// Use the given color scheme
    #[must_use]
    pub fn with_color_scheme(mut self, scheme: &str) -> Self {
        self.color_scheme = Some(scheme.to_string());
        self
    }

    /// Override one default engine option
    #[must_use]
    pub fn with_editor_option(mut self, key: &str, value: serde_json::Value) -> Self {
        self.editor_options.insert(key.to_string(), value);
        self
    }

    /// Default options overlaid with per-instance overrides
    #[must_use]
    pub fn merged_options(&self, overrides: &EngineOptions) -> EngineOptions {
        let mut options = self.editor_options.clone();
        for (key, value) in overrides {
            options.insert(key.clone(), value.clone());
        }
        options
    }
}

/// Engine options every editor starts from
#[must_use]
pub fn default_editor_options() -> EngineOptions {
    let options = json!({
        "roundedSelection": false,
        "scrollBeyondLastLine": false,
        "minimap": { "enabled": false },
        "automaticLayout": true,
        "readOnly": false,
    });
    match options {
        serde_json::Value::Object(map) => map,
        _ => EngineOptions::new(),
    }
}
