//! Default extension bundles
//!
//! Instances can be created with a list of bundle specifiers. Each specifier
//! is resolved to a module path, loaded through a [`BundleLoader`] and the
//! module's export is then used on the instance.
//!
//! Path resolution:
//!
//! | specifier      | path              |
//! |----------------|-------------------|
//! | `foo`          | `~/editor/foo`    |
//! | `/custom/bar`  | `~/custom/bar`    |
//! | `custom/delta` | `~/custom/delta`  |

use super::{builtin, DefinitionRef, ExtensionSource, ExtensionUse};
use crate::core::{EditorError, Result};
use core::fmt;
use futures::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Alias root every resolved bundle path starts with
pub const BUNDLE_ALIAS_ROOT: &str = "~";

/// What a loaded bundle module exports
#[derive(Clone)]
pub enum ModuleExport {
    /// A single definition
    Definition(DefinitionRef),
    /// Several definitions applied together
    Definitions(Vec<DefinitionRef>),
    /// Anything else
    Opaque(Value),
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&ExtensionSource::from(self.clone()), f)
    }
}

impl From<ModuleExport> for ExtensionSource {
    fn from(export: ModuleExport) -> Self {
        match export {
            ModuleExport::Definition(definition) => Self::Single(definition),
            ModuleExport::Definitions(definitions) => Self::Group(definitions),
            ModuleExport::Opaque(value) => Self::Opaque(value),
        }
    }
}

impl From<ModuleExport> for ExtensionUse {
    fn from(export: ModuleExport) -> Self {
        Self {
            definition: Some(export.into()),
            setup_options: Value::Null,
        }
    }
}

/// Default extensions requested for a new instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionSpecifiers {
    /// No default extensions
    #[default]
    None,
    /// Comma separated specifiers, e.g. `"foo, bar"`
    Joined(String),
    /// One specifier per entry
    List(Vec<String>),
}

impl ExtensionSpecifiers {
    /// Specifiers in order, trimmed, blanks dropped
    #[must_use]
    pub fn specifiers(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::None => Vec::new(),
            Self::Joined(joined) => joined.split(',').collect(),
            Self::List(list) => list.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|specifier| !specifier.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Resolved module paths, in order
    #[must_use]
    pub fn resolve(&self, extension_root: &str) -> Vec<String> {
        self.specifiers()
            .iter()
            .map(|specifier| resolve_bundle_path(extension_root, specifier))
            .collect()
    }
}

impl From<&str> for ExtensionSpecifiers {
    fn from(joined: &str) -> Self {
        Self::Joined(joined.to_string())
    }
}

impl From<Vec<&str>> for ExtensionSpecifiers {
    fn from(list: Vec<&str>) -> Self {
        Self::List(list.into_iter().map(str::to_string).collect())
    }
}

/// Resolve one bundle specifier to a module path
///
/// ```
/// use lite_editor::extensions::resolve_bundle_path;
///
/// assert_eq!(resolve_bundle_path("~/editor", "foo"), "~/editor/foo");
/// assert_eq!(resolve_bundle_path("~/editor", "/my_path/bar"), "~/my_path/bar");
/// assert_eq!(resolve_bundle_path("~/editor", "my_path/delta"), "~/my_path/delta");
/// ```
#[must_use]
pub fn resolve_bundle_path(extension_root: &str, specifier: &str) -> String {
    if specifier.contains('/') {
        format!(
            "{BUNDLE_ALIAS_ROOT}/{}",
            specifier.trim_start_matches('/')
        )
    } else {
        format!("{}/{specifier}", extension_root.trim_end_matches('/'))
    }
}

/// Loads bundle modules by path
pub trait BundleLoader: Send + Sync {
    /// Load the module at `path`
    fn load(&self, path: &str) -> BoxFuture<'static, Result<ModuleExport>>;
}

/// Loader serving modules registered up front
pub struct StaticBundleLoader {
    modules: Mutex<BTreeMap<String, ModuleExport>>,
}

impl fmt::Debug for StaticBundleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBundleLoader")
            .field("modules", &self.paths())
            .finish()
    }
}

impl Default for StaticBundleLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StaticBundleLoader {
    /// Loader without any module
    #[must_use]
    pub fn empty() -> Self {
        Self {
            modules: Mutex::new(BTreeMap::new()),
        }
    }

    /// Loader serving the builtin extensions
    ///
    /// `base` and `read_only` resolve to the base and read-only extensions.
    #[must_use]
    pub fn builtin() -> Self {
        let loader = Self::empty();
        loader.register(
            "~/editor/base",
            ModuleExport::Definition(builtin::base_definition()),
        );
        loader.register(
            "~/editor/read_only",
            ModuleExport::Definition(builtin::read_only_definition()),
        );
        loader
    }

    /// Serve `export` at `path`
    pub fn register(&self, path: &str, export: ModuleExport) {
        self.modules.lock().insert(path.to_string(), export);
    }

    /// Registered module paths
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.modules.lock().keys().cloned().collect()
    }
}

impl BundleLoader for StaticBundleLoader {
    fn load(&self, path: &str) -> BoxFuture<'static, Result<ModuleExport>> {
        let loaded = self
            .modules
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| EditorError::BundleNotFound {
                path: path.to_string(),
            });
        tracing::trace!(path, found = loaded.is_ok(), "bundle requested");
        Box::pin(future::ready(loaded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn blank_specifiers_are_dropped() {
        for specifiers in [
            ExtensionSpecifiers::None,
            ExtensionSpecifiers::from(""),
            ExtensionSpecifiers::from(vec![]),
            ExtensionSpecifiers::from(vec![""]),
            ExtensionSpecifiers::from(" , "),
        ] {
            assert!(specifiers.specifiers().is_empty(), "{specifiers:?}");
        }
    }

    #[test]
    fn joined_and_listed_specifiers() {
        assert_eq!(ExtensionSpecifiers::from("foo").specifiers(), vec!["foo"]);
        assert_eq!(
            ExtensionSpecifiers::from("foo, bar").specifiers(),
            vec!["foo", "bar"]
        );
        assert_eq!(
            ExtensionSpecifiers::from(vec!["foo", "bar"]).resolve("~/editor"),
            vec!["~/editor/foo", "~/editor/bar"]
        );
    }

    #[test]
    fn custom_root_applies_to_bare_specifiers_only() {
        assert_eq!(resolve_bundle_path("~/ide/", "foo"), "~/ide/foo");
        assert_eq!(resolve_bundle_path("~/ide", "x/y"), "~/x/y");
    }

    #[test]
    fn static_loader_serves_builtins() {
        let loader = StaticBundleLoader::builtin();
        assert_eq!(loader.paths(), vec!["~/editor/base", "~/editor/read_only"]);
        let export = block_on(loader.load("~/editor/base")).unwrap();
        assert!(matches!(export, ModuleExport::Definition(_)));

        let err = block_on(loader.load("~/editor/missing")).unwrap_err();
        assert_eq!(
            err,
            EditorError::BundleNotFound {
                path: "~/editor/missing".to_string()
            }
        );
    }
}
