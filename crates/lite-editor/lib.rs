//! Extension composition layer for the lite editor
//!
//! `lite-editor` wraps widgets of an editor engine (see `lite-core`) in
//! [`EditorInstance`]s that independently authored extensions can extend
//! with methods, values and lifecycle hooks.
//!
//! # Features
//!
//! - **Extensions**: type-based or closure-based definitions, instantiated
//!   with setup options and cached per name in a shared registry
//! - **Lifecycle hooks**: `on_setup`, `on_use`, `on_before_unuse` and `on_unuse`
//! - **Conflict detection**: the first extension providing a member keeps it,
//!   later ones are logged and reported as events
//! - **Three-tier dispatch**: extension members, then instance members, then
//!   the widget itself
//! - **Facade**: creates single and diff instances, shares models by URI,
//!   loads default extension bundles and disposes models with their instance
//! - **Events**: instance and extension changes broadcast to filtered handlers
//!
//! # Example
//!
//! ```
//! use lite_core::{MemoryEngine, MountTarget};
//! use lite_editor::extensions::{Api, Extension, ExtensionUse, FnDefinition};
//! use lite_editor::{EditorFacade, InstanceOptions, Tier};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! impl Extension for Greeter {
//!     fn provides(&self) -> Api {
//!         Api::new().with_method("greet", |instance, _| {
//!             Ok(json!(format!("hello from {}", instance.id())))
//!         })
//!     }
//! }
//!
//! let facade = EditorFacade::new(Arc::new(MemoryEngine::new()));
//! let mount = MountTarget::new("editor");
//! let instance = facade
//!     .create_instance(InstanceOptions::new(&mount).with_path("main.rs"))
//!     .unwrap();
//!
//! let greeter = FnDefinition::named("Greeter", |_| Ok(Box::new(Greeter)));
//! instance.use_extension(&ExtensionUse::new(greeter)).unwrap();
//!
//! assert_eq!(instance.resolve("greet"), Some(Tier::Extension));
//! assert_eq!(instance.resolve("getValue"), Some(Tier::Widget));
//! assert_eq!(instance.invoke("getLanguage", &[]).unwrap(), json!("rust"));
//! ```

pub mod core;
pub mod events;
pub mod extensions;
pub mod facade;
pub mod instance;

// Re-export the engine seam callers need alongside the facade
pub use lite_core::{EditorEngine, EditorKind, MemoryEngine, MountTarget, Widget};

// Public API exports
pub use core::{default_editor_options, EditorError, FacadeConfig, Result, DEFAULT_EXTENSION_ROOT};
pub use events::{
    EditorEvent, EventChannel, EventChannelConfig, EventFilter, EventHandler, EventStats,
};
pub use extensions::{
    Api, BundleLoader, DefinitionRef, Extension, ExtensionDefinition, ExtensionRecord,
    ExtensionRegistry, ExtensionSource, ExtensionSpecifiers, ExtensionUse, FnDefinition, Member,
    ModuleExport, SetupOptions, StaticBundleLoader, StaticExtension, Used,
};
pub use facade::{EditorFacade, InstanceOptions, ModelSetup};
pub use instance::{BoundMember, EditorInstance, InstanceMember, Tier, INSTANCE_MEMBERS};
