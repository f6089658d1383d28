//! Engine seam for the lite editor
//!
//! `lite-core` describes the narrow surface the editor composition layer
//! consumes from a concrete code-editor engine, plus the pure lookup tables
//! that sit next to it:
//!
//! - **Engine traits**: [`EditorEngine`], [`Widget`] and [`TextModel`]
//! - **Model identity**: [`ModelUri`] built from a namespace prefix, a global id and a path
//! - **Languages**: a language table and path-based language resolution
//! - **Themes**: a theme table and user-scheme based theme selection
//! - **Mount targets**: the element an editor widget is mounted on
//! - **Memory engine**: an in-process engine for headless use and tests
//!
//! # Example
//!
//! ```
//! use lite_core::languages::{resolve_language, LanguageTable, PLAINTEXT};
//!
//! let table = LanguageTable::builtin();
//! assert_eq!(resolve_language("config/app.yml", &table), "yaml");
//! assert_eq!(resolve_language("notes.unknownext", &table), PLAINTEXT);
//! ```

pub mod engine;
pub mod languages;
pub mod mount;
pub mod themes;
pub mod utils;

pub use engine::memory::{MemoryEngine, MemoryModel, MemoryWidget};
pub use engine::uri::{ModelUri, URI_PREFIX};
pub use engine::{EditorEngine, EditorKind, EngineOptions, TextModel, Widget, WidgetModel};
pub use languages::{resolve_language, Language, LanguageTable, PLAINTEXT};
pub use mount::{MountEvent, MountTarget, EDITOR_LOADING_ATTRIBUTE, EDITOR_READY_EVENT};
pub use themes::{Theme, ThemeSelection, ThemeTable, DEFAULT_THEME};
pub use utils::errors::{CoreError, Result};
