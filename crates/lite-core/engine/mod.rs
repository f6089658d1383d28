//! Editor engine seam
//!
//! The composition layer never talks to a concrete editor toolkit directly.
//! It consumes the three traits defined here:
//!
//! - [`EditorEngine`]: creates widgets and text models, owns the language
//!   table and the active theme
//! - [`Widget`]: one mounted editor (single or diff), with its options,
//!   model and disposal notification
//! - [`TextModel`]: a text buffer addressable by [`ModelUri`]
//!
//! Widgets also expose a dynamic member surface ([`Widget::has_member`] and
//! [`Widget::invoke`]) which is the last tier of instance member dispatch.

pub mod memory;
pub mod uri;

use crate::languages::LanguageTable;
use crate::mount::MountTarget;
use crate::themes::Theme;
use crate::utils::errors::Result;
use core::fmt;
use serde_json::{Map, Value};
use std::sync::Arc;

pub use uri::{ModelUri, URI_PREFIX};

/// Options passed to the engine when a widget is created
pub type EngineOptions = Map<String, Value>;

/// Callback fired once when a widget is disposed
pub type DisposeListener = Box<dyn FnOnce() + Send>;

/// Kind of editor widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    /// Regular single-buffer code editor
    Code,
    /// Side-by-side diff editor with original and modified buffers
    Diff,
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Diff => f.write_str("diff"),
        }
    }
}

/// A text buffer owned by the engine
pub trait TextModel: Send + Sync + fmt::Debug {
    /// Identity of the model, if it was created with one
    fn uri(&self) -> Option<&ModelUri>;

    /// Current text content
    fn value(&self) -> String;

    /// Replace the text content
    fn set_value(&self, value: &str);

    /// Language id used for highlighting
    fn language(&self) -> String;

    /// Change the language id
    fn set_language(&self, language: &str);

    /// Release the model
    fn dispose(&self);

    /// Whether [`TextModel::dispose`] has been called
    fn is_disposed(&self) -> bool;
}

/// Model attached to a widget
#[derive(Debug, Clone)]
pub enum WidgetModel {
    /// Model of a code editor
    Single(Arc<dyn TextModel>),
    /// Models of a diff editor
    Diff {
        original: Arc<dyn TextModel>,
        modified: Arc<dyn TextModel>,
    },
}

impl WidgetModel {
    /// The buffer the user edits (the modified side of a diff)
    #[must_use]
    pub fn primary(&self) -> &Arc<dyn TextModel> {
        match self {
            Self::Single(model) => model,
            Self::Diff { modified, .. } => modified,
        }
    }

    /// All buffers, original side first
    #[must_use]
    pub fn models(&self) -> Vec<Arc<dyn TextModel>> {
        match self {
            Self::Single(model) => vec![model.clone()],
            Self::Diff { original, modified } => vec![original.clone(), modified.clone()],
        }
    }
}

/// One mounted editor widget
pub trait Widget: Send + Sync {
    /// Engine-unique widget id
    fn id(&self) -> u64;

    /// Single or diff editor
    fn kind(&self) -> EditorKind;

    /// Currently attached model
    fn model(&self) -> Option<WidgetModel>;

    /// Attach a model; the shape must match [`Widget::kind`]
    fn set_model(&self, model: WidgetModel) -> Result<()>;

    /// Read one option
    fn option(&self, key: &str) -> Option<Value>;

    /// Merge options into the widget's current options
    fn update_options(&self, options: &EngineOptions);

    /// Register a listener fired once on disposal
    fn on_did_dispose(&self, listener: DisposeListener);

    /// Dispose the widget; listeners fire before the model is detached
    fn dispose(&self);

    /// Whether the widget has been disposed
    fn is_disposed(&self) -> bool;

    /// Whether [`Widget::invoke`] understands `member`
    fn has_member(&self, member: &str) -> bool;

    /// Call a widget member with JSON arguments
    fn invoke(&self, member: &str, args: &[Value]) -> Result<Value>;
}

/// The editor engine consumed by the composition layer
pub trait EditorEngine: Send + Sync {
    /// Create a code editor widget on `mount`
    fn create_editor(&self, mount: &MountTarget, options: &EngineOptions)
        -> Result<Arc<dyn Widget>>;

    /// Create a diff editor widget on `mount`
    fn create_diff_editor(
        &self,
        mount: &MountTarget,
        options: &EngineOptions,
    ) -> Result<Arc<dyn Widget>>;

    /// Create a text model; `language` falls back to the URI's path
    fn create_model(
        &self,
        value: &str,
        language: Option<&str>,
        uri: Option<ModelUri>,
    ) -> Arc<dyn TextModel>;

    /// Look up a live model by identity
    fn model(&self, uri: &ModelUri) -> Option<Arc<dyn TextModel>>;

    /// All live models
    fn models(&self) -> Vec<Arc<dyn TextModel>>;

    /// Registered languages
    fn languages(&self) -> Arc<LanguageTable>;

    /// Register a theme definition
    fn define_theme(&self, theme: &Theme);

    /// Activate a theme by name
    fn set_theme(&self, name: &str);

    /// Change the language of a model
    fn set_model_language(&self, model: &dyn TextModel, language: &str) {
        model.set_language(language);
    }
}
