//! In-process editor engine
//!
//! `MemoryEngine` implements the engine seam with plain strings for text
//! buffers and JSON maps for widget options. It is used for headless editors
//! and as the engine behind the test-suites; it does no rendering.

use super::{
    DisposeListener, EditorEngine, EditorKind, EngineOptions, ModelUri, TextModel, Widget,
    WidgetModel,
};
use crate::languages::{resolve_language, LanguageTable, PLAINTEXT};
use crate::mount::MountTarget;
use crate::themes::Theme;
use crate::utils::errors::{CoreError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Members understood by [`MemoryWidget::invoke`]
const WIDGET_MEMBERS: &[&str] = &[
    "getId",
    "getValue",
    "setValue",
    "getOption",
    "updateOptions",
    "getModelUri",
    "getLanguage",
    "dispose",
];

/// A text buffer held in memory
#[derive(Debug)]
pub struct MemoryModel {
    uri: Option<ModelUri>,
    value: Mutex<String>,
    language: Mutex<String>,
    dispose_calls: AtomicUsize,
}

impl MemoryModel {
    /// Create a model
    pub fn new(value: &str, language: &str, uri: Option<ModelUri>) -> Self {
        Self {
            uri,
            value: Mutex::new(value.to_string()),
            language: Mutex::new(language.to_string()),
            dispose_calls: AtomicUsize::new(0),
        }
    }

    /// How many times [`TextModel::dispose`] was called
    #[must_use]
    pub fn dispose_calls(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }
}

impl TextModel for MemoryModel {
    fn uri(&self) -> Option<&ModelUri> {
        self.uri.as_ref()
    }

    fn value(&self) -> String {
        self.value.lock().clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.lock() = value.to_string();
    }

    fn language(&self) -> String {
        self.language.lock().clone()
    }

    fn set_language(&self, language: &str) {
        *self.language.lock() = language.to_string();
    }

    fn dispose(&self) {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn is_disposed(&self) -> bool {
        self.dispose_calls() > 0
    }
}

/// A widget held in memory
pub struct MemoryWidget {
    id: u64,
    kind: EditorKind,
    mount_id: String,
    model: Mutex<Option<WidgetModel>>,
    options: Mutex<EngineOptions>,
    listeners: Mutex<Vec<DisposeListener>>,
    disposed: AtomicBool,
}

impl core::fmt::Debug for MemoryWidget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryWidget")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("mount_id", &self.mount_id)
            .field("options", &*self.options.lock())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl MemoryWidget {
    fn new(id: u64, kind: EditorKind, mount: &MountTarget, options: &EngineOptions) -> Self {
        Self {
            id,
            kind,
            mount_id: mount.id().to_string(),
            model: Mutex::new(None),
            options: Mutex::new(options.clone()),
            listeners: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Id of the element the widget was mounted on
    #[must_use]
    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(CoreError::WidgetDisposed { id: self.id });
        }
        Ok(())
    }

    fn primary_model(&self) -> Result<Arc<dyn TextModel>> {
        self.model
            .lock()
            .as_ref()
            .map(|model| model.primary().clone())
            .ok_or(CoreError::NoModel { id: self.id })
    }
}

fn string_arg<'a>(member: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::invalid_arguments(member, format!("argument {index} must be a string")))
}

impl Widget for MemoryWidget {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> EditorKind {
        self.kind
    }

    fn model(&self) -> Option<WidgetModel> {
        self.model.lock().clone()
    }

    fn set_model(&self, model: WidgetModel) -> Result<()> {
        self.ensure_live()?;
        match (&model, self.kind) {
            (WidgetModel::Single(_), EditorKind::Code) | (WidgetModel::Diff { .. }, EditorKind::Diff) => {
                *self.model.lock() = Some(model);
                Ok(())
            }
            _ => Err(CoreError::UnsupportedOperation {
                operation: "set_model with mismatched model shape".to_string(),
                kind: self.kind.to_string(),
            }),
        }
    }

    fn option(&self, key: &str) -> Option<Value> {
        self.options.lock().get(key).cloned()
    }

    fn update_options(&self, options: &EngineOptions) {
        let mut current = self.options.lock();
        for (key, value) in options {
            current.insert(key.clone(), value.clone());
        }
    }

    fn on_did_dispose(&self, listener: DisposeListener) {
        self.listeners.lock().push(listener);
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let listeners = std::mem::take(&mut *self.listeners.lock());
        for listener in listeners {
            listener();
        }
        self.model.lock().take();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn has_member(&self, member: &str) -> bool {
        WIDGET_MEMBERS.contains(&member)
    }

    fn invoke(&self, member: &str, args: &[Value]) -> Result<Value> {
        match member {
            "getId" => Ok(json!(self.id)),
            "dispose" => {
                self.dispose();
                Ok(Value::Null)
            }
            "getValue" => {
                self.ensure_live()?;
                Ok(Value::String(self.primary_model()?.value()))
            }
            "setValue" => {
                self.ensure_live()?;
                let value = string_arg(member, args, 0)?;
                self.primary_model()?.set_value(value);
                Ok(Value::Null)
            }
            "getOption" => {
                let key = string_arg(member, args, 0)?;
                Ok(self.option(key).unwrap_or(Value::Null))
            }
            "updateOptions" => {
                self.ensure_live()?;
                let options = args.first().and_then(Value::as_object).ok_or_else(|| {
                    CoreError::invalid_arguments(member, "argument 0 must be an object")
                })?;
                self.update_options(options);
                Ok(Value::Null)
            }
            "getModelUri" => Ok(self
                .model()
                .and_then(|model| model.primary().uri().map(|uri| json!(uri.as_str())))
                .unwrap_or(Value::Null)),
            "getLanguage" => Ok(Value::String(self.primary_model()?.language())),
            _ => Err(CoreError::unknown_member(member)),
        }
    }
}

struct MemoryEngineInner {
    models: Vec<Arc<MemoryModel>>,
    widgets: Vec<Arc<MemoryWidget>>,
    defined_themes: Vec<String>,
    active_theme: Option<String>,
}

/// Engine keeping widgets and models in memory
pub struct MemoryEngine {
    languages: Arc<LanguageTable>,
    next_widget_id: AtomicU64,
    inner: Mutex<MemoryEngineInner>,
}

impl core::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryEngine")
            .field("languages", &self.languages.len())
            .field("models", &inner.models.len())
            .field("widgets", &inner.widgets.len())
            .field("active_theme", &inner.active_theme)
            .finish()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Engine with the builtin language table
    #[must_use]
    pub fn new() -> Self {
        Self::with_languages(LanguageTable::builtin())
    }

    /// Engine with a custom language table
    #[must_use]
    pub fn with_languages(languages: LanguageTable) -> Self {
        Self {
            languages: Arc::new(languages),
            next_widget_id: AtomicU64::new(1),
            inner: Mutex::new(MemoryEngineInner {
                models: Vec::new(),
                widgets: Vec::new(),
                defined_themes: Vec::new(),
                active_theme: None,
            }),
        }
    }

    /// Every widget created so far, disposed or not
    #[must_use]
    pub fn widgets(&self) -> Vec<Arc<MemoryWidget>> {
        self.inner.lock().widgets.clone()
    }

    /// Every model created so far, disposed or not
    #[must_use]
    pub fn all_models(&self) -> Vec<Arc<MemoryModel>> {
        self.inner.lock().models.clone()
    }

    /// Names passed to [`EditorEngine::define_theme`], in call order
    #[must_use]
    pub fn defined_themes(&self) -> Vec<String> {
        self.inner.lock().defined_themes.clone()
    }

    /// Theme activated last
    #[must_use]
    pub fn active_theme(&self) -> Option<String> {
        self.inner.lock().active_theme.clone()
    }

    fn create_widget(&self, kind: EditorKind, mount: &MountTarget, options: &EngineOptions) -> Arc<dyn Widget> {
        let id = self.next_widget_id.fetch_add(1, Ordering::SeqCst);
        let widget = Arc::new(MemoryWidget::new(id, kind, mount, options));
        self.inner.lock().widgets.push(widget.clone());
        tracing::trace!(widget = id, %kind, mount = mount.id(), "memory widget created");
        widget
    }
}

impl EditorEngine for MemoryEngine {
    fn create_editor(&self, mount: &MountTarget, options: &EngineOptions) -> Result<Arc<dyn Widget>> {
        Ok(self.create_widget(EditorKind::Code, mount, options))
    }

    fn create_diff_editor(
        &self,
        mount: &MountTarget,
        options: &EngineOptions,
    ) -> Result<Arc<dyn Widget>> {
        Ok(self.create_widget(EditorKind::Diff, mount, options))
    }

    fn create_model(
        &self,
        value: &str,
        language: Option<&str>,
        uri: Option<ModelUri>,
    ) -> Arc<dyn TextModel> {
        let language = match (language, &uri) {
            (Some(language), _) => language.to_string(),
            (None, Some(uri)) => resolve_language(uri.path(), &self.languages).to_string(),
            (None, None) => PLAINTEXT.to_string(),
        };
        let model = Arc::new(MemoryModel::new(value, &language, uri));
        self.inner.lock().models.push(model.clone());
        model
    }

    fn model(&self, uri: &ModelUri) -> Option<Arc<dyn TextModel>> {
        self.inner
            .lock()
            .models
            .iter()
            .find(|model| !model.is_disposed() && model.uri() == Some(uri))
            .map(|model| model.clone() as Arc<dyn TextModel>)
    }

    fn models(&self) -> Vec<Arc<dyn TextModel>> {
        self.inner
            .lock()
            .models
            .iter()
            .filter(|model| !model.is_disposed())
            .map(|model| model.clone() as Arc<dyn TextModel>)
            .collect()
    }

    fn languages(&self) -> Arc<LanguageTable> {
        self.languages.clone()
    }

    fn define_theme(&self, theme: &Theme) {
        self.inner.lock().defined_themes.push(theme.name.clone());
    }

    fn set_theme(&self, name: &str) {
        self.inner.lock().active_theme = Some(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount() -> Arc<MountTarget> {
        MountTarget::new("editor")
    }

    #[test]
    fn model_language_inferred_from_uri() {
        let engine = MemoryEngine::new();
        let model = engine.create_model("# Title", None, Some(ModelUri::new(None, "README.md")));
        assert_eq!(model.language(), "markdown");

        let explicit = engine.create_model("x", Some("ruby"), None);
        assert_eq!(explicit.language(), "ruby");

        let bare = engine.create_model("x", None, None);
        assert_eq!(bare.language(), PLAINTEXT);
    }

    #[test]
    fn disposed_models_are_not_found() {
        let engine = MemoryEngine::new();
        let uri = ModelUri::new(Some("id"), "a.js");
        let model = engine.create_model("let a;", None, Some(uri.clone()));
        assert!(engine.model(&uri).is_some());
        model.dispose();
        assert!(engine.model(&uri).is_none());
        assert!(engine.models().is_empty());
        assert_eq!(engine.all_models()[0].dispose_calls(), 1);
    }

    #[test]
    fn widget_rejects_mismatched_model_shape() {
        let engine = MemoryEngine::new();
        let widget = engine.create_diff_editor(&mount(), &EngineOptions::new()).unwrap();
        let model = engine.create_model("a", None, None);
        let err = widget.set_model(WidgetModel::Single(model)).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
    }

    #[test]
    fn widget_members_proxy_the_model() {
        let engine = MemoryEngine::new();
        let widget = engine.create_editor(&mount(), &EngineOptions::new()).unwrap();
        let model = engine.create_model("Foo Bar", None, Some(ModelUri::new(None, "test.md")));
        widget.set_model(WidgetModel::Single(model.clone())).unwrap();

        assert!(widget.has_member("getValue"));
        assert!(!widget.has_member("alpha"));
        assert_eq!(widget.invoke("getValue", &[]).unwrap(), json!("Foo Bar"));
        widget.invoke("setValue", &[json!("Baz")]).unwrap();
        assert_eq!(model.value(), "Baz");
        assert_eq!(widget.invoke("getModelUri", &[]).unwrap(), json!("/lite/test.md"));
        assert!(matches!(
            widget.invoke("setValue", &[json!(1)]),
            Err(CoreError::InvalidArguments { .. })
        ));
        assert!(matches!(
            widget.invoke("alpha", &[]),
            Err(CoreError::UnknownMember { .. })
        ));
    }

    #[test]
    fn dispose_fires_listeners_once_then_detaches_model() {
        let engine = MemoryEngine::new();
        let widget = engine.create_editor(&mount(), &EngineOptions::new()).unwrap();
        widget
            .set_model(WidgetModel::Single(engine.create_model("a", None, None)))
            .unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen_model = Arc::new(AtomicBool::new(false));
        {
            let fired = fired.clone();
            let seen_model = seen_model.clone();
            let handle = widget.clone();
            widget.on_did_dispose(Box::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
                seen_model.store(handle.model().is_some(), Ordering::SeqCst);
            }));
        }

        widget.dispose();
        widget.dispose();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(seen_model.load(Ordering::SeqCst));
        assert!(widget.model().is_none());
        assert!(matches!(
            widget.invoke("getValue", &[]),
            Err(CoreError::WidgetDisposed { .. })
        ));
    }

    #[test]
    fn options_merge_on_update() {
        let engine = MemoryEngine::new();
        let mut options = EngineOptions::new();
        options.insert("readOnly".to_string(), json!(true));
        let widget = engine.create_editor(&mount(), &options).unwrap();
        assert_eq!(widget.option("readOnly"), Some(json!(true)));

        widget
            .invoke("updateOptions", &[json!({ "readOnly": false, "tabSize": 2 })])
            .unwrap();
        assert_eq!(widget.invoke("getOption", &[json!("readOnly")]).unwrap(), json!(false));
        assert_eq!(widget.option("tabSize"), Some(json!(2)));
    }
}
