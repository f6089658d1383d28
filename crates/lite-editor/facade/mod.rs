//! Editor facade
//!
//! The `EditorFacade` creates editor instances on mount targets, keeps track
//! of the live ones and shares one extension registry, one event channel and
//! one configuration between them. It also:
//!
//! - picks the syntax theme once, when the facade is built
//! - reuses text models by URI so two instances of the same file share a buffer
//! - loads default extension bundles and announces readiness on the mount
//! - disposes models with their instance unless another instance shows them

use crate::core::{EditorError, FacadeConfig, Result};
use crate::events::{EditorEvent, EventChannel};
use crate::extensions::{
    BundleLoader, ExtensionRegistry, ExtensionSpecifiers, ExtensionUse, StaticBundleLoader, Used,
};
use crate::instance::EditorInstance;
use core::fmt;
use futures::future::{self, BoxFuture, FutureExt};
use lite_core::{
    resolve_language, EditorEngine, EngineOptions, ModelUri, MountEvent, MountTarget, TextModel,
    ThemeTable, Widget, WidgetModel, EDITOR_LOADING_ATTRIBUTE, EDITOR_READY_EVENT,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::{Arc, Weak};

/// How the model of a new instance is set up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelSetup {
    /// Create or reuse a model for the blob path
    #[default]
    Auto,
    /// Leave the widget without a model
    Skip,
}

/// Parameters of a new instance
#[derive(Debug, Clone, Default)]
pub struct InstanceOptions {
    /// Element to mount the widget on
    pub mount: Option<Arc<MountTarget>>,
    /// File path of the blob, drives the model URI and language
    pub blob_path: String,
    /// Initial text (the modified side of a diff)
    pub blob_content: String,
    /// Original text of a diff
    pub blob_original_content: String,
    /// Caller supplied id that namespaces the model URI
    pub blob_global_id: Option<String>,
    /// Create a diff editor
    pub is_diff: bool,
    /// Model setup
    pub model: ModelSetup,
    /// Default extension bundles
    pub extensions: ExtensionSpecifiers,
    /// Per-instance engine option overrides
    pub editor_options: EngineOptions,
}

impl InstanceOptions {
    /// Options mounting on `mount`
    #[must_use]
    pub fn new(mount: &Arc<MountTarget>) -> Self {
        Self {
            mount: Some(mount.clone()),
            ..Self::default()
        }
    }

    /// Set the blob path
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.blob_path = path.to_string();
        self
    }

    /// Set the initial text
    #[must_use]
    pub fn with_content(mut self, content: &str) -> Self {
        self.blob_content = content.to_string();
        self
    }

    /// Set the original text of a diff
    #[must_use]
    pub fn with_original_content(mut self, content: &str) -> Self {
        self.blob_original_content = content.to_string();
        self
    }

    /// Namespace the model URI with a global id
    #[must_use]
    pub fn with_global_id(mut self, id: &str) -> Self {
        self.blob_global_id = Some(id.to_string());
        self
    }

    /// Create a diff editor
    #[must_use]
    pub fn diff(mut self) -> Self {
        self.is_diff = true;
        self
    }

    /// Do not create a model
    #[must_use]
    pub fn without_model(mut self) -> Self {
        self.model = ModelSetup::Skip;
        self
    }

    /// Request default extension bundles
    #[must_use]
    pub fn with_extensions(mut self, extensions: impl Into<ExtensionSpecifiers>) -> Self {
        self.extensions = extensions.into();
        self
    }

    /// Override one engine option for this instance
    #[must_use]
    pub fn with_editor_option(mut self, key: &str, value: Value) -> Self {
        self.editor_options.insert(key.to_string(), value);
        self
    }
}

/// Internal storage for EditorFacade data
#[derive(Default)]
struct EditorFacadeInner {
    /// live instances in creation order
    instances: Vec<Arc<EditorInstance>>,
}

/// Creates and tracks editor instances
pub struct EditorFacade {
    engine: Arc<dyn EditorEngine>,
    registry: Arc<ExtensionRegistry>,
    loader: Arc<dyn BundleLoader>,
    events: Arc<EventChannel>,
    config: FacadeConfig,
    inner: Arc<Mutex<EditorFacadeInner>>,
}

impl fmt::Debug for EditorFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorFacade")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("instances", &self.instances().len())
            .finish_non_exhaustive()
    }
}

impl EditorFacade {
    /// Create a facade with the default configuration
    pub fn new(engine: Arc<dyn EditorEngine>) -> Self {
        Self::with_config(engine, FacadeConfig::default())
    }

    /// Create a facade and activate the theme for the configured scheme
    pub fn with_config(engine: Arc<dyn EditorEngine>, config: FacadeConfig) -> Self {
        let themes = ThemeTable::builtin();
        let selection = themes.select(config.color_scheme.as_deref());
        if let Some(theme) = selection.define {
            engine.define_theme(theme);
        }
        engine.set_theme(selection.activate);
        tracing::info!(
            theme = selection.activate,
            requested = config.color_scheme.as_deref().unwrap_or_default(),
            "editor theme selected"
        );

        Self {
            engine,
            registry: Arc::new(ExtensionRegistry::new()),
            loader: Arc::new(StaticBundleLoader::builtin()),
            events: Arc::new(EventChannel::new()),
            config,
            inner: Arc::new(Mutex::new(EditorFacadeInner::default())),
        }
    }

    /// Load default extension bundles through `loader`
    #[must_use]
    pub fn with_bundle_loader(mut self, loader: Arc<dyn BundleLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Helper method for accessing inner data immutably
    fn with_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EditorFacadeInner) -> R,
    {
        let inner = self.inner.lock();
        f(&inner)
    }

    /// Helper method for accessing inner data mutably
    fn with_inner_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EditorFacadeInner) -> R,
    {
        let mut inner = self.inner.lock();
        f(&mut inner)
    }

    /// Create an instance on the options' mount target
    ///
    /// Default extensions are loaded when [`EditorInstance::ready`] is
    /// awaited; the `editor-ready` mount event follows the last `use`.
    /// Without default extensions the event fires before this returns.
    pub fn create_instance(&self, options: InstanceOptions) -> Result<Arc<EditorInstance>> {
        let mount = options
            .mount
            .clone()
            .ok_or(EditorError::MissingMountTarget)?;
        mount.clear_children();
        mount.remove_attribute(EDITOR_LOADING_ATTRIBUTE);

        let engine_options = self.config.merged_options(&options.editor_options);
        let widget = if options.is_diff {
            self.engine.create_diff_editor(&mount, &engine_options)?
        } else {
            self.engine.create_editor(&mount, &engine_options)?
        };

        let uri = match options.model {
            ModelSetup::Auto => {
                let model = self.build_model(&options);
                let uri = model.primary().uri().map(ToString::to_string);
                if let Err(err) = widget.set_model(model) {
                    widget.dispose();
                    return Err(err.into());
                }
                uri
            }
            ModelSetup::Skip => None,
        };

        let instance = Arc::new(
            EditorInstance::new(widget.clone(), self.engine.clone(), &self.registry)
                .with_event_channel(self.events.clone()),
        );
        self.watch_disposal(&widget);
        self.with_inner_mut(|inner| inner.instances.push(instance.clone()));

        tracing::debug!(
            instance = instance.id(),
            kind = %instance.kind(),
            uri = uri.as_deref().unwrap_or_default(),
            "editor instance created"
        );
        instance.emit(EditorEvent::InstanceCreated {
            instance: instance.id(),
            kind: instance.kind(),
            uri,
        });

        let paths = options.extensions.resolve(&self.config.extension_root);
        if paths.is_empty() {
            notify_ready(&mount, &instance, 0);
        } else {
            instance.set_pending_load(self.load_extensions(&mount, &instance, &paths));
        }

        Ok(instance)
    }

    /// Create a diff instance; same as [`Self::create_instance`] in diff mode
    pub fn create_diff_instance(&self, options: InstanceOptions) -> Result<Arc<EditorInstance>> {
        self.create_instance(InstanceOptions {
            is_diff: true,
            ..options
        })
    }

    fn build_model(&self, options: &InstanceOptions) -> WidgetModel {
        let uri = ModelUri::with_prefix(
            &self.config.uri_prefix,
            options.blob_global_id.as_deref(),
            &options.blob_path,
        );
        let language = resolve_language(&options.blob_path, &self.engine.languages()).to_string();

        let modified = self.engine.model(&uri).unwrap_or_else(|| {
            self.engine
                .create_model(&options.blob_content, Some(&language), Some(uri))
        });
        if !options.is_diff {
            return WidgetModel::Single(modified);
        }

        let original = self.engine.create_model(
            &options.blob_original_content,
            Some(&modified.language()),
            None,
        );
        WidgetModel::Diff { original, modified }
    }

    /// Stop tracking the instance and release its models once the widget goes
    fn watch_disposal(&self, widget: &Arc<dyn Widget>) {
        let id = widget.id();
        let weak_widget: Weak<dyn Widget> = Arc::downgrade(widget);
        let tracked = Arc::downgrade(&self.inner);
        let events = self.events.clone();

        widget.on_did_dispose(Box::new(move || {
            let remaining = match tracked.upgrade() {
                Some(inner) => {
                    let mut inner = inner.lock();
                    inner.instances.retain(|instance| instance.id() != id);
                    inner.instances.clone()
                }
                None => Vec::new(),
            };

            let mut released = 0;
            if let Some(model) = weak_widget.upgrade().and_then(|widget| widget.model()) {
                for model in model.models() {
                    if !shown_by_any(&remaining, &model) {
                        model.dispose();
                        released += 1;
                    }
                }
            }

            tracing::debug!(instance = id, models = released, "editor instance disposed");
            if let Err(err) = events.dispatch(&EditorEvent::InstanceDisposed { instance: id }) {
                tracing::warn!(instance = id, error = %err, "event handler failed");
            }
        }));
    }

    fn load_extensions(
        &self,
        mount: &Arc<MountTarget>,
        instance: &Arc<EditorInstance>,
        paths: &[String],
    ) -> BoxFuture<'static, Result<()>> {
        let loads: Vec<_> = paths.iter().map(|path| self.loader.load(path)).collect();
        let weak = Arc::downgrade(instance);
        let mount = mount.clone();
        tracing::debug!(instance = instance.id(), bundles = ?paths, "loading default extensions");

        async move {
            let exports = future::try_join_all(loads).await?;
            let count = exports.len();
            for export in exports {
                let Some(instance) = weak.upgrade().filter(|instance| !instance.is_disposed())
                else {
                    return Ok(());
                };
                instance.use_extension(&ExtensionUse::from(export))?;
            }
            if let Some(instance) = weak.upgrade().filter(|instance| !instance.is_disposed()) {
                notify_ready(&mount, &instance, count);
            }
            Ok(())
        }
        .boxed()
    }

    /// Use an extension on every live instance, in creation order
    pub fn use_extension(&self, request: &ExtensionUse) -> Result<Vec<Used>> {
        self.instances()
            .iter()
            .map(|instance| instance.use_extension(request))
            .collect()
    }

    /// Use several requests on every live instance
    pub fn use_extensions<I>(&self, requests: I) -> Result<()>
    where
        I: IntoIterator<Item = ExtensionUse>,
    {
        let requests: Vec<ExtensionUse> = requests.into_iter().collect();
        for instance in self.instances() {
            for request in &requests {
                instance.use_extension(request)?;
            }
        }
        Ok(())
    }

    /// Dispose every live instance
    pub fn dispose(&self) {
        let instances = self.instances();
        tracing::debug!(instances = instances.len(), "disposing editor facade");
        for instance in instances {
            instance.dispose();
        }
    }

    /// Live instances in creation order
    #[must_use]
    pub fn instances(&self) -> Vec<Arc<EditorInstance>> {
        self.with_inner(|inner| inner.instances.clone())
    }

    /// Extension registry shared by every instance
    #[must_use]
    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Channel instance and facade events are reported on
    #[must_use]
    pub fn events(&self) -> &Arc<EventChannel> {
        &self.events
    }

    /// The engine widgets and models come from
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn EditorEngine> {
        &self.engine
    }

    /// Facade configuration
    #[must_use]
    pub fn config(&self) -> &FacadeConfig {
        &self.config
    }
}

fn shown_by_any(instances: &[Arc<EditorInstance>], model: &Arc<dyn TextModel>) -> bool {
    instances.iter().any(|instance| {
        instance.widget().model().is_some_and(|shown| {
            shown
                .models()
                .iter()
                .any(|other| Arc::ptr_eq(other, model))
        })
    })
}

fn notify_ready(mount: &MountTarget, instance: &EditorInstance, extensions: usize) {
    mount.dispatch_event(&MountEvent::new(
        EDITOR_READY_EVENT,
        json!({ "instance": instance.id() }),
    ));
    tracing::debug!(instance = instance.id(), extensions, "editor instance ready");
    instance.emit(EditorEvent::InstanceReady {
        instance: instance.id(),
        extensions,
    });
}
