//! Editor instances
//!
//! An [`EditorInstance`] wraps one engine widget and layers extensions on
//! top of it. It owns two tables:
//!
//! - the ownership table, member name to the extension providing it
//! - the bindings, extension name to the record used on this instance
//!
//! Registration follows a fixed sequence: reuse an equivalent registration
//! when the instance already exposes all of its members, otherwise unbind the
//! old record, instantiate, run `on_setup`, store in the shared registry
//! (running `on_use` only when the record is newly stored) and merge the
//! members, first registrant wins.
//!
//! The tables are never locked while extension code runs, so hooks and
//! methods may call back into the instance.

pub mod dispatch;

pub use dispatch::{BoundMember, InstanceMember, Tier, INSTANCE_MEMBERS};

use crate::core::{EditorError, Result};
use crate::events::{EditorEvent, EventChannel};
use crate::extensions::{
    not_a_definition, DefinitionRef, ExtensionRecord, ExtensionRegistry, ExtensionSource,
    ExtensionUse, SetupOptions, Used,
};
use core::fmt;
use futures::future::{BoxFuture, FutureExt, Shared};
use lite_core::{resolve_language, EditorEngine, EditorKind, Widget};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

type PendingLoad = Shared<BoxFuture<'static, Result<()>>>;

/// Internal storage for EditorInstance data
#[derive(Default)]
struct EditorInstanceInner {
    /// member name -> owning extension name
    ownership: BTreeMap<String, String>,
    /// extension name -> record used on this instance
    bindings: BTreeMap<String, Arc<ExtensionRecord>>,
}

/// One editor widget with extensions layered on top
pub struct EditorInstance {
    widget: Arc<dyn Widget>,
    engine: Arc<dyn EditorEngine>,
    registry: Weak<ExtensionRegistry>,
    events: Arc<EventChannel>,
    inner: Mutex<EditorInstanceInner>,
    pending_load: Mutex<Option<PendingLoad>>,
}

impl fmt::Debug for EditorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_inner(|inner| {
            f.debug_struct("EditorInstance")
                .field("id", &self.id())
                .field("kind", &self.kind())
                .field("ownership", &inner.ownership)
                .field("bindings", &inner.bindings.keys().collect::<Vec<_>>())
                .finish_non_exhaustive()
        })
    }
}

impl EditorInstance {
    /// Wrap `widget`, sharing `registry` with the other instances
    pub fn new(
        widget: Arc<dyn Widget>,
        engine: Arc<dyn EditorEngine>,
        registry: &Arc<ExtensionRegistry>,
    ) -> Self {
        Self {
            widget,
            engine,
            registry: Arc::downgrade(registry),
            events: Arc::new(EventChannel::new()),
            inner: Mutex::new(EditorInstanceInner::default()),
            pending_load: Mutex::new(None),
        }
    }

    /// Report events on a shared channel
    #[must_use]
    pub fn with_event_channel(mut self, events: Arc<EventChannel>) -> Self {
        self.events = events;
        self
    }

    /// Helper method for accessing inner data immutably
    fn with_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EditorInstanceInner) -> R,
    {
        let inner = self.inner.lock();
        f(&inner)
    }

    /// Helper method for accessing inner data mutably
    fn with_inner_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EditorInstanceInner) -> R,
    {
        let mut inner = self.inner.lock();
        f(&mut inner)
    }

    /// Instance id, the wrapped widget's id
    #[must_use]
    pub fn id(&self) -> u64 {
        self.widget.id()
    }

    /// Single or diff editor
    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.widget.kind()
    }

    /// The wrapped widget
    #[must_use]
    pub fn widget(&self) -> &Arc<dyn Widget> {
        &self.widget
    }

    /// The engine the widget belongs to
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn EditorEngine> {
        &self.engine
    }

    /// Channel instance events are reported on
    #[must_use]
    pub fn events(&self) -> &Arc<EventChannel> {
        &self.events
    }

    /// Whether the widget has been disposed
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.widget.is_disposed()
    }

    /// Dispose the widget; disposal listeners run first
    pub fn dispose(&self) {
        self.widget.dispose();
    }

    fn registry(&self) -> Result<Arc<ExtensionRegistry>> {
        self.registry
            .upgrade()
            .ok_or(EditorError::MissingExtensionRegistry)
    }

    pub(crate) fn emit(&self, event: EditorEvent) {
        if let Err(err) = self.events.dispatch(&event) {
            tracing::warn!(
                instance = self.id(),
                event = event.event_type_name(),
                error = %err,
                "event handler failed"
            );
        }
    }

    /// Use one extension request
    ///
    /// Returns the record for a single definition and one record per
    /// definition, in order, for a group.
    pub fn use_extension(&self, request: &ExtensionUse) -> Result<Used> {
        let source = request
            .definition
            .as_ref()
            .ok_or(EditorError::MissingExtensionDefinition)?;
        let options = &request.setup_options;
        match source {
            ExtensionSource::Single(definition) => {
                self.use_definition(definition, options).map(Used::One)
            }
            ExtensionSource::Group(definitions) => definitions
                .iter()
                .map(|definition| self.use_definition(definition, options))
                .collect::<Result<Vec<_>>>()
                .map(Used::Many),
            ExtensionSource::Opaque(value) => Err(not_a_definition(value)),
        }
    }

    /// Use several requests strictly in order; an empty sequence does nothing
    pub fn use_extensions<I>(&self, requests: I) -> Result<Vec<Used>>
    where
        I: IntoIterator<Item = ExtensionUse>,
    {
        requests
            .into_iter()
            .map(|request| self.use_extension(&request))
            .collect()
    }

    /// Use the extension currently stored in the registry under `name`
    pub fn use_registered(&self, name: &str) -> Result<Arc<ExtensionRecord>> {
        let record = self
            .registry()?
            .get(name)
            .ok_or_else(|| EditorError::ExtensionNotRegistered {
                name: name.to_string(),
            })?;
        self.use_definition(record.definition(), record.setup_options())
    }

    fn use_definition(
        &self,
        definition: &DefinitionRef,
        options: &SetupOptions,
    ) -> Result<Arc<ExtensionRecord>> {
        let registry = self.registry()?;

        // Definitions without a declared name are named by their object. The
        // object is built before the reuse check and dropped unused when an
        // equivalent record is reused; no hook has run on it at that point.
        let mut candidate = None;
        let name = match definition.name().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let record = ExtensionRecord::new(definition.clone(), options.clone())?;
                let name = record.extension_name().to_string();
                candidate = Some(record);
                name
            }
        };

        if let Some(existing) = registry.get(&name) {
            if existing.is_equivalent(definition, options) && self.exposes_all(&existing) {
                tracing::trace!(instance = self.id(), extension = %name, "extension already in use");
                let bound = self
                    .bound_extension(&name)
                    .filter(|bound| bound.is_equivalent(definition, options));
                return Ok(bound.unwrap_or(existing));
            }
        }

        // Only this instance's own registration is unused; a record that other
        // instances bound stays with them.
        if let Some(bound) = self.bound_extension(&name) {
            self.unuse_record(&registry, &bound)?;
        }

        let record = Arc::new(match candidate {
            Some(record) => record,
            None => ExtensionRecord::new(definition.clone(), options.clone())?,
        });
        record.object().on_setup(self, options)?;

        let already_stored = registry
            .get(&name)
            .is_some_and(|stored| stored.is_equivalent(definition, options));
        if !already_stored {
            registry.insert(record.clone());
            record.object().on_use(self)?;
        }

        self.bind(&name, &record);
        Ok(record)
    }

    /// Whether every member of the record's API is exposed on this instance
    fn exposes_all(&self, record: &ExtensionRecord) -> bool {
        let members: Vec<&str> = record.api().names().collect();
        self.with_inner(|inner| {
            members
                .iter()
                .all(|member| inner.ownership.contains_key(*member))
        })
    }

    /// Merge the record's members into the ownership table
    fn bind(&self, name: &str, record: &Arc<ExtensionRecord>) {
        let members: Vec<String> = record.api().names().map(str::to_string).collect();
        let conflicts = self.with_inner_mut(|inner| {
            let mut conflicts = Vec::new();
            for member in &members {
                match inner.ownership.get(member) {
                    Some(owner) if owner != name => conflicts.push((member.clone(), owner.clone())),
                    _ => {
                        inner.ownership.insert(member.clone(), name.to_string());
                    }
                }
            }
            inner.bindings.insert(name.to_string(), record.clone());
            conflicts
        });

        for (member, owner) in conflicts {
            tracing::warn!(
                instance = self.id(),
                member = %member,
                owner = %owner,
                rejected = %name,
                "naming conflict: member is already provided by another extension"
            );
            self.emit(EditorEvent::NamingConflict {
                instance: self.id(),
                member,
                owner,
                rejected: name.to_string(),
            });
        }

        tracing::debug!(instance = self.id(), extension = %name, "extension used");
        self.emit(EditorEvent::ExtensionUsed {
            instance: self.id(),
            extension: name.to_string(),
            members,
        });
    }

    /// Unuse one record; `None` is a caller error
    pub fn unuse_extension(&self, target: Option<&Arc<ExtensionRecord>>) -> Result<()> {
        let record = target.ok_or(EditorError::MissingTargetForUnuse)?;
        let registry = self.registry()?;
        self.unuse_record(&registry, record)
    }

    /// Unuse several records strictly in order; an empty sequence does nothing
    pub fn unuse_extensions<'a, I>(&self, targets: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Arc<ExtensionRecord>>,
    {
        targets
            .into_iter()
            .try_for_each(|record| self.unuse_extension(Some(record)))
    }

    /// Unuse everything a `use` call returned
    pub fn unuse(&self, used: &Used) -> Result<()> {
        match used {
            Used::One(record) => self.unuse_extension(Some(record)),
            Used::Many(records) => self.unuse_extensions(records),
        }
    }

    /// Unuse an extension by name
    pub fn unuse_by_name(&self, name: &str) -> Result<()> {
        let registry = self.registry()?;
        let record = self
            .bound_extension(name)
            .or_else(|| registry.get(name))
            .ok_or_else(|| EditorError::ExtensionNotRegistered {
                name: name.to_string(),
            })?;
        self.unuse_record(&registry, &record)
    }

    fn unuse_record(&self, registry: &ExtensionRegistry, record: &Arc<ExtensionRecord>) -> Result<()> {
        let name = record.extension_name();
        if !registry.contains(name) {
            return Err(EditorError::ExtensionNotRegistered {
                name: name.to_string(),
            });
        }

        // Hooks go to the object set up for this instance when there is one.
        let target = self.bound_extension(name).unwrap_or_else(|| record.clone());
        target.object().on_before_unuse(self)?;

        let removed = self.with_inner_mut(|inner| {
            let owned: Vec<String> = inner
                .ownership
                .iter()
                .filter(|(_, owner)| owner.as_str() == name)
                .map(|(member, _)| member.clone())
                .collect();
            for member in &owned {
                inner.ownership.remove(member);
            }
            inner.bindings.remove(name);
            owned
        });

        target.object().on_unuse(self)?;

        tracing::debug!(
            instance = self.id(),
            extension = %name,
            members = removed.len(),
            "extension unused"
        );
        self.emit(EditorEvent::ExtensionUnused {
            instance: self.id(),
            extension: name.to_string(),
        });
        Ok(())
    }

    /// Member names currently provided by extensions, sorted
    #[must_use]
    pub fn extensions_api(&self) -> Vec<String> {
        self.with_inner(|inner| inner.ownership.keys().cloned().collect())
    }

    /// Extension owning `member` on this instance
    #[must_use]
    pub fn owner_of(&self, member: &str) -> Option<String> {
        self.with_inner(|inner| inner.ownership.get(member).cloned())
    }

    /// Record used on this instance under `name`
    #[must_use]
    pub fn bound_extension(&self, name: &str) -> Option<Arc<ExtensionRecord>> {
        self.with_inner(|inner| inner.bindings.get(name).cloned())
    }

    /// Names of the extensions used on this instance, sorted
    #[must_use]
    pub fn bound_extensions(&self) -> Vec<String> {
        self.with_inner(|inner| inner.bindings.keys().cloned().collect())
    }

    /// Switch the model language to the one `path` resolves to
    ///
    /// Both sides of a diff are updated. Returns the language applied.
    pub fn update_model_language(&self, path: &str) -> Result<String> {
        if self.is_disposed() {
            return Err(EditorError::InstanceDisposed { id: self.id() });
        }
        let languages = self.engine.languages();
        let language = resolve_language(path, &languages).to_string();
        if let Some(model) = self.widget.model() {
            for model in model.models() {
                self.engine.set_model_language(model.as_ref(), &language);
            }
        }
        Ok(language)
    }

    /// Wait until default extensions are applied
    ///
    /// Loading starts when this future is first polled. Every caller sees
    /// the same outcome, load errors included.
    pub async fn ready(&self) -> Result<()> {
        let pending = self.pending_load.lock().clone();
        match pending {
            Some(load) => load.await,
            None => Ok(()),
        }
    }

    pub(crate) fn set_pending_load(&self, load: BoxFuture<'static, Result<()>>) {
        *self.pending_load.lock() = Some(load.shared());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::{Api, Extension, FnDefinition};
    use lite_core::{EngineOptions, MemoryEngine, MountTarget, WidgetModel};
    use serde_json::{json, Value};

    struct Hooked {
        log: Arc<Mutex<Vec<String>>>,
        members: &'static [&'static str],
    }

    impl Extension for Hooked {
        fn provides(&self) -> Api {
            self.members.iter().fold(Api::new(), |api, member| {
                api.with_value(member, json!(member))
            })
        }

        fn on_setup(&self, _instance: &EditorInstance, options: &SetupOptions) -> Result<()> {
            self.log.lock().push(format!("setup:{options}"));
            Ok(())
        }

        fn on_use(&self, _instance: &EditorInstance) -> Result<()> {
            self.log.lock().push("use".to_string());
            Ok(())
        }

        fn on_before_unuse(&self, instance: &EditorInstance) -> Result<()> {
            // members are still reachable here
            let reachable = self
                .members
                .iter()
                .all(|member| instance.owner_of(member).is_some());
            self.log.lock().push(format!("before_unuse:{reachable}"));
            Ok(())
        }

        fn on_unuse(&self, _instance: &EditorInstance) -> Result<()> {
            self.log.lock().push("unuse".to_string());
            Ok(())
        }
    }

    fn hooked(
        name: &str,
        members: &'static [&'static str],
        log: &Arc<Mutex<Vec<String>>>,
    ) -> DefinitionRef {
        let log = log.clone();
        FnDefinition::named(name, move |_| {
            Ok(Box::new(Hooked {
                log: log.clone(),
                members,
            }))
        })
    }

    fn instance(registry: &Arc<ExtensionRegistry>) -> EditorInstance {
        let engine = Arc::new(MemoryEngine::new());
        let widget = engine
            .create_editor(&MountTarget::new("editor"), &EngineOptions::new())
            .unwrap();
        let model = engine.create_model("", None, None);
        widget.set_model(WidgetModel::Single(model)).unwrap();
        EditorInstance::new(widget, engine, registry)
    }

    #[test]
    fn same_options_reuse_without_hooks() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = hooked("Alpha", &["alpha"], &log);
        let request = ExtensionUse::new(definition).with_options(json!({ "a": 1 }));

        let first = editor.use_extension(&request).unwrap();
        let second = editor.use_extension(&request).unwrap();

        assert!(Arc::ptr_eq(
            first.single().unwrap(),
            second.single().unwrap()
        ));
        assert_eq!(*log.lock(), vec![r#"setup:{"a":1}"#.to_string(), "use".to_string()]);
    }

    #[test]
    fn changed_options_replace_registration() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        let log = Arc::new(Mutex::new(Vec::new()));
        let definition = hooked("Alpha", &["alpha"], &log);

        editor
            .use_extension(&ExtensionUse::new(definition.clone()).with_options(json!(1)))
            .unwrap();
        log.lock().clear();
        editor
            .use_extension(&ExtensionUse::new(definition).with_options(json!(2)))
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec!["before_unuse:true", "unuse", "setup:2", "use"]
        );
        assert_eq!(
            registry.get("Alpha").unwrap().setup_options(),
            &json!(2)
        );
        assert_eq!(editor.extensions_api(), vec!["alpha"]);
    }

    #[test]
    fn missing_definition_and_target() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        assert_eq!(
            editor.use_extension(&ExtensionUse::default()).unwrap_err(),
            EditorError::MissingExtensionDefinition
        );
        assert_eq!(
            editor.unuse_extension(None).unwrap_err(),
            EditorError::MissingTargetForUnuse
        );
        let opaque = ExtensionUse {
            definition: Some(ExtensionSource::Opaque(json!("foo"))),
            setup_options: Value::Null,
        };
        assert!(matches!(
            editor.use_extension(&opaque),
            Err(EditorError::InvalidExtensionDefinitionType { .. })
        ));
    }

    #[test]
    fn registry_gone_is_reported() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        drop(registry);
        let log = Arc::new(Mutex::new(Vec::new()));
        let err = editor
            .use_extension(&ExtensionUse::new(hooked("Alpha", &[], &log)))
            .unwrap_err();
        assert_eq!(err, EditorError::MissingExtensionRegistry);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn unuse_of_unregistered_extension_fails() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        let log = Arc::new(Mutex::new(Vec::new()));
        let record = editor
            .use_extension(&ExtensionUse::new(hooked("Alpha", &["alpha"], &log)))
            .unwrap();
        registry.clear();
        assert_eq!(
            editor.unuse(&record).unwrap_err(),
            EditorError::ExtensionNotRegistered {
                name: "Alpha".to_string()
            }
        );
        assert_eq!(
            editor.unuse_by_name("Beta").unwrap_err(),
            EditorError::ExtensionNotRegistered {
                name: "Beta".to_string()
            }
        );
    }

    #[test]
    fn group_returns_records_in_order() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        let log = Arc::new(Mutex::new(Vec::new()));
        let used = editor
            .use_extension(&ExtensionUse::group(vec![
                hooked("Beta", &["beta"], &log),
                hooked("Alpha", &["alpha"], &log),
            ]))
            .unwrap();
        let names: Vec<String> = used
            .records()
            .iter()
            .map(|record| record.extension_name().to_string())
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
        assert_eq!(editor.bound_extensions(), vec!["Alpha", "Beta"]);

        editor.unuse(&used).unwrap();
        assert!(editor.extensions_api().is_empty());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn update_model_language_uses_path() {
        let registry = Arc::new(ExtensionRegistry::new());
        let editor = instance(&registry);
        assert_eq!(editor.update_model_language("app.rb").unwrap(), "ruby");
        let model = editor.widget().model().unwrap();
        assert_eq!(model.primary().language(), "ruby");
        assert_eq!(
            editor.update_model_language("notes.unknownext").unwrap(),
            "plaintext"
        );

        editor.dispose();
        assert!(matches!(
            editor.update_model_language("a.js"),
            Err(EditorError::InstanceDisposed { .. })
        ));
    }
}
