//! Mount targets
//!
//! A [`MountTarget`] stands in for the host element an editor widget is
//! mounted on. It keeps the bits the composition layer touches: child
//! content (cleared before mounting), data attributes (the loading marker)
//! and custom event listeners (the ready notification).

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Event dispatched on the mount target once default extensions are applied
pub const EDITOR_READY_EVENT: &str = "editor-ready";

/// Data attribute marking a target that is still waiting for its editor
pub const EDITOR_LOADING_ATTRIBUTE: &str = "data-editor-loading";

/// Custom event delivered to mount listeners
#[derive(Debug, Clone, PartialEq)]
pub struct MountEvent {
    /// Event name
    pub name: String,
    /// Event payload
    pub detail: Value,
}

impl MountEvent {
    /// Create an event
    pub fn new(name: &str, detail: Value) -> Self {
        Self {
            name: name.to_string(),
            detail,
        }
    }
}

type Listener = Arc<dyn Fn(&MountEvent) + Send + Sync>;

#[derive(Default)]
struct MountTargetInner {
    children: Vec<String>,
    attributes: BTreeMap<String, String>,
    listeners: Vec<(String, Listener)>,
}

/// Element an editor widget is mounted on
pub struct MountTarget {
    id: String,
    inner: Mutex<MountTargetInner>,
}

impl core::fmt::Debug for MountTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MountTarget")
            .field("id", &self.id)
            .field("children", &inner.children)
            .field("attributes", &inner.attributes)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl MountTarget {
    /// Create an empty mount target
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            inner: Mutex::new(MountTargetInner::default()),
        })
    }

    /// Element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a child node
    pub fn append_child(&self, child: &str) {
        self.inner.lock().children.push(child.to_string());
    }

    /// Current child nodes
    #[must_use]
    pub fn children(&self) -> Vec<String> {
        self.inner.lock().children.clone()
    }

    /// Remove every child node
    pub fn clear_children(&self) {
        self.inner.lock().children.clear();
    }

    /// Set a data attribute
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.inner
            .lock()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    /// Read a data attribute
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.lock().attributes.get(name).cloned()
    }

    /// Remove a data attribute, returning its previous value
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.inner.lock().attributes.remove(name)
    }

    /// Listen for a custom event
    pub fn add_event_listener<F>(&self, event: &str, listener: F)
    where
        F: Fn(&MountEvent) + Send + Sync + 'static,
    {
        self.inner
            .lock()
            .listeners
            .push((event.to_string(), Arc::new(listener)));
    }

    /// Deliver an event to every listener registered for its name
    ///
    /// Returns the number of listeners notified. Listeners run without the
    /// target locked, so they may touch the target again.
    pub fn dispatch_event(&self, event: &MountEvent) -> usize {
        let listeners: Vec<Listener> = self
            .inner
            .lock()
            .listeners
            .iter()
            .filter(|(name, _)| *name == event.name)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }
}
