//! Event system for editor instance changes
//!
//! Provides the `EditorEvent` enum describing instance lifecycle and
//! extension registration changes, and an `EventChannel` that fans events out
//! to registered handlers in priority order. Handlers are filtered per event
//! type and per instance.
//!
//! Handlers run without the channel locked, so a handler may touch
//! instances (and thereby dispatch) from inside `handle_event`. Events raised
//! while a handler is still busy with an outer event skip that handler.

use crate::core::{EditorError, Result};
use core::fmt;
use lite_core::EditorKind;
use parking_lot::Mutex;
use std::sync::Arc;

/// Events emitted by editor instances and the facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A facade created an instance
    InstanceCreated {
        instance: u64,
        kind: EditorKind,
        uri: Option<String>,
    },

    /// An instance's widget was disposed
    InstanceDisposed { instance: u64 },

    /// An extension was used on an instance
    ExtensionUsed {
        instance: u64,
        extension: String,
        members: Vec<String>,
    },

    /// An extension was unused from an instance
    ExtensionUnused { instance: u64, extension: String },

    /// Two extensions provide the same member; the owner keeps it
    NamingConflict {
        instance: u64,
        member: String,
        owner: String,
        rejected: String,
    },

    /// Default extensions were applied and the mount target notified
    InstanceReady { instance: u64, extensions: usize },
}

impl EditorEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            Self::InstanceCreated {
                instance,
                kind,
                uri,
            } => match uri {
                Some(uri) => format!("Created {kind} editor {instance} for {uri}"),
                None => format!("Created {kind} editor {instance}"),
            },
            Self::InstanceDisposed { instance } => format!("Disposed editor {instance}"),
            Self::ExtensionUsed {
                instance,
                extension,
                members,
            } => format!(
                "Used {extension} on editor {instance} ({} members)",
                members.len()
            ),
            Self::ExtensionUnused {
                instance,
                extension,
            } => format!("Unused {extension} from editor {instance}"),
            Self::NamingConflict {
                instance,
                member,
                owner,
                rejected,
            } => format!(
                "'{member}' on editor {instance} is provided by {owner}, ignored from {rejected}"
            ),
            Self::InstanceReady {
                instance,
                extensions,
            } => format!("Editor {instance} ready with {extensions} default extensions"),
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::InstanceCreated { .. } => "InstanceCreated",
            Self::InstanceDisposed { .. } => "InstanceDisposed",
            Self::ExtensionUsed { .. } => "ExtensionUsed",
            Self::ExtensionUnused { .. } => "ExtensionUnused",
            Self::NamingConflict { .. } => "NamingConflict",
            Self::InstanceReady { .. } => "InstanceReady",
        }
    }

    /// Instance the event is about
    pub fn instance(&self) -> u64 {
        match self {
            Self::InstanceCreated { instance, .. }
            | Self::InstanceDisposed { instance }
            | Self::ExtensionUsed { instance, .. }
            | Self::ExtensionUnused { instance, .. }
            | Self::NamingConflict { instance, .. }
            | Self::InstanceReady { instance, .. } => *instance,
        }
    }

    /// Check if this event changes the members an instance exposes
    pub fn changes_members(&self) -> bool {
        matches!(
            self,
            Self::ExtensionUsed { .. } | Self::ExtensionUnused { .. }
        )
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Event types to include (empty means all types)
    include_types: Vec<String>,
    /// Event types to exclude
    exclude_types: Vec<String>,
    /// Only events about this instance
    instance: Option<u64>,
}

impl EventFilter {
    /// Create a new event filter that accepts all events
    pub fn new() -> Self {
        Self::default()
    }

    /// Only include specific event types
    pub fn include_types(mut self, types: &[&str]) -> Self {
        self.include_types = types.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Exclude specific event types
    pub fn exclude_types(mut self, types: &[&str]) -> Self {
        self.exclude_types = types.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Only include events about one instance
    pub fn for_instance(mut self, instance: u64) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Check if an event passes this filter
    pub fn matches(&self, event: &EditorEvent) -> bool {
        let event_type = event.event_type_name();

        if self.exclude_types.iter().any(|t| t == event_type) {
            return false;
        }

        if !self.include_types.is_empty() && !self.include_types.iter().any(|t| t == event_type) {
            return false;
        }

        self.instance.is_none() || self.instance == Some(event.instance())
    }
}

/// Event handler trait for responding to editor events
pub trait EventHandler: Send + Sync {
    /// Handle an editor event
    fn handle_event(&mut self, event: &EditorEvent) -> Result<()>;

    /// Get the event filter for this handler
    fn event_filter(&self) -> EventFilter {
        EventFilter::new()
    }

    /// Get handler priority (higher numbers = higher priority)
    fn priority(&self) -> i32 {
        0
    }
}

/// Statistics about event handling
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Total number of events dispatched
    pub events_dispatched: usize,
    /// Number of handlers currently registered
    pub handlers_count: usize,
    /// Number of handler deliveries skipped by filters
    pub events_filtered: usize,
    /// Number of handler calls that returned an error
    pub handler_failures: usize,
    /// Number of deliveries skipped because the handler was busy
    pub reentrant_skips: usize,
}

/// Event channel configuration
#[derive(Debug, Clone)]
pub struct EventChannelConfig {
    /// Maximum number of handlers
    pub max_handlers: usize,
}

impl Default for EventChannelConfig {
    fn default() -> Self {
        Self { max_handlers: 100 }
    }
}

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Information about a registered handler
struct HandlerInfo {
    id: usize,
    handler: SharedHandler,
    filter: EventFilter,
    priority: i32,
    events_processed: usize,
}

impl fmt::Debug for HandlerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerInfo")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("priority", &self.priority)
            .field("events_processed", &self.events_processed)
            .field("handler", &"<EventHandler>")
            .finish()
    }
}

/// Internal storage for EventChannel data
#[derive(Debug, Default)]
struct EventChannelInner {
    handlers: Vec<HandlerInfo>,
    stats: EventStats,
    next_handler_id: usize,
}

/// Event channel distributing editor events to handlers
///
/// Shared by reference between a facade and its instances.
#[derive(Debug)]
pub struct EventChannel {
    config: EventChannelConfig,
    inner: Mutex<EventChannelInner>,
}

impl EventChannel {
    /// Create a new event channel with default configuration
    pub fn new() -> Self {
        Self::with_config(EventChannelConfig::default())
    }

    /// Create a new event channel with custom configuration
    pub fn with_config(config: EventChannelConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(EventChannelInner::default()),
        }
    }

    /// Register an event handler
    pub fn register_handler(&self, handler: Box<dyn EventHandler>) -> Result<usize> {
        let mut inner = self.inner.lock();
        if inner.handlers.len() >= self.config.max_handlers {
            return Err(EditorError::EventChannelError {
                message: format!("Handler limit reached: {}", self.config.max_handlers),
            });
        }

        let handler_id = inner.next_handler_id;
        inner.next_handler_id += 1;

        let filter = handler.event_filter();
        let priority = handler.priority();
        inner.handlers.push(HandlerInfo {
            id: handler_id,
            handler: Arc::new(Mutex::new(handler)),
            filter,
            priority,
            events_processed: 0,
        });
        // Sort by priority (highest first)
        inner.handlers.sort_by(|a, b| b.priority.cmp(&a.priority));
        inner.stats.handlers_count = inner.handlers.len();
        Ok(handler_id)
    }

    /// Unregister an event handler by ID
    pub fn unregister_handler(&self, handler_id: usize) -> bool {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.handlers.iter().position(|h| h.id == handler_id) else {
            return false;
        };
        inner.handlers.remove(pos);
        inner.stats.handlers_count = inner.handlers.len();
        true
    }

    /// Dispatch an event to all registered handlers
    ///
    /// Every matching handler sees the event; the first handler error is
    /// returned once all of them ran. Handlers are snapshotted first and
    /// called with the channel unlocked.
    pub fn dispatch(&self, event: &EditorEvent) -> Result<()> {
        let targets: Vec<(usize, SharedHandler)> = {
            let mut inner = self.inner.lock();
            let inner = &mut *inner;
            inner.stats.events_dispatched += 1;
            let mut targets = Vec::new();
            for info in &inner.handlers {
                if info.filter.matches(event) {
                    targets.push((info.id, info.handler.clone()));
                } else {
                    inner.stats.events_filtered += 1;
                }
            }
            targets
        };

        let mut first_error = None;
        let mut delivered = Vec::with_capacity(targets.len());
        let mut failures = 0;
        let mut skipped = 0;
        for (id, shared) in targets {
            // a handler still running an outer event is not re-entered
            let Some(mut handler) = shared.try_lock() else {
                skipped += 1;
                tracing::trace!(handler = id, event = event.event_type_name(), "handler busy, event skipped");
                continue;
            };
            delivered.push(id);
            if let Err(err) = handler.handle_event(event) {
                failures += 1;
                first_error.get_or_insert(err);
            }
        }

        self.with_inner_mut(|inner| {
            inner.stats.handler_failures += failures;
            inner.stats.reentrant_skips += skipped;
            for info in &mut inner.handlers {
                if delivered.contains(&info.id) {
                    info.events_processed += 1;
                }
            }
        });

        tracing::trace!(event = %event.description(), "event dispatched");
        first_error.map_or(Ok(()), Err)
    }

    fn with_inner_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EventChannelInner) -> R,
    {
        let mut inner = self.inner.lock();
        f(&mut inner)
    }

    /// Get event statistics
    pub fn stats(&self) -> EventStats {
        self.inner.lock().stats.clone()
    }

    /// Number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// Clear all event handlers
    pub fn clear_handlers(&self) {
        let mut inner = self.inner.lock();
        inner.handlers.clear();
        inner.stats.handlers_count = 0;
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestHandler {
        seen: Arc<Mutex<Vec<String>>>,
        filter: EventFilter,
        priority: i32,
        tag: &'static str,
        fail: bool,
    }

    impl TestHandler {
        fn new(seen: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Self {
            Self {
                seen: seen.clone(),
                filter: EventFilter::new(),
                priority: 0,
                tag,
                fail: false,
            }
        }
    }

    impl EventHandler for TestHandler {
        fn handle_event(&mut self, event: &EditorEvent) -> Result<()> {
            self.seen
                .lock()
                .push(format!("{}:{}", self.tag, event.event_type_name()));
            if self.fail {
                return Err(EditorError::EventChannelError {
                    message: self.tag.to_string(),
                });
            }
            Ok(())
        }

        fn event_filter(&self) -> EventFilter {
            self.filter.clone()
        }

        fn priority(&self) -> i32 {
            self.priority
        }
    }

    fn used(instance: u64) -> EditorEvent {
        EditorEvent::ExtensionUsed {
            instance,
            extension: "Alpha".to_string(),
            members: vec!["alpha".to_string()],
        }
    }

    #[test]
    fn event_description() {
        assert_eq!(used(1).description(), "Used Alpha on editor 1 (1 members)");
        assert!(used(1).changes_members());
        assert!(!EditorEvent::InstanceDisposed { instance: 1 }.changes_members());
    }

    #[test]
    fn filter_by_type_and_instance() {
        let filter = EventFilter::new()
            .include_types(&["ExtensionUsed"])
            .for_instance(2);
        assert!(filter.matches(&used(2)));
        assert!(!filter.matches(&used(3)));
        assert!(!filter.matches(&EditorEvent::InstanceDisposed { instance: 2 }));

        let exclude = EventFilter::new().exclude_types(&["ExtensionUsed"]);
        assert!(!exclude.matches(&used(2)));
    }

    #[test]
    fn priority_ordering() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel = EventChannel::new();
        channel
            .register_handler(Box::new(TestHandler::new(&seen, "low")))
            .unwrap();
        let mut high = TestHandler::new(&seen, "high");
        high.priority = 10;
        channel.register_handler(Box::new(high)).unwrap();

        channel.dispatch(&used(1)).unwrap();
        assert_eq!(
            *seen.lock(),
            vec!["high:ExtensionUsed".to_string(), "low:ExtensionUsed".to_string()]
        );
    }

    #[test]
    fn failing_handler_does_not_starve_others() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel = EventChannel::new();
        let mut failing = TestHandler::new(&seen, "failing");
        failing.fail = true;
        failing.priority = 1;
        channel.register_handler(Box::new(failing)).unwrap();
        channel
            .register_handler(Box::new(TestHandler::new(&seen, "ok")))
            .unwrap();

        let err = channel.dispatch(&used(1)).unwrap_err();
        assert_eq!(
            err,
            EditorError::EventChannelError {
                message: "failing".to_string()
            }
        );
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(channel.stats().handler_failures, 1);
    }

    #[test]
    fn handler_limit_and_unregister() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel = EventChannel::with_config(EventChannelConfig { max_handlers: 1 });
        let id = channel
            .register_handler(Box::new(TestHandler::new(&seen, "a")))
            .unwrap();
        assert!(channel
            .register_handler(Box::new(TestHandler::new(&seen, "b")))
            .is_err());
        assert!(channel.unregister_handler(id));
        assert!(!channel.unregister_handler(id));
        assert_eq!(channel.handler_count(), 0);

        let mut filtered = TestHandler::new(&seen, "c");
        filtered.filter = EventFilter::new().for_instance(9);
        channel.register_handler(Box::new(filtered)).unwrap();
        channel.dispatch(&used(1)).unwrap();
        assert!(seen.lock().is_empty());
        assert_eq!(channel.stats().events_filtered, 1);
        channel.clear_handlers();
        assert_eq!(channel.stats().handlers_count, 0);
    }

    #[test]
    fn handlers_may_dispatch_on_the_same_channel() {
        struct Relay(Arc<EventChannel>);

        impl EventHandler for Relay {
            fn handle_event(&mut self, event: &EditorEvent) -> Result<()> {
                if let EditorEvent::ExtensionUsed { instance, .. } = event {
                    self.0.dispatch(&EditorEvent::InstanceDisposed {
                        instance: *instance,
                    })?;
                }
                Ok(())
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel = Arc::new(EventChannel::new());
        let mut logger = TestHandler::new(&seen, "log");
        logger.priority = -1;
        channel.register_handler(Box::new(logger)).unwrap();
        channel
            .register_handler(Box::new(Relay(channel.clone())))
            .unwrap();

        channel.dispatch(&used(4)).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                "log:InstanceDisposed".to_string(),
                "log:ExtensionUsed".to_string()
            ]
        );
        let stats = channel.stats();
        assert_eq!(stats.events_dispatched, 2);
        assert_eq!(stats.reentrant_skips, 1);
        channel.clear_handlers();
    }
}
