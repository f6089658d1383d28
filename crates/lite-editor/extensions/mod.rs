//! Extension system for editor instances
//!
//! An extension is an independently authored unit that attaches members
//! (methods and values) and lifecycle hooks onto an [`EditorInstance`].
//!
//! - [`ExtensionDefinition`] is the factory callers hand to `use`. Both
//!   type-based definitions ([`definition_of`]) and closure-based ones
//!   ([`FnDefinition`]) implement it.
//! - [`Extension`] is the instantiated object: it provides an [`Api`] and
//!   may react to `on_setup`, `on_use`, `on_before_unuse` and `on_unuse`.
//! - [`ExtensionRecord`] pairs a definition with its setup options and
//!   the object built from them.
//! - [`ExtensionRegistry`] caches the current record per extension name and
//!   is shared by every instance of a facade.
//!
//! Methods never rely on a rebound receiver: the instance they are called on
//! is passed explicitly, and the extension's own state is whatever the
//! method closure captured.

pub mod builtin;
pub mod bundles;
pub mod record;
pub mod registry;

use crate::core::{EditorError, Result};
use crate::instance::EditorInstance;
use core::any::TypeId;
use core::fmt;
use core::marker::PhantomData;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use bundles::{
    resolve_bundle_path, BundleLoader, ExtensionSpecifiers, ModuleExport, StaticBundleLoader,
};
pub use record::ExtensionRecord;
pub use registry::ExtensionRegistry;

/// Opaque configuration passed when an extension is used
///
/// Compared by deep equality to decide whether a registration can be reused.
pub type SetupOptions = Value;

/// Method contributed by an extension
pub type Method = Arc<dyn Fn(&EditorInstance, &[Value]) -> Result<Value> + Send + Sync>;

/// Shared handle to an extension definition
///
/// Two handles refer to the same definition when they point to the same
/// allocation or are built from the same extension type.
pub type DefinitionRef = Arc<dyn ExtensionDefinition>;

/// Whether two handles refer to the same definition
#[must_use]
pub fn same_definition(a: &DefinitionRef, b: &DefinitionRef) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    matches!((a.extension_type(), b.extension_type()), (Some(a), Some(b)) if a == b)
}

/// One member of an extension's API
#[derive(Clone)]
pub enum Member {
    /// Callable member, receives the instance as its first argument
    Method(Method),
    /// Plain value member
    Value(Value),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(_) => f.write_str("Method(<fn>)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl Member {
    /// Call the member; value members ignore the arguments
    pub fn call(&self, instance: &EditorInstance, args: &[Value]) -> Result<Value> {
        match self {
            Self::Method(method) => method(instance, args),
            Self::Value(value) => Ok(value.clone()),
        }
    }

    /// Whether the member is callable
    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

/// Members an extension contributes, keyed by name
#[derive(Debug, Clone, Default)]
pub struct Api {
    members: BTreeMap<String, Member>,
}

impl Api {
    /// Create an empty API
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method
    #[must_use]
    pub fn with_method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&EditorInstance, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.members
            .insert(name.to_string(), Member::Method(Arc::new(method)));
        self
    }

    /// Add a value
    #[must_use]
    pub fn with_value(mut self, name: &str, value: Value) -> Self {
        self.members.insert(name.to_string(), Member::Value(value));
        self
    }

    /// Insert or replace a member
    pub fn insert(&mut self, name: &str, member: Member) {
        self.members.insert(name.to_string(), member);
    }

    /// Look up a member
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Whether the API has a member called `name`
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Member names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the API is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An instantiated extension object
pub trait Extension: Send + Sync {
    /// Instance-level name, used when the definition declares none
    fn name(&self) -> Option<&str> {
        None
    }

    /// Members this extension contributes
    fn provides(&self) -> Api {
        Api::new()
    }

    /// Called with the setup options before the extension is wired up
    fn on_setup(&self, _instance: &EditorInstance, _options: &SetupOptions) -> Result<()> {
        Ok(())
    }

    /// Called when the extension is newly stored in the registry
    fn on_use(&self, _instance: &EditorInstance) -> Result<()> {
        Ok(())
    }

    /// Called before the extension's members are removed from an instance
    fn on_before_unuse(&self, _instance: &EditorInstance) -> Result<()> {
        Ok(())
    }

    /// Called after the extension's members were removed from an instance
    fn on_unuse(&self, _instance: &EditorInstance) -> Result<()> {
        Ok(())
    }
}

/// Factory producing extension objects
pub trait ExtensionDefinition: Send + Sync {
    /// Name declared by the definition itself
    fn name(&self) -> Option<&str> {
        None
    }

    /// Extension type built by the definition, if it is type-based
    fn extension_type(&self) -> Option<TypeId> {
        None
    }

    /// Build the extension object for the given setup options
    fn instantiate(&self, options: &SetupOptions) -> Result<Box<dyn Extension>>;
}

/// Extension types that carry their own name
pub trait StaticExtension: Extension + Sized + 'static {
    /// Extension name
    const NAME: &'static str;

    /// Build the extension from its setup options
    fn create(options: &SetupOptions) -> Result<Self>;
}

/// Definition backed by a [`StaticExtension`] type
pub struct TypedDefinition<E> {
    _marker: PhantomData<fn() -> E>,
}

/// Create a definition handle for the extension type `E`
#[must_use]
pub fn definition_of<E: StaticExtension>() -> DefinitionRef {
    Arc::new(TypedDefinition::<E> {
        _marker: PhantomData,
    })
}

impl<E: StaticExtension> ExtensionDefinition for TypedDefinition<E> {
    fn name(&self) -> Option<&str> {
        Some(E::NAME)
    }

    fn extension_type(&self) -> Option<TypeId> {
        Some(TypeId::of::<E>())
    }

    fn instantiate(&self, options: &SetupOptions) -> Result<Box<dyn Extension>> {
        Ok(Box::new(E::create(options)?))
    }
}

type Factory = Box<dyn Fn(&SetupOptions) -> Result<Box<dyn Extension>> + Send + Sync>;

/// Definition backed by a closure
pub struct FnDefinition {
    name: Option<String>,
    factory: Factory,
}

impl FnDefinition {
    /// Definition whose objects name themselves
    pub fn anonymous<F>(factory: F) -> DefinitionRef
    where
        F: Fn(&SetupOptions) -> Result<Box<dyn Extension>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: None,
            factory: Box::new(factory),
        })
    }

    /// Definition with a declared name
    pub fn named<F>(name: &str, factory: F) -> DefinitionRef
    where
        F: Fn(&SetupOptions) -> Result<Box<dyn Extension>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: Some(name.to_string()),
            factory: Box::new(factory),
        })
    }
}

impl ExtensionDefinition for FnDefinition {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn instantiate(&self, options: &SetupOptions) -> Result<Box<dyn Extension>> {
        (self.factory)(options)
    }
}

/// What a `use` request points at
#[derive(Clone)]
pub enum ExtensionSource {
    /// One definition
    Single(DefinitionRef),
    /// Several definitions sharing the same setup options
    Group(Vec<DefinitionRef>),
    /// A loaded value that is not a definition
    Opaque(Value),
}

impl fmt::Debug for ExtensionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(definition) => f
                .debug_tuple("Single")
                .field(&definition.name().unwrap_or("<anonymous>"))
                .finish(),
            Self::Group(definitions) => f
                .debug_tuple("Group")
                .field(&definitions.len())
                .finish(),
            Self::Opaque(value) => f.debug_tuple("Opaque").field(value).finish(),
        }
    }
}

/// Error for a loaded value that is not a definition
pub(crate) fn not_a_definition(value: &Value) -> EditorError {
    EditorError::InvalidExtensionDefinitionType {
        found: json_type_name(value).to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One request to `use` an extension
#[derive(Debug, Clone, Default)]
pub struct ExtensionUse {
    /// Definition(s) to use; `None` is a caller error
    pub definition: Option<ExtensionSource>,
    /// Options passed to `on_setup`
    pub setup_options: SetupOptions,
}

impl ExtensionUse {
    /// Use one definition without options
    #[must_use]
    pub fn new(definition: DefinitionRef) -> Self {
        Self {
            definition: Some(ExtensionSource::Single(definition)),
            setup_options: Value::Null,
        }
    }

    /// Use several definitions with shared options
    #[must_use]
    pub fn group(definitions: Vec<DefinitionRef>) -> Self {
        Self {
            definition: Some(ExtensionSource::Group(definitions)),
            setup_options: Value::Null,
        }
    }

    /// Set the setup options
    #[must_use]
    pub fn with_options(mut self, options: SetupOptions) -> Self {
        self.setup_options = options;
        self
    }
}

impl From<DefinitionRef> for ExtensionUse {
    fn from(definition: DefinitionRef) -> Self {
        Self::new(definition)
    }
}

/// Records returned by `use`, in the shape of the request
#[derive(Debug, Clone)]
pub enum Used {
    /// Result of a single definition
    One(Arc<ExtensionRecord>),
    /// Results of a group, in order
    Many(Vec<Arc<ExtensionRecord>>),
}

impl Used {
    /// All records, in order
    #[must_use]
    pub fn records(&self) -> Vec<Arc<ExtensionRecord>> {
        match self {
            Self::One(record) => vec![record.clone()],
            Self::Many(records) => records.clone(),
        }
    }

    /// The record of a single-definition request
    #[must_use]
    pub fn single(&self) -> Option<&Arc<ExtensionRecord>> {
        match self {
            Self::One(record) => Some(record),
            Self::Many(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Named;

    impl Extension for Named {}

    impl StaticExtension for Named {
        const NAME: &'static str = "Named";

        fn create(_options: &SetupOptions) -> Result<Self> {
            Ok(Self)
        }
    }

    #[test]
    fn api_builder_keeps_members_sorted() {
        let api = Api::new()
            .with_value("zeta", json!(1))
            .with_method("alpha", |_, _| Ok(json!("a")));
        assert_eq!(api.names().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
        assert!(api.get("alpha").is_some_and(Member::is_method));
        assert!(!api.get("zeta").is_some_and(Member::is_method));
    }

    #[test]
    fn typed_definition_declares_name() {
        let definition = definition_of::<Named>();
        assert_eq!(definition.name(), Some("Named"));
        assert!(definition.instantiate(&Value::Null).is_ok());
    }

    #[test]
    fn typed_definitions_are_identified_by_type() {
        struct Other;

        impl Extension for Other {}

        impl StaticExtension for Other {
            const NAME: &'static str = "Named";

            fn create(_options: &SetupOptions) -> Result<Self> {
                Ok(Self)
            }
        }

        assert!(same_definition(&definition_of::<Named>(), &definition_of::<Named>()));
        assert!(!same_definition(&definition_of::<Named>(), &definition_of::<Other>()));

        let factory = |_: &SetupOptions| -> Result<Box<dyn Extension>> { Ok(Box::new(Named)) };
        let closure = FnDefinition::named("Named", factory);
        assert!(same_definition(&closure, &closure.clone()));
        assert!(!same_definition(&closure, &FnDefinition::named("Named", factory)));
        assert!(!same_definition(&closure, &definition_of::<Named>()));
    }

    #[test]
    fn opaque_value_is_rejected() {
        let err = not_a_definition(&json!({}));
        assert_eq!(
            err,
            EditorError::InvalidExtensionDefinitionType {
                found: "object".to_string()
            }
        );
    }

    #[test]
    fn used_preserves_shape() {
        let record = Arc::new(
            ExtensionRecord::new(definition_of::<Named>(), Value::Null).unwrap(),
        );
        let one = Used::One(record.clone());
        assert!(one.single().is_some());
        let many = Used::Many(vec![record.clone(), record]);
        assert!(many.single().is_none());
        assert_eq!(many.records().len(), 2);
    }
}
