//! Member dispatch
//!
//! Resolving a member name walks three tiers and stops at the first one
//! defining it:
//!
//! 1. the extension owning the name on this instance
//! 2. the instance's own members ([`INSTANCE_MEMBERS`])
//! 3. the wrapped widget
//!
//! A name only fails to resolve when no tier defines it.

use super::EditorInstance;
use crate::core::{EditorError, Result};
use crate::extensions::{ExtensionRecord, Member};
use core::fmt;
use serde_json::{json, Value};
use std::sync::Arc;

/// Member names the instance itself defines
pub const INSTANCE_MEMBERS: &[&str] = &[
    "use",
    "unuse",
    "updateModelLanguage",
    "extensionsAPI",
    "dispose",
    "getId",
];

/// Dispatch tier a member resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Provided by an extension
    Extension,
    /// Defined by the instance
    Instance,
    /// Forwarded to the widget
    Widget,
}

/// Members defined by the instance itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceMember {
    /// Use registered extensions by name
    Use,
    /// Unuse extensions by name
    Unuse,
    /// Switch the model language for a path
    UpdateModelLanguage,
    /// List members provided by extensions
    ExtensionsApi,
    /// Dispose the widget
    Dispose,
    /// Instance id
    GetId,
}

impl InstanceMember {
    /// Look up an instance member by name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "use" => Some(Self::Use),
            "unuse" => Some(Self::Unuse),
            "updateModelLanguage" => Some(Self::UpdateModelLanguage),
            "extensionsAPI" => Some(Self::ExtensionsApi),
            "dispose" => Some(Self::Dispose),
            "getId" => Some(Self::GetId),
            _ => None,
        }
    }

    /// Member name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Use => "use",
            Self::Unuse => "unuse",
            Self::UpdateModelLanguage => "updateModelLanguage",
            Self::ExtensionsApi => "extensionsAPI",
            Self::Dispose => "dispose",
            Self::GetId => "getId",
        }
    }

    fn call(self, instance: &EditorInstance, args: &[Value]) -> Result<Value> {
        match self {
            Self::Use => {
                let names = extension_names(self.name(), args)
                    .ok_or(EditorError::MissingExtensionDefinition)??;
                let mut used = Vec::with_capacity(names.len());
                for name in names {
                    used.push(instance.use_registered(&name)?.extension_name().to_string());
                }
                Ok(json!(used))
            }
            Self::Unuse => {
                let names = extension_names(self.name(), args)
                    .ok_or(EditorError::MissingTargetForUnuse)??;
                for name in names {
                    instance.unuse_by_name(&name)?;
                }
                Ok(Value::Null)
            }
            Self::UpdateModelLanguage => {
                let path = args.first().and_then(Value::as_str).ok_or_else(|| {
                    EditorError::invalid_arguments(self.name(), "expected a file path")
                })?;
                instance.update_model_language(path).map(Value::String)
            }
            Self::ExtensionsApi => Ok(json!(instance.extensions_api())),
            Self::Dispose => {
                instance.dispose();
                Ok(Value::Null)
            }
            Self::GetId => Ok(json!(instance.id())),
        }
    }
}

/// Extension names from a string or an array of strings
///
/// `None` when no target was given at all.
fn extension_names(member: &str, args: &[Value]) -> Option<Result<Vec<String>>> {
    let names = match args.first()? {
        Value::Null => return None,
        Value::String(name) => Ok(vec![name.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    EditorError::invalid_arguments(member, "extension names must be strings")
                })
            })
            .collect(),
        _ => Err(EditorError::invalid_arguments(
            member,
            "expected an extension name or a list of names",
        )),
    };
    Some(names)
}

/// A resolved member, ready to be called
#[derive(Clone)]
pub enum BoundMember {
    /// Member of the extension owning the name
    Extension {
        owner: Arc<ExtensionRecord>,
        member: Member,
    },
    /// Member of the instance itself
    Instance(InstanceMember),
    /// Member forwarded to the widget
    Widget(String),
}

impl fmt::Debug for BoundMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension { owner, member } => f
                .debug_struct("Extension")
                .field("owner", &owner.extension_name())
                .field("member", member)
                .finish(),
            Self::Instance(member) => f.debug_tuple("Instance").field(member).finish(),
            Self::Widget(name) => f.debug_tuple("Widget").field(name).finish(),
        }
    }
}

impl BoundMember {
    /// Tier the member was found in
    #[must_use]
    pub fn tier(&self) -> Tier {
        match self {
            Self::Extension { .. } => Tier::Extension,
            Self::Instance(_) => Tier::Instance,
            Self::Widget(_) => Tier::Widget,
        }
    }

    /// Call the member on `instance`
    pub fn call(&self, instance: &EditorInstance, args: &[Value]) -> Result<Value> {
        match self {
            Self::Extension { member, .. } => member.call(instance, args),
            Self::Instance(member) => member.call(instance, args),
            Self::Widget(name) => Ok(instance.widget().invoke(name, args)?),
        }
    }
}

impl EditorInstance {
    /// Resolve `name` to the first tier defining it
    #[must_use]
    pub fn member(&self, name: &str) -> Option<BoundMember> {
        let owner = self.with_inner(|inner| {
            inner
                .ownership
                .get(name)
                .and_then(|owner| inner.bindings.get(owner))
                .cloned()
        });
        if let Some(owner) = owner {
            if let Some(member) = owner.api().get(name).cloned() {
                return Some(BoundMember::Extension { owner, member });
            }
        }

        if let Some(member) = InstanceMember::from_name(name) {
            return Some(BoundMember::Instance(member));
        }

        if self.widget.has_member(name) {
            return Some(BoundMember::Widget(name.to_string()));
        }

        None
    }

    /// Tier `name` resolves to
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Tier> {
        self.member(name).map(|member| member.tier())
    }

    /// Whether any tier defines `name`
    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// Call `name` with JSON arguments
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        let member = self.member(name).ok_or_else(|| EditorError::UnknownMember {
            member: name.to_string(),
        })?;
        member.call(self, args)
    }
}
