//! Read-only toggle extension
//!
//! Drives the widget's `readOnly` option. The extension keeps no state of
//! its own: every call goes through the instance to the widget, so the
//! option stays the single source of truth.

use crate::core::Result;
use crate::extensions::{Api, Extension, SetupOptions, StaticExtension};
use crate::instance::EditorInstance;
use serde_json::{json, Value};

const READ_ONLY_OPTION: &str = "readOnly";

fn is_read_only(instance: &EditorInstance) -> Result<bool> {
    let value = instance.invoke("getOption", &[json!(READ_ONLY_OPTION)])?;
    Ok(value.as_bool().unwrap_or(false))
}

fn set_read_only(instance: &EditorInstance, read_only: bool) -> Result<()> {
    instance.invoke("updateOptions", &[json!({ READ_ONLY_OPTION: read_only })])?;
    Ok(())
}

/// Toggles the editor between editable and read-only
#[derive(Debug, Default)]
pub struct ReadOnlyExtension {
    initial: Option<bool>,
}

impl StaticExtension for ReadOnlyExtension {
    const NAME: &'static str = "ReadOnlyExtension";

    fn create(options: &SetupOptions) -> Result<Self> {
        Ok(Self {
            initial: options.get(READ_ONLY_OPTION).and_then(Value::as_bool),
        })
    }
}

impl Extension for ReadOnlyExtension {
    fn provides(&self) -> Api {
        Api::new()
            .with_method("toggleReadOnly", |instance, _| {
                let read_only = !is_read_only(instance)?;
                set_read_only(instance, read_only)?;
                Ok(Value::Bool(read_only))
            })
            .with_method("isReadOnly", |instance, _| {
                Ok(Value::Bool(is_read_only(instance)?))
            })
    }

    fn on_setup(&self, instance: &EditorInstance, _options: &SetupOptions) -> Result<()> {
        match self.initial {
            Some(read_only) => set_read_only(instance, read_only),
            None => Ok(()),
        }
    }
}
