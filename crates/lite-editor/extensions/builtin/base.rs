//! Base extension: line highlighting
//!
//! Provides `highlightLines`, `removeHighlights` and `highlightedLines`.
//! A `{"highlight": "L5-10"}` setup option highlights those lines on every
//! instance the extension is set up on; unusing the extension clears the
//! highlight.

use crate::core::{EditorError, Result};
use crate::extensions::{Api, Extension, SetupOptions, StaticExtension};
use crate::instance::EditorInstance;
use core::fmt;
use core::str::FromStr;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Inclusive, 1-based range of highlighted lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line
    pub start: u32,
    /// Last line
    pub end: u32,
}

impl LineRange {
    /// Create a range; bounds are swapped if given in reverse
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    fn to_json(self) -> Value {
        json!([self.start, self.end])
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "L{}", self.start)
        } else {
            write!(f, "L{}-{}", self.start, self.end)
        }
    }
}

impl FromStr for LineRange {
    type Err = EditorError;

    /// Parse `L5`, `L5-10` or `#L5-10`
    fn from_str(input: &str) -> Result<Self> {
        let invalid = || EditorError::extension(BaseExtension::NAME, format!("invalid line range '{input}'"));
        let body = input
            .trim()
            .trim_start_matches('#')
            .strip_prefix('L')
            .ok_or_else(invalid)?;
        let line = |part: &str| -> Result<u32> {
            part.parse::<u32>()
                .ok()
                .filter(|line| *line > 0)
                .ok_or_else(invalid)
        };
        match body.split_once('-') {
            Some((start, end)) => Ok(Self::new(line(start)?, line(end)?)),
            None => {
                let line = line(body)?;
                Ok(Self::new(line, line))
            }
        }
    }
}

/// Line highlighting extension
pub struct BaseExtension {
    initial: Option<LineRange>,
    highlighted: Arc<Mutex<Option<LineRange>>>,
}

impl BaseExtension {
    /// Currently highlighted lines
    #[must_use]
    pub fn highlighted(&self) -> Option<LineRange> {
        *self.highlighted.lock()
    }
}

impl StaticExtension for BaseExtension {
    const NAME: &'static str = "BaseExtension";

    fn create(options: &SetupOptions) -> Result<Self> {
        let initial = match options.get("highlight") {
            None | Some(Value::Null) => None,
            Some(Value::String(range)) => Some(range.parse()?),
            Some(other) => {
                return Err(EditorError::extension(
                    Self::NAME,
                    format!("highlight must be a string, got {other}"),
                ))
            }
        };
        Ok(Self {
            initial,
            highlighted: Arc::new(Mutex::new(None)),
        })
    }
}

impl Extension for BaseExtension {
    fn provides(&self) -> Api {
        let state = self.highlighted.clone();
        let highlight = move |_: &EditorInstance, args: &[Value]| -> Result<Value> {
            let range: LineRange = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| EditorError::invalid_arguments("highlightLines", "expected a line range string"))?
                .parse()?;
            *state.lock() = Some(range);
            Ok(range.to_json())
        };

        let state = self.highlighted.clone();
        let remove = move |_: &EditorInstance, _: &[Value]| -> Result<Value> {
            state.lock().take();
            Ok(Value::Null)
        };

        let state = self.highlighted.clone();
        let current = move |_: &EditorInstance, _: &[Value]| -> Result<Value> {
            Ok(state.lock().map_or(Value::Null, LineRange::to_json))
        };

        Api::new()
            .with_method("highlightLines", highlight)
            .with_method("removeHighlights", remove)
            .with_method("highlightedLines", current)
    }

    fn on_setup(&self, instance: &EditorInstance, _options: &SetupOptions) -> Result<()> {
        if let Some(range) = self.initial {
            tracing::debug!(instance = instance.id(), %range, "applying initial highlight");
            *self.highlighted.lock() = Some(range);
        }
        Ok(())
    }

    fn on_unuse(&self, _instance: &EditorInstance) -> Result<()> {
        self.highlighted.lock().take();
        Ok(())
    }
}
