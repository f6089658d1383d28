//! Syntax highlighting themes
//!
//! A static theme table keyed by name plus the selection rule applied when a
//! facade starts: the user's color scheme is used when the table knows it,
//! otherwise the default theme is activated without being (re)defined.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Theme used when the user has no (supported) preference
pub const DEFAULT_THEME: &str = "white";

/// A named theme definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Theme name, also the user color scheme key
    pub name: String,
    /// Engine-specific theme data
    pub data: Value,
}

impl Theme {
    /// Create a theme
    pub fn new(name: &str, data: Value) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }
}

/// Outcome of theme selection
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSelection<'a> {
    /// Theme to define with the engine before activation, if any
    pub define: Option<&'a Theme>,
    /// Name of the theme to activate
    pub activate: &'a str,
}

/// Table of known themes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeTable {
    themes: Vec<Theme>,
}

impl ThemeTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Themes shipped with the editor
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (name, base, background) in [
            (DEFAULT_THEME, "vs", "#ffffff"),
            ("dark", "vs-dark", "#1f1f1f"),
            ("monokai", "vs-dark", "#272822"),
            ("solarized-light", "vs", "#fdf6e3"),
            ("solarized-dark", "vs-dark", "#002b36"),
            ("none", "vs", "#ffffff"),
        ] {
            table.register(Theme::new(
                name,
                json!({
                    "base": base,
                    "inherit": true,
                    "rules": [],
                    "colors": { "editor.background": background },
                }),
            ));
        }
        table
    }

    /// Register or replace a theme
    pub fn register(&mut self, theme: Theme) {
        if let Some(existing) = self.themes.iter_mut().find(|t| t.name == theme.name) {
            *existing = theme;
        } else {
            self.themes.push(theme);
        }
    }

    /// Look up a theme by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.iter().find(|theme| theme.name == name)
    }

    /// All themes in registration order
    #[must_use]
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// Pick the theme for a user color scheme
    ///
    /// ```
    /// use lite_core::themes::{ThemeTable, DEFAULT_THEME};
    ///
    /// let table = ThemeTable::builtin();
    /// let selection = table.select(Some("non-existent-theme"));
    /// assert!(selection.define.is_none());
    /// assert_eq!(selection.activate, DEFAULT_THEME);
    /// ```
    #[must_use]
    pub fn select<'a>(&'a self, color_scheme: Option<&'a str>) -> ThemeSelection<'a> {
        let wanted = color_scheme.unwrap_or(DEFAULT_THEME);
        match self.get(wanted) {
            Some(theme) => ThemeSelection {
                define: Some(theme),
                activate: theme.name.as_str(),
            },
            None => ThemeSelection {
                define: None,
                activate: DEFAULT_THEME,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_default_theme_without_preference() {
        let table = ThemeTable::builtin();
        let selection = table.select(None);
        assert_eq!(selection.activate, DEFAULT_THEME);
        assert_eq!(selection.define.map(|t| t.name.as_str()), Some(DEFAULT_THEME));
    }

    #[test]
    fn selects_user_preference_when_supported() {
        let table = ThemeTable::builtin();
        let selection = table.select(Some("monokai"));
        assert_eq!(selection.activate, "monokai");
        assert_eq!(
            selection.define.map(|t| &t.data["base"]),
            Some(&json!("vs-dark"))
        );
    }

    #[test]
    fn unsupported_preference_falls_back_without_define() {
        let table = ThemeTable::builtin();
        let selection = table.select(Some("non-existent-theme"));
        assert!(selection.define.is_none());
        assert_eq!(selection.activate, DEFAULT_THEME);
    }
}
