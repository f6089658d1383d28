//! Language table and path-based language resolution
//!
//! Resolution is a pure function of the path string and the table: the file
//! name's extension (everything after the last `.`) is matched
//! case-insensitively against each language's registered extensions. Paths
//! without a match resolve to [`PLAINTEXT`].

use serde::{Deserialize, Serialize};

/// Language id used when nothing else matches
pub const PLAINTEXT: &str = "plaintext";

/// A registered language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Language id (e.g. "javascript")
    pub id: String,
    /// File extensions including the leading dot (e.g. ".js")
    pub extensions: Vec<String>,
    /// Alternative display names
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Language {
    /// Create a language with its file extensions
    pub fn new(id: &str, extensions: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            extensions: extensions.iter().map(|ext| (*ext).to_string()).collect(),
            aliases: Vec::new(),
        }
    }

    /// Add a display alias
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Check if this language claims the given extension (leading dot optional)
    #[must_use]
    pub fn matches_extension(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

/// Ordered set of registered languages
///
/// Earlier registrations win when two languages claim the same extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTable {
    languages: Vec<Language>,
}

impl LanguageTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the languages the editor ships highlighting for
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for language in [
            Language::new(PLAINTEXT, &[".txt"]).with_alias("Plain Text"),
            Language::new("markdown", &[".md", ".markdown", ".mdown"]).with_alias("Markdown"),
            Language::new("javascript", &[".js", ".mjs", ".cjs", ".jsx"]).with_alias("JavaScript"),
            Language::new("typescript", &[".ts", ".tsx"]).with_alias("TypeScript"),
            Language::new("json", &[".json"]).with_alias("JSON"),
            Language::new("yaml", &[".yml", ".yaml"]).with_alias("YAML"),
            Language::new("ruby", &[".rb", ".rake", ".gemspec"]).with_alias("Ruby"),
            Language::new("rust", &[".rs"]).with_alias("Rust"),
            Language::new("python", &[".py"]).with_alias("Python"),
            Language::new("go", &[".go"]).with_alias("Go"),
            Language::new("html", &[".html", ".htm"]).with_alias("HTML"),
            Language::new("css", &[".css"]).with_alias("CSS"),
            Language::new("scss", &[".scss"]).with_alias("SCSS"),
            Language::new("shell", &[".sh", ".bash"]).with_alias("Shell"),
            Language::new("vue", &[".vue"]).with_alias("Vue"),
            Language::new("toml", &[".toml"]).with_alias("TOML"),
            Language::new("hcl", &[".tf", ".hcl"]).with_alias("Terraform"),
        ] {
            table.register(language);
        }
        table
    }

    /// Register a language; re-registering an id replaces its extensions in place
    pub fn register(&mut self, language: Language) {
        if let Some(existing) = self.languages.iter_mut().find(|l| l.id == language.id) {
            *existing = language;
        } else {
            self.languages.push(language);
        }
    }

    /// Look up a language by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Language> {
        self.languages.iter().find(|language| language.id == id)
    }

    /// All registered languages in registration order
    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Number of registered languages
    #[must_use]
    pub fn len(&self) -> usize {
        self.languages.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Resolve the language id for a file path
///
/// ```
/// use lite_core::languages::{resolve_language, LanguageTable};
///
/// let table = LanguageTable::builtin();
/// assert_eq!(resolve_language("app/assets/main.JS", &table), "javascript");
/// assert_eq!(resolve_language("Makefile", &table), "plaintext");
/// ```
#[must_use]
pub fn resolve_language<'a>(path: &str, table: &'a LanguageTable) -> &'a str {
    file_extension(path)
        .and_then(|extension| {
            table
                .languages()
                .iter()
                .find(|language| language.matches_extension(extension))
        })
        .map_or(PLAINTEXT, |language| language.id.as_str())
}

/// Extension of the last path segment, without the dot
fn file_extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit(['/', '\\']).next()?;
    let (stem, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() || (stem.is_empty() && !file_name[1..].contains('.')) {
        // ".gitignore" style dotfiles have no extension
        return None;
    }
    Some(extension)
}
