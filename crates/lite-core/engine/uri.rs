//! File-path addressable model identity
//!
//! Models are keyed by a URI-like path made of a fixed namespace prefix, an
//! optional caller supplied global id and the file path, e.g.
//! `/lite/snippet_777/app/models/user.rb`.

use core::fmt;

/// Namespace prefix for every model URI created by the editor
pub const URI_PREFIX: &str = "lite";

/// Identity of a text model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelUri {
    uri: String,
    path: String,
}

impl ModelUri {
    /// Build a model URI from an optional global id and a file path
    pub fn new(global_id: Option<&str>, path: &str) -> Self {
        Self::with_prefix(URI_PREFIX, global_id, path)
    }

    /// Build a model URI under a custom namespace prefix
    pub fn with_prefix(prefix: &str, global_id: Option<&str>, path: &str) -> Self {
        let uri = join_paths(&["/", prefix, global_id.unwrap_or_default(), path]);
        Self {
            uri,
            path: path.to_string(),
        }
    }

    /// Full URI string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// File path the URI was built from
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Join path segments with single slashes, skipping empty segments
fn join_paths(segments: &[&str]) -> String {
    let mut joined = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        let trimmed = if index == 0 {
            segment.trim_end_matches('/')
        } else {
            segment.trim_matches('/')
        };
        if trimmed.is_empty() && index != 0 {
            continue;
        }
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(trimmed);
    }
    if joined.is_empty() {
        joined.push('/');
    }
    joined
}
