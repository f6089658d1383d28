//! Property-based tests for lite-core
//!
//! Language resolution and model URIs are pure functions of their inputs;
//! proptest checks that across generated paths.

use lite_core::{resolve_language, LanguageTable, ModelUri, PLAINTEXT};
use proptest::prelude::*;

/// Generate a relative file path
fn arb_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec("[a-z_]{1,8}", 0..4),
        "[a-zA-Z_-]{1,10}",
        prop_oneof![
            Just(String::new()),
            Just(".rb".to_string()),
            Just(".JS".to_string()),
            Just(".md".to_string()),
            "\\.[a-z]{1,6}",
        ],
    )
        .prop_map(|(dirs, stem, extension)| {
            let mut path = dirs.join("/");
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&stem);
            path.push_str(&extension);
            path
        })
}

proptest! {
    #[test]
    fn language_depends_only_on_the_path(path in arb_path()) {
        let table = LanguageTable::builtin();
        let first = resolve_language(&path, &table);
        let fresh_table = LanguageTable::builtin();
        let second = resolve_language(&path, &fresh_table);
        prop_assert_eq!(first, second);
        prop_assert!(first == PLAINTEXT || table.get(first).is_some());
    }

    #[test]
    fn directories_do_not_change_the_language(
        path in arb_path(),
        dir in "[a-z]{1,6}(\\.[a-z]{1,3})?",
    ) {
        let table = LanguageTable::builtin();
        let nested = format!("{dir}/{path}");
        prop_assert_eq!(resolve_language(&path, &table), resolve_language(&nested, &table));
    }

    #[test]
    fn uri_has_no_duplicate_slashes(
        id in prop::option::of("/?[a-z0-9_]{0,8}/?"),
        path in arb_path(),
    ) {
        let uri = ModelUri::new(id.as_deref(), &path);
        prop_assert!(uri.as_str().starts_with("/lite"));
        prop_assert!(!uri.as_str().contains("//"));
        prop_assert!(uri.as_str().ends_with(path.as_str()));
    }
}
