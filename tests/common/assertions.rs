//! Custom assertions over store maps and CLI output

use vuex_engine::{Entry, EntryKind, StoreMap};

/// Find the entry of `kind` named `name` at structural path `path`
pub fn find_entry<'s>(store: &'s StoreMap, kind: EntryKind, path: &str, name: &str) -> Option<&'s Entry> {
    store
        .entries(kind)
        .iter()
        .find(|entry| entry.name == name && entry.module_path.to_string() == path)
}

/// Assert an entry exists and return it
pub fn assert_entry<'s>(store: &'s StoreMap, kind: EntryKind, path: &str, name: &str) -> &'s Entry {
    find_entry(store, kind, path, name).unwrap_or_else(|| {
        let known: Vec<String> = store
            .entries(kind)
            .iter()
            .map(|e| format!("{}:{}", e.module_path, e.name))
            .collect();
        panic!(
            "expected {} '{}' at '{}', store has {:?}",
            kind, name, path, known
        )
    })
}

pub fn assert_no_entry(store: &StoreMap, kind: EntryKind, path: &str, name: &str) {
    assert!(
        find_entry(store, kind, path, name).is_none(),
        "unexpected {} '{}' at '{}'",
        kind,
        name,
        path
    );
}

/// Entries of `kind` as `path:name` strings, in store order
pub fn keys(store: &StoreMap, kind: EntryKind) -> Vec<String> {
    store
        .entries(kind)
        .iter()
        .map(|e| format!("{}:{}", e.module_path, e.name))
        .collect()
}

/// Assert the output is valid JSON and return it
pub fn assert_valid_json(output: &str) -> serde_json::Value {
    serde_json::from_str(output)
        .unwrap_or_else(|e| panic!("invalid JSON ({}):\n{}", e, output))
}
