//! Incremental re-indexing against a full pass over the same files

use std::path::PathBuf;

use vuex_engine::parsing::DEFAULT_MAX_FILE_SIZE;
use vuex_engine::{EntryKind, IncrementalReindexer, IndexSnapshot};

use crate::common::test_repo::STORE_ENTRY;
use crate::common::{assert_entry, assert_no_entry, TestRepo};

fn reindex(repo: &TestRepo, previous: &IndexSnapshot, changed: &[PathBuf]) -> IndexSnapshot {
    let resolver = repo.resolver();
    IncrementalReindexer::new(&resolver, DEFAULT_MAX_FILE_SIZE)
        .reindex(previous, changed)
        .expect("reindex")
}

#[test]
fn test_empty_change_set_reproduces_previous() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let full = repo.index(STORE_ENTRY);

    let incremental = reindex(&repo, &full, &[]);
    assert_eq!(incremental.store, full.store);
    assert_eq!(incremental.graph, full.graph);
    assert_eq!(incremental.stats.files_parsed, 0);
    assert!(incremental.stats.visits_reused > 0);
}

#[test]
fn test_changed_module_matches_full_pass() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let before = repo.index(STORE_ENTRY);

    repo.add_file(
        "src/store/modules/profile.js",
        "export default {\n  state: { avatar: null, bio: '' },\n  mutations: {},\n}\n",
    );
    let changed = [repo.file("src/store/modules/profile.js")];
    let incremental = reindex(&repo, &before, &changed);
    let full = repo.index(STORE_ENTRY);

    assert_eq!(incremental.store, full.store);
    assert_entry(&incremental.store, EntryKind::State, "user/profile", "bio");
    assert_no_entry(&incremental.store, EntryKind::Mutation, "user/profile", "SET_AVATAR");
}

#[test]
fn test_unaffected_entries_are_unchanged() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let before = repo.index(STORE_ENTRY);

    repo.add_file(
        "src/store/modules/profile.js",
        "export default { state: { avatar: 'none' } }\n",
    );
    let after = reindex(&repo, &before, &[repo.file("src/store/modules/profile.js")]);

    let cart = |snapshot: &IndexSnapshot| {
        snapshot
            .store
            .iter()
            .filter(|e| e.module_path.segments().first().map(String::as_str) == Some("cart"))
            .cloned()
            .collect::<Vec<_>>()
    };
    assert!(!cart(&before).is_empty());
    assert_eq!(cart(&before), cart(&after));
}

#[test]
fn test_change_in_imported_constant_propagates() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let before = repo.index(STORE_ENTRY);

    let affected = IncrementalReindexer::new(&repo.resolver(), DEFAULT_MAX_FILE_SIZE)
        .affected_files(&before, &[repo.file("src/store/mutation-types.js")]);
    assert!(affected.contains(&repo.file("src/store/modules/user.js")));
    assert!(affected.contains(&repo.file(STORE_ENTRY)));

    repo.add_file(
        "src/store/mutation-types.js",
        "export const SET_NAME = 'SET_USER_NAME'\n",
    );
    let after = reindex(&repo, &before, &[repo.file("src/store/mutation-types.js")]);

    assert_entry(&after.store, EntryKind::Mutation, "user", "SET_USER_NAME");
    assert_no_entry(&after.store, EntryKind::Mutation, "user", "SET_NAME");
    // the root mutation is declared literally
    assert_entry(&after.store, EntryKind::Mutation, "", "SET_NAME");
}

#[test]
fn test_removed_module_file() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let before = repo.index(STORE_ENTRY);

    let removed = repo.remove_file("src/store/modules/profile.js");
    let after = reindex(&repo, &before, &[removed]);

    assert_no_entry(&after.store, EntryKind::State, "user/profile", "avatar");
    assert_entry(&after.store, EntryKind::State, "user", "name");
    assert_eq!(after.store, repo.index(STORE_ENTRY).store);
}

#[test]
fn test_file_no_longer_reached_contributes_nothing() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let before = repo.index(STORE_ENTRY);

    repo.add_file(
        "src/store/modules/user.js",
        "export default { namespaced: true, state: () => ({ name: '' }) }\n",
    );
    let after = reindex(&repo, &before, &[repo.file("src/store/modules/user.js")]);

    assert_no_entry(&after.store, EntryKind::State, "user/profile", "avatar");
    assert_no_entry(&after.store, EntryKind::Action, "user", "save");
    assert!(after
        .store
        .entries_in_file(&repo.file("src/store/modules/profile.js"))
        .next()
        .is_none());
}

#[test]
fn test_created_file_satisfies_unresolved_import() {
    let repo = TestRepo::new();
    repo.add_file(
        "store.js",
        "import settings from './settings'\nexport default createStore({ modules: { settings } })\n",
    );
    let before = repo.index("store.js");
    assert!(before.store.is_empty());

    repo.add_file(
        "settings.js",
        "export default { state: { theme: 'dark' } }\n",
    );
    let after = reindex(&repo, &before, &[repo.file("settings.js")]);

    assert_entry(&after.store, EntryKind::State, "settings", "theme");
    assert_eq!(after.store, repo.index("store.js").store);
}

#[test]
fn test_registered_module_change() {
    let repo = TestRepo::new();
    repo.add_file(
        "store.js",
        "import Vuex from 'vuex'\nimport stats from './stats'\nconst store = new Vuex.Store({})\nstore.registerModule('stats', stats)\nexport default store\n",
    )
    .add_file("stats.js", "export default { namespaced: true, actions: { track() {} } }\n");
    let before = repo.index("store.js");
    let track = assert_entry(&before.store, EntryKind::Action, "stats", "track");
    assert_eq!(track.runtime_key(), "stats/track");

    repo.add_file("stats.js", "export default { actions: { track() {}, flush() {} } }\n");
    let after = reindex(&repo, &before, &[repo.file("stats.js")]);

    let flush = assert_entry(&after.store, EntryKind::Action, "stats", "flush");
    assert_eq!(flush.runtime_key(), "flush");
    assert_eq!(after.store, repo.index("store.js").store);
}

#[test]
fn test_parent_namespacing_change_requalifies_registrations() {
    let repo = TestRepo::new();
    repo.add_file(
        "store.js",
        "import Vuex from 'vuex'\nimport a from './a'\nimport b from './b'\nexport default new Vuex.Store({ modules: { a, b } })\n",
    )
    .add_file("a.js", "export default { state: { open: false } }\n")
    .add_file(
        "b.js",
        "export default { state: {} }\nexport function install(store) {\n  store.registerModule(['a', 'x'], { mutations: { X() {} } })\n}\n",
    );
    let before = repo.index("store.js");
    let x = assert_entry(&before.store, EntryKind::Mutation, "a/x", "X");
    assert_eq!(x.runtime_key(), "X");

    // b.js does not depend on a.js, yet what it registers moves
    repo.add_file("a.js", "export default { namespaced: true, state: { open: false } }\n");
    let after = reindex(&repo, &before, &[repo.file("a.js")]);

    let x = assert_entry(&after.store, EntryKind::Mutation, "a/x", "X");
    assert_eq!(x.runtime_key(), "a/X");
    assert_eq!(after.store, repo.index("store.js").store);
}

#[test]
fn test_reindex_without_previous_pass_fails() {
    let repo = TestRepo::new();
    let resolver = repo.resolver();
    let result = IncrementalReindexer::new(&resolver, DEFAULT_MAX_FILE_SIZE)
        .reindex(&IndexSnapshot::empty(), &[]);
    assert!(result.is_err());
}
