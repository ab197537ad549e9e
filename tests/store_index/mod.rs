//! Module graph parsing over real workspaces

use std::fs;
use std::sync::Arc;

use vuex_engine::fs_utils::OsFileSystem;
use vuex_engine::parsing::DEFAULT_MAX_FILE_SIZE;
use vuex_engine::{AliasMap, EngineConfig, EntryKind, IncrementalReindexer, ModulePath, PathResolver};

use crate::common::test_repo::STORE_ENTRY;
use crate::common::{assert_entry, assert_no_entry, keys, TestRepo};

#[test]
fn test_standard_store_entries() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let snapshot = repo.index(STORE_ENTRY);
    let store = &snapshot.store;

    assert_entry(store, EntryKind::State, "", "title");
    assert_entry(store, EntryKind::Getter, "", "appTitle");
    assert_entry(store, EntryKind::Mutation, "", "SET_NAME");

    // state declared through a function
    assert_entry(store, EntryKind::State, "user", "name");
    assert_entry(store, EntryKind::State, "user", "age");
    // computed key through an imported constant
    let set_name = assert_entry(store, EntryKind::Mutation, "user", "SET_NAME");
    assert_eq!(set_name.runtime_key(), "user/SET_NAME");
    assert_entry(store, EntryKind::Action, "user", "save");

    // non-namespaced child of a namespaced module inherits its namespace
    let avatar = assert_entry(store, EntryKind::Mutation, "user/profile", "SET_AVATAR");
    assert_eq!(avatar.namespace, ModulePath::parse("user"));
    assert_eq!(avatar.runtime_key(), "user/SET_AVATAR");
    let avatar_state = assert_entry(store, EntryKind::State, "user/profile", "avatar");
    assert_eq!(avatar_state.runtime_key(), "user/profile/avatar");

    // aliased import, shorthand sections, spread of an imported object
    assert_entry(store, EntryKind::State, "cart", "items");
    let add = assert_entry(store, EntryKind::Mutation, "cart", "ADD_ITEM");
    assert_eq!(add.runtime_key(), "ADD_ITEM");
    let checkout = assert_entry(store, EntryKind::Action, "cart", "checkout");
    assert!(checkout.location.file.ends_with("shared-actions.js"));
}

#[test]
fn test_register_module_under_non_namespaced_parent() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let snapshot = repo.index(STORE_ENTRY);

    let code = assert_entry(&snapshot.store, EntryKind::State, "cart/promo", "code");
    assert_eq!(code.namespace, ModulePath::parse("promo"));
    let apply = assert_entry(&snapshot.store, EntryKind::Mutation, "cart/promo", "APPLY");
    assert_eq!(apply.runtime_key(), "promo/APPLY");

    // `cart` is not namespaced, so neither is anything registered in it
    let extra = assert_entry(&snapshot.store, EntryKind::Mutation, "cart/extra", "EXTRA");
    assert_eq!(extra.namespace, ModulePath::root());
    assert_eq!(extra.runtime_key(), "EXTRA");
}

#[test]
fn test_register_module_under_namespaced_parent() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let source = fs::read_to_string(repo.path().join(STORE_ENTRY)).unwrap();
    repo.add_file(
        STORE_ENTRY,
        &source.replace(
            "export default store",
            "store.registerModule(['user', 'prefs'], { mutations: { SET_THEME() {} } })\nexport default store",
        ),
    );
    let snapshot = repo.index(STORE_ENTRY);

    let theme = assert_entry(&snapshot.store, EntryKind::Mutation, "user/prefs", "SET_THEME");
    assert_eq!(theme.runtime_key(), "user/SET_THEME");
}

#[test]
fn test_register_module_with_missing_parent() {
    let repo = TestRepo::new();
    repo.add_file(
        STORE_ENTRY,
        r#"import Vuex from 'vuex'
const store = new Vuex.Store({ state: {} })
store.registerModule(['nested', 'stats'], {
  namespaced: true,
  state: { loaded: true },
  mutations: { INCREMENT() {} },
})
export default store
"#,
    );
    let snapshot = repo.index(STORE_ENTRY);

    let loaded = assert_entry(&snapshot.store, EntryKind::State, "nested/stats", "loaded");
    assert_eq!(loaded.module_path, ModulePath::parse("nested/stats"));
    let increment = assert_entry(&snapshot.store, EntryKind::Mutation, "nested/stats", "INCREMENT");
    assert_eq!(increment.runtime_key(), "stats/INCREMENT");
}

#[test]
fn test_locations_and_documentation() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let snapshot = repo.index(STORE_ENTRY);

    let title = assert_entry(&snapshot.store, EntryKind::State, "", "title");
    assert_eq!(title.location.file, repo.file(STORE_ENTRY));
    assert_eq!(title.location.line, 11);
    assert_eq!(title.location.column, 4);
    assert_eq!(title.documentation.as_deref(), Some("Application title"));
    assert_eq!(title.display_type.as_deref(), Some("string"));

    let name = assert_entry(&snapshot.store, EntryKind::State, "user", "name");
    assert_eq!(name.location.file, repo.file("src/store/modules/user.js"));
}

#[test]
fn test_index_is_deterministic() {
    let repo = TestRepo::new();
    repo.with_standard_store();

    let first = repo.index(STORE_ENTRY);
    let second = repo.index(STORE_ENTRY);
    assert_eq!(first.store, second.store);
    assert_eq!(
        keys(&first.store, EntryKind::Mutation),
        keys(&second.store, EntryKind::Mutation)
    );
}

#[test]
fn test_namespace_for_file() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let snapshot = repo.index(STORE_ENTRY);

    assert_eq!(
        snapshot.namespace_for_file(&repo.file("src/store/modules/user.js")),
        Some(ModulePath::parse("user"))
    );
    assert_eq!(
        snapshot.namespace_for_file(&repo.file("src/store/modules/profile.js")),
        Some(ModulePath::parse("user/profile"))
    );
    assert_eq!(
        snapshot.namespace_for_file(&repo.file(STORE_ENTRY)),
        Some(ModulePath::root())
    );
    assert_eq!(
        snapshot.namespace_for_file(&repo.file("src/store/mutation-types.js")),
        None
    );
}

#[test]
fn test_dependency_graph_edges() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let snapshot = repo.index(STORE_ENTRY);

    let dependents = snapshot
        .graph
        .dependents(&repo.file("src/store/mutation-types.js"));
    assert!(dependents.contains(&repo.file("src/store/modules/user.js")));

    let affected = snapshot.affected_files([&repo.file("src/store/modules/profile.js")]);
    assert!(affected.contains(&repo.file("src/store/modules/user.js")));
    assert!(affected.contains(&repo.file(STORE_ENTRY)));
    assert!(!affected.contains(&repo.file("src/store/modules/cart.js")));
}

#[test]
fn test_oversized_file_contributes_nothing() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let padding = "// padding\n".repeat(400);
    repo.add_file(
        "src/store/modules/cart.js",
        &format!("{}export default {{ state: {{ items: [] }} }}\n", padding),
    );

    let resolver = repo.resolver();
    let snapshot = IncrementalReindexer::new(&resolver, 2_000).full(&repo.path().join(STORE_ENTRY));

    assert_no_entry(&snapshot.store, EntryKind::State, "cart", "items");
    assert_entry(&snapshot.store, EntryKind::State, "user", "name");
}

#[test]
fn test_unparsable_module_is_skipped() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    repo.add_file("src/store/modules/cart.js", "export default { state: {{{ \n");

    let snapshot = repo.index(STORE_ENTRY);
    assert_no_entry(&snapshot.store, EntryKind::State, "cart", "items");
    assert_entry(&snapshot.store, EntryKind::State, "user", "name");
}

#[test]
fn test_missing_module_file_is_skipped() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    fs::remove_file(repo.path().join("src/store/modules/profile.js")).unwrap();

    let snapshot = repo.index(STORE_ENTRY);
    assert_no_entry(&snapshot.store, EntryKind::State, "user/profile", "avatar");
    assert_entry(&snapshot.store, EntryKind::State, "user", "name");
}

#[test]
fn test_cyclic_modules_terminate() {
    let repo = TestRepo::new();
    repo.add_file(
        "store.js",
        "import a from './a'\nexport default createStore({ modules: { a } })\n",
    )
    .add_file(
        "a.js",
        "import b from './b'\nexport default { state: { fromA: 1 }, modules: { b } }\n",
    )
    .add_file(
        "b.js",
        "import a from './a'\nexport default { state: { fromB: 2 }, modules: { a } }\n",
    );

    let snapshot = repo.index("store.js");
    assert_entry(&snapshot.store, EntryKind::State, "a", "fromA");
    assert_entry(&snapshot.store, EntryKind::State, "a/b", "fromB");
    assert_no_entry(&snapshot.store, EntryKind::State, "a/b/a", "fromA");
}

#[test]
fn test_commonjs_store() {
    let repo = TestRepo::new();
    repo.add_file(
        "store/index.js",
        "const Vuex = require('vuex')\nconst user = require('./user')\nmodule.exports = new Vuex.Store({ modules: { user } })\n",
    )
    .add_file(
        "store/user.js",
        "module.exports = { namespaced: true, actions: { load() {} } }\n",
    );

    let snapshot = repo.index("store/index.js");
    let load = assert_entry(&snapshot.store, EntryKind::Action, "user", "load");
    assert_eq!(load.runtime_key(), "user/load");
}

#[test]
fn test_typescript_store_and_vue_module() {
    let repo = TestRepo::new();
    repo.add_file(
        "src/store/index.ts",
        r#"import { createStore } from 'vuex'
import counter from './counter.vue'

interface RootState {
  ready: boolean
}

export default createStore<RootState>({
  state: { ready: false } as RootState,
  modules: { counter },
})
"#,
    )
    .add_file(
        "src/store/counter.vue",
        "<template><div/></template>\n<script>\nexport default { namespaced: true, state: () => ({ count: 0 }) }\n</script>\n",
    );

    let snapshot = repo.index("src/store/index.ts");
    assert_entry(&snapshot.store, EntryKind::State, "", "ready");
    let count = assert_entry(&snapshot.store, EntryKind::State, "counter", "count");
    assert_eq!(count.location.line, 3);
}

#[test]
fn test_resolver_stays_inside_root() {
    let repo = TestRepo::new();
    repo.add_file(
        "app/store.js",
        "import outside from '../shared/outside'\nexport default { modules: { outside } }\n",
    )
    .add_file(
        "shared/outside.js",
        "export default { state: { leaked: true } }\n",
    );

    let resolver = PathResolver::new(
        &repo.path().join("app"),
        AliasMap::new(),
        Arc::new(OsFileSystem),
    );
    let from = repo.file("app/store.js");
    assert_eq!(resolver.resolve("../shared/outside", &from), None);

    let snapshot =
        IncrementalReindexer::new(&resolver, DEFAULT_MAX_FILE_SIZE).full(&repo.path().join("app/store.js"));
    assert!(snapshot.store.is_empty());
}

#[test]
fn test_project_config_aliases() {
    let repo = TestRepo::new();
    repo.add_file(
        "tsconfig.json",
        r#"{
  // comments and trailing commas are accepted
  "compilerOptions": { "baseUrl": ".", "paths": { "~/*": ["src/*"], }, },
}"#,
    )
    .add_file(
        "src/store/index.js",
        "import user from '~/modules/user'\nexport default createStore({ modules: { user } })\n",
    )
    .add_file(
        "src/modules/user.js",
        "export default { getters: { isAdmin: () => false } }\n",
    );

    let aliases = EngineConfig::default().alias_map(repo.path());
    let resolver = repo.resolver_with(aliases);
    let snapshot = IncrementalReindexer::new(&resolver, DEFAULT_MAX_FILE_SIZE)
        .full(&repo.path().join("src/store/index.js"));

    let getter = assert_entry(&snapshot.store, EntryKind::Getter, "user", "isAdmin");
    assert_eq!(getter.runtime_key(), "isAdmin");
    assert_eq!(getter.location.file, repo.file("src/modules/user.js"));
}

#[test]
fn test_json_section_import() {
    let repo = TestRepo::new();
    repo.add_file(
        "store.js",
        "import defaults from './defaults.json'\nexport default createStore({ state: defaults })\n",
    )
    .add_file("defaults.json", "{ \"theme\": \"dark\", \"size\": 12 }\n");

    let snapshot = repo.index("store.js");
    let theme = assert_entry(&snapshot.store, EntryKind::State, "", "theme");
    assert_eq!(theme.display_type.as_deref(), Some("string"));
    let size = assert_entry(&snapshot.store, EntryKind::State, "", "size");
    assert_eq!(size.display_type.as_deref(), Some("number"));
    assert_eq!(theme.location.file, repo.file("defaults.json"));
}
