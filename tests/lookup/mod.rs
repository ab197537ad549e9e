//! Cursor context + lookup against a real index

use std::fs;

use vuex_engine::{
    detect_root_option, find_item, scan_context, Entry, EntryKind, HelperNames, IndexSnapshot,
    LookupQuery, ModulePath,
};

use crate::common::test_repo::STORE_ENTRY;
use crate::common::TestRepo;

/// Resolve the symbol at the first `|` of `marked`, as typed in `file`
fn resolve_at<'s>(snapshot: &'s IndexSnapshot, repo: &TestRepo, file: &str, marked: &str) -> Option<&'s Entry> {
    let cursor = marked.find('|').expect("cursor marker");
    let text = marked.replacen('|', "", 1);

    let helpers = HelperNames::discover(&text);
    let descriptor = scan_context(&text, cursor, &helpers)?;
    let name_start = text[..cursor]
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '/'))
        .map_or(0, |i| i + 1);
    let name_end = text[cursor..]
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '/'))
        .map_or(text.len(), |i| cursor + i);

    let current = snapshot.namespace_for_file(&repo.file(file));
    let query = LookupQuery::from_context(
        &descriptor,
        &text[name_start..name_end],
        current,
        detect_root_option(&text, cursor),
    );
    find_item(&snapshot.store, &query)
}

fn at(entry: Option<&Entry>) -> Option<String> {
    entry.map(|e| format!("{}:{}", e.module_path, e.name))
}

fn indexed_repo() -> (TestRepo, IndexSnapshot) {
    let repo = TestRepo::new();
    repo.with_standard_store().with_consumer_component();
    let snapshot = repo.index(STORE_ENTRY);
    (repo, snapshot)
}

const COMPONENT: &str = "src/components/UserCard.vue";
const USER_MODULE: &str = "src/store/modules/user.js";

#[test]
fn test_helper_with_namespace_argument() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(&snapshot, &repo, COMPONENT, "...mapState('user', ['na|me'])");
    assert_eq!(at(found), Some("user:name".to_string()));
}

#[test]
fn test_aliased_helper_resolves_root_mutation() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(
        &snapshot,
        &repo,
        COMPONENT,
        "import { mapMutations as mm } from 'vuex'\n...mm(['SET_|NAME'])",
    );
    assert_eq!(at(found), Some(":SET_NAME".to_string()));
}

#[test]
fn test_qualified_commit_from_component() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(
        &snapshot,
        &repo,
        COMPONENT,
        "this.$store.commit('user/SET_|NAME', 'x')",
    );
    assert_eq!(at(found), Some("user:SET_NAME".to_string()));
}

#[test]
fn test_commit_inside_namespaced_module_prefers_local() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(
        &snapshot,
        &repo,
        USER_MODULE,
        "save({ commit }, name) { commit('SET_|NAME', name) }",
    );
    assert_eq!(at(found), Some("user:SET_NAME".to_string()));
}

#[test]
fn test_root_option_skips_local_module() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(
        &snapshot,
        &repo,
        USER_MODULE,
        "save({ commit }, name) { commit('SET_|NAME', name, { root: true }) }",
    );
    assert_eq!(at(found), Some(":SET_NAME".to_string()));
}

#[test]
fn test_commit_in_child_module_uses_structural_path() {
    let (repo, snapshot) = indexed_repo();
    // profile is not namespaced; its mutations live in the `user` namespace
    let found = resolve_at(
        &snapshot,
        &repo,
        "src/store/modules/profile.js",
        "commit('SET_|AVATAR', a)",
    );
    assert_eq!(at(found), Some("user/profile:SET_AVATAR".to_string()));
}

#[test]
fn test_dotted_state_access() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(&snapshot, &repo, COMPONENT, "this.$store.state.user.na|me");
    assert_eq!(at(found), Some("user:name".to_string()));
}

#[test]
fn test_getters_bracket_access() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(&snapshot, &repo, COMPONENT, "this.$store.getters['user/display|Name']");
    assert_eq!(at(found), Some("user:displayName".to_string()));
}

#[test]
fn test_dispatch_to_non_namespaced_action() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(&snapshot, &repo, COMPONENT, "this.$store.dispatch('check|out')");
    assert_eq!(at(found), Some("cart:checkout".to_string()));
}

#[test]
fn test_namespaced_symbol_needs_qualification() {
    let (repo, snapshot) = indexed_repo();
    let found = resolve_at(&snapshot, &repo, COMPONENT, "this.$store.dispatch('sa|ve')");
    assert_eq!(found, None);
    let found = resolve_at(&snapshot, &repo, COMPONENT, "this.$store.dispatch('user/sa|ve')");
    assert_eq!(at(found), Some("user:save".to_string()));
}

#[test]
fn test_registered_module_lookup() {
    let (_repo, snapshot) = indexed_repo();
    let query = LookupQuery::new("promo/APPLY", EntryKind::Mutation);
    let found = find_item(&snapshot.store, &query);
    assert_eq!(at(found), Some("cart/promo:APPLY".to_string()));

    // registered under the non-namespaced `cart`: a bare root key
    let query = LookupQuery::new("EXTRA", EntryKind::Mutation).allow_root_fallback(true);
    assert_eq!(
        at(find_item(&snapshot.store, &query)),
        Some("cart/extra:EXTRA".to_string())
    );

    let query = LookupQuery::new("code", EntryKind::State)
        .with_current_namespace(ModulePath::parse("cart/promo"))
        .prefer_local(true);
    assert_eq!(
        at(find_item(&snapshot.store, &query)),
        Some("cart/promo:code".to_string())
    );
}

#[test]
fn test_component_file_is_not_a_module() {
    let (repo, snapshot) = indexed_repo();
    let text = fs::read_to_string(repo.path().join(COMPONENT)).unwrap();
    assert!(text.contains("mapState"));
    assert_eq!(snapshot.namespace_for_file(&repo.file(COMPONENT)), None);
}
