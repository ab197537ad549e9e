//! CLI binary tests
//!
//! Each test runs the built `vuex-engine` binary inside a temporary
//! workspace with no configuration file.

use std::fs;

use crate::common::test_repo::STORE_ENTRY;
use crate::common::{assert_valid_json, TestRepo};

const COMPONENT: &str = "src/components/UserCard.vue";

fn repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.with_standard_store().with_consumer_component();
    repo
}

/// `@/*` is not configured for the binary; give it the project file
fn with_jsconfig(repo: &TestRepo) {
    repo.add_file(
        "jsconfig.json",
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
    );
}

#[test]
fn test_index_text_output() {
    let repo = repo();
    with_jsconfig(&repo);
    let output = repo.run_cli_success(&["index", STORE_ENTRY]);

    assert!(output.contains("STORE INDEX"));
    assert!(output.contains("generation: 1"));
    assert!(output.contains("user/SET_NAME"));
    assert!(output.contains("src/store/modules/cart.js"));
}

#[test]
fn test_index_json_with_kind_filter() {
    let repo = repo();
    with_jsconfig(&repo);
    let output = repo.run_cli_success(&["index", STORE_ENTRY, "--kind", "action", "-f", "json"]);
    let json = assert_valid_json(&output);

    assert_eq!(json["generation"], 1);
    let entries = json["entries"].as_array().expect("entries array");
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e["kind"] == "action"));
    assert!(entries.iter().any(|e| e["name"] == "checkout"));
}

#[test]
fn test_index_with_changed_files() {
    let repo = repo();
    let output = repo.run_cli_success(&[
        "index",
        STORE_ENTRY,
        "--changed",
        "src/store/modules/user.js",
        "-f",
        "json",
    ]);
    let json = assert_valid_json(&output);
    assert_eq!(json["generation"], 2);
    assert!(json["visits_reused"].as_u64().unwrap() > 0);
}

#[test]
fn test_find_with_namespace() {
    let repo = repo();
    let output = repo.run_cli_success(&[
        "find",
        STORE_ENTRY,
        "SET_NAME",
        "--kind",
        "mutation",
        "--namespace",
        "user",
        "-f",
        "json",
    ]);
    let json = assert_valid_json(&output);
    assert_eq!(json["found"]["module_path"], serde_json::json!(["user"]));
}

#[test]
fn test_find_miss_is_not_an_error() {
    let repo = repo();
    let output = repo.run_cli_success(&["find", STORE_ENTRY, "NOPE", "--kind", "action"]);
    assert!(output.contains("no action named NOPE"));
}

#[test]
fn test_resolve_commit_in_component() {
    let repo = repo();
    let text = fs::read_to_string(repo.path().join(COMPONENT)).unwrap();
    let offset = text.find("user/SET_NAME").unwrap() + 7;

    let output = repo.run_cli_success(&[
        "resolve",
        STORE_ENTRY,
        COMPONENT,
        "--offset",
        &offset.to_string(),
    ]);
    assert!(output.contains("user/SET_NAME"), "{}", output);
    assert!(output.contains("src/store/modules/user.js"), "{}", output);
}

#[test]
fn test_context_by_line_and_column() {
    let repo = repo();
    let text = fs::read_to_string(repo.path().join(COMPONENT)).unwrap();
    let (index, line) = text
        .lines()
        .enumerate()
        .find(|(_, line)| line.contains("mapState('user'"))
        .unwrap();
    let column = line.find("'name'").unwrap() + 2;

    let output = repo.run_cli_success(&[
        "context",
        COMPONENT,
        "--line",
        &(index + 1).to_string(),
        "--column",
        &column.to_string(),
        "-f",
        "json",
    ]);
    let json = assert_valid_json(&output);
    assert_eq!(json["context"]["kind"], "state");
    assert_eq!(json["context"]["invocation"], "helper_call");
    assert_eq!(json["context"]["explicit_namespace"], "user");
    assert_eq!(json["root_option"], false);
}

#[test]
fn test_missing_entry_exit_code() {
    let repo = repo();
    let (_, stderr, code) = repo.run_cli_failure(&["index", "src/store/missing.js"]);
    assert!(stderr.contains("missing.js"));
    assert_eq!(code, Some(1));
}

#[test]
fn test_invalid_config_exit_code() {
    let repo = repo();
    repo.add_file("bad.toml", "[logging]\nlevel = \"loud\"\n");
    let (_, stderr, code) = repo.run_cli_failure(&["--config", "bad.toml", "config"]);
    assert!(stderr.contains("Invalid log level"));
    assert_eq!(code, Some(6));
}

#[test]
fn test_config_shows_defaults() {
    let repo = repo();
    let output = repo.run_cli_success(&["config"]);
    assert!(output.contains("[scanner]"));
    assert!(output.contains("lookback = 2000"));
}
