//! Memoized context scanning over real documents

use std::fs;
use std::sync::Arc;
use std::thread;

use vuex_engine::{ContextScanner, EntryKind, HelperNames, Invocation};

use crate::common::TestRepo;

const COMPONENT: &str = "src/components/UserCard.vue";

fn component(repo: &TestRepo) -> (String, usize) {
    let text = fs::read_to_string(repo.path().join(COMPONENT)).unwrap();
    let cursor = text.find("'name'").unwrap() + 2;
    (text, cursor)
}

#[test]
fn test_repeated_queries_hit_the_memo() {
    let repo = TestRepo::new();
    repo.with_consumer_component();
    let (text, cursor) = component(&repo);
    let helpers = HelperNames::discover(&text);
    let scanner = ContextScanner::new();

    let first = scanner.get_context(COMPONENT, 1, &text, cursor, &helpers);
    let second = scanner.get_context(COMPONENT, 1, &text, cursor, &helpers);

    let descriptor = first.clone().expect("context");
    assert_eq!(descriptor.kind, EntryKind::State);
    assert_eq!(descriptor.invocation, Invocation::HelperCall);
    assert_eq!(descriptor.explicit_namespace.as_deref(), Some("user"));
    assert_eq!(first, second);
    assert_eq!(scanner.tokenize_count(), 1);
}

#[test]
fn test_new_version_rescans() {
    let repo = TestRepo::new();
    repo.with_consumer_component();
    let (text, cursor) = component(&repo);
    let helpers = HelperNames::discover(&text);
    let scanner = ContextScanner::new();

    scanner.get_context(COMPONENT, 1, &text, cursor, &helpers);
    let edited = text.replacen("mapState('user',", "mapState('account',", 1);
    let moved = cursor + "account".len() - "user".len();
    let result = scanner.get_context(COMPONENT, 2, &edited, moved, &helpers);

    assert_eq!(
        result.and_then(|d| d.explicit_namespace).as_deref(),
        Some("account")
    );
    assert_eq!(scanner.tokenize_count(), 2);
    assert_eq!(scanner.stats().entries, 1);
}

#[test]
fn test_concurrent_readers_share_the_memo() {
    let repo = TestRepo::new();
    repo.with_consumer_component();
    let (text, cursor) = component(&repo);
    let helpers = Arc::new(HelperNames::discover(&text));
    let text = Arc::new(text);
    let scanner = Arc::new(ContextScanner::new());

    // warm the memo so every thread hits it
    scanner.get_context(COMPONENT, 7, &text, cursor, &helpers);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scanner = Arc::clone(&scanner);
            let text = Arc::clone(&text);
            let helpers = Arc::clone(&helpers);
            thread::spawn(move || scanner.get_context(COMPONENT, 7, &text, cursor, &helpers))
        })
        .collect();

    for handle in handles {
        let descriptor = handle.join().unwrap().expect("context");
        assert_eq!(descriptor.kind, EntryKind::State);
    }
    assert_eq!(scanner.tokenize_count(), 1);
}

#[test]
fn test_lookback_limits_the_scan() {
    let repo = TestRepo::new();
    repo.with_consumer_component();
    let (text, cursor) = component(&repo);
    let helpers = HelperNames::discover(&text);

    // the `mapState(` frame starts more than 5 characters before the cursor
    let scanner = ContextScanner::with_limits(5, 16);
    assert_eq!(scanner.get_context(COMPONENT, 1, &text, cursor, &helpers), None);
}
