//! Single-flight indexing over a real workspace

use std::sync::Arc;

use vuex_engine::{EntryKind, IndexOutcome, ModuleGraphAnalyzer, StoreIndexer};

use crate::common::test_repo::STORE_ENTRY;
use crate::common::{assert_entry, TestRepo};

fn indexer(repo: &TestRepo) -> StoreIndexer<ModuleGraphAnalyzer> {
    StoreIndexer::new(ModuleGraphAnalyzer::new(
        repo.path().join(STORE_ENTRY),
        repo.resolver(),
    ))
}

#[tokio::test]
async fn test_first_pass_publishes_generation_one() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let indexer = indexer(&repo);
    assert_eq!(indexer.state().generation(), 0);

    let outcome = indexer.index().await;
    assert_eq!(outcome, IndexOutcome::Completed { passes: 1 });

    let snapshot = indexer.snapshot();
    assert_eq!(snapshot.generation, 1);
    assert_entry(&snapshot.store, EntryKind::State, "user", "name");
    assert_eq!(indexer.state().entry(), Some(repo.file(STORE_ENTRY)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_coalesce() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let indexer = Arc::new(indexer(&repo));

    let calls: Vec<_> = (0..6)
        .map(|_| {
            let indexer = Arc::clone(&indexer);
            tokio::spawn(async move { indexer.index().await })
        })
        .collect();

    let mut passes = 0;
    for call in calls {
        if let IndexOutcome::Completed { passes: n } = call.await.unwrap() {
            passes += n;
        }
    }

    // every request ran or was folded into a pass that ran
    assert!(passes >= 1);
    assert!(passes <= 6);
    assert_eq!(indexer.state().generation(), passes as u64);
    assert_eq!(indexer.snapshot().store, repo.index(STORE_ENTRY).store);
}

#[tokio::test]
async fn test_incremental_request_after_edit() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let indexer = indexer(&repo);
    indexer.index().await;

    repo.add_file(
        "src/store/modules/profile.js",
        "export default { state: { avatar: null, theme: 'light' } }\n",
    );
    indexer
        .index_changed([repo.file("src/store/modules/profile.js")])
        .await;

    let snapshot = indexer.snapshot();
    assert_eq!(snapshot.generation, 2);
    assert_entry(&snapshot.store, EntryKind::State, "user/profile", "theme");
    assert!(snapshot.stats.visits_reused > 0);
    assert_eq!(snapshot.store, repo.index(STORE_ENTRY).store);
}

#[tokio::test]
async fn test_missing_entry_keeps_previous_snapshot() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let indexer = indexer(&repo);
    indexer.index().await;
    let published = indexer.snapshot();

    repo.remove_file(STORE_ENTRY);
    indexer.index().await;

    let status = indexer.state().status();
    assert_eq!(status.failed_passes, 1);
    assert!(status.last_error.is_some());
    assert_eq!(indexer.snapshot().generation, published.generation);
    assert_eq!(indexer.snapshot().store, published.store);
}

#[tokio::test]
async fn test_readers_see_whole_snapshots() {
    let repo = TestRepo::new();
    repo.with_standard_store();
    let indexer = Arc::new(indexer(&repo));
    indexer.index().await;

    let writer = {
        let indexer = Arc::clone(&indexer);
        tokio::spawn(async move {
            for _ in 0..3 {
                indexer.index().await;
            }
        })
    };

    let expected = indexer.snapshot().store.len();
    for _ in 0..50 {
        let snapshot = indexer.snapshot();
        assert_eq!(snapshot.store.len(), expected);
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert_eq!(indexer.state().generation(), 4);
}
