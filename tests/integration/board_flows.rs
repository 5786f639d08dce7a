//! Integration tests for optimistic board flows.
//!
//! Exercises the `BoardManager` against the in-memory repository:
//! multi-step board sessions, rollback consistency after injected
//! failures, pagination walks, and the event stream contract.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use tokio::sync::mpsc;

use flowboard::board::cache::TaskCache;
use flowboard::board::{BoardError, BoardEvent, BoardManager, MutationKind};
use flowboard::repo::memory::InMemoryRepository;
use flowboard::repo::{RepoError, TaskRepository};
use flowboard_core::api::PositionUpdate;
use flowboard_core::position::{MIN_GAP, needs_rebalance, rebalanced_positions};
use flowboard_core::task::{Priority, Task, TaskColumn, TaskDraft, TaskId, TaskPatch};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a manager over a fresh in-memory repository and shared cache.
fn make_board() -> (
    BoardManager<InMemoryRepository>,
    mpsc::Receiver<BoardEvent>,
    Arc<TaskCache>,
) {
    let cache = Arc::new(TaskCache::new());
    let (manager, events) = BoardManager::new(InMemoryRepository::new(), Arc::clone(&cache), 64);
    (manager, events, cache)
}

/// Creates a draft with a valid title and description.
fn draft(title: &str, column: TaskColumn) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: format!("{title} details"),
        column,
        priority: Priority::Medium,
        ..TaskDraft::default()
    }
}

/// Creates a repository-side task with an explicit position.
fn stored_task(title: &str, column: TaskColumn, position: f64) -> Task {
    Task::from_draft(
        draft(title, column),
        TaskId::new(),
        position,
        chrono::Utc::now(),
    )
}

/// Titles of a column view, top to bottom.
fn titles(cache: &TaskCache, column: TaskColumn) -> Vec<String> {
    cache
        .view_by_column(column, None)
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

/// Positions of a column view, ascending.
fn positions(cache: &TaskCache, column: TaskColumn) -> Vec<f64> {
    cache
        .view_by_column(column, None)
        .iter()
        .map(|t| t.position)
        .collect()
}

/// Asserts every column view is strictly ascending by position.
fn assert_strictly_ordered(cache: &TaskCache) {
    for column in TaskColumn::ALL {
        let view = positions(cache, column);
        for pair in view.windows(2) {
            assert!(pair[0] < pair[1], "column {column} out of order: {view:?}");
        }
    }
}

// --- full session tests ---

#[tokio::test]
async fn full_session_converges_cache_and_repository() {
    let (manager, _events, cache) = make_board();

    // Three creations, each landing on top of the backlog.
    let ci = manager
        .create_task(draft("Set up CI", TaskColumn::Backlog))
        .await
        .expect("create ci");
    let login = manager
        .create_task(draft("Fix login", TaskColumn::Backlog))
        .await
        .expect("create login");
    manager
        .create_task(draft("Write docs", TaskColumn::Backlog))
        .await
        .expect("create docs");
    assert_eq!(titles(&cache, TaskColumn::Backlog), vec!["Write docs", "Fix login", "Set up CI"]);

    // Start on the login fix, bump its priority, then pull CI to the top
    // of the backlog.
    manager
        .move_task(&login.id, TaskColumn::InProgress, 0)
        .await
        .expect("move login");
    manager
        .update_task(
            &login.id,
            TaskPatch {
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("update login");
    manager
        .reorder_task(&ci.id, 0, TaskColumn::Backlog)
        .await
        .expect("reorder ci");

    assert_eq!(titles(&cache, TaskColumn::Backlog), vec!["Set up CI", "Write docs"]);
    assert_eq!(titles(&cache, TaskColumn::InProgress), vec!["Fix login"]);
    assert_eq!(cache.get(&login.id).expect("login").priority, Priority::High);
    assert_strictly_ordered(&cache);

    // The cache and the repository agree task for task.
    manager.refresh().await.expect("refresh");
    let mut cached = cache.snapshot();
    let mut stored = manager.repository().list().await.expect("list");
    cached.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
    stored.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
    assert_eq!(cached, stored);
}

#[tokio::test]
async fn rollback_leaves_board_identical_after_every_failed_mutation() {
    let (manager, _events, cache) = make_board();
    let first = manager
        .create_task(draft("First", TaskColumn::Backlog))
        .await
        .expect("create first");
    manager
        .create_task(draft("Second", TaskColumn::Backlog))
        .await
        .expect("create second");
    let before = cache.snapshot();

    manager.repository().set_failing(true);

    let update = manager
        .update_task(
            &first.id,
            TaskPatch {
                title: Some("Renamed".to_string()),
                ..TaskPatch::default()
            },
        )
        .await;
    assert!(matches!(update, Err(BoardError::Repo(RepoError::Network(_)))));
    assert_eq!(cache.snapshot(), before);

    let delete = manager.delete_task(&first.id).await;
    assert!(delete.is_err());
    assert_eq!(cache.snapshot(), before);

    let moved = manager.move_task(&first.id, TaskColumn::Completed, 0).await;
    assert!(moved.is_err());
    assert_eq!(cache.snapshot(), before);

    let reordered = manager.reorder_task(&first.id, 0, TaskColumn::Backlog).await;
    assert!(reordered.is_err());
    assert_eq!(cache.snapshot(), before);

    let created = manager.create_task(draft("Third", TaskColumn::Backlog)).await;
    assert!(created.is_err());
    assert_eq!(cache.snapshot(), before);

    // After the backend heals, a refresh confirms nothing leaked through.
    manager.repository().set_failing(false);
    manager.refresh().await.expect("refresh");
    assert_eq!(cache.len(), 2);
    assert_eq!(manager.repository().len().await, 2);
}

// --- event stream tests ---

#[tokio::test]
async fn event_stream_reports_settles_in_order() {
    let (manager, mut events, _cache) = make_board();

    let task = manager
        .create_task(draft("Tracked", TaskColumn::Backlog))
        .await
        .expect("create");

    manager.repository().set_failing(true);
    let _ = manager
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("Nope".to_string()),
                ..TaskPatch::default()
            },
        )
        .await;
    manager.repository().set_failing(false);

    manager.delete_task(&task.id).await.expect("delete");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0], BoardEvent::Refresh);
    assert!(matches!(
        seen[1],
        BoardEvent::MutationFailed {
            operation: MutationKind::Update,
            ..
        }
    ));
    assert_eq!(seen[2], BoardEvent::Refresh);
    assert_eq!(seen[3], BoardEvent::Refresh);
}

// --- pagination tests ---

#[tokio::test]
async fn pagination_walks_column_in_page_order() {
    let cache = Arc::new(TaskCache::new());
    let (manager, _events) = BoardManager::with_page_size(
        InMemoryRepository::new(),
        Arc::clone(&cache),
        64,
        5,
    );
    let tasks: Vec<Task> = (0..12)
        .map(|i| {
            stored_task(&format!("task-{i:02}"), TaskColumn::UnderReview, f64::from(i) * 100.0)
        })
        .collect();
    manager.repository().seed(tasks).await;

    assert_eq!(manager.hydrate_column(TaskColumn::UnderReview).await.expect("page 1"), 5);
    assert_eq!(manager.load_more(TaskColumn::UnderReview).await.expect("page 2"), 5);
    assert_eq!(manager.load_more(TaskColumn::UnderReview).await.expect("page 3"), 2);
    assert_eq!(manager.load_more(TaskColumn::UnderReview).await.expect("exhausted"), 0);

    let view = titles(&cache, TaskColumn::UnderReview);
    assert_eq!(view.len(), 12);
    assert_eq!(view[0], "task-00");
    assert_eq!(view[11], "task-11");
    assert_strictly_ordered(&cache);
}

#[tokio::test]
async fn head_insert_converges_with_partially_hydrated_cache() {
    let cache = Arc::new(TaskCache::new());
    let (manager, _events) = BoardManager::with_page_size(
        InMemoryRepository::new(),
        Arc::clone(&cache),
        64,
        3,
    );
    let tasks: Vec<Task> = (0..9)
        .map(|i| stored_task(&format!("task-{i}"), TaskColumn::Backlog, f64::from(i) * 100.0))
        .collect();
    manager.repository().seed(tasks).await;

    // Only the first page is cached, but a head insert depends only on the
    // first neighbor, so the allocated key tops the backend's full column
    // too.
    manager.hydrate_column(TaskColumn::Backlog).await.expect("hydrate");
    assert_eq!(cache.len(), 3);

    let created = manager
        .create_task(draft("Newest", TaskColumn::Backlog))
        .await
        .expect("create");
    assert!(created.position < 0.0);
    assert_eq!(titles(&cache, TaskColumn::Backlog)[0], "Newest");

    let stored = manager
        .repository()
        .list_by_column(TaskColumn::Backlog)
        .await
        .expect("list column");
    assert_eq!(stored[0].title, "Newest");
    assert_eq!(stored.len(), 10);
}

// --- position key lifetime tests ---

#[tokio::test]
async fn repeated_head_insertion_keeps_strict_order() {
    let (manager, _events, cache) = make_board();

    for i in 0..8 {
        manager
            .create_task(draft(&format!("task-{i}"), TaskColumn::Backlog))
            .await
            .expect("create");
    }

    let view = positions(&cache, TaskColumn::Backlog);
    assert_eq!(view.len(), 8);
    assert_strictly_ordered(&cache);
    // Head inserts above a zero key step downward by the append gap, so the
    // column never crowds.
    assert!(!needs_rebalance(&view, MIN_GAP));
    assert_eq!(titles(&cache, TaskColumn::Backlog)[0], "task-7");
}

#[tokio::test]
async fn gap_exhaustion_is_detected_and_renumbered() {
    let (manager, _events, cache) = make_board();
    manager
        .repository()
        .seed(vec![
            stored_task("A", TaskColumn::Backlog, 0.0),
            stored_task("B", TaskColumn::Backlog, 1000.0),
            stored_task("C", TaskColumn::Backlog, 2000.0),
        ])
        .await;
    manager.refresh().await.expect("refresh");

    // Each pass drops the bottom task between the top two, halving the
    // second slot until the gap detector trips.
    let mut tripped = false;
    for _ in 0..40 {
        let bottom = cache.view_by_column(TaskColumn::Backlog, None)[2].id.clone();
        manager
            .reorder_task(&bottom, 1, TaskColumn::Backlog)
            .await
            .expect("reorder");
        if needs_rebalance(&positions(&cache, TaskColumn::Backlog), MIN_GAP) {
            tripped = true;
            break;
        }
    }
    assert!(tripped, "midpoint churn never exhausted the gap");

    // Renumber the column through the bulk position update and re-sync.
    let view = cache.view_by_column(TaskColumn::Backlog, None);
    let updates: Vec<PositionUpdate> = view
        .iter()
        .zip(rebalanced_positions(view.len()))
        .map(|(task, position)| PositionUpdate {
            id: task.id.clone(),
            position,
        })
        .collect();
    manager
        .repository()
        .update_positions(updates)
        .await
        .expect("renumber");
    manager.refresh().await.expect("refresh");

    assert_eq!(positions(&cache, TaskColumn::Backlog), vec![0.0, 1000.0, 2000.0]);
    assert!(!needs_rebalance(&positions(&cache, TaskColumn::Backlog), MIN_GAP));
}
