//! Integration tests for the HTTP repository against a live task server.
//!
//! Each test boots an in-process `flowboard-server` on an OS-assigned port
//! and drives it through `HttpRepository`, covering the wire round trip,
//! the pagination envelope, and the mapping of backend failures onto
//! `RepoError`.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]

use url::Url;

use flowboard::repo::http::HttpRepository;
use flowboard::repo::{RepoError, TaskRepository};
use flowboard_core::api::PositionUpdate;
use flowboard_core::task::{Priority, TaskColumn, TaskDraft, TaskId, TaskPatch};
use flowboard_server::http::start_server;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Boots an empty in-process task server and returns a repository pointed
/// at it. The server task dies with the test runtime.
async fn start_backend() -> HttpRepository {
    let (addr, _handle) = start_server("127.0.0.1:0").await.expect("start server");
    let url = Url::parse(&format!("http://{addr}")).expect("base url");
    HttpRepository::new(&url)
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

// --- round trip tests ---

#[tokio::test]
async fn create_then_get_round_trips() {
    let repo = start_backend().await;

    let created = repo
        .create(draft("Ship release", TaskColumn::InProgress), 250.0)
        .await
        .expect("create");
    assert!(!created.id.is_temporary());
    assert_eq!(created.title, "Ship release");
    assert_eq!(created.column, TaskColumn::InProgress);
    assert_eq!(created.position, 250.0);

    let fetched = repo.get(&created.id).await.expect("get");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn list_by_column_returns_ascending_positions() {
    let repo = start_backend().await;
    repo.create(draft("Middle", TaskColumn::Backlog), 500.0)
        .await
        .expect("create");
    repo.create(draft("Last", TaskColumn::Backlog), 1000.0)
        .await
        .expect("create");
    repo.create(draft("First", TaskColumn::Backlog), 0.0)
        .await
        .expect("create");
    repo.create(draft("Elsewhere", TaskColumn::Completed), 0.0)
        .await
        .expect("create");

    let column = repo
        .list_by_column(TaskColumn::Backlog)
        .await
        .expect("list column");
    let titles: Vec<&str> = column.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Middle", "Last"]);

    let all = repo.list().await.expect("list all");
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn paged_listing_follows_next_page_chain() {
    let repo = start_backend().await;
    for i in 0..7 {
        repo.create(
            draft(&format!("task-{i}"), TaskColumn::UnderReview),
            f64::from(i) * 100.0,
        )
        .await
        .expect("create");
    }

    let first = repo
        .list_by_column_paged(TaskColumn::UnderReview, 1, 3)
        .await
        .expect("page 1");
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.items[0].title, "task-0");
    assert_eq!(first.next_page, Some(2));

    let second = repo
        .list_by_column_paged(TaskColumn::UnderReview, 2, 3)
        .await
        .expect("page 2");
    assert_eq!(second.items.len(), 3);
    assert_eq!(second.items[0].title, "task-3");
    assert_eq!(second.next_page, Some(3));

    let last = repo
        .list_by_column_paged(TaskColumn::UnderReview, 3, 3)
        .await
        .expect("page 3");
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.next_page, None);
}

#[tokio::test]
async fn update_patches_only_set_fields() {
    let repo = start_backend().await;
    let created = repo
        .create(draft("Original", TaskColumn::Backlog), 0.0)
        .await
        .expect("create");

    let updated = repo
        .update(
            &created.id,
            TaskPatch {
                title: Some("Renamed".to_string()),
                priority: Some(Priority::High),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.column, created.column);
    assert!(updated.updated_at >= created.updated_at);
}

// --- move/reorder tests ---

#[tokio::test]
async fn move_recomputes_position_against_server_column() {
    let repo = start_backend().await;
    repo.create(draft("Top", TaskColumn::InProgress), 0.0)
        .await
        .expect("create");
    repo.create(draft("Bottom", TaskColumn::InProgress), 1000.0)
        .await
        .expect("create");
    let mover = repo
        .create(draft("Mover", TaskColumn::Backlog), 0.0)
        .await
        .expect("create");

    let moved = repo
        .move_task(&mover.id, TaskColumn::InProgress, 1)
        .await
        .expect("move");
    assert_eq!(moved.column, TaskColumn::InProgress);
    assert_eq!(moved.position, 500.0);

    let column = repo
        .list_by_column(TaskColumn::InProgress)
        .await
        .expect("list");
    let titles: Vec<&str> = column.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Top", "Mover", "Bottom"]);
}

#[tokio::test]
async fn reorder_to_head_halves_first_key() {
    let repo = start_backend().await;
    repo.create(draft("Head", TaskColumn::Backlog), 10.0)
        .await
        .expect("create");
    let tail = repo
        .create(draft("Tail", TaskColumn::Backlog), 20.0)
        .await
        .expect("create");

    let reordered = repo
        .reorder(&tail.id, 0, TaskColumn::Backlog)
        .await
        .expect("reorder");
    assert_eq!(reordered.position, 5.0);
}

#[tokio::test]
async fn bulk_position_update_renumbers_column() {
    let repo = start_backend().await;
    let a = repo
        .create(draft("A", TaskColumn::Backlog), 0.125)
        .await
        .expect("create");
    let b = repo
        .create(draft("B", TaskColumn::Backlog), 0.25)
        .await
        .expect("create");

    repo.update_positions(vec![
        PositionUpdate {
            id: a.id.clone(),
            position: 0.0,
        },
        PositionUpdate {
            id: b.id.clone(),
            position: 1000.0,
        },
    ])
    .await
    .expect("renumber");

    let column = repo
        .list_by_column(TaskColumn::Backlog)
        .await
        .expect("list");
    let keys: Vec<f64> = column.iter().map(|t| t.position).collect();
    assert_eq!(keys, vec![0.0, 1000.0]);
}

// --- error mapping tests ---

#[tokio::test]
async fn get_unknown_id_maps_to_not_found() {
    let repo = start_backend().await;
    let missing = TaskId::new();
    let result = repo.get(&missing).await;
    match result {
        Err(RepoError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn update_unknown_id_maps_to_not_found() {
    let repo = start_backend().await;
    let result = repo
        .update(
            &TaskId::new(),
            TaskPatch {
                title: Some("Ghost".to_string()),
                ..TaskPatch::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RepoError::NotFound(_))));
}

#[tokio::test]
async fn invalid_draft_maps_to_unprocessable_status() {
    let repo = start_backend().await;
    let mut bad = draft("x", TaskColumn::Backlog);
    bad.title = String::new();

    let result = repo.create(bad, 0.0).await;
    match result {
        Err(RepoError::Status { status, message }) => {
            assert_eq!(status, 422);
            assert!(message.contains("title"), "unexpected message: {message}");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn delete_is_idempotent_from_the_clients_view() {
    let repo = start_backend().await;
    let created = repo
        .create(draft("Doomed", TaskColumn::Backlog), 0.0)
        .await
        .expect("create");

    repo.delete(&created.id).await.expect("first delete");
    assert!(matches!(
        repo.get(&created.id).await,
        Err(RepoError::NotFound(_))
    ));

    // A repeated delete races with the settle refresh in real sessions;
    // the repository treats the 404 as already done.
    repo.delete(&created.id).await.expect("second delete");
}

#[tokio::test]
async fn unreachable_backend_maps_to_network_error() {
    let (addr, handle) = start_server("127.0.0.1:0").await.expect("start server");
    let url = Url::parse(&format!("http://{addr}")).expect("base url");
    let repo = HttpRepository::new(&url);

    repo.create(draft("Before shutdown", TaskColumn::Backlog), 0.0)
        .await
        .expect("create");

    handle.abort();
    let _ = handle.await;

    let result = repo.list().await;
    assert!(matches!(result, Err(RepoError::Network(_))));
}
