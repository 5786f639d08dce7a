//! Board application layer.
//!
//! Contains the [`BoardManager`] which orchestrates every board mutation
//! (create/update/delete/move/reorder) as an optimistic flow: compute the
//! target position, apply the change to the local [`cache::TaskCache`]
//! immediately, invoke the repository, and on failure restore the
//! pre-mutation snapshot. A [`BoardEvent::Refresh`] signal is emitted
//! after mutations settle so consumers can re-sync from the backend.
//!
//! Mutations are not serialized against each other. Each in-flight
//! mutation carries its own pre-mutation snapshot, so when two race, the
//! later-settling rollback can discard the earlier one's committed
//! optimistic change. The board accepts this last-settled-wins behavior;
//! the refresh after settle converges the cache back to the backend's
//! state.

pub mod cache;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};

use flowboard_core::position::compute_position;
use flowboard_core::task::{Task, TaskColumn, TaskDraft, TaskId, TaskPatch, ValidationError};

use crate::repo::{RepoError, TaskRepository};

use cache::TaskCache;

/// Page size used for column hydration when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Errors that can occur when mutating the board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Input fields were rejected before any cache or network activity.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The repository call failed; the cache was restored to its
    /// pre-mutation state.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
}

/// The kind of board mutation, for event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// A task creation.
    Create,
    /// A partial field update.
    Update,
    /// A task deletion.
    Delete,
    /// A cross-column move.
    Move,
    /// A within-column reorder.
    Reorder,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Move => "move",
            Self::Reorder => "reorder",
        };
        write!(f, "{name}")
    }
}

/// Events emitted by the [`BoardManager`] for UI notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// A mutation settled; consumers should re-sync from the backend.
    Refresh,
    /// A mutation failed and its optimistic change was rolled back.
    MutationFailed {
        /// Which mutation failed.
        operation: MutationKind,
        /// Description of the failure.
        reason: String,
    },
}

/// Orchestrates optimistic board mutations against a repository.
///
/// The cache is owned by the session and injected here, so the UI can
/// read the same instance the manager mutates. Mutations follow a fixed
/// shape:
///
/// 1. Validate locally (rejects before any cache or network activity).
/// 2. Apply the change optimistically to the cache.
/// 3. Invoke the repository.
/// 4. On failure, restore the pre-mutation snapshot.
/// 5. On settle, emit [`BoardEvent::Refresh`]. A failed create emits only
///    the failure event, never a refresh.
pub struct BoardManager<R: TaskRepository> {
    /// The authoritative backend.
    repo: R,
    /// Shared task cache, also read by the UI.
    cache: Arc<TaskCache>,
    /// Channel for emitting board events to the UI layer.
    event_tx: mpsc::Sender<BoardEvent>,
    /// Next page to fetch per column, for incremental hydration.
    next_pages: Mutex<HashMap<TaskColumn, u32>>,
    /// Page size for column hydration.
    page_size: u32,
}

impl<R: TaskRepository> BoardManager<R> {
    /// Creates a manager over the given repository and shared cache.
    ///
    /// Returns the manager and a receiver for [`BoardEvent`]s that the
    /// UI layer should consume.
    pub fn new(
        repo: R,
        cache: Arc<TaskCache>,
        event_buffer: usize,
    ) -> (Self, mpsc::Receiver<BoardEvent>) {
        Self::with_page_size(repo, cache, event_buffer, DEFAULT_PAGE_SIZE)
    }

    /// Creates a manager with a custom column hydration page size.
    pub fn with_page_size(
        repo: R,
        cache: Arc<TaskCache>,
        event_buffer: usize,
        page_size: u32,
    ) -> (Self, mpsc::Receiver<BoardEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        let manager = Self {
            repo,
            cache,
            event_tx,
            next_pages: Mutex::new(HashMap::new()),
            page_size,
        };
        (manager, event_rx)
    }

    /// Returns the shared task cache.
    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Replaces the cache with a fresh authoritative snapshot of every
    /// task. Returns the number of tasks fetched.
    ///
    /// This is the re-sync consumers should run when they observe a
    /// [`BoardEvent::Refresh`]; it does not emit one itself.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the listing fails. The cache is
    /// left untouched in that case.
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        let tasks = self.repo.list().await?;
        let count = tasks.len();
        self.cache.replace_all(tasks);
        tracing::debug!(count, "cache refreshed from backend");
        Ok(count)
    }

    /// Fetches the first page of a column and merges it into the cache.
    /// Subsequent pages are fetched with [`load_more`](Self::load_more).
    ///
    /// Returns the number of tasks merged.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the page fetch fails.
    pub async fn hydrate_column(&self, column: TaskColumn) -> Result<usize, BoardError> {
        self.fetch_page(column, 1).await
    }

    /// Fetches the next page of a column, if one remains, and merges it
    /// into the cache.
    ///
    /// Returns the number of tasks merged; `0` when the column is
    /// exhausted or was never hydrated.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the page fetch fails.
    pub async fn load_more(&self, column: TaskColumn) -> Result<usize, BoardError> {
        let next = { self.next_pages.lock().await.get(&column).copied() };
        match next {
            Some(page) => self.fetch_page(column, page).await,
            None => Ok(0),
        }
    }

    async fn fetch_page(&self, column: TaskColumn, page: u32) -> Result<usize, BoardError> {
        let fetched = self
            .repo
            .list_by_column_paged(column, page, self.page_size)
            .await?;
        let count = fetched.items.len();
        self.cache.merge(fetched.items);

        let mut cursors = self.next_pages.lock().await;
        match fetched.next_page {
            Some(next) => {
                cursors.insert(column, next);
            }
            None => {
                cursors.remove(&column);
            }
        }
        Ok(count)
    }

    /// Creates a task at the top of its column.
    ///
    /// A temporary placeholder (prefixed id, computed position, current
    /// timestamps) is inserted into the cache while the repository call
    /// is in flight. On success the placeholder is replaced by the
    /// confirmed record and a refresh is signaled; on failure the
    /// placeholder is removed, leaving the cache exactly as before.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for a malformed draft (checked
    /// before any cache change) or [`BoardError::Repo`] if creation fails
    /// backend-side.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, BoardError> {
        draft.validate()?;

        // New tasks go on top: position computed against the cached view
        // of the target column at drop index 0.
        let neighbors: Vec<f64> = self
            .cache
            .view_by_column(draft.column, None)
            .iter()
            .map(|t| t.position)
            .collect();
        let position = compute_position(&neighbors, 0);

        let placeholder =
            Task::from_draft(draft.clone(), TaskId::temporary(), position, Utc::now());
        let placeholder_id = placeholder.id.clone();
        self.cache.insert(placeholder);

        match self.repo.create(draft, position).await {
            Ok(task) => {
                self.cache.remove(&placeholder_id);
                self.cache.insert(task.clone());
                tracing::debug!(task_id = %task.id, column = %task.column, "task created");
                self.emit(BoardEvent::Refresh);
                Ok(task)
            }
            Err(e) => {
                self.cache.remove(&placeholder_id);
                self.emit_failure(MutationKind::Create, &e);
                Err(e.into())
            }
        }
    }

    /// Applies a partial update to a task.
    ///
    /// The patch is applied to the cache immediately; on failure the
    /// entire pre-mutation task set is restored (global rollback rather
    /// than minimal-diff correction). An unknown id is a local no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] for malformed patch fields or
    /// [`BoardError::Repo`] if the backend rejects the update.
    pub async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<(), BoardError> {
        patch.validate()?;
        if self.cache.get(id).is_none() {
            tracing::debug!(task_id = %id, "update for unknown task ignored");
            return Ok(());
        }

        let snapshot = self.cache.snapshot();
        self.cache.patch(id, &patch);

        match self.repo.update(id, patch).await {
            Ok(task) => {
                self.cache.merge(vec![task]);
                self.emit(BoardEvent::Refresh);
                Ok(())
            }
            Err(e) => {
                self.cache.replace_all(snapshot);
                self.emit_failure(MutationKind::Update, &e);
                self.emit(BoardEvent::Refresh);
                Err(e.into())
            }
        }
    }

    /// Deletes a task.
    ///
    /// The task is removed from the cache immediately; on failure the
    /// full pre-mutation snapshot is restored. An unknown id is a local
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the backend delete fails.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), BoardError> {
        if self.cache.get(id).is_none() {
            tracing::debug!(task_id = %id, "delete for unknown task ignored");
            return Ok(());
        }

        let snapshot = self.cache.snapshot();
        self.cache.remove(id);

        match self.repo.delete(id).await {
            Ok(()) => {
                self.emit(BoardEvent::Refresh);
                Ok(())
            }
            Err(e) => {
                self.cache.replace_all(snapshot);
                self.emit_failure(MutationKind::Delete, &e);
                self.emit(BoardEvent::Refresh);
                Err(e.into())
            }
        }
    }

    /// Moves a task to another column at the given drop index.
    ///
    /// The new position is computed locally against the cached view of
    /// the destination column and applied optimistically; the backend
    /// recomputes it independently with the same allocator against its
    /// own column contents, so both sides converge.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the backend move fails; the cache
    /// is restored to its pre-mutation state.
    pub async fn move_task(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
    ) -> Result<(), BoardError> {
        self.relocate(id, column, drop_index, MutationKind::Move).await
    }

    /// Reorders a task within a column to the given drop index.
    ///
    /// Same optimistic flow and backend-side recomputation as
    /// [`move_task`](Self::move_task).
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Repo`] if the backend reorder fails; the
    /// cache is restored to its pre-mutation state.
    pub async fn reorder_task(
        &self,
        id: &TaskId,
        drop_index: usize,
        column: TaskColumn,
    ) -> Result<(), BoardError> {
        self.relocate(id, column, drop_index, MutationKind::Reorder)
            .await
    }

    /// Shared move/reorder flow.
    async fn relocate(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
        kind: MutationKind,
    ) -> Result<(), BoardError> {
        let Some(current) = self.cache.get(id) else {
            tracing::debug!(task_id = %id, "relocation of unknown task ignored");
            return Ok(());
        };

        // Dropping a task where it already sits is a no-op: no repository
        // call, no cache change.
        if current.column == column {
            let view = self.cache.view_by_column(column, None);
            if view.iter().position(|t| t.id == *id) == Some(drop_index) {
                tracing::debug!(task_id = %id, "drop on current slot ignored");
                return Ok(());
            }
        }

        let snapshot = self.cache.snapshot();

        // Destination neighbors exclude the task being placed.
        let neighbors: Vec<f64> = self
            .cache
            .view_by_column(column, None)
            .iter()
            .filter(|t| t.id != *id)
            .map(|t| t.position)
            .collect();
        let position = compute_position(&neighbors, drop_index);

        self.cache.patch(
            id,
            &TaskPatch {
                column: Some(column),
                position: Some(position),
                ..TaskPatch::default()
            },
        );

        let result = if kind == MutationKind::Move {
            self.repo.move_task(id, column, drop_index).await
        } else {
            self.repo.reorder(id, drop_index, column).await
        };

        match result {
            Ok(task) => {
                self.cache.merge(vec![task]);
                self.emit(BoardEvent::Refresh);
                Ok(())
            }
            Err(e) => {
                self.cache.replace_all(snapshot);
                self.emit_failure(kind, &e);
                self.emit(BoardEvent::Refresh);
                Err(e.into())
            }
        }
    }

    /// Best-effort event emission; a full channel drops the event.
    fn emit(&self, event: BoardEvent) {
        let _ = self.event_tx.try_send(event);
    }

    fn emit_failure(&self, operation: MutationKind, error: &RepoError) {
        tracing::warn!(%operation, error = %error, "mutation failed, cache restored");
        let _ = self.event_tx.try_send(BoardEvent::MutationFailed {
            operation,
            reason: error.to_string(),
        });
    }
}
