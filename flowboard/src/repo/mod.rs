//! Repository abstraction over the task backend.
//!
//! Defines the [`TaskRepository`] trait that all backends must satisfy.
//! Concrete implementations include:
//! - [`memory::InMemoryRepository`] — in-process repository for tests and
//!   offline use
//! - [`http::HttpRepository`] — REST client for a running task server

pub mod http;
pub mod memory;

use flowboard_core::api::PositionUpdate;
use flowboard_core::page::Page;
use flowboard_core::task::{Task, TaskColumn, TaskDraft, TaskId, TaskPatch};

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The backend could not be reached or the request never completed.
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The task does not exist on the backend.
    #[error("task {0} not found")]
    NotFound(TaskId),
}

/// Async repository trait for reading and mutating the task set.
///
/// The repository is the authoritative source. Mutations return the
/// persisted record so callers can reconcile optimistic local state
/// against what the backend actually stored.
///
/// Position recomputation for [`move_task`](TaskRepository::move_task) and
/// [`reorder`](TaskRepository::reorder) happens backend-side with the same
/// allocator the client uses, so both sides agree on the resulting order.
pub trait TaskRepository: Send + Sync {
    /// Fetch every task on the board.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Task>, RepoError>> + Send;

    /// Fetch the tasks of one column, ascending by position.
    fn list_by_column(
        &self,
        column: TaskColumn,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepoError>> + Send;

    /// Fetch one page of a column's tasks. Pages are 1-based.
    fn list_by_column_paged(
        &self,
        column: TaskColumn,
        page: u32,
        per_page: u32,
    ) -> impl std::future::Future<Output = Result<Page<Task>, RepoError>> + Send;

    /// Fetch a single task by id.
    fn get(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<Task, RepoError>> + Send;

    /// Create a task from a draft at the given position. The backend
    /// assigns the id and timestamps.
    fn create(
        &self,
        draft: TaskDraft,
        position: f64,
    ) -> impl std::future::Future<Output = Result<Task, RepoError>> + Send;

    /// Apply a partial update to a task. The backend refreshes `updatedAt`.
    fn update(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl std::future::Future<Output = Result<Task, RepoError>> + Send;

    /// Delete a task.
    fn delete(&self, id: &TaskId)
    -> impl std::future::Future<Output = Result<(), RepoError>> + Send;

    /// Move a task to another column at the given drop index. The backend
    /// recomputes the position from its own column snapshot.
    fn move_task(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
    ) -> impl std::future::Future<Output = Result<Task, RepoError>> + Send;

    /// Reorder a task within a column at the given drop index. Same
    /// backend-side position recomputation as a move.
    fn reorder(
        &self,
        id: &TaskId,
        drop_index: usize,
        column: TaskColumn,
    ) -> impl std::future::Future<Output = Result<Task, RepoError>> + Send;

    /// Overwrite the positions of several tasks at once. Unknown ids are
    /// skipped.
    fn update_positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> impl std::future::Future<Output = Result<(), RepoError>> + Send;
}
