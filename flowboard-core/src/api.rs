//! Request and response bodies for the task REST interface.
//!
//! Shared by the server handlers and the HTTP repository so both sides
//! agree on field names. Bodies are camelCase JSON, matching the task
//! records themselves.

use serde::{Deserialize, Serialize};

use crate::task::{TaskColumn, TaskDraft, TaskId};

/// Body of `POST /tasks`: the draft fields plus the client-proposed
/// position, flattened into one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// The submitted task fields.
    #[serde(flatten)]
    pub draft: TaskDraft,
    /// Sort key proposed by the client's allocator.
    pub position: f64,
}

/// Body of `POST /tasks/{id}/move`.
///
/// Carries the destination column and drop index, not a position: the
/// server recomputes the position against its own column snapshot with the
/// same allocator the client used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTaskRequest {
    /// Destination column.
    pub column: TaskColumn,
    /// 0-based slot among the destination column's tasks (excluding the
    /// moved task).
    pub drop_index: usize,
}

/// Body of `POST /tasks/{id}/reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderTaskRequest {
    /// 0-based slot among the column's tasks (excluding the moved task).
    pub drop_index: usize,
    /// The column being reordered within.
    pub column: TaskColumn,
}

/// One entry of a `POST /tasks/positions` bulk update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Task to renumber.
    pub id: TaskId,
    /// Its new sort key.
    pub position: f64,
}

/// Error body returned by the server for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub error: String,
}
