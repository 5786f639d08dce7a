//! In-memory task store backing the REST interface.
//!
//! The [`BoardStore`] is the authoritative task collection. Move and reorder
//! recompute the task's position here with the shared allocator, against this
//! store's own column snapshot, so a client that computed the same drop
//! optimistically lands on the same key. Optionally seeded from a JSON data
//! file and saved back after each mutation (best-effort).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::RwLock;

use flowboard_core::api::PositionUpdate;
use flowboard_core::page::Paginated;
use flowboard_core::position::{self, MIN_GAP};
use flowboard_core::task::{Task, TaskColumn, TaskDraft, TaskId, TaskPatch, ValidationError};

/// Errors returned by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No task with the given id.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Draft or patch fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Reading the data file failed.
    #[error("failed to read data file {path}: {source}")]
    ReadDataFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The data file held malformed JSON.
    #[error("failed to parse data file: {0}")]
    ParseDataFile(#[from] serde_json::Error),
}

/// On-disk shape of the data file: a single `tasks` array.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct DataFile {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// In-memory task collection with optional JSON file persistence.
///
/// Thread-safe via [`RwLock`]. All mutating operations refresh the task's
/// `updated_at` stamp and trigger a best-effort save when a data file is
/// configured.
pub struct BoardStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    data_file: Option<PathBuf>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    /// Creates a new, empty store with no persistence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            data_file: None,
        }
    }

    /// Creates a store that loads from and saves to the given JSON file.
    #[must_use]
    pub fn with_data_file(path: PathBuf) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            data_file: Some(path),
        }
    }

    /// Loads tasks from the configured data file, replacing current contents.
    ///
    /// A missing file is treated as an empty board. Returns the number of
    /// tasks loaded. Runs blocking file I/O; call it during startup, before
    /// serving requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadDataFile`] if the file exists but cannot be
    /// read, or [`StoreError::ParseDataFile`] if its JSON is malformed.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let Some(path) = &self.data_file else {
            return Ok(0);
        };
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "data file not found, starting empty");
                return Ok(0);
            }
            Err(source) => {
                return Err(StoreError::ReadDataFile {
                    path: path.clone(),
                    source,
                });
            }
        };
        let data: DataFile = serde_json::from_str(&contents)?;
        let count = data.tasks.len();
        let mut tasks = self.tasks.write().await;
        tasks.clear();
        for task in data.tasks {
            tasks.insert(task.id.clone(), task);
        }
        drop(tasks);
        tracing::info!(path = %path.display(), count = count, "loaded tasks from data file");
        Ok(count)
    }

    /// Returns all tasks, ordered by board column order then ascending
    /// position.
    pub async fn list_all(&self) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut all: Vec<Task> = Vec::with_capacity(tasks.len());
        for column in TaskColumn::ALL {
            all.extend(column_snapshot(&tasks, column, None));
        }
        all
    }

    /// Returns the tasks of one column, ascending by position.
    pub async fn list_by_column(&self, column: TaskColumn) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        column_snapshot(&tasks, column, None)
    }

    /// Returns one page of a column's tasks (ascending by position) in the
    /// paginated envelope.
    pub async fn page_by_column(
        &self,
        column: TaskColumn,
        page: u32,
        per_page: u32,
    ) -> Paginated<Task> {
        let all = self.list_by_column(column).await;
        Paginated::paginate(all, page, per_page)
    }

    /// Returns a clone of one task, if present.
    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(id).cloned()
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        let tasks = self.tasks.read().await;
        tasks.len()
    }

    /// Returns true if the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Creates a task from a validated draft at the client-proposed position,
    /// assigning the id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] if the draft fields are invalid.
    pub async fn create(&self, draft: TaskDraft, pos: f64) -> Result<Task, StoreError> {
        draft.validate()?;
        let task = Task::from_draft(draft, TaskId::new(), pos, Utc::now());
        {
            let mut tasks = self.tasks.write().await;
            tasks.insert(task.id.clone(), task.clone());
        }
        tracing::debug!(
            task_id = %task.id,
            column = %task.column,
            position = task.position,
            "task created"
        );
        self.persist().await;
        Ok(task)
    }

    /// Shallow-merges a patch into a task and refreshes its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] for invalid patch fields and
    /// [`StoreError::NotFound`] if no task has this id.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        patch.validate()?;
        let updated = {
            let mut tasks = self.tasks.write().await;
            let task = tasks
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.apply_to(task);
            task.updated_at = Utc::now();
            task.clone()
        };
        tracing::debug!(task_id = %id, "task updated");
        self.persist().await;
        Ok(updated)
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has this id.
    pub async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        {
            let mut tasks = self.tasks.write().await;
            tasks
                .remove(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        }
        tracing::debug!(task_id = %id, "task deleted");
        self.persist().await;
        Ok(())
    }

    /// Moves a task to `column` at `drop_index`, recomputing its position
    /// with the shared allocator against this store's column contents
    /// (excluding the moved task).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has this id.
    pub async fn move_task(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
    ) -> Result<Task, StoreError> {
        let moved = {
            let mut tasks = self.tasks.write().await;
            if !tasks.contains_key(id) {
                return Err(StoreError::NotFound(id.clone()));
            }
            let neighbors: Vec<f64> = column_snapshot(&tasks, column, Some(id))
                .iter()
                .map(|t| t.position)
                .collect();
            let pos = position::compute_position(&neighbors, drop_index);
            let task = tasks
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            task.column = column;
            task.position = pos;
            task.updated_at = Utc::now();
            let moved = task.clone();
            rebalance_if_packed(&mut tasks, column);
            moved
        };
        tracing::debug!(
            task_id = %id,
            column = %column,
            drop_index = drop_index,
            position = moved.position,
            "task moved"
        );
        self.persist().await;
        Ok(moved)
    }

    /// Reorders a task within `column` to `drop_index`, recomputing its
    /// position the same way [`BoardStore::move_task`] does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has this id.
    pub async fn reorder(
        &self,
        id: &TaskId,
        drop_index: usize,
        column: TaskColumn,
    ) -> Result<Task, StoreError> {
        let reordered = {
            let mut tasks = self.tasks.write().await;
            if !tasks.contains_key(id) {
                return Err(StoreError::NotFound(id.clone()));
            }
            let neighbors: Vec<f64> = column_snapshot(&tasks, column, Some(id))
                .iter()
                .map(|t| t.position)
                .collect();
            let pos = position::compute_position(&neighbors, drop_index);
            let task = tasks
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            task.position = pos;
            task.updated_at = Utc::now();
            let reordered = task.clone();
            rebalance_if_packed(&mut tasks, column);
            reordered
        };
        tracing::debug!(
            task_id = %id,
            drop_index = drop_index,
            position = reordered.position,
            "task reordered"
        );
        self.persist().await;
        Ok(reordered)
    }

    /// Applies a bulk set of position updates (used to renumber a column).
    ///
    /// Unknown ids are skipped. Returns the number of tasks updated.
    pub async fn update_positions(&self, updates: Vec<PositionUpdate>) -> usize {
        let applied = {
            let mut tasks = self.tasks.write().await;
            let now = Utc::now();
            let mut applied = 0;
            for update in updates {
                if let Some(task) = tasks.get_mut(&update.id) {
                    task.position = update.position;
                    task.updated_at = now;
                    applied += 1;
                }
            }
            applied
        };
        tracing::debug!(count = applied, "bulk position update applied");
        self.persist().await;
        applied
    }

    /// Best-effort save of the full task set to the configured data file.
    ///
    /// Failures are logged, never surfaced: a request that mutated the board
    /// has already succeeded by the time the save runs.
    async fn persist(&self) {
        let Some(path) = &self.data_file else {
            return;
        };
        let data = DataFile {
            tasks: self.list_all().await,
        };
        let json = match serde_json::to_string_pretty(&data) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize data file");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write data file");
        }
    }
}

/// Clones the tasks of one column, sorted ascending by position, optionally
/// excluding one id.
fn column_snapshot(
    tasks: &HashMap<TaskId, Task>,
    column: TaskColumn,
    exclude: Option<&TaskId>,
) -> Vec<Task> {
    let mut snapshot: Vec<Task> = tasks
        .values()
        .filter(|t| t.column == column && exclude.is_none_or(|id| t.id != *id))
        .cloned()
        .collect();
    snapshot.sort_by(|a, b| a.position.total_cmp(&b.position));
    snapshot
}

/// Renumbers a column evenly when fractional gaps have shrunk below
/// [`MIN_GAP`]. Midpoint insertion halves an interval each time, so heavily
/// reordered columns eventually exhaust `f64` precision without this.
fn rebalance_if_packed(tasks: &mut HashMap<TaskId, Task>, column: TaskColumn) {
    let snapshot = column_snapshot(tasks, column, None);
    let positions: Vec<f64> = snapshot.iter().map(|t| t.position).collect();
    if !position::needs_rebalance(&positions, MIN_GAP) {
        return;
    }
    tracing::info!(column = %column, count = snapshot.len(), "rebalancing column positions");
    let fresh = position::rebalanced_positions(snapshot.len());
    for (task, pos) in snapshot.iter().zip(fresh) {
        if let Some(entry) = tasks.get_mut(&task.id) {
            entry.position = pos;
        }
    }
}
