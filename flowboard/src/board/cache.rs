//! Client-side task cache.
//!
//! Single in-memory source of truth for the UI's view of the board,
//! independent of any one in-flight network call. All operations are
//! synchronous and immediately observable; column views are recomputed
//! on demand rather than stored, so they can never go stale.

use parking_lot::RwLock;

use flowboard_core::task::{Task, TaskColumn, TaskId, TaskPatch};

/// Shared in-memory task set.
///
/// Owned explicitly and injected into the mutation orchestrator; created
/// at session start and dropped at session end. Clones of the stored
/// tasks are handed out so readers never hold the lock across awaits.
pub struct TaskCache {
    tasks: RwLock<Vec<Task>>,
}

impl TaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Overwrites the full task set with a fresh authoritative snapshot.
    pub fn replace_all(&self, tasks: Vec<Task>) {
        *self.tasks.write() = tasks;
    }

    /// Clones the current full task set, e.g. as a pre-mutation snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    /// Appends a task (temporary or confirmed).
    pub fn insert(&self, task: Task) {
        self.tasks.write().push(task);
    }

    /// Shallow-merges the patch's set fields into the matching task.
    /// No-op if the id is absent.
    pub fn patch(&self, id: &TaskId, patch: &TaskPatch) {
        let mut tasks = self.tasks.write();
        if let Some(task) = tasks.iter_mut().find(|t| t.id == *id) {
            patch.apply_to(task);
        }
    }

    /// Drops the task with the given id. No-op if absent.
    pub fn remove(&self, id: &TaskId) {
        self.tasks.write().retain(|t| t.id != *id);
    }

    /// Clones the task with the given id, if present.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.read().iter().find(|t| t.id == *id).cloned()
    }

    /// Upserts a batch of tasks by id, e.g. a page fetched from the
    /// backend. Existing records are replaced, new ones appended.
    pub fn merge(&self, batch: Vec<Task>) {
        let mut tasks = self.tasks.write();
        for incoming in batch {
            if let Some(existing) = tasks.iter_mut().find(|t| t.id == incoming.id) {
                *existing = incoming;
            } else {
                tasks.push(incoming);
            }
        }
    }

    /// Returns the column's tasks sorted ascending by position, optionally
    /// filtered by a case-insensitive substring match against title or
    /// description.
    ///
    /// The view is derived on every call, never cached.
    #[must_use]
    pub fn view_by_column(&self, column: TaskColumn, search: Option<&str>) -> Vec<Task> {
        let needle = search.map(str::to_lowercase);
        let mut view: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|t| t.column == column)
            .filter(|t| {
                needle.as_ref().is_none_or(|q| {
                    t.title.to_lowercase().contains(q) || t.description.to_lowercase().contains(q)
                })
            })
            .cloned()
            .collect();
        view.sort_by(|a, b| a.position.total_cmp(&b.position));
        view
    }

    /// Number of cached tasks across all columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new()
    }
}
