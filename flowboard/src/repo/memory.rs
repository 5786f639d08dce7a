//! In-process [`TaskRepository`] for tests and offline use.
//!
//! Mirrors the task server's observable behavior: ids and timestamps are
//! assigned here, and move/reorder recompute positions with the shared
//! allocator against the current column contents. Packed columns are never
//! renumbered automatically; callers drive renumbering through
//! [`TaskRepository::update_positions`]. Requests can be made to fail on
//! demand to exercise rollback paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use flowboard_core::api::PositionUpdate;
use flowboard_core::page::Page;
use flowboard_core::position::compute_position;
use flowboard_core::task::{Task, TaskColumn, TaskDraft, TaskId, TaskPatch};

use super::{RepoError, TaskRepository};

/// In-memory task repository.
///
/// Not persistent: all data is lost when the struct is dropped.
pub struct InMemoryRepository {
    tasks: Mutex<HashMap<TaskId, Task>>,
    fail_requests: AtomicBool,
}

impl InMemoryRepository {
    /// Creates a new, empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            fail_requests: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent request fail with [`RepoError::Network`]
    /// until cleared. Used to exercise failure and rollback paths.
    pub fn set_failing(&self, fail: bool) {
        self.fail_requests.store(fail, Ordering::SeqCst);
    }

    /// Inserts tasks directly, bypassing creation (ids are kept as given).
    pub async fn seed(&self, tasks: Vec<Task>) {
        let mut guard = self.tasks.lock().await;
        for task in tasks {
            guard.insert(task.id.clone(), task);
        }
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Whether the repository holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    fn check_reachable(&self) -> Result<(), RepoError> {
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(RepoError::Network("injected backend failure".to_string()));
        }
        Ok(())
    }

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
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<Task>, RepoError> {
        self.check_reachable()?;
        let guard = self.tasks.lock().await;
        let mut all = Vec::with_capacity(guard.len());
        for column in TaskColumn::ALL {
            all.extend(Self::column_snapshot(&guard, column, None));
        }
        Ok(all)
    }

    async fn list_by_column(&self, column: TaskColumn) -> Result<Vec<Task>, RepoError> {
        self.check_reachable()?;
        let guard = self.tasks.lock().await;
        Ok(Self::column_snapshot(&guard, column, None))
    }

    async fn list_by_column_paged(
        &self,
        column: TaskColumn,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Task>, RepoError> {
        self.check_reachable()?;
        let tasks = {
            let guard = self.tasks.lock().await;
            Self::column_snapshot(&guard, column, None)
        };
        let page = page.max(1);
        let per = usize::try_from(per_page.max(1)).unwrap_or(usize::MAX);
        let start = usize::try_from(page - 1)
            .unwrap_or(usize::MAX)
            .saturating_mul(per);
        let items: Vec<Task> = tasks.iter().skip(start).take(per).cloned().collect();
        let next_page = (start.saturating_add(per) < tasks.len()).then(|| page + 1);
        Ok(Page { items, next_page })
    }

    async fn get(&self, id: &TaskId) -> Result<Task, RepoError> {
        self.check_reachable()?;
        self.tasks
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(id.clone()))
    }

    async fn create(&self, draft: TaskDraft, position: f64) -> Result<Task, RepoError> {
        self.check_reachable()?;
        draft.validate().map_err(|e| RepoError::Status {
            status: 422,
            message: e.to_string(),
        })?;
        let task = Task::from_draft(draft, TaskId::new(), position, Utc::now());
        self.tasks
            .lock()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, RepoError> {
        self.check_reachable()?;
        patch.validate().map_err(|e| RepoError::Status {
            status: 422,
            message: e.to_string(),
        })?;
        let mut guard = self.tasks.lock().await;
        let Some(task) = guard.get_mut(id) else {
            return Err(RepoError::NotFound(id.clone()));
        };
        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepoError> {
        self.check_reachable()?;
        match self.tasks.lock().await.remove(id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(id.clone())),
        }
    }

    async fn move_task(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
    ) -> Result<Task, RepoError> {
        self.check_reachable()?;
        let mut guard = self.tasks.lock().await;
        if !guard.contains_key(id) {
            return Err(RepoError::NotFound(id.clone()));
        }
        let neighbors: Vec<f64> = Self::column_snapshot(&guard, column, Some(id))
            .iter()
            .map(|t| t.position)
            .collect();
        let position = compute_position(&neighbors, drop_index);
        let Some(task) = guard.get_mut(id) else {
            return Err(RepoError::NotFound(id.clone()));
        };
        task.column = column;
        task.position = position;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn reorder(
        &self,
        id: &TaskId,
        drop_index: usize,
        column: TaskColumn,
    ) -> Result<Task, RepoError> {
        self.move_task(id, column, drop_index).await
    }

    async fn update_positions(&self, updates: Vec<PositionUpdate>) -> Result<(), RepoError> {
        self.check_reachable()?;
        let mut guard = self.tasks.lock().await;
        for update in updates {
            if let Some(task) = guard.get_mut(&update.id) {
                task.position = update.position;
                task.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}
