//! REST-backed [`TaskRepository`] implementation.
//!
//! Talks to a running task server over JSON. Status mapping:
//! - `404` on id-addressed reads and mutations becomes [`RepoError::NotFound`]
//! - other non-success statuses become [`RepoError::Status`] with the error
//!   body's message when one is present
//! - `404` on delete is treated as success: the task is already gone, which
//!   is the state the caller asked for

use reqwest::StatusCode;
use url::Url;

use flowboard_core::api::{
    CreateTaskRequest, ErrorBody, MoveTaskRequest, PositionUpdate, ReorderTaskRequest,
};
use flowboard_core::page::{Page, Paginated};
use flowboard_core::task::{Task, TaskColumn, TaskDraft, TaskId, TaskPatch};

use super::{RepoError, TaskRepository};

/// HTTP client for the task server's REST interface.
pub struct HttpRepository {
    client: reqwest::Client,
    base: String,
}

impl HttpRepository {
    /// Creates a repository pointing at the given server base URL.
    #[must_use]
    pub fn new(base_url: &Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a repository with a caller-supplied [`reqwest::Client`],
    /// e.g. one with custom timeouts.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &Url) -> Self {
        Self {
            client,
            base: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base)
    }

    /// Turns a non-success response into a [`RepoError::Status`].
    async fn status_error(response: reqwest::Response) -> RepoError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => "no error detail".to_string(),
        };
        RepoError::Status { status, message }
    }

    /// Decodes a success response body as JSON.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RepoError> {
        response
            .json()
            .await
            .map_err(|e| RepoError::Decode(e.to_string()))
    }

    /// Checks a response for success, mapping 404 to [`RepoError::NotFound`]
    /// for the given task id.
    async fn check(
        response: reqwest::Response,
        id: &TaskId,
    ) -> Result<reqwest::Response, RepoError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(id.clone()));
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(response)
    }
}

impl TaskRepository for HttpRepository {
    async fn list(&self) -> Result<Vec<Task>, RepoError> {
        let response = self
            .client
            .get(self.endpoint("tasks"))
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Self::decode(response).await
    }

    async fn list_by_column(&self, column: TaskColumn) -> Result<Vec<Task>, RepoError> {
        let response = self
            .client
            .get(self.endpoint("tasks"))
            .query(&[("column", column.as_str())])
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Self::decode(response).await
    }

    async fn list_by_column_paged(
        &self,
        column: TaskColumn,
        page: u32,
        per_page: u32,
    ) -> Result<Page<Task>, RepoError> {
        let response = self
            .client
            .get(self.endpoint("tasks"))
            .query(&[
                ("column", column.as_str().to_string()),
                ("page", page.to_string()),
                ("perPage", per_page.to_string()),
            ])
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        let paginated: Paginated<Task> = Self::decode(response).await?;
        Ok(paginated.into_page())
    }

    async fn get(&self, id: &TaskId) -> Result<Task, RepoError> {
        let response = self
            .client
            .get(self.endpoint(&format!("tasks/{id}")))
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        let response = Self::check(response, id).await?;
        Self::decode(response).await
    }

    async fn create(&self, draft: TaskDraft, position: f64) -> Result<Task, RepoError> {
        let response = self
            .client
            .post(self.endpoint("tasks"))
            .json(&CreateTaskRequest { draft, position })
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Self::decode(response).await
    }

    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, RepoError> {
        let response = self
            .client
            .patch(self.endpoint(&format!("tasks/{id}")))
            .json(&patch)
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        let response = Self::check(response, id).await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RepoError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("tasks/{id}")))
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        // Deleting an already-deleted task is success from the caller's
        // point of view.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(Self::status_error(response).await)
    }

    async fn move_task(
        &self,
        id: &TaskId,
        column: TaskColumn,
        drop_index: usize,
    ) -> Result<Task, RepoError> {
        let response = self
            .client
            .post(self.endpoint(&format!("tasks/{id}/move")))
            .json(&MoveTaskRequest { column, drop_index })
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        let response = Self::check(response, id).await?;
        Self::decode(response).await
    }

    async fn reorder(
        &self,
        id: &TaskId,
        drop_index: usize,
        column: TaskColumn,
    ) -> Result<Task, RepoError> {
        let response = self
            .client
            .post(self.endpoint(&format!("tasks/{id}/reorder")))
            .json(&ReorderTaskRequest { drop_index, column })
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        let response = Self::check(response, id).await?;
        Self::decode(response).await
    }

    async fn update_positions(&self, updates: Vec<PositionUpdate>) -> Result<(), RepoError> {
        let response = self
            .client
            .post(self.endpoint("tasks/positions"))
            .json(&updates)
            .send()
            .await
            .map_err(|e| RepoError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }
}
