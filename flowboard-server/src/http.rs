//! REST interface over the board store.
//!
//! Routes:
//! - `GET /health` — liveness probe.
//! - `GET /tasks` — all tasks; `?column=` narrows to one column (ascending
//!   by position); adding `?page=&perPage=` returns the paginated envelope.
//! - `POST /tasks` — create from draft fields plus a client-proposed
//!   position.
//! - `GET`/`PATCH`/`DELETE /tasks/{id}` — fetch, partial update, remove.
//! - `POST /tasks/{id}/move` — cross-column move; the position is recomputed
//!   here from the drop index.
//! - `POST /tasks/{id}/reorder` — within-column move, same recompute.
//! - `POST /tasks/positions` — bulk position renumbering.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;

use flowboard_core::api::{
    CreateTaskRequest, ErrorBody, MoveTaskRequest, PositionUpdate, ReorderTaskRequest,
};
use flowboard_core::page::Paginated;
use flowboard_core::task::{Task, TaskColumn, TaskId, TaskPatch};

use crate::store::{BoardStore, StoreError};

/// Page size used when `?page=` is given without `perPage`.
const DEFAULT_PAGE_SIZE: u32 = 5;

/// Errors that can occur when starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The TCP listener could not bind to the requested address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was attempted.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Builds the task router over a shared store.
pub fn router(store: Arc<BoardStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/positions", post(update_positions))
        .route(
            "/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/{id}/move", post(move_task))
        .route("/tasks/{id}/reorder", post(reorder_task))
        .with_state(store)
}

/// Starts the task server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the TCP listener cannot bind.
pub async fn start_server(
    addr: &str,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), ServerError> {
    start_server_with_state(addr, Arc::new(BoardStore::new())).await
}

/// Starts the task server with a pre-configured [`BoardStore`].
///
/// Use [`BoardStore::with_data_file`] plus [`BoardStore::load`] to seed the
/// store from the resolved [`crate::config::ServerConfig`] before starting.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the TCP listener cannot bind.
pub async fn start_server_with_state(
    addr: &str,
    store: Arc<BoardStore>,
) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>), ServerError> {
    let app = router(store);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
    let bound_addr = listener.local_addr().map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the task server in-process for testing.
///
/// Binds to `127.0.0.1:0` (OS-assigned port) and returns the bound address
/// and a [`tokio::task::JoinHandle`] for cleanup.
#[cfg(test)]
pub async fn start_test_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
    start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server")
}

/// Query parameters of `GET /tasks`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ListQuery {
    column: Option<TaskColumn>,
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(
    State(store): State<Arc<BoardStore>>,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Some(page) = query.page {
        let per_page = query.per_page.unwrap_or(DEFAULT_PAGE_SIZE);
        let paged = match query.column {
            Some(column) => store.page_by_column(column, page, per_page).await,
            None => Paginated::paginate(store.list_all().await, page, per_page),
        };
        return Json(paged).into_response();
    }
    match query.column {
        Some(column) => Json(store.list_by_column(column).await).into_response(),
        None => Json(store.list_all().await).into_response(),
    }
}

async fn get_task(
    State(store): State<Arc<BoardStore>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorBody>)> {
    let id = TaskId::from_string(id);
    match store.get(&id).await {
        Some(task) => Ok(Json(task)),
        None => Err(not_found(&id)),
    }
}

async fn create_task(
    State(store): State<Arc<BoardStore>>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), (StatusCode, Json<ErrorBody>)> {
    match store.create(body.draft, body.position).await {
        Ok(task) => Ok((StatusCode::CREATED, Json(task))),
        Err(e) => Err(store_error(&e)),
    }
}

async fn update_task(
    State(store): State<Arc<BoardStore>>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorBody>)> {
    let id = TaskId::from_string(id);
    match store.update(&id, patch).await {
        Ok(task) => Ok(Json(task)),
        Err(e) => Err(store_error(&e)),
    }
}

async fn delete_task(
    State(store): State<Arc<BoardStore>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let id = TaskId::from_string(id);
    match store.delete(&id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(store_error(&e)),
    }
}

async fn move_task(
    State(store): State<Arc<BoardStore>>,
    Path(id): Path<String>,
    Json(body): Json<MoveTaskRequest>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorBody>)> {
    let id = TaskId::from_string(id);
    match store.move_task(&id, body.column, body.drop_index).await {
        Ok(task) => Ok(Json(task)),
        Err(e) => Err(store_error(&e)),
    }
}

async fn reorder_task(
    State(store): State<Arc<BoardStore>>,
    Path(id): Path<String>,
    Json(body): Json<ReorderTaskRequest>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorBody>)> {
    let id = TaskId::from_string(id);
    match store.reorder(&id, body.drop_index, body.column).await {
        Ok(task) => Ok(Json(task)),
        Err(e) => Err(store_error(&e)),
    }
}

async fn update_positions(
    State(store): State<Arc<BoardStore>>,
    Json(updates): Json<Vec<PositionUpdate>>,
) -> Json<serde_json::Value> {
    let updated = store.update_positions(updates).await;
    Json(json!({ "updated": updated }))
}

/// Maps a store failure to a status code and error body.
fn store_error(e: &StoreError) -> (StatusCode, Json<ErrorBody>) {
    let status = match e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::ReadDataFile { .. } | StoreError::ParseDataFile(_) => {
            tracing::error!(error = %e, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

fn not_found(id: &TaskId) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("task {id} not found"),
        }),
    )
}
