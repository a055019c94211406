use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::dto::{NewTask, Task, TaskPatch, TaskQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_tasks).post(create_task))
        .route("/todos/:id", put(update_task).delete(delete_task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Task>>> {
    let Query(q) = query?;
    Ok(Json(state.events.find_tasks(&q.date.into()).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> AppResult<Json<Task>> {
    let Json(new) = payload?;
    let task = state.events.insert_task(new.into_record()?).await?;
    info!(id = %task.id, "task created");
    Ok(Json(task))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> AppResult<Json<Task>> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let patch = patch.validated()?;
    let task = state
        .events
        .update_task(id, &patch)
        .await?
        .ok_or(AppError::NotFound("task"))?;
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    if !state.events.delete_task(id).await? {
        return Err(AppError::NotFound("task"));
    }
    Ok(Json(json!({ "success": true })))
}
