use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::dto::{NewWeight, WeightSample, HISTORY_LIMIT};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/weight", get(weight_history).post(log_weight))
        .route("/weight/:id", delete(delete_weight))
}

#[instrument(skip(state))]
pub async fn weight_history(State(state): State<AppState>) -> AppResult<Json<Vec<WeightSample>>> {
    Ok(Json(state.events.find_weights(HISTORY_LIMIT).await?))
}

#[instrument(skip(state, payload))]
pub async fn log_weight(
    State(state): State<AppState>,
    payload: Result<Json<NewWeight>, JsonRejection>,
) -> AppResult<Json<WeightSample>> {
    let Json(new) = payload?;
    let sample = state.events.insert_weight(new.into_record()?).await?;
    info!(id = %sample.id, weight = sample.weight, "weight logged");
    Ok(Json(sample))
}

#[instrument(skip(state))]
pub async fn delete_weight(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    if !state.events.delete_weight(id).await? {
        return Err(AppError::NotFound("weight sample"));
    }
    Ok(Json(json!({ "success": true })))
}
