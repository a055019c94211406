use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::dto::{NewWater, WaterEntry, WaterQuery};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/water", get(list_water).post(log_water))
        .route("/water/:id", delete(delete_water))
}

#[instrument(skip(state))]
pub async fn list_water(
    State(state): State<AppState>,
    query: Result<Query<WaterQuery>, QueryRejection>,
) -> AppResult<Json<Vec<WaterEntry>>> {
    let Query(q) = query?;
    Ok(Json(state.events.find_water(&q.date.into()).await?))
}

#[instrument(skip(state, payload))]
pub async fn log_water(
    State(state): State<AppState>,
    payload: Result<Json<NewWater>, JsonRejection>,
) -> AppResult<Json<WaterEntry>> {
    let Json(new) = payload?;
    let entry = state.events.insert_water(new.into_record()?).await?;
    debug!(id = %entry.id, amount = entry.amount, "water logged");
    Ok(Json(entry))
}

#[instrument(skip(state))]
pub async fn delete_water(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    if !state.events.delete_water(id).await? {
        return Err(AppError::NotFound("water entry"));
    }
    Ok(Json(json!({ "success": true })))
}
