use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::ai::{BurnEstimate, EstimateError};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::dto::{Activity, ActivityQuery, EstimateRequest, NewActivity, LIST_LIMIT};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activity", get(list_activities).post(log_activity))
        .route("/activity/estimate", post(estimate_burn))
        .route("/activity/:id", delete(delete_activity))
}

#[instrument(skip(state))]
pub async fn list_activities(
    State(state): State<AppState>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Activity>>> {
    let Query(q) = query?;
    let rows = state
        .events
        .find_activities(&q.date.into(), Some(LIST_LIMIT))
        .await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn log_activity(
    State(state): State<AppState>,
    payload: Result<Json<NewActivity>, JsonRejection>,
) -> AppResult<Json<Activity>> {
    let Json(new) = payload?;
    let activity = state.events.insert_activity(new.into_record()?).await?;
    info!(id = %activity.id, kcal = activity.calories_burned, source = ?activity.source, "activity logged");
    Ok(Json(activity))
}

#[instrument(skip(state))]
pub async fn delete_activity(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    if !state.events.delete_activity(id).await? {
        return Err(AppError::NotFound("activity"));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /activity/estimate { query: "45 min cycling" }
/// Model failures still answer 200 with a zero estimate so the client can
/// fall back to manual entry.
#[instrument(skip(state, payload))]
pub async fn estimate_burn(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> AppResult<Json<BurnEstimate>> {
    let Json(req) = payload?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::validation("Query required"));
    }
    if !state.estimator.is_configured() {
        return Err(EstimateError::MissingApiKey.into());
    }

    let estimate = state.estimator.estimate_burn(query).await;
    if estimate.needs_manual_entry() {
        warn!("no usable burn estimate; client should ask for manual entry");
    }
    Ok(Json(estimate))
}
