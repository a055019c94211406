use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::error::AppResult;
use crate::state::AppState;

use super::dto::{SettingsPatch, UserSettings};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/reset", post(reset_all))
}

#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> AppResult<Json<UserSettings>> {
    Ok(Json(state.settings.get_or_create_default().await?))
}

#[instrument(skip(state, payload))]
pub async fn update_settings(
    State(state): State<AppState>,
    payload: Result<Json<SettingsPatch>, JsonRejection>,
) -> AppResult<Json<UserSettings>> {
    let Json(patch) = payload?;
    let patch = patch.validated()?;
    Ok(Json(state.settings.upsert(&patch).await?))
}

/// Wipes every logged event and restores default settings.
#[instrument(skip(state))]
pub async fn reset_all(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.events.reset().await?;
    warn!("all data reset");
    Ok(Json(json!({ "success": true })))
}
