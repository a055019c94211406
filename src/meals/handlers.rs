use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        multipart::MultipartRejection,
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::ai::{ImagePart, MealEstimate};
use crate::calendar::CalendarDate;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

use super::dto::{Meal, MealQuery, NewMeal};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/meals", get(list_meals))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/meals", post(create_meal))
        .route("/meals/:id", delete(delete_meal))
        .route(
            "/analyze",
            post(analyze_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    query: Result<Query<MealQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Meal>>> {
    let Query(q) = query?;
    if matches!(q.limit, Some(limit) if limit <= 0) {
        return Err(AppError::validation("limit must be positive"));
    }
    let meals = state.events.find_meals(&q.date.into(), q.limit).await?;
    Ok(Json(meals))
}

#[instrument(skip(state, payload))]
pub async fn create_meal(
    State(state): State<AppState>,
    payload: Result<Json<NewMeal>, JsonRejection>,
) -> AppResult<Json<Meal>> {
    let Json(new) = payload?;
    let meal = state.events.insert_meal(new.into_record()?).await?;
    info!(id = %meal.id, calories = meal.calories, "meal logged");
    Ok(Json(meal))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(id) = path?;
    if !state.events.delete_meal(id).await? {
        return Err(AppError::NotFound("meal"));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub estimate: MealEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal: Option<Meal>,
}

/// POST /analyze (multipart)
/// Field `image` is required, `date` optional. With `?save=true` the estimate
/// is also logged as a meal; nothing is written unless the estimate parsed.
#[instrument(skip(state, mp))]
pub async fn analyze_image(
    State(state): State<AppState>,
    params: Result<Query<AnalyzeParams>, QueryRejection>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let Query(params) = params?;
    let mut mp = mp?;
    let mut image: Option<ImagePart> = None;
    let mut date: Option<CalendarDate> = None;

    while let Some(field) = mp.next_field().await? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                if !mime_type.starts_with("image/") {
                    return Err(AppError::validation("uploaded file must be an image"));
                }
                let data = field.bytes().await?;
                if data.is_empty() {
                    return Err(AppError::validation("uploaded image is empty"));
                }
                image = Some(ImagePart { data, mime_type });
            }
            Some("date") => {
                let text = field.text().await?;
                let parsed = text
                    .trim()
                    .parse::<CalendarDate>()
                    .map_err(|e| AppError::validation(e.to_string()))?;
                date = Some(parsed);
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| AppError::validation("No image uploaded"))?;
    let estimate = state.estimator.analyze_image(&image).await?;

    let meal = if params.save {
        let new = NewMeal::from_estimate(&estimate, date);
        let meal = state.events.insert_meal(new.into_record()?).await?;
        info!(id = %meal.id, "analysed meal saved");
        Some(meal)
    } else {
        None
    };

    Ok(Json(AnalyzeResponse { estimate, meal }))
}
