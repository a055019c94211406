use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::calendar::CalendarDate;
use crate::error::AppResult;
use crate::state::AppState;
use crate::store::DateFilter;
use crate::weight::dto::HISTORY_LIMIT;

use super::aggregate::{
    burn_summary, daily_summary, hydration_summary, weekly_rollup, weekly_summary,
    weight_summary, BurnSummary, DailySummary, DayStats, HydrationSummary, WeeklySummary,
    WeightSummary,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/weekly", get(weekly))
        .route("/stats/weekly/summary", get(weekly_totals))
        .route("/stats/daily", get(daily))
        .route("/stats/activity", get(activity))
        .route("/stats/water", get(water))
        .route("/stats/weight", get(weight))
}

/// `?date=` for the single-day views; today (UTC) when omitted.
#[derive(Debug, Default, Deserialize)]
pub struct DayParams {
    pub date: Option<CalendarDate>,
}

impl DayParams {
    fn day(&self) -> CalendarDate {
        self.date.unwrap_or_else(CalendarDate::today)
    }
}

fn this_week(today: CalendarDate) -> DateFilter {
    DateFilter::In(today.trailing_week().to_vec())
}

#[instrument(skip(state))]
pub async fn weekly(State(state): State<AppState>) -> AppResult<Json<Vec<DayStats>>> {
    let today = CalendarDate::today();
    let meals = state.events.find_meals(&this_week(today), None).await?;
    Ok(Json(weekly_rollup(today, &meals)))
}

#[instrument(skip(state))]
pub async fn weekly_totals(State(state): State<AppState>) -> AppResult<Json<WeeklySummary>> {
    let today = CalendarDate::today();
    let meals = state.events.find_meals(&this_week(today), None).await?;
    Ok(Json(weekly_summary(today, &meals)))
}

#[instrument(skip(state))]
pub async fn daily(
    State(state): State<AppState>,
    params: Result<Query<DayParams>, QueryRejection>,
) -> AppResult<Json<DailySummary>> {
    let Query(params) = params?;
    let day = params.day();
    let meals = state.events.find_meals(&DateFilter::On(day), None).await?;
    let settings = state.settings.get_or_create_default().await?;
    Ok(Json(daily_summary(day, &meals, &settings)))
}

#[instrument(skip(state))]
pub async fn activity(State(state): State<AppState>) -> AppResult<Json<BurnSummary>> {
    let today = CalendarDate::today();
    // whole history: personal bests are all-time
    let activities = state.events.find_activities(&DateFilter::Any, None).await?;
    let settings = state.settings.get_or_create_default().await?;
    Ok(Json(burn_summary(today, &activities, settings.weekly_burn_goal)))
}

#[instrument(skip(state))]
pub async fn water(
    State(state): State<AppState>,
    params: Result<Query<DayParams>, QueryRejection>,
) -> AppResult<Json<HydrationSummary>> {
    let Query(params) = params?;
    let day = params.day();
    let entries = state.events.find_water(&DateFilter::On(day)).await?;
    let settings = state.settings.get_or_create_default().await?;
    Ok(Json(hydration_summary(day, &entries, settings.water_goal)))
}

#[instrument(skip(state))]
pub async fn weight(State(state): State<AppState>) -> AppResult<Json<WeightSummary>> {
    let history = state.events.find_weights(HISTORY_LIMIT).await?;
    Ok(Json(weight_summary(&history)))
}
