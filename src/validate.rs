use time::OffsetDateTime;

use crate::calendar::CalendarDate;
use crate::error::{AppError, AppResult};

pub fn non_empty(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn non_negative(field: &str, value: f64) -> AppResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(value)
}

pub fn positive(field: &str, value: f64) -> AppResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation(format!("{field} must be greater than zero")));
    }
    Ok(value)
}

/// Whole, non-negative count (calories, millilitres). Fractions are rounded.
pub fn whole(field: &str, value: f64) -> AppResult<i32> {
    let v = non_negative(field, value)?.round();
    if v > i32::MAX as f64 {
        return Err(AppError::validation(format!("{field} is too large")));
    }
    Ok(v as i32)
}

pub fn optional_non_negative(field: &str, value: Option<f64>) -> AppResult<f64> {
    value.map_or(Ok(0.0), |v| non_negative(field, v))
}

/// Resolves the calendar day and instant of a new record. The timestamp
/// defaults to now; a missing date is taken from the timestamp's UTC day.
/// A supplied pair is kept as-is, even when the two disagree.
pub fn stamp(
    date: Option<CalendarDate>,
    timestamp: Option<OffsetDateTime>,
) -> (CalendarDate, OffsetDateTime) {
    let timestamp = timestamp.unwrap_or_else(OffsetDateTime::now_utc);
    let date = date.unwrap_or_else(|| CalendarDate::of(timestamp));
    (date, timestamp)
}
