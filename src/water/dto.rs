use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calendar::CalendarDate;
use crate::error::{AppError, AppResult};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WaterEntry {
    pub id: Uuid,
    pub date: CalendarDate,
    /// Millilitres.
    pub amount: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewWater {
    pub amount: f64,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl NewWater {
    pub fn into_record(self) -> AppResult<WaterEntry> {
        let amount = validate::whole("amount", self.amount)?;
        if amount == 0 {
            return Err(AppError::validation("amount must be greater than zero"));
        }
        let (date, timestamp) = validate::stamp(self.date, self.timestamp);
        Ok(WaterEntry {
            id: Uuid::new_v4(),
            date,
            amount,
            timestamp,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WaterQuery {
    pub date: Option<CalendarDate>,
}
