use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calendar::CalendarDate;
use crate::error::AppResult;
use crate::validate;

/// Number of samples returned by the weight history endpoint.
pub const HISTORY_LIMIT: i64 = 30;

/// One scale reading. Several readings on the same date are all kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WeightSample {
    pub id: Uuid,
    pub date: CalendarDate,
    pub weight: f64,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewWeight {
    pub weight: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl NewWeight {
    pub fn into_record(self) -> AppResult<WeightSample> {
        let (date, timestamp) = validate::stamp(self.date, self.timestamp);
        Ok(WeightSample {
            id: Uuid::new_v4(),
            date,
            weight: validate::positive("weight", self.weight)?,
            note: self
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            timestamp,
        })
    }
}
