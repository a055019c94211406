use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calendar::CalendarDate;
use crate::error::AppResult;
use crate::validate;

/// Number of activities returned by the activity list endpoint.
pub const LIST_LIMIT: i64 = 50;

/// How an activity's burn figure was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "activity_source", rename_all = "lowercase")]
pub enum ActivitySource {
    #[default]
    Manual,
    #[serde(alias = "ai-estimated")]
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub calories_burned: f64,
    pub duration_minutes: f64,
    pub date: CalendarDate,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type")]
    pub source: ActivitySource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub calories_burned: f64,
    pub duration_minutes: f64,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default, rename = "type")]
    pub source: ActivitySource,
}

impl NewActivity {
    pub fn into_record(self) -> AppResult<Activity> {
        let (date, timestamp) = validate::stamp(self.date, self.timestamp);
        Ok(Activity {
            id: Uuid::new_v4(),
            name: validate::non_empty("name", &self.name)?,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            calories_burned: validate::non_negative("caloriesBurned", self.calories_burned)?,
            duration_minutes: validate::non_negative("durationMinutes", self.duration_minutes)?,
            date,
            timestamp,
            source: self.source,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub date: Option<CalendarDate>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub query: String,
}

#[cfg(test)]
mod activity_dto_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_defaults_to_manual_and_accepts_alias() {
        let manual: NewActivity = serde_json::from_value(json!({
            "name": "Walk", "caloriesBurned": 120, "durationMinutes": 25
        }))
        .unwrap();
        assert_eq!(manual.source, ActivitySource::Manual);

        let ai: NewActivity = serde_json::from_value(json!({
            "name": "Run", "caloriesBurned": 300, "durationMinutes": 30, "type": "ai-estimated"
        }))
        .unwrap();
        assert_eq!(ai.source, ActivitySource::Ai);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let res = serde_json::from_value::<NewActivity>(json!({
            "name": "Run", "caloriesBurned": 300, "durationMinutes": 30, "type": "guess"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn wire_format_uses_camel_case_and_type_tag() {
        let new: NewActivity = serde_json::from_value(json!({
            "name": "Swim", "caloriesBurned": 410.5, "durationMinutes": 45,
            "date": "2024-06-01", "type": "ai"
        }))
        .unwrap();
        let value = serde_json::to_value(new.into_record().unwrap()).unwrap();
        assert_eq!(value["caloriesBurned"], 410.5);
        assert_eq!(value["durationMinutes"], 45.0);
        assert_eq!(value["type"], "ai");
    }
}
