use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ai::MealEstimate;
use crate::calendar::CalendarDate;
use crate::error::AppResult;
use crate::stats::aggregate::{dominant_macro, Macro};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub meal_name: String,
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub image_path: Option<String>,
    /// Full model reply kept alongside meals created from photo analysis.
    pub analysis_raw: Option<serde_json::Value>,
    pub date: CalendarDate,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Meal {
    pub fn dominant_macro(&self) -> Macro {
        dominant_macro(self.protein, self.carbs, self.fat)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewMeal {
    pub meal_name: String,
    pub calories: f64,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub analysis_raw: Option<serde_json::Value>,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl NewMeal {
    pub fn into_record(self) -> AppResult<Meal> {
        let (date, timestamp) = validate::stamp(self.date, self.timestamp);
        Ok(Meal {
            id: Uuid::new_v4(),
            meal_name: validate::non_empty("meal_name", &self.meal_name)?,
            calories: validate::whole("calories", self.calories)?,
            protein: validate::optional_non_negative("protein", self.protein)?,
            carbs: validate::optional_non_negative("carbs", self.carbs)?,
            fat: validate::optional_non_negative("fat", self.fat)?,
            image_path: self.image_path.filter(|p| !p.trim().is_empty()),
            analysis_raw: self.analysis_raw,
            date,
            timestamp,
        })
    }

    /// A meal logged from a photo estimate, keeping the estimate as `analysis_raw`.
    pub fn from_estimate(estimate: &MealEstimate, date: Option<CalendarDate>) -> Self {
        Self {
            meal_name: estimate.meal_name.clone(),
            calories: f64::from(estimate.calories),
            protein: Some(estimate.protein),
            carbs: Some(estimate.carbs),
            fat: Some(estimate.fat),
            image_path: None,
            analysis_raw: serde_json::to_value(estimate).ok(),
            date,
            timestamp: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MealQuery {
    pub date: Option<CalendarDate>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod meal_dto_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_macros_default_to_zero() {
        let new: NewMeal = serde_json::from_value(json!({
            "meal_name": "Toast",
            "calories": 180,
            "date": "2024-02-10"
        }))
        .unwrap();
        let meal = new.into_record().unwrap();
        assert_eq!(meal.protein, 0.0);
        assert_eq!(meal.fat, 0.0);
        assert_eq!(meal.date.to_string(), "2024-02-10");
    }

    #[test]
    fn meal_without_calories_is_rejected_by_serde() {
        let res = serde_json::from_value::<NewMeal>(json!({ "meal_name": "Toast" }));
        assert!(res.is_err());
    }

    #[test]
    fn negative_calories_fail_validation() {
        let new: NewMeal =
            serde_json::from_value(json!({ "meal_name": "Toast", "calories": -5 })).unwrap();
        assert!(new.into_record().is_err());
    }

    #[test]
    fn estimate_becomes_meal_with_raw_analysis() {
        let estimate = MealEstimate {
            meal_name: "Salmon bowl".into(),
            calories: 640,
            protein: 42.0,
            carbs: 55.0,
            fat: 24.0,
            reasoning: "rice and fish".into(),
        };
        let day: CalendarDate = "2024-05-05".parse().unwrap();
        let meal = NewMeal::from_estimate(&estimate, Some(day))
            .into_record()
            .unwrap();
        assert_eq!(meal.calories, 640);
        assert_eq!(meal.date, day);
        assert_eq!(
            meal.analysis_raw.unwrap()["reasoning"],
            json!("rice and fish")
        );
    }

    #[test]
    fn serialized_timestamp_is_rfc3339() {
        let new: NewMeal = serde_json::from_value(json!({
            "meal_name": "Rice",
            "calories": 200,
            "timestamp": "2024-02-10T12:00:00Z"
        }))
        .unwrap();
        let value = serde_json::to_value(new.into_record().unwrap()).unwrap();
        assert_eq!(value["timestamp"], "2024-02-10T12:00:00Z");
        assert_eq!(value["date"], "2024-02-10");
    }
}
