use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::error::AppResult;
use crate::validate;

/// The one user-configuration record. Stores keep it under a fixed key, so a
/// second instance can never be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub name: String,
    pub program: String,
    pub calorie_target: i32,
    pub protein_target: f64,
    pub carbs_target: f64,
    pub fat_target: f64,
    pub current_weight: f64,
    pub goal_weight: f64,
    pub theme: String,
    pub notifications: bool,
    pub weekly_burn_goal: i32,
    pub water_goal: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: "Athlete".into(),
            program: "Muscle Gain".into(),
            calorie_target: 2500,
            protein_target: 180.0,
            carbs_target: 250.0,
            fat_target: 80.0,
            current_weight: 75.5,
            goal_weight: 80.0,
            theme: "dark".into(),
            notifications: true,
            weekly_burn_goal: 2000,
            water_goal: 3000,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub name: Option<String>,
    pub program: Option<String>,
    pub calorie_target: Option<f64>,
    pub protein_target: Option<f64>,
    pub carbs_target: Option<f64>,
    pub fat_target: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub theme: Option<String>,
    pub notifications: Option<bool>,
    pub weekly_burn_goal: Option<f64>,
    pub water_goal: Option<f64>,
}

/// A patch whose values have passed validation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidSettingsPatch {
    pub name: Option<String>,
    pub program: Option<String>,
    pub calorie_target: Option<i32>,
    pub protein_target: Option<f64>,
    pub carbs_target: Option<f64>,
    pub fat_target: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub theme: Option<String>,
    pub notifications: Option<bool>,
    pub weekly_burn_goal: Option<i32>,
    pub water_goal: Option<i32>,
}

impl SettingsPatch {
    pub fn validated(self) -> AppResult<ValidSettingsPatch> {
        fn text(field: &str, v: Option<String>) -> AppResult<Option<String>> {
            v.map(|s| validate::non_empty(field, &s)).transpose()
        }
        fn grams(field: &str, v: Option<f64>) -> AppResult<Option<f64>> {
            v.map(|x| validate::non_negative(field, x)).transpose()
        }
        fn count(field: &str, v: Option<f64>) -> AppResult<Option<i32>> {
            v.map(|x| validate::whole(field, x)).transpose()
        }
        fn kilos(field: &str, v: Option<f64>) -> AppResult<Option<f64>> {
            v.map(|x| validate::positive(field, x)).transpose()
        }

        Ok(ValidSettingsPatch {
            name: text("name", self.name)?,
            program: text("program", self.program)?,
            calorie_target: count("calorieTarget", self.calorie_target)?,
            protein_target: grams("proteinTarget", self.protein_target)?,
            carbs_target: grams("carbsTarget", self.carbs_target)?,
            fat_target: grams("fatTarget", self.fat_target)?,
            current_weight: kilos("currentWeight", self.current_weight)?,
            goal_weight: kilos("goalWeight", self.goal_weight)?,
            theme: text("theme", self.theme)?,
            notifications: self.notifications,
            weekly_burn_goal: count("weeklyBurnGoal", self.weekly_burn_goal)?,
            water_goal: count("waterGoal", self.water_goal)?,
        })
    }
}

impl ValidSettingsPatch {
    pub fn apply(&self, s: &mut UserSettings) {
        if let Some(v) = &self.name {
            s.name.clone_from(v);
        }
        if let Some(v) = &self.program {
            s.program.clone_from(v);
        }
        if let Some(v) = self.calorie_target {
            s.calorie_target = v;
        }
        if let Some(v) = self.protein_target {
            s.protein_target = v;
        }
        if let Some(v) = self.carbs_target {
            s.carbs_target = v;
        }
        if let Some(v) = self.fat_target {
            s.fat_target = v;
        }
        if let Some(v) = self.current_weight {
            s.current_weight = v;
        }
        if let Some(v) = self.goal_weight {
            s.goal_weight = v;
        }
        if let Some(v) = &self.theme {
            s.theme.clone_from(v);
        }
        if let Some(v) = self.notifications {
            s.notifications = v;
        }
        if let Some(v) = self.weekly_burn_goal {
            s.weekly_burn_goal = v;
        }
        if let Some(v) = self.water_goal {
            s.water_goal = v;
        }
        s.updated_at = OffsetDateTime::now_utc();
    }
}
