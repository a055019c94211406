//! Time-windowed rollups over raw event records.
//!
//! Everything here is a pure function of its inputs: no I/O, no clock reads
//! (the reference day is always passed in) and no failure modes. Numeric
//! fields that are not finite count as zero.

use serde::Serialize;

use crate::activity::dto::Activity;
use crate::calendar::CalendarDate;
use crate::meals::dto::Meal;
use crate::settings::dto::UserSettings;
use crate::water::dto::WaterEntry;
use crate::weight::dto::WeightSample;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DailyTotals {
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl DailyTotals {
    /// Macros rounded to whole grams, as reported to clients.
    pub fn rounded(self) -> Self {
        Self {
            protein: self.protein.round(),
            carbs: self.carbs.round(),
            fat: self.fat.round(),
            ..self
        }
    }
}

/// Sum of every meal logged on `date`.
pub fn daily_rollup(date: CalendarDate, meals: &[Meal]) -> DailyTotals {
    meals
        .iter()
        .filter(|m| m.date == date)
        .fold(DailyTotals::default(), |acc, m| DailyTotals {
            calories: acc.calories + i64::from(m.calories),
            protein: acc.protein + finite_or_zero(m.protein),
            carbs: acc.carbs + finite_or_zero(m.carbs),
            fat: acc.fat + finite_or_zero(m.fat),
        })
}

/// One bar of the weekly trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStats {
    pub day: &'static str,
    pub date: CalendarDate,
    pub cal: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
}

/// Totals for the seven days ending at `today`, oldest first. Days without
/// meals are zero-filled, so the result always has seven entries.
pub fn weekly_rollup(today: CalendarDate, meals: &[Meal]) -> Vec<DayStats> {
    today
        .trailing_week()
        .into_iter()
        .map(|date| {
            let t = daily_rollup(date, meals);
            DayStats {
                day: date.short_weekday(),
                date,
                cal: t.calories,
                protein: t.protein.round() as i64,
                carbs: t.carbs.round() as i64,
                fat: t.fat.round() as i64,
            }
        })
        .collect()
}

/// The weekly series with its calorie total and whole-calorie daily average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub total: i64,
    pub average: i64,
    pub days: Vec<DayStats>,
}

pub fn weekly_summary(today: CalendarDate, meals: &[Meal]) -> WeeklySummary {
    let days = weekly_rollup(today, meals);
    let total: i64 = days.iter().map(|d| d.cal).sum();
    let average = (total as f64 / days.len().max(1) as f64).round() as i64;
    WeeklySummary {
        total,
        average,
        days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Macro {
    Protein,
    Fat,
    Carbs,
}

/// The macronutrient contributing the most calories. Ties go to protein,
/// then fat, then carbs; a meal with no macros at all reports carbs.
pub fn dominant_macro(protein: f64, carbs: f64, fat: f64) -> Macro {
    let p = finite_or_zero(protein) * KCAL_PER_G_PROTEIN;
    let c = finite_or_zero(carbs) * KCAL_PER_G_CARBS;
    let f = finite_or_zero(fat) * KCAL_PER_G_FAT;

    if p == 0.0 && c == 0.0 && f == 0.0 {
        Macro::Carbs
    } else if p >= c && p >= f {
        Macro::Protein
    } else if f >= c && f >= p {
        Macro::Fat
    } else {
        Macro::Carbs
    }
}

/// Percentage of `goal` reached, clamped to `0..=100`. A goal of zero or less
/// counts as met as soon as anything was achieved.
pub fn goal_progress(achieved: f64, goal: f64) -> f64 {
    let achieved = finite_or_zero(achieved).max(0.0);
    if !goal.is_finite() || goal <= 0.0 {
        return if achieved > 0.0 { 100.0 } else { 0.0 };
    }
    (100.0 * achieved / goal).min(100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurnDay {
    pub day: &'static str,
    pub date: CalendarDate,
    pub burn: f64,
}

/// Best single sessions across every activity passed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBests {
    pub longest_duration: f64,
    pub max_calories: f64,
}

pub fn personal_bests(activities: &[Activity]) -> PersonalBests {
    activities
        .iter()
        .fold(PersonalBests::default(), |best, a| PersonalBests {
            longest_duration: best
                .longest_duration
                .max(finite_or_zero(a.duration_minutes)),
            max_calories: best.max_calories.max(finite_or_zero(a.calories_burned)),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnSummary {
    pub today_burn: f64,
    pub weekly_burn: f64,
    pub weekly_goal: i32,
    pub progress: f64,
    pub days: Vec<BurnDay>,
    pub personal_bests: PersonalBests,
}

/// Calories burned today and over the same seven-day window as
/// [`weekly_rollup`], measured against the weekly burn goal. Personal bests
/// cover every activity given, not just the window.
pub fn burn_summary(today: CalendarDate, activities: &[Activity], weekly_goal: i32) -> BurnSummary {
    let days: Vec<BurnDay> = today
        .trailing_week()
        .into_iter()
        .map(|date| BurnDay {
            day: date.short_weekday(),
            date,
            burn: activities
                .iter()
                .filter(|a| a.date == date)
                .map(|a| finite_or_zero(a.calories_burned))
                .sum(),
        })
        .collect();

    let weekly_burn: f64 = days.iter().map(|d| d.burn).sum();
    let today_burn = days.last().map_or(0.0, |d| d.burn);

    BurnSummary {
        today_burn,
        weekly_burn,
        weekly_goal,
        progress: goal_progress(weekly_burn, f64::from(weekly_goal)),
        days,
        personal_bests: personal_bests(activities),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrationSummary {
    pub date: CalendarDate,
    pub total: i64,
    pub goal: i32,
    pub progress: f64,
}

pub fn hydration_summary(date: CalendarDate, entries: &[WaterEntry], goal: i32) -> HydrationSummary {
    let total: i64 = entries
        .iter()
        .filter(|e| e.date == date)
        .map(|e| i64::from(e.amount))
        .sum();
    HydrationSummary {
        date,
        total,
        goal,
        progress: goal_progress(total as f64, f64::from(goal)),
    }
}

/// Trend over a weight history. `change` is current minus start, to 0.1 kg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightSummary {
    pub current: Option<f64>,
    pub start: Option<f64>,
    pub change: Option<f64>,
    pub entries: usize,
}

pub fn weight_summary(samples: &[WeightSample]) -> WeightSummary {
    let mut ordered: Vec<&WeightSample> = samples.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then(a.timestamp.cmp(&b.timestamp)));

    let start = ordered.first().map(|s| s.weight);
    let current = ordered.last().map(|s| s.weight);
    let change = start
        .zip(current)
        .map(|(start, current)| ((current - start) * 10.0).round() / 10.0);

    WeightSummary {
        current,
        start,
        change,
        entries: samples.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Targets {
    pub calories: i32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealView {
    #[serde(flatten)]
    pub meal: Meal,
    pub dominant_macro: Macro,
}

/// Everything the dashboard shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: CalendarDate,
    pub totals: DailyTotals,
    pub targets: Targets,
    pub progress: Targets,
    pub meals: Vec<MealView>,
}

/// Meals are listed oldest first. Totals carry rounded macros; progress is
/// measured on the exact sums.
pub fn daily_summary(date: CalendarDate, meals: &[Meal], settings: &UserSettings) -> DailySummary {
    let totals = daily_rollup(date, meals);
    let mut day_meals: Vec<&Meal> = meals.iter().filter(|m| m.date == date).collect();
    day_meals.sort_by_key(|m| m.timestamp);

    DailySummary {
        date,
        totals: totals.rounded(),
        targets: Targets {
            calories: settings.calorie_target,
            protein: settings.protein_target,
            carbs: settings.carbs_target,
            fat: settings.fat_target,
        },
        progress: Targets {
            calories: goal_progress(totals.calories as f64, f64::from(settings.calorie_target))
                .round() as i32,
            protein: goal_progress(totals.protein, settings.protein_target),
            carbs: goal_progress(totals.carbs, settings.carbs_target),
            fat: goal_progress(totals.fat, settings.fat_target),
        },
        meals: day_meals
            .into_iter()
            .map(|m| MealView {
                dominant_macro: m.dominant_macro(),
                meal: m.clone(),
            })
            .collect(),
    }
}
