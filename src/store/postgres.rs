use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use super::{DateFilter, EventStore, SettingsStore};
use crate::activity::dto::Activity;
use crate::meals::dto::Meal;
use crate::settings::dto::{UserSettings, ValidSettingsPatch};
use crate::todos::dto::{Task, TaskPatch};
use crate::water::dto::WaterEntry;
use crate::weight::dto::WeightSample;

const MEAL_COLUMNS: &str =
    "id, meal_name, calories, protein, carbs, fat, image_path, analysis_raw, date, timestamp";
const WEIGHT_COLUMNS: &str = "id, date, weight, note, timestamp";
const ACTIVITY_COLUMNS: &str =
    "id, name, description, calories_burned, duration_minutes, date, timestamp, source";
const WATER_COLUMNS: &str = "id, date, amount, timestamp";
const TASK_COLUMNS: &str = "id, text, status, notes, date, timestamp";
const SETTINGS_COLUMNS: &str = "name, program, calorie_target, protein_target, carbs_target, \
     fat_target, current_weight, goal_weight, theme, notifications, weekly_burn_goal, \
     water_goal, updated_at";

/// Postgres-backed store. Each statement is atomic on its own; no operation
/// spans several records transactionally except `reset`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn delete_from(&self, table: &str, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete from {table}"))?;
        Ok(res.rows_affected() > 0)
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &DateFilter) {
    match filter {
        DateFilter::Any => {}
        DateFilter::On(day) => {
            qb.push(" WHERE date = ").push_bind(*day);
        }
        DateFilter::In(days) => {
            let days: Vec<Date> = days.iter().map(|d| d.into_inner()).collect();
            qb.push(" WHERE date = ANY(").push_bind(days).push(")");
        }
    }
}

fn push_limit(qb: &mut QueryBuilder<'_, Postgres>, limit: Option<i64>) {
    if let Some(limit) = limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn find_meals(&self, filter: &DateFilter, limit: Option<i64>) -> anyhow::Result<Vec<Meal>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {MEAL_COLUMNS} FROM meals"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp DESC");
        push_limit(&mut qb, limit);
        qb.build_query_as::<Meal>()
            .fetch_all(&self.db)
            .await
            .context("find meals")
    }

    async fn insert_meal(&self, meal: Meal) -> anyhow::Result<Meal> {
        sqlx::query_as::<_, Meal>(&format!(
            "INSERT INTO meals ({MEAL_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {MEAL_COLUMNS}"
        ))
        .bind(meal.id)
        .bind(&meal.meal_name)
        .bind(meal.calories)
        .bind(meal.protein)
        .bind(meal.carbs)
        .bind(meal.fat)
        .bind(&meal.image_path)
        .bind(&meal.analysis_raw)
        .bind(meal.date)
        .bind(meal.timestamp)
        .fetch_one(&self.db)
        .await
        .context("insert meal")
    }

    async fn delete_meal(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_from("meals", id).await
    }

    async fn find_weights(&self, limit: i64) -> anyhow::Result<Vec<WeightSample>> {
        sqlx::query_as::<_, WeightSample>(&format!(
            "SELECT {WEIGHT_COLUMNS} FROM weights ORDER BY date DESC, timestamp DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("find weights")
    }

    async fn insert_weight(&self, sample: WeightSample) -> anyhow::Result<WeightSample> {
        sqlx::query_as::<_, WeightSample>(&format!(
            "INSERT INTO weights ({WEIGHT_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {WEIGHT_COLUMNS}"
        ))
        .bind(sample.id)
        .bind(sample.date)
        .bind(sample.weight)
        .bind(&sample.note)
        .bind(sample.timestamp)
        .fetch_one(&self.db)
        .await
        .context("insert weight")
    }

    async fn delete_weight(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_from("weights", id).await
    }

    async fn find_activities(
        &self,
        filter: &DateFilter,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Activity>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {ACTIVITY_COLUMNS} FROM activities"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp DESC");
        push_limit(&mut qb, limit);
        qb.build_query_as::<Activity>()
            .fetch_all(&self.db)
            .await
            .context("find activities")
    }

    async fn insert_activity(&self, activity: Activity) -> anyhow::Result<Activity> {
        sqlx::query_as::<_, Activity>(&format!(
            "INSERT INTO activities ({ACTIVITY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(activity.id)
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.calories_burned)
        .bind(activity.duration_minutes)
        .bind(activity.date)
        .bind(activity.timestamp)
        .bind(activity.source)
        .fetch_one(&self.db)
        .await
        .context("insert activity")
    }

    async fn delete_activity(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_from("activities", id).await
    }

    async fn find_water(&self, filter: &DateFilter) -> anyhow::Result<Vec<WaterEntry>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {WATER_COLUMNS} FROM water_logs"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp ASC");
        qb.build_query_as::<WaterEntry>()
            .fetch_all(&self.db)
            .await
            .context("find water logs")
    }

    async fn insert_water(&self, entry: WaterEntry) -> anyhow::Result<WaterEntry> {
        sqlx::query_as::<_, WaterEntry>(&format!(
            "INSERT INTO water_logs ({WATER_COLUMNS}) VALUES ($1, $2, $3, $4) \
             RETURNING {WATER_COLUMNS}"
        ))
        .bind(entry.id)
        .bind(entry.date)
        .bind(entry.amount)
        .bind(entry.timestamp)
        .fetch_one(&self.db)
        .await
        .context("insert water log")
    }

    async fn delete_water(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_from("water_logs", id).await
    }

    async fn find_tasks(&self, filter: &DateFilter) -> anyhow::Result<Vec<Task>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY timestamp ASC");
        qb.build_query_as::<Task>()
            .fetch_all(&self.db)
            .await
            .context("find tasks")
    }

    async fn insert_task(&self, task: Task) -> anyhow::Result<Task> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.id)
        .bind(&task.text)
        .bind(task.status)
        .bind(&task.notes)
        .bind(task.date)
        .bind(task.timestamp)
        .fetch_one(&self.db)
        .await
        .context("insert task")
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET \
                text = COALESCE($2, text), \
                status = COALESCE($3, status), \
                notes = COALESCE($4, notes) \
             WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.text)
        .bind(patch.status)
        .bind(&patch.notes)
        .fetch_optional(&self.db)
        .await
        .context("update task")
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_from("tasks", id).await
    }

    async fn reset(&self) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        for table in ["meals", "weights", "activities", "water_logs", "tasks", "settings"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("clear {table}"))?;
        }
        tx.commit().await.context("commit tx")?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get_or_create_default(&self) -> anyhow::Result<UserSettings> {
        sqlx::query("INSERT INTO settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&self.db)
            .await
            .context("create default settings")?;
        sqlx::query_as::<_, UserSettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1"
        ))
        .fetch_one(&self.db)
        .await
        .context("load settings")
    }

    async fn upsert(&self, patch: &ValidSettingsPatch) -> anyhow::Result<UserSettings> {
        sqlx::query("INSERT INTO settings (id) VALUES (1) ON CONFLICT (id) DO NOTHING")
            .execute(&self.db)
            .await
            .context("create default settings")?;
        sqlx::query_as::<_, UserSettings>(&format!(
            "UPDATE settings SET \
                name = COALESCE($1, name), \
                program = COALESCE($2, program), \
                calorie_target = COALESCE($3, calorie_target), \
                protein_target = COALESCE($4, protein_target), \
                carbs_target = COALESCE($5, carbs_target), \
                fat_target = COALESCE($6, fat_target), \
                current_weight = COALESCE($7, current_weight), \
                goal_weight = COALESCE($8, goal_weight), \
                theme = COALESCE($9, theme), \
                notifications = COALESCE($10, notifications), \
                weekly_burn_goal = COALESCE($11, weekly_burn_goal), \
                water_goal = COALESCE($12, water_goal), \
                updated_at = now() \
             WHERE id = 1 \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&patch.name)
        .bind(&patch.program)
        .bind(patch.calorie_target)
        .bind(patch.protein_target)
        .bind(patch.carbs_target)
        .bind(patch.fat_target)
        .bind(patch.current_weight)
        .bind(patch.goal_weight)
        .bind(&patch.theme)
        .bind(patch.notifications)
        .bind(patch.weekly_burn_goal)
        .bind(patch.water_goal)
        .fetch_one(&self.db)
        .await
        .context("update settings")
    }

    async fn clear(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM settings")
            .execute(&self.db)
            .await
            .context("clear settings")?;
        Ok(())
    }
}
