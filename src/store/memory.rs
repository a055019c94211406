use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DateFilter, EventStore, SettingsStore};
use crate::activity::dto::Activity;
use crate::meals::dto::Meal;
use crate::settings::dto::{UserSettings, ValidSettingsPatch};
use crate::todos::dto::{Task, TaskPatch};
use crate::water::dto::WaterEntry;
use crate::weight::dto::WeightSample;

#[derive(Default)]
struct Collections {
    meals: Vec<Meal>,
    weights: Vec<WeightSample>,
    activities: Vec<Activity>,
    water: Vec<WaterEntry>,
    tasks: Vec<Task>,
    settings: Option<UserSettings>,
}

/// Process-local store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn truncate<T>(mut rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    if let Some(limit) = limit {
        rows.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
    }
    rows
}

fn remove_by<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|r| !matches(r));
    rows.len() != before
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_meals(&self, filter: &DateFilter, limit: Option<i64>) -> anyhow::Result<Vec<Meal>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Meal> = inner
            .meals
            .iter()
            .filter(|m| filter.matches(m.date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(truncate(rows, limit))
    }

    async fn insert_meal(&self, meal: Meal) -> anyhow::Result<Meal> {
        self.inner.write().await.meals.push(meal.clone());
        Ok(meal)
    }

    async fn delete_meal(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(remove_by(&mut self.inner.write().await.meals, |m| m.id == id))
    }

    async fn find_weights(&self, limit: i64) -> anyhow::Result<Vec<WeightSample>> {
        let mut rows = self.inner.read().await.weights.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.timestamp.cmp(&a.timestamp)));
        Ok(truncate(rows, Some(limit)))
    }

    async fn insert_weight(&self, sample: WeightSample) -> anyhow::Result<WeightSample> {
        self.inner.write().await.weights.push(sample.clone());
        Ok(sample)
    }

    async fn delete_weight(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(remove_by(&mut self.inner.write().await.weights, |w| w.id == id))
    }

    async fn find_activities(
        &self,
        filter: &DateFilter,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Activity>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Activity> = inner
            .activities
            .iter()
            .filter(|a| filter.matches(a.date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(truncate(rows, limit))
    }

    async fn insert_activity(&self, activity: Activity) -> anyhow::Result<Activity> {
        self.inner.write().await.activities.push(activity.clone());
        Ok(activity)
    }

    async fn delete_activity(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(remove_by(&mut self.inner.write().await.activities, |a| a.id == id))
    }

    async fn find_water(&self, filter: &DateFilter) -> anyhow::Result<Vec<WaterEntry>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<WaterEntry> = inner
            .water
            .iter()
            .filter(|w| filter.matches(w.date))
            .cloned()
            .collect();
        rows.sort_by_key(|w| w.timestamp);
        Ok(rows)
    }

    async fn insert_water(&self, entry: WaterEntry) -> anyhow::Result<WaterEntry> {
        self.inner.write().await.water.push(entry.clone());
        Ok(entry)
    }

    async fn delete_water(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(remove_by(&mut self.inner.write().await.water, |w| w.id == id))
    }

    async fn find_tasks(&self, filter: &DateFilter) -> anyhow::Result<Vec<Task>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| filter.matches(t.date))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.timestamp);
        Ok(rows)
    }

    async fn insert_task(&self, task: Task) -> anyhow::Result<Task> {
        self.inner.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        let mut inner = self.inner.write().await;
        Ok(inner.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            patch.apply(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(remove_by(&mut self.inner.write().await.tasks, |t| t.id == id))
    }

    async fn reset(&self) -> anyhow::Result<()> {
        *self.inner.write().await = Collections::default();
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_or_create_default(&self) -> anyhow::Result<UserSettings> {
        let mut inner = self.inner.write().await;
        Ok(inner.settings.get_or_insert_with(UserSettings::default).clone())
    }

    async fn upsert(&self, patch: &ValidSettingsPatch) -> anyhow::Result<UserSettings> {
        let mut inner = self.inner.write().await;
        let settings = inner.settings.get_or_insert_with(UserSettings::default);
        patch.apply(settings);
        Ok(settings.clone())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.inner.write().await.settings = None;
        Ok(())
    }
}

#[cfg(test)]
mod memory_tests {
    use super::*;
    use crate::calendar::CalendarDate;
    use crate::todos::dto::TaskStatus;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn meal_at(date: &str, ts: OffsetDateTime) -> Meal {
        Meal {
            id: Uuid::new_v4(),
            meal_name: "m".into(),
            calories: 100,
            protein: 1.0,
            carbs: 1.0,
            fat: 1.0,
            image_path: None,
            analysis_raw: None,
            date: date.parse().unwrap(),
            timestamp: ts,
        }
    }

    #[tokio::test]
    async fn meals_newest_first_with_limit() {
        let store = MemoryStore::new();
        let early = store
            .insert_meal(meal_at("2024-01-01", datetime!(2024-01-01 08:00 UTC)))
            .await
            .unwrap();
        let late = store
            .insert_meal(meal_at("2024-01-01", datetime!(2024-01-01 19:00 UTC)))
            .await
            .unwrap();
        store
            .insert_meal(meal_at("2024-01-02", datetime!(2024-01-02 08:00 UTC)))
            .await
            .unwrap();

        let day: CalendarDate = "2024-01-01".parse().unwrap();
        let rows = store.find_meals(&DateFilter::On(day), None).await.unwrap();
        assert_eq!(rows, vec![late.clone(), early]);

        let limited = store.find_meals(&DateFilter::Any, Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].date.to_string(), "2024-01-02");
    }

    #[tokio::test]
    async fn delete_reports_missing_ids() {
        let store = MemoryStore::new();
        let meal = store
            .insert_meal(meal_at("2024-01-01", datetime!(2024-01-01 08:00 UTC)))
            .await
            .unwrap();
        assert!(store.delete_meal(meal.id).await.unwrap());
        assert!(!store.delete_meal(meal.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_task_in_place() {
        let store = MemoryStore::new();
        let task = Task {
            id: Uuid::new_v4(),
            text: "Walk".into(),
            status: TaskStatus::Pending,
            notes: String::new(),
            date: "2024-01-01".parse().unwrap(),
            timestamp: datetime!(2024-01-01 08:00 UTC),
        };
        store.insert_task(task.clone()).await.unwrap();
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let updated = store.update_task(task.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(store.update_task(Uuid::new_v4(), &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_singleton_is_created_once() {
        let store = MemoryStore::new();
        let first = store.get_or_create_default().await.unwrap();
        let second = store.get_or_create_default().await.unwrap();
        assert_eq!(first, second);

        let patch = ValidSettingsPatch {
            water_goal: Some(2500),
            ..Default::default()
        };
        let updated = store.upsert(&patch).await.unwrap();
        assert_eq!(updated.water_goal, 2500);
        assert_eq!(store.get_or_create_default().await.unwrap().water_goal, 2500);

        store.clear().await.unwrap();
        assert_eq!(store.get_or_create_default().await.unwrap().water_goal, 3000);
    }

    #[tokio::test]
    async fn reset_drops_events_and_settings_together() {
        let store = MemoryStore::new();
        store
            .insert_meal(meal_at("2024-01-01", datetime!(2024-01-01 08:00 UTC)))
            .await
            .unwrap();
        let patch = ValidSettingsPatch {
            name: Some("Sam".into()),
            ..Default::default()
        };
        store.upsert(&patch).await.unwrap();

        store.reset().await.unwrap();

        assert!(store.find_meals(&DateFilter::Any, None).await.unwrap().is_empty());
        assert_eq!(store.get_or_create_default().await.unwrap().name, "Athlete");
    }
}
