//! Persistence for the five event collections and the settings singleton.

use async_trait::async_trait;
use uuid::Uuid;

use crate::activity::dto::Activity;
use crate::calendar::CalendarDate;
use crate::meals::dto::Meal;
use crate::settings::dto::{UserSettings, ValidSettingsPatch};
use crate::todos::dto::{Task, TaskPatch};
use crate::water::dto::WaterEntry;
use crate::weight::dto::WeightSample;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which calendar days a query covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    Any,
    On(CalendarDate),
    In(Vec<CalendarDate>),
}

impl DateFilter {
    pub fn matches(&self, date: CalendarDate) -> bool {
        match self {
            DateFilter::Any => true,
            DateFilter::On(d) => *d == date,
            DateFilter::In(days) => days.contains(&date),
        }
    }
}

impl From<Option<CalendarDate>> for DateFilter {
    fn from(date: Option<CalendarDate>) -> Self {
        date.map_or(DateFilter::Any, DateFilter::On)
    }
}

/// Records are written whole (ids are assigned before insert). Deletes report
/// `false` when the id does not exist.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Newest first.
    async fn find_meals(&self, filter: &DateFilter, limit: Option<i64>) -> anyhow::Result<Vec<Meal>>;
    async fn insert_meal(&self, meal: Meal) -> anyhow::Result<Meal>;
    async fn delete_meal(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Latest calendar date first.
    async fn find_weights(&self, limit: i64) -> anyhow::Result<Vec<WeightSample>>;
    async fn insert_weight(&self, sample: WeightSample) -> anyhow::Result<WeightSample>;
    async fn delete_weight(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Newest first.
    async fn find_activities(
        &self,
        filter: &DateFilter,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Activity>>;
    async fn insert_activity(&self, activity: Activity) -> anyhow::Result<Activity>;
    async fn delete_activity(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Oldest first.
    async fn find_water(&self, filter: &DateFilter) -> anyhow::Result<Vec<WaterEntry>>;
    async fn insert_water(&self, entry: WaterEntry) -> anyhow::Result<WaterEntry>;
    async fn delete_water(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Oldest first.
    async fn find_tasks(&self, filter: &DateFilter) -> anyhow::Result<Vec<Task>>;
    async fn insert_task(&self, task: Task) -> anyhow::Result<Task>;
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Removes every event of every kind and the settings record in one step;
    /// the next settings read recreates defaults.
    async fn reset(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the singleton, creating it with defaults on first access.
    async fn get_or_create_default(&self) -> anyhow::Result<UserSettings>;
    async fn upsert(&self, patch: &ValidSettingsPatch) -> anyhow::Result<UserSettings>;
    /// Drops the singleton; the next read recreates defaults.
    async fn clear(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
mod filter_tests {
    use super::*;

    #[test]
    fn filters_match_expected_days() {
        let a: CalendarDate = "2024-01-01".parse().unwrap();
        let b: CalendarDate = "2024-01-02".parse().unwrap();
        assert!(DateFilter::Any.matches(a));
        assert!(DateFilter::On(a).matches(a));
        assert!(!DateFilter::On(a).matches(b));
        assert!(DateFilter::In(vec![a, b]).matches(b));
        assert_eq!(DateFilter::from(None), DateFilter::Any);
        assert_eq!(DateFilter::from(Some(a)), DateFilter::On(a));
    }
}
