use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::calendar::CalendarDate;
use crate::error::AppResult;
use crate::validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    /// Done in part; `notes` usually says how much.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub text: String,
    pub status: TaskStatus,
    pub notes: String,
    pub date: CalendarDate,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub text: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

impl NewTask {
    pub fn into_record(self) -> AppResult<Task> {
        let (date, timestamp) = validate::stamp(self.date, self.timestamp);
        Ok(Task {
            id: Uuid::new_v4(),
            text: validate::non_empty("text", &self.text)?,
            status: self.status,
            notes: self.notes.trim().to_string(),
            date,
            timestamp,
        })
    }
}

/// In-place edit of a task. Absent fields are left untouched.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub status: Option<TaskStatus>,
    pub notes: Option<String>,
}

impl TaskPatch {
    pub fn validated(self) -> AppResult<Self> {
        let text = match self.text {
            Some(t) => Some(validate::non_empty("text", &t)?),
            None => None,
        };
        Ok(Self {
            text,
            status: self.status,
            notes: self.notes.map(|n| n.trim().to_string()),
        })
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(text) = &self.text {
            task.text.clone_from(text);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(notes) = &self.notes {
            task.notes.clone_from(notes);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub date: Option<CalendarDate>,
}
