//! Study planner data models

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Kind of study block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    #[default]
    Review,
    Study,
    Practice,
    Reading,
    Exam,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A task scheduled on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerTask {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: Priority,
    /// Date key (YYYY-MM-DD)
    pub day: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// Planned length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl PlannerTask {
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Planner ordering: day, then start time with untimed tasks last, then creation time
///
/// The id is a final tie-break so the order is total even for records
/// created in the same instant.
pub fn task_order(a: &PlannerTask, b: &PlannerTask) -> Ordering {
    a.day
        .cmp(&b.day)
        .then_with(|| match (a.start_time, b.start_time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Request to create a new task, as entered by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub topic: String,
    /// Date of the task (YYYY-MM-DD)
    pub day: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Start time (HH:MM)
    #[serde(default)]
    pub start_time: Option<String>,
    /// End time (HH:MM)
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

impl CreateTaskRequest {
    pub fn new(topic: impl Into<String>, day: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            day: day.into(),
            ..Self::default()
        }
    }

    /// Check required fields, parse dates and times, and fill in defaults
    pub fn validate(self) -> Result<NewTask> {
        let topic = self.topic.trim().to_string();
        if topic.is_empty() {
            return Err(CoreError::Validation("topic is required".to_string()));
        }

        let day_str = self.day.trim();
        if day_str.is_empty() {
            return Err(CoreError::Validation("day is required".to_string()));
        }
        let day = NaiveDate::parse_from_str(day_str, "%Y-%m-%d")
            .map_err(|e| CoreError::Validation(format!("Invalid day '{}': {}", day_str, e)))?;

        let start_time = parse_time("startTime", self.start_time.as_deref())?;
        let end_time = parse_time("endTime", self.end_time.as_deref())?;
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end < start {
                return Err(CoreError::Validation(format!(
                    "endTime {} is before startTime {}",
                    end.format("%H:%M"),
                    start.format("%H:%M")
                )));
            }
        }

        Ok(NewTask {
            course_id: non_empty(self.course_id),
            topic,
            description: non_empty(self.description),
            task_type: self.task_type.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            day,
            start_time,
            end_time,
            duration: self.duration,
            completed: false,
        })
    }
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<NaiveTime>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveTime::parse_from_str(v, "%H:%M")
            .map(Some)
            .map_err(|e| CoreError::Validation(format!("Invalid {} '{}': {}", field, v, e))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A validated task ready to insert; the store assigns `id` and `createdAt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub course_id: Option<String>,
    pub topic: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub priority: Priority,
    pub day: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub duration: Option<u32>,
    pub completed: bool,
}

impl NewTask {
    pub fn into_task(self, id: String, created_at: DateTime<Utc>) -> PlannerTask {
        PlannerTask {
            id,
            course_id: self.course_id,
            topic: self.topic,
            description: self.description,
            task_type: self.task_type,
            priority: self.priority,
            day: self.day,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            completed: self.completed,
            created_at,
        }
    }
}

/// Partial update of a task; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}
