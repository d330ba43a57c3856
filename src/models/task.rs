use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Wire marker for a completed task. An empty string means "not completed".
pub const COMPLETED_MARKER: &str = "completed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Anything outside the three known values becomes `Medium`.
    pub fn coerce(s: Option<&str>) -> Self {
        s.and_then(Self::from_str).unwrap_or_default()
    }
}

pub fn completion_to_wire(completed: bool) -> &'static str {
    if completed {
        COMPLETED_MARKER
    } else {
        ""
    }
}

pub fn completion_from_wire(value: &str) -> bool {
    !value.is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    /// Weak reference; may point at a category that no longer exists.
    pub category_id: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: String,
    pub owner: String,
}

/// Editable fields of a task, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category_id: Option<String>,
}

impl TaskForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            category_id: task.category_id.clone(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_coerce() {
        assert_eq!(Priority::coerce(Some("low")), Priority::Low);
        assert_eq!(Priority::coerce(Some("high")), Priority::High);
        assert_eq!(Priority::coerce(Some("urgent")), Priority::Medium);
        assert_eq!(Priority::coerce(Some("")), Priority::Medium);
        assert_eq!(Priority::coerce(None), Priority::Medium);
    }

    #[test]
    fn test_completion_marker() {
        assert!(completion_from_wire(completion_to_wire(true)));
        assert!(!completion_from_wire(completion_to_wire(false)));
        assert!(completion_from_wire("completed,archived"));
        assert!(!completion_from_wire(""));
    }

    #[test]
    fn test_form_clear() {
        let mut form = TaskForm::new("Buy milk");
        form.priority = Priority::Low;
        form.clear();
        assert_eq!(form, TaskForm::default());
        assert_eq!(form.priority, Priority::Medium);
    }
}
