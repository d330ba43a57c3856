use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    All,
    Completed,
    Pending,
    Today,
    Overdue,
}

impl FilterMode {
    pub const ALL: [FilterMode; 5] = [
        Self::All,
        Self::Pending,
        Self::Completed,
        Self::Today,
        Self::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Today => "today",
            Self::Overdue => "overdue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "completed" => Some(Self::Completed),
            "pending" => Some(Self::Pending),
            "today" => Some(Self::Today),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    /// A due date counts from the start of its day, so an open task due
    /// today is overdue as soon as `now` is past midnight.
    pub fn accepts(&self, task: &Task, now: NaiveDateTime) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed,
            Self::Pending => !task.is_completed,
            Self::Today => task.due_date == Some(now.date()),
            Self::Overdue => {
                !task.is_completed
                    && task.due_date.is_some_and(|due| due.and_time(NaiveTime::MIN) < now)
            }
        }
    }
}

/// Tasks to display: the category selection narrows first, then the mode.
pub fn visible_tasks<'a>(
    tasks: &'a [Task],
    category: Option<&str>,
    mode: FilterMode,
    now: NaiveDateTime,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| category.map_or(true, |c| t.category_id.as_deref() == Some(c)))
        .filter(|t| mode.accepts(t, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::{NaiveDate, Utc};
    use rstest::rstest;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn task(id: &str, due: Option<&str>, done: bool, category: Option<&str>) -> Task {
        Task {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            due_date: due.map(day),
            priority: Priority::Medium,
            category_id: category.map(String::from),
            is_completed: done,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            tags: String::new(),
            owner: String::new(),
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("past-open", Some("2026-10-01"), false, Some("work")),
            task("past-done", Some("2026-10-01"), true, Some("work")),
            task("today-open", Some("2026-10-19"), false, Some("home")),
            task("today-done", Some("2026-10-19"), true, None),
            task("future", Some("2026-11-01"), false, Some("work")),
            task("undated", None, false, None),
        ]
    }

    fn ids(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[rstest]
    #[case(FilterMode::All, vec!["past-open", "past-done", "today-open", "today-done", "future", "undated"])]
    #[case(FilterMode::Completed, vec!["past-done", "today-done"])]
    #[case(FilterMode::Pending, vec!["past-open", "today-open", "future", "undated"])]
    #[case(FilterMode::Today, vec!["today-open", "today-done"])]
    #[case(FilterMode::Overdue, vec!["past-open", "today-open"])]
    fn test_modes(#[case] mode: FilterMode, #[case] expected: Vec<&str>) {
        let tasks = sample();
        assert_eq!(ids(visible_tasks(&tasks, None, mode, at("2026-10-19 09:00"))), expected);
    }

    #[test]
    fn test_due_today_is_not_overdue_at_midnight() {
        let tasks = sample();
        let midnight = at("2026-10-19 00:00");
        assert_eq!(
            ids(visible_tasks(&tasks, None, FilterMode::Overdue, midnight)),
            ["past-open"]
        );
        assert_eq!(
            ids(visible_tasks(&tasks, None, FilterMode::Today, midnight)),
            ["today-open", "today-done"]
        );
    }

    #[test]
    fn test_category_applies_before_mode() {
        let tasks = sample();
        let now = at("2026-10-19 09:00");
        assert_eq!(
            ids(visible_tasks(&tasks, Some("work"), FilterMode::Pending, now)),
            ["past-open", "future"]
        );
        assert!(visible_tasks(&tasks, Some("missing"), FilterMode::All, now).is_empty());
    }

    #[test]
    fn test_overdue_never_includes_completed() {
        let tasks = sample();
        for now in ["2026-09-01 12:00", "2026-10-19 12:00", "2027-01-01 12:00"] {
            let overdue = visible_tasks(&tasks, None, FilterMode::Overdue, at(now));
            assert!(overdue.iter().all(|t| !t.is_completed));
        }
    }

    #[test]
    fn test_mode_names() {
        for mode in FilterMode::ALL {
            assert_eq!(FilterMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(FilterMode::from_str("soon"), None);
    }
}
