//! Conversions between store records and view models.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::models::{completion_from_wire, Category, Priority, Task, TaskForm, DEFAULT_CATEGORY_COLOR};
use crate::store::{record_id, wire_timestamp, Record, ID_FIELD};

fn text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn first_text<'a>(record: &'a Record, fields: &[&str]) -> Option<&'a str> {
    fields.iter().find_map(|f| text(record, f))
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Accepts `YYYY-MM-DD` or a full timestamp.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|at| at.date_naive()))
}

/// Missing text becomes empty, missing priority `Medium`, missing completion
/// `false`, and missing timestamps `now`.
pub fn task_from_record(record: &Record, now: DateTime<Utc>) -> Task {
    Task {
        id: record_id(record).unwrap_or_default(),
        title: first_text(record, &["title", "Name"]).unwrap_or_default().to_string(),
        description: text(record, "description").unwrap_or_default().to_string(),
        due_date: text(record, "due_date").and_then(parse_due_date),
        priority: Priority::coerce(text(record, "priority")),
        category_id: text(record, "category").map(String::from),
        is_completed: text(record, "is_completed").is_some_and(completion_from_wire),
        created_at: first_text(record, &["created_at", "CreatedOn"])
            .and_then(parse_instant)
            .unwrap_or(now),
        updated_at: first_text(record, &["updated_at", "ModifiedOn"])
            .and_then(parse_instant)
            .unwrap_or(now),
        tags: text(record, "Tags").unwrap_or_default().to_string(),
        owner: text(record, "Owner").unwrap_or_default().to_string(),
    }
}

/// Copies the editable fields of an updated record onto `task`.
pub fn merge_edit(task: &mut Task, record: &Record, now: DateTime<Utc>) {
    let updated = task_from_record(record, now);
    task.title = updated.title;
    task.description = updated.description;
    task.due_date = updated.due_date;
    task.priority = updated.priority;
    task.category_id = updated.category_id;
    task.updated_at = updated.updated_at;
}

pub fn category_from_record(record: &Record) -> Category {
    Category {
        id: record_id(record).unwrap_or_default(),
        name: text(record, "Name").unwrap_or_default().to_string(),
        color: text(record, "color").unwrap_or(DEFAULT_CATEGORY_COLOR).to_string(),
        task_count: 0,
    }
}

fn due_date_value(form: &TaskForm) -> Value {
    form.due_date
        .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
        .unwrap_or_else(|| Value::String(String::new()))
}

fn to_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

pub fn new_task_record(form: &TaskForm, owner: &str, now: DateTime<Utc>) -> Record {
    let title = form.title.trim();
    to_record(json!({
        "Name": title,
        "title": title,
        "description": form.description,
        "due_date": due_date_value(form),
        "priority": form.priority.as_str(),
        "category": form.category_id.clone().unwrap_or_default(),
        "is_completed": false,
        "created_at": wire_timestamp(now),
        "updated_at": wire_timestamp(now),
        "Tags": "",
        "Owner": owner,
    }))
}

pub fn edit_task_record(id: &str, form: &TaskForm, now: DateTime<Utc>) -> Record {
    let title = form.title.trim();
    to_record(json!({
        ID_FIELD: id,
        "Name": title,
        "title": title,
        "description": form.description,
        "due_date": due_date_value(form),
        "priority": form.priority.as_str(),
        "category": form.category_id.clone().unwrap_or_default(),
        "updated_at": wire_timestamp(now),
    }))
}

pub fn completion_record(id: &str, completed: bool, now: DateTime<Utc>) -> Record {
    to_record(json!({
        ID_FIELD: id,
        "is_completed": completed,
        "updated_at": wire_timestamp(now),
    }))
}

pub fn new_category_record(name: &str, color: &str, owner: &str) -> Record {
    to_record(json!({
        "Name": name.trim(),
        "color": color,
        "Owner": owner,
    }))
}
