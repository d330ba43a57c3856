use serde_json::{json, Value};

use crate::error::TaskdeckError;
use crate::models::{Category, Task, User};
use crate::workspace::{Notification, TaskStats};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

/// Success envelope that also carries the notifications the command raised.
pub fn success_with_notifications(data: Value, notifications: &[Notification]) -> Value {
    json!({
        "success": true,
        "data": data,
        "notifications": notifications
    })
}

pub fn error(err: &TaskdeckError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn print(value: &Value) {
    println!("{value:#}");
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "due_date": t.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        "priority": t.priority.as_str(),
        "category_id": t.category_id,
        "is_completed": t.is_completed,
        "created_at": t.created_at.to_rfc3339(),
        "updated_at": t.updated_at.to_rfc3339()
    })
}

pub fn task_summary(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "priority": t.priority.as_str(),
        "is_completed": t.is_completed
    })
}

pub fn category_json(c: &Category) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "color": c.color,
        "task_count": c.task_count
    })
}

pub fn stats_json(s: &TaskStats) -> Value {
    json!({
        "total": s.total,
        "completed": s.completed,
        "pending": s.pending,
        "completion_percent": s.completion_percent
    })
}

pub fn user_json(u: &User) -> Value {
    json!({
        "email": u.email_address,
        "first_name": u.first_name,
        "last_name": u.last_name,
        "display_name": u.display_name()
    })
}
