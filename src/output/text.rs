use crate::models::{Category, Task};
use crate::workspace::{Level, Notification, TaskStats};

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn print_task(t: &Task, category: Option<&Category>) {
    println!("Task: {} ({})", t.title, t.id);
    if !t.description.is_empty() {
        println!("  Description: {}", t.description);
    }
    println!(
        "  Status: {}",
        if t.is_completed { "completed" } else { "pending" }
    );
    println!("  Priority: {}", t.priority.as_str());
    if let Some(due) = t.due_date {
        println!("  Due: {due}");
    }
    match (category, t.category_id.as_deref()) {
        (Some(c), _) => println!("  Category: {} ({})", c.name, c.id),
        (None, Some(id)) => println!("  Category: {id} (missing)"),
        (None, None) => {}
    }
    println!("  Created: {}", t.created_at.to_rfc3339());
    println!("  Updated: {}", t.updated_at.to_rfc3339());
}

pub fn print_task_list(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let due = t
            .due_date
            .map(|d| format!(" due {d}"))
            .unwrap_or_default();
        println!(
            "  [{}] {} ({}) {}{}",
            if t.is_completed { "x" } else { " " },
            t.title,
            short_id(&t.id),
            t.priority.as_str(),
            due
        );
    }
}

pub fn print_category_list(categories: &[Category]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }
    for c in categories {
        println!("  {} ({}) {} open={}", c.name, c.id, c.color, c.task_count);
    }
}

pub fn print_stats(s: &TaskStats) {
    println!("Progress: {}% ({}/{})", s.completion_percent, s.completed, s.total);
    println!("  completed={} pending={}", s.completed, s.pending);
}

/// Success messages go to stdout, errors to stderr.
pub fn print_notifications(notifications: &[Notification]) {
    for n in notifications {
        match n.level {
            Level::Success => println!("{}", n.message),
            Level::Error => eprintln!("Error: {}", n.message),
        }
    }
}
