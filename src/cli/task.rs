use chrono::{Local, NaiveDate};
use serde_json::json;

use crate::auth::Location;
use crate::cli::commands::TaskCommands;
use crate::cli::{failure, print_outcome, report, with_workspace, CliWorkspace};
use crate::error::TaskdeckError;
use crate::models::{Priority, Task};
use crate::output;
use crate::workspace::{FilterMode, LoadState};

pub fn run(cmd: TaskCommands, location: &Location, json_output: bool) -> i32 {
    let result = match cmd {
        TaskCommands::Add {
            title,
            description,
            due,
            priority,
            category,
        } => run_add(title, description, due, priority, category, location, json_output),
        TaskCommands::List { filter, category } => {
            run_list(&filter, category.as_deref(), location, json_output)
        }
        TaskCommands::Show { id } => run_show(&id, location, json_output),
        TaskCommands::Edit {
            id,
            title,
            description,
            due,
            priority,
            category,
        } => run_edit(
            &id,
            EditArgs {
                title,
                description,
                due,
                priority,
                category,
            },
            location,
            json_output,
        ),
        TaskCommands::Toggle { id } => run_toggle(&id, location, json_output),
        TaskCommands::Delete { id } => run_delete(&id, location, json_output),
        TaskCommands::Search { term } => run_search(&term, location, json_output),
    };
    report(result, json_output)
}

/// Empty input means "no due date".
fn parse_due(value: &str) -> Result<Option<NaiveDate>, TaskdeckError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| TaskdeckError::validation(format!("Invalid due date '{value}'. Use YYYY-MM-DD.")))
}

/// Empty input means "no category".
fn resolve_category_arg(
    ws: &CliWorkspace<'_>,
    reference: &str,
) -> Result<Option<String>, TaskdeckError> {
    if reference.trim().is_empty() {
        return Ok(None);
    }
    ws.resolve_category(reference).map(|c| Some(c.id.clone()))
}

fn ensure_tasks_loaded(ws: &CliWorkspace<'_>) -> Result<(), TaskdeckError> {
    if ws.tasks_state() == LoadState::LoadFailed {
        return Err(failure(ws));
    }
    Ok(())
}

fn run_add(
    title: String,
    description: Option<String>,
    due: Option<String>,
    priority: Option<String>,
    category: Option<String>,
    location: &Location,
    json_output: bool,
) -> Result<i32, TaskdeckError> {
    let due_date = due.as_deref().map(parse_due).transpose()?.flatten();
    with_workspace(location, |ws| {
        let category_id = match category.as_deref() {
            Some(reference) => resolve_category_arg(ws, reference)?,
            None => None,
        };
        let form = ws.form_mut();
        form.title = title;
        form.description = description.unwrap_or_default();
        form.due_date = due_date;
        form.priority = Priority::coerce(priority.as_deref());
        form.category_id = category_id;

        let Some(task) = ws.create_task() else {
            return Err(failure(ws));
        };
        Ok(print_outcome(
            ws,
            json!({ "task": output::json::task_json(&task) }),
            json_output,
            || println!("Added task: {} ({})", task.title, task.id),
        ))
    })
}

fn run_list(
    filter: &str,
    category: Option<&str>,
    location: &Location,
    json_output: bool,
) -> Result<i32, TaskdeckError> {
    let mode = FilterMode::from_str(filter).ok_or_else(|| {
        let known: Vec<&str> = FilterMode::ALL.iter().map(|m| m.as_str()).collect();
        TaskdeckError::validation(format!(
            "Unknown filter '{filter}'. Expected one of: {}",
            known.join(", ")
        ))
    })?;
    with_workspace(location, |ws| {
        ensure_tasks_loaded(ws)?;
        if let Some(reference) = category {
            let id = ws.resolve_category(reference)?.id.clone();
            ws.select_category(Some(id));
        }
        ws.set_filter(mode);

        let visible: Vec<Task> = ws
            .visible_tasks(Local::now().naive_local())
            .into_iter()
            .cloned()
            .collect();
        let tasks: Vec<_> = visible.iter().map(output::json::task_json).collect();
        let data = json!({
            "filter": mode.as_str(),
            "category": ws.selected_category(),
            "tasks": tasks,
            "stats": output::json::stats_json(&ws.stats())
        });
        Ok(print_outcome(ws, data, json_output, || {
            let refs: Vec<_> = visible.iter().collect();
            output::text::print_task_list(&refs);
        }))
    })
}

fn run_show(id: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        ensure_tasks_loaded(ws)?;
        let task = ws.resolve_task(id)?.clone();
        let category = task
            .category_id
            .as_deref()
            .and_then(|c| ws.category(c))
            .cloned();
        let data = json!({
            "task": output::json::task_json(&task),
            "category": category.as_ref().map(output::json::category_json)
        });
        Ok(print_outcome(ws, data, json_output, || {
            output::text::print_task(&task, category.as_ref())
        }))
    })
}

struct EditArgs {
    title: Option<String>,
    description: Option<String>,
    due: Option<String>,
    priority: Option<String>,
    category: Option<String>,
}

fn run_edit(
    id: &str,
    args: EditArgs,
    location: &Location,
    json_output: bool,
) -> Result<i32, TaskdeckError> {
    let due_date = args.due.as_deref().map(parse_due).transpose()?;
    with_workspace(location, |ws| {
        ensure_tasks_loaded(ws)?;
        let task_id = ws.resolve_task(id)?.id.clone();
        let category_id = match args.category.as_deref() {
            Some(reference) => Some(resolve_category_arg(ws, reference)?),
            None => None,
        };

        let saved = ws.edit_task(&task_id, |form| {
            if let Some(title) = args.title {
                form.title = title;
            }
            if let Some(description) = args.description {
                form.description = description;
            }
            if let Some(due_date) = due_date {
                form.due_date = due_date;
            }
            if let Some(priority) = args.priority.as_deref() {
                form.priority = Priority::coerce(Some(priority));
            }
            if let Some(category_id) = category_id {
                form.category_id = category_id;
            }
        });
        if !saved {
            return Err(failure(ws));
        }
        let task = ws.resolve_task(&task_id)?.clone();
        Ok(print_outcome(
            ws,
            json!({ "task": output::json::task_json(&task) }),
            json_output,
            || println!("Updated task: {} ({})", task.title, task.id),
        ))
    })
}

fn run_toggle(id: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        ensure_tasks_loaded(ws)?;
        let task_id = ws.resolve_task(id)?.id.clone();
        if !ws.toggle_completion(&task_id) {
            return Err(failure(ws));
        }
        let task = ws.resolve_task(&task_id)?.clone();
        Ok(print_outcome(
            ws,
            json!({ "task": output::json::task_summary(&task) }),
            json_output,
            || {},
        ))
    })
}

fn run_delete(id: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        ensure_tasks_loaded(ws)?;
        let task = ws.resolve_task(id)?.clone();
        if !ws.delete_task(&task.id) {
            return Err(failure(ws));
        }
        Ok(print_outcome(
            ws,
            json!({ "deleted": output::json::task_summary(&task) }),
            json_output,
            || {},
        ))
    })
}

fn run_search(term: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        let raised = ws.notifications().len();
        let found = ws.search_tasks(term);
        if ws.notifications()[raised..].iter().any(|n| n.is_error()) {
            return Err(failure(ws));
        }
        let tasks: Vec<_> = found.iter().map(output::json::task_json).collect();
        let data = json!({
            "term": term,
            "tasks": tasks
        });
        Ok(print_outcome(ws, data, json_output, || {
            let refs: Vec<_> = found.iter().collect();
            output::text::print_task_list(&refs);
        }))
    })
}
