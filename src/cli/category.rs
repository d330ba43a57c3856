use serde_json::json;

use crate::auth::Location;
use crate::cli::commands::CategoryCommands;
use crate::cli::{failure, print_outcome, report, with_workspace};
use crate::error::TaskdeckError;
use crate::output;

pub fn run(cmd: CategoryCommands, location: &Location, json_output: bool) -> i32 {
    let result = match cmd {
        CategoryCommands::Add { name, color } => run_add(&name, &color, location, json_output),
        CategoryCommands::List => run_list(location, json_output),
        CategoryCommands::Delete { id } => run_delete(&id, location, json_output),
    };
    report(result, json_output)
}

fn is_hex_color(color: &str) -> bool {
    let digits = color.strip_prefix('#').unwrap_or("");
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

fn run_add(name: &str, color: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    if !is_hex_color(color) {
        return Err(TaskdeckError::validation(format!(
            "Invalid color '{color}'. Use #rgb or #rrggbb."
        )));
    }
    with_workspace(location, |ws| {
        let Some(category) = ws.create_category(name, color) else {
            return Err(failure(ws));
        };
        Ok(print_outcome(
            ws,
            json!({ "category": output::json::category_json(&category) }),
            json_output,
            || println!("Added category: {} ({})", category.name, category.id),
        ))
    })
}

fn run_list(location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        let categories = ws.categories().to_vec();
        let data = json!({
            "categories": categories.iter().map(output::json::category_json).collect::<Vec<_>>(),
            "state": ws.categories_state()
        });
        Ok(print_outcome(ws, data, json_output, || {
            output::text::print_category_list(&categories)
        }))
    })
}

fn run_delete(id: &str, location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        let category = ws.resolve_category(id)?.clone();
        if !ws.delete_category(&category.id) {
            return Err(failure(ws));
        }
        Ok(print_outcome(
            ws,
            json!({ "deleted": output::json::category_json(&category) }),
            json_output,
            || {},
        ))
    })
}
