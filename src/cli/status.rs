use serde_json::json;

use crate::auth::Location;
use crate::cli::{report, with_workspace};
use crate::error::TaskdeckError;
use crate::output;

pub fn run(location: &Location, json_output: bool) -> i32 {
    report(run_inner(location, json_output), json_output)
}

fn run_inner(location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    with_workspace(location, |ws| {
        let stats = ws.stats();
        let notifications = ws.drain_notifications();
        if json_output {
            let categories: Vec<_> = ws
                .categories()
                .iter()
                .map(output::json::category_json)
                .collect();
            let user = ws.user().map(output::json::user_json);
            output::json::print(&output::json::success_with_notifications(
                json!({
                    "user": user,
                    "tasks_state": ws.tasks_state(),
                    "stats": output::json::stats_json(&stats),
                    "categories": categories
                }),
                &notifications,
            ));
        } else {
            output::text::print_notifications(&notifications);
            if let Some(user) = ws.user() {
                println!("Signed in as {}", user.display_name());
            }
            output::text::print_stats(&stats);
            println!("\nCategories:");
            output::text::print_category_list(ws.categories());
        }
        Ok(0)
    })
}
