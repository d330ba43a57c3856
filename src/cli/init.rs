use serde_json::json;
use tracing::info;

use crate::cli::report;
use crate::config::Config;
use crate::db::connection;
use crate::error::TaskdeckError;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    report(run_inner(json_output), json_output)
}

fn run_inner(json_output: bool) -> Result<i32, TaskdeckError> {
    let dir = connection::init_dir()?;
    let db = connection::init_db(&dir)?;
    let config_path = connection::config_path(&dir);
    if !config_path.exists() {
        Config::default().save(&config_path)?;
    }
    info!(path = %dir.display(), "initialized workspace");

    if json_output {
        output::json::print(&output::json::success(json!({
            "path": dir.to_string_lossy(),
            "database": db.to_string_lossy(),
            "config": config_path.to_string_lossy()
        })));
    } else {
        println!("Initialized taskdeck at {}", dir.display());
    }
    Ok(0)
}
