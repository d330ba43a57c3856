use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::TaskdeckError;

use super::migrations;

/// Name of the per-workspace data directory.
pub const WORKSPACE_DIR: &str = ".taskdeck";

/// Overrides the workspace directory lookup when set.
pub const HOME_ENV: &str = "TASKDECK_HOME";

/// Directory `init` creates: `$TASKDECK_HOME`, or `.taskdeck` under the current directory.
pub fn init_dir() -> Result<PathBuf, TaskdeckError> {
    if let Some(home) = env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    let cwd = env::current_dir().map_err(|e| TaskdeckError::config(e.to_string()))?;
    Ok(cwd.join(WORKSPACE_DIR))
}

/// Find the workspace directory: `$TASKDECK_HOME`, or the nearest `.taskdeck`
/// walking up from the current directory.
pub fn find_workspace_dir() -> Result<PathBuf, TaskdeckError> {
    if let Some(home) = env::var_os(HOME_ENV) {
        let home = PathBuf::from(home);
        return if db_path(&home).exists() {
            Ok(home)
        } else {
            Err(TaskdeckError::not_initialized())
        };
    }
    let mut dir = env::current_dir().map_err(|e| TaskdeckError::config(e.to_string()))?;
    loop {
        let candidate = dir.join(WORKSPACE_DIR);
        if db_path(&candidate).exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            return Err(TaskdeckError::not_initialized());
        }
    }
}

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join("taskdeck.db")
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join("config.json")
}

pub fn session_path(workspace: &Path) -> PathBuf {
    workspace.join("session.json")
}

/// Open a connection to the workspace database. Returns error if not initialized.
pub fn open_db(workspace: &Path) -> Result<Connection, TaskdeckError> {
    let path = db_path(workspace);
    if !path.exists() {
        return Err(TaskdeckError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the workspace: create the directory, database, and run migrations.
pub fn init_db(workspace: &Path) -> Result<PathBuf, TaskdeckError> {
    fs::create_dir_all(workspace).map_err(|e| TaskdeckError::config(e.to_string()))?;
    let path = db_path(workspace);
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

fn configure_connection(conn: &Connection) -> Result<(), TaskdeckError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}
