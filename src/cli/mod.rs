pub mod auth;
pub mod category;
pub mod commands;
pub mod init;
pub mod status;
pub mod task;

pub use commands::*;

use tracing::debug;

use crate::auth::{AuthSession, AuthState, Location, SessionFile};
use crate::config::Config;
use crate::db::connection;
use crate::error::{ErrorCode, TaskdeckError};
use crate::models::User;
use crate::output;
use crate::repo::{CategoryRepo, TaskRepo};
use crate::store::SqliteRecordStore;
use crate::workspace::Workspace;

pub type CliWorkspace<'a> = Workspace<&'a SqliteRecordStore>;

/// Turns a runner result into an exit code, printing the error if any.
pub fn report(result: Result<i32, TaskdeckError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                output::json::print(&output::json::error(&e));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

/// Signs in through the workspace session file.
pub fn authenticate(location: &Location) -> Result<(AuthSession, Option<String>), TaskdeckError> {
    let dir = connection::find_workspace_dir()?;
    let provider = SessionFile::new(connection::session_path(&dir));
    let mut session = AuthSession::new();
    let target = session.authenticate(&provider, location)?;
    debug!(state = session.state().as_str(), ?target, "authentication finished");
    Ok((session, target))
}

pub(crate) fn signed_in_user(session: &AuthSession) -> Result<User, TaskdeckError> {
    match session.state() {
        AuthState::Authenticated(user) => Ok(user.clone()),
        AuthState::AuthFailed(reason) => Err(TaskdeckError::new(
            ErrorCode::NotAuthenticated,
            format!("Sign-in failed: {reason}"),
        )),
        _ => Err(TaskdeckError::not_authenticated()),
    }
}

/// Opens the workspace for the signed-in user and runs `f` against it.
pub fn with_workspace<F>(location: &Location, f: F) -> Result<i32, TaskdeckError>
where
    F: FnOnce(&mut CliWorkspace<'_>) -> Result<i32, TaskdeckError>,
{
    let dir = connection::find_workspace_dir()?;
    let config = Config::load(&connection::config_path(&dir))?;
    let (session, _) = authenticate(location)?;
    let user = signed_in_user(&session)?;

    let mut store = SqliteRecordStore::new(connection::open_db(&dir)?, config.project_id.clone())?;
    store.set_actor(Some(user.email_address.clone()));

    let mut workspace = Workspace::new(
        TaskRepo::new(&store).with_page_size(config.task_page_size),
        CategoryRepo::new(&store).with_page_size(config.category_page_size),
    );
    workspace.set_user(Some(user));
    f(&mut workspace)
}

/// The error behind a failed workspace operation.
pub fn failure(workspace: &CliWorkspace<'_>) -> TaskdeckError {
    workspace
        .last_error()
        .unwrap_or_else(|| TaskdeckError::transport("Operation failed"))
}

/// Prints the outcome of a successful mutation.
pub fn print_outcome(
    workspace: &mut CliWorkspace<'_>,
    data: serde_json::Value,
    json_output: bool,
    text: impl FnOnce(),
) -> i32 {
    let notifications = workspace.drain_notifications();
    if json_output {
        output::json::print(&output::json::success_with_notifications(data, &notifications));
    } else {
        output::text::print_notifications(&notifications);
        text();
    }
    0
}
