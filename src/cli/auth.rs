use serde_json::json;

use crate::auth::{resolve_navigation, AuthState, Location, SessionFile};
use crate::cli::{authenticate, report, signed_in_user};
use crate::db::connection;
use crate::error::TaskdeckError;
use crate::models::User;
use crate::output;

pub fn login(
    email: &str,
    first_name: Option<String>,
    last_name: Option<String>,
    location: &Location,
    json_output: bool,
) -> i32 {
    report(
        run_login(email, first_name, last_name, location, json_output),
        json_output,
    )
}

pub fn logout(location: &Location, json_output: bool) -> i32 {
    report(run_logout(location, json_output), json_output)
}

pub fn whoami(location: &Location, json_output: bool) -> i32 {
    report(run_whoami(location, json_output), json_output)
}

fn run_login(
    email: &str,
    first_name: Option<String>,
    last_name: Option<String>,
    location: &Location,
    json_output: bool,
) -> Result<i32, TaskdeckError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(TaskdeckError::validation(format!(
            "Invalid email address: '{email}'"
        )));
    }
    let dir = connection::find_workspace_dir()?;
    let user = User {
        email_address: email.to_string(),
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
    };
    SessionFile::new(connection::session_path(&dir)).save(&user)?;

    let (session, target) = authenticate(location)?;
    let user = signed_in_user(&session)?;
    if json_output {
        output::json::print(&output::json::success(json!({
            "user": output::json::user_json(&user),
            "navigate_to": target
        })));
    } else {
        println!("Signed in as {}", user.display_name());
        if let Some(target) = target {
            println!("Continue at {target}");
        }
    }
    Ok(0)
}

fn run_logout(location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    let dir = connection::find_workspace_dir()?;
    let (mut session, _) = authenticate(location)?;
    let target = match session.state().clone() {
        AuthState::Authenticated(_) => session.sign_out(location)?,
        // A broken session file is still removed.
        AuthState::AuthFailed(_) => resolve_navigation(location, false),
        _ => return Err(TaskdeckError::not_authenticated()),
    };
    SessionFile::new(connection::session_path(&dir)).clear()?;

    if json_output {
        output::json::print(&output::json::success(json!({
            "signed_out": true,
            "navigate_to": target
        })));
    } else {
        println!("Signed out");
        println!("Continue at {target}");
    }
    Ok(0)
}

fn run_whoami(location: &Location, json_output: bool) -> Result<i32, TaskdeckError> {
    let (session, target) = authenticate(location)?;
    let user = signed_in_user(&session)?;
    if json_output {
        output::json::print(&output::json::success(json!({
            "user": output::json::user_json(&user),
            "state": session.state().as_str(),
            "navigate_to": target
        })));
    } else {
        println!("{} <{}>", user.display_name(), user.email_address);
    }
    Ok(0)
}
