use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::TaskdeckError;
use crate::models::User;

use super::AuthResult;

/// Source of the signed-in user.
pub trait IdentityProvider {
    fn authenticate(&self) -> AuthResult;
}

/// Keeps the signed-in user in a JSON file inside the workspace directory.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save(&self, user: &User) -> Result<(), TaskdeckError> {
        let content = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, content).map_err(|e| TaskdeckError::config(e.to_string()))
    }

    /// Returns whether a session existed.
    pub fn clear(&self) -> Result<bool, TaskdeckError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(TaskdeckError::config(e.to_string())),
        }
    }
}

impl IdentityProvider for SessionFile {
    fn authenticate(&self) -> AuthResult {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return AuthResult::SignedOut,
            Err(e) => return AuthResult::Failed(e.to_string()),
        };
        match serde_json::from_str::<User>(&content) {
            Ok(user) if !user.email_address.trim().is_empty() => AuthResult::SignedIn(user),
            Ok(_) => AuthResult::Failed("Session has no email address".to_string()),
            Err(e) => AuthResult::Failed(format!("Corrupt session file: {e}")),
        }
    }
}
