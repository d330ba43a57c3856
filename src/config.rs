use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TaskdeckError;

pub const PROJECT_ENV: &str = "TASKDECK_PROJECT_ID";
pub const TASK_PAGE_SIZE_ENV: &str = "TASKDECK_TASK_PAGE_SIZE";
pub const CATEGORY_PAGE_SIZE_ENV: &str = "TASKDECK_CATEGORY_PAGE_SIZE";

/// Workspace settings stored in `config.json`. Every key is optional in the
/// file; environment variables win over the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project_id: String,
    pub task_page_size: usize,
    pub category_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: "default".to_string(),
            task_page_size: 50,
            category_page_size: 20,
        }
    }
}

impl Config {
    /// Reads `path` (defaults when absent) and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, TaskdeckError> {
        let config = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                TaskdeckError::config(format!("Invalid config {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(TaskdeckError::config(e.to_string())),
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    pub fn save(&self, path: &Path) -> Result<(), TaskdeckError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| TaskdeckError::config(e.to_string()))
    }

    fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TaskdeckError> {
        if let Some(project) = lookup(PROJECT_ENV).filter(|p| !p.trim().is_empty()) {
            self.project_id = project;
        }
        if let Some(size) = lookup(TASK_PAGE_SIZE_ENV) {
            self.task_page_size = parse_page_size(TASK_PAGE_SIZE_ENV, &size)?;
        }
        if let Some(size) = lookup(CATEGORY_PAGE_SIZE_ENV) {
            self.category_page_size = parse_page_size(CATEGORY_PAGE_SIZE_ENV, &size)?;
        }
        Ok(self)
    }
}

fn parse_page_size(key: &str, value: &str) -> Result<usize, TaskdeckError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(TaskdeckError::config(format!(
            "{key} must be a positive integer, got '{value}'"
        ))),
    }
}
