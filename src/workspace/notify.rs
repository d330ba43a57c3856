use serde::Serialize;

use crate::error::{ErrorCode, TaskdeckError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A message meant for the user, queued until the caller drains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    #[serde(skip)]
    pub code: Option<ErrorCode>,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
            code: None,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// The error this notification reports, if it is one.
    pub fn to_error(&self) -> Option<TaskdeckError> {
        self.code.map(|code| TaskdeckError::new(code, self.message.clone()))
    }
}
