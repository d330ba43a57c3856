use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_COLOR: &str = "#6366f1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Open tasks referencing this category. Derived locally, never persisted.
    pub task_count: usize,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            task_count: 0,
        }
    }
}

/// Shown when the remote category list is unavailable or empty.
pub fn default_categories() -> Vec<Category> {
    vec![
        Category::new("default-1", "Personal", "#3b82f6"),
        Category::new("default-2", "Work", "#8b5cf6"),
        Category::new("default-3", "Shopping", "#10b981"),
        Category::new("default-4", "Health", "#f59e0b"),
    ]
}
