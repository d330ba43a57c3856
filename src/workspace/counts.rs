use std::collections::HashMap;

use crate::models::{Category, Task};

/// Open (not completed) tasks per category, in category order.
pub fn open_task_counts(tasks: &[Task], categories: &[Category]) -> Vec<usize> {
    let mut per_category: HashMap<&str, usize> = HashMap::new();
    for task in tasks.iter().filter(|t| !t.is_completed) {
        if let Some(id) = task.category_id.as_deref() {
            *per_category.entry(id).or_default() += 1;
        }
    }
    categories
        .iter()
        .map(|c| per_category.get(c.id.as_str()).copied().unwrap_or(0))
        .collect()
}

/// Writes fresh counts into `categories`. Returns whether anything changed.
pub fn apply_counts(categories: &mut [Category], tasks: &[Task]) -> bool {
    let counts = open_task_counts(tasks, categories);
    let mut changed = false;
    for (category, count) in categories.iter_mut().zip(counts) {
        if category.task_count != count {
            category.task_count = count;
            changed = true;
        }
    }
    changed
}
