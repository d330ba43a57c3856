//! In-memory view of a user's tasks and categories, kept consistent with the
//! record store across every mutation.
//!
//! Every store failure is caught here: it is logged, queued as a user-facing
//! [`Notification`], and leaves local state as it was.

pub mod counts;
pub mod filter;
pub mod mapping;
pub mod notify;

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{ErrorCode, TaskdeckError};
use crate::models::{default_categories, Category, Task, TaskForm, User};
use crate::repo::{BatchOutcome, CategoryRepo, FetchParams, TaskRepo};
use crate::store::RecordStore;

pub use filter::{visible_tasks, FilterMode};
pub use notify::{Level, Notification};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    LoadFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded to the nearest whole percent.
    pub completion_percent: u32,
}

/// Latest request issued for one task. Responses carrying an older ticket
/// are stale and get dropped.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    completion: Option<bool>,
}

/// A completion toggle that has been issued but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub task_id: String,
    pub completed: bool,
    ticket: u64,
}

pub struct Workspace<S> {
    tasks_repo: TaskRepo<S>,
    categories_repo: CategoryRepo<S>,
    user: Option<User>,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    tasks_state: LoadState,
    categories_state: LoadState,
    tasks_revision: u64,
    categories_revision: u64,
    counted_revisions: Option<(u64, u64)>,
    form: TaskForm,
    editing: Option<String>,
    filter: FilterMode,
    selected_category: Option<String>,
    in_flight: HashMap<String, InFlight>,
    next_ticket: u64,
    notifications: Vec<Notification>,
}

impl<S: RecordStore> Workspace<S> {
    pub fn new(tasks_repo: TaskRepo<S>, categories_repo: CategoryRepo<S>) -> Self {
        Self {
            tasks_repo,
            categories_repo,
            user: None,
            tasks: Vec::new(),
            categories: Vec::new(),
            tasks_state: LoadState::Unloaded,
            categories_state: LoadState::Unloaded,
            tasks_revision: 0,
            categories_revision: 0,
            counted_revisions: None,
            form: TaskForm::default(),
            editing: None,
            filter: FilterMode::All,
            selected_category: None,
            in_flight: HashMap::new(),
            next_ticket: 0,
            notifications: Vec::new(),
        }
    }

    /// Signing in loads both collections; signing out discards them.
    pub fn set_user(&mut self, user: Option<User>) {
        let was_signed_in = self.user.is_some();
        let same_user = self.user.as_ref().map(|u| &u.email_address)
            == user.as_ref().map(|u| &u.email_address);
        self.user = user;
        match (was_signed_in, self.user.is_some()) {
            (false, true) => self.reload(),
            (true, true) if !same_user => self.reload(),
            (true, false) => self.discard(),
            _ => {}
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn owner(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.email_address.clone())
            .unwrap_or_default()
    }

    fn reload(&mut self) {
        self.discard();
        self.load_tasks();
        self.load_categories();
    }

    fn discard(&mut self) {
        self.tasks.clear();
        self.categories.clear();
        self.tasks_state = LoadState::Unloaded;
        self.categories_state = LoadState::Unloaded;
        self.in_flight.clear();
        self.editing = None;
        self.form.clear();
        self.selected_category = None;
        self.tasks_changed();
        self.categories_changed();
    }

    /// On failure the task list is emptied and marked as failed.
    pub fn load_tasks(&mut self) -> bool {
        self.tasks_state = LoadState::Loading;
        match self.tasks_repo.fetch(&FetchParams::default()) {
            Ok(page) => {
                let now = Utc::now();
                self.tasks = page
                    .records
                    .iter()
                    .map(|r| mapping::task_from_record(r, now))
                    .collect();
                self.tasks_state = LoadState::Loaded;
                info!(count = self.tasks.len(), total = page.total, "loaded tasks");
                self.tasks_changed();
                true
            }
            Err(e) => {
                error!(error = %e, "failed to load tasks");
                self.tasks.clear();
                self.tasks_state = LoadState::LoadFailed;
                self.tasks_changed();
                self.notify_error(ErrorCode::TransportError, "Failed to load tasks. Please try again.");
                false
            }
        }
    }

    /// Falls back to the default categories when the store has none or
    /// cannot be reached.
    pub fn load_categories(&mut self) -> bool {
        self.categories_state = LoadState::Loading;
        let loaded = match self.categories_repo.fetch(&FetchParams::default()) {
            Ok(page) => {
                let categories: Vec<Category> = page
                    .records
                    .iter()
                    .map(mapping::category_from_record)
                    .collect();
                self.categories_state = LoadState::Loaded;
                if categories.is_empty() {
                    info!("no categories stored, using defaults");
                    self.categories = default_categories();
                } else {
                    info!(count = categories.len(), "loaded categories");
                    self.categories = categories;
                }
                true
            }
            Err(e) => {
                error!(error = %e, "failed to load categories");
                self.categories = default_categories();
                self.categories_state = LoadState::LoadFailed;
                self.notify_error(
                    ErrorCode::TransportError,
                    "Failed to load categories. Using default categories.",
                );
                false
            }
        };
        self.categories_changed();
        loaded
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn tasks_state(&self) -> LoadState {
        self.tasks_state
    }

    pub fn categories_state(&self) -> LoadState {
        self.categories_state
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Exact id first, then a unique id prefix.
    pub fn resolve_task(&self, reference: &str) -> Result<&Task, TaskdeckError> {
        if let Some(task) = self.task(reference) {
            return Ok(task);
        }
        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| !reference.is_empty() && t.id.starts_with(reference))
            .collect();
        match matches.as_slice() {
            [] => Err(TaskdeckError::task_not_found(reference)),
            [task] => Ok(*task),
            _ => {
                let candidates: Vec<String> =
                    matches.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
                Err(TaskdeckError::validation(format!(
                    "Ambiguous reference '{}'. Candidates: {}",
                    reference,
                    candidates.join(", ")
                )))
            }
        }
    }

    /// Exact id, then case-insensitive name, then a unique id prefix.
    pub fn resolve_category(&self, reference: &str) -> Result<&Category, TaskdeckError> {
        if let Some(category) = self.category(reference) {
            return Ok(category);
        }
        if let Some(category) = self
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(reference.trim()))
        {
            return Ok(category);
        }
        let mut prefixed = self
            .categories
            .iter()
            .filter(|c| !reference.is_empty() && c.id.starts_with(reference));
        match (prefixed.next(), prefixed.next()) {
            (Some(category), None) => Ok(category),
            _ => Err(TaskdeckError::category_not_found(reference)),
        }
    }

    pub fn form(&self) -> &TaskForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TaskForm {
        &mut self.form
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    /// Selecting the already-selected category clears the selection.
    pub fn toggle_category(&mut self, id: &str) {
        if self.selected_category.as_deref() == Some(id) {
            self.selected_category = None;
        } else {
            self.selected_category = Some(id.to_string());
        }
    }

    pub fn select_category(&mut self, id: Option<String>) {
        self.selected_category = id;
    }

    pub fn visible_tasks(&self, now: NaiveDateTime) -> Vec<&Task> {
        visible_tasks(&self.tasks, self.selected_category.as_deref(), self.filter, now)
    }

    pub fn stats(&self) -> TaskStats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.is_completed).count();
        let completion_percent = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };
        TaskStats {
            total,
            completed,
            pending: total - completed,
            completion_percent,
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Most recent error notification, as an error.
    pub fn last_error(&self) -> Option<TaskdeckError> {
        self.notifications
            .iter()
            .rev()
            .find(|n| n.is_error())
            .and_then(Notification::to_error)
    }

    fn notify_success(&mut self, message: impl Into<String>) {
        self.notifications.push(Notification::success(message));
    }

    fn notify_error(&mut self, code: ErrorCode, message: impl Into<String>) {
        self.notifications.push(Notification::error(code, message));
    }

    fn tasks_changed(&mut self) {
        self.tasks_revision += 1;
        self.refresh_counts();
    }

    fn categories_changed(&mut self) {
        self.categories_revision += 1;
        self.refresh_counts();
    }

    /// Recomputes category counts when either collection changed since the
    /// last computation. Returns whether any count moved.
    pub fn refresh_counts(&mut self) -> bool {
        let revisions = (self.tasks_revision, self.categories_revision);
        if self.counted_revisions == Some(revisions) {
            return false;
        }
        self.counted_revisions = Some(revisions);
        counts::apply_counts(&mut self.categories, &self.tasks)
    }

    fn issue_ticket(&mut self, task_id: &str, completion: Option<bool>) -> u64 {
        self.next_ticket += 1;
        self.in_flight.insert(
            task_id.to_string(),
            InFlight {
                ticket: self.next_ticket,
                completion,
            },
        );
        self.next_ticket
    }

    /// Retires `ticket` if it is still the latest for `task_id`.
    fn settle(&mut self, task_id: &str, ticket: u64) -> bool {
        match self.in_flight.get(task_id) {
            Some(latest) if latest.ticket == ticket => {
                self.in_flight.remove(task_id);
                true
            }
            _ => {
                debug!(task_id, ticket, "discarding stale response");
                false
            }
        }
    }

    /// Loads `id` into the form for editing.
    pub fn start_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.task(id) else {
            return false;
        };
        self.form = TaskForm::from_task(task);
        self.editing = Some(id.to_string());
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.form.clear();
    }

    /// Creates a task from the form, or saves the task being edited.
    pub fn submit_form(&mut self) -> bool {
        match self.editing.clone() {
            Some(id) => self.save_edit(&id),
            None => self.create_task().is_some(),
        }
    }

    fn validate_form(&mut self) -> bool {
        if self.form.title.trim().is_empty() {
            self.notify_error(ErrorCode::ValidationError, "Please enter a task title");
            return false;
        }
        true
    }

    /// Creates a task from the form. On success the task is prepended and the
    /// form cleared.
    pub fn create_task(&mut self) -> Option<Task> {
        if !self.validate_form() {
            return None;
        }
        let now = Utc::now();
        let record = mapping::new_task_record(&self.form, &self.owner(), now);
        match self.tasks_repo.create(std::slice::from_ref(&record)) {
            Ok(outcome) => match outcome.first() {
                Some(created) => {
                    let task = mapping::task_from_record(created, now);
                    self.tasks.insert(0, task.clone());
                    self.tasks_changed();
                    self.form.clear();
                    self.notify_success("Task created successfully!");
                    Some(task)
                }
                None => {
                    self.report_rejection(&outcome, "Failed to create task");
                    None
                }
            },
            Err(e) => {
                error!(error = %e, "failed to create task");
                self.notify_error(e.code, "Failed to create task. Please try again.");
                None
            }
        }
    }

    fn save_edit(&mut self, id: &str) -> bool {
        if !self.validate_form() {
            return false;
        }
        if self.task(id).is_none() {
            self.notify_error(ErrorCode::TaskNotFound, format!("Task not found: {id}"));
            return false;
        }
        let now = Utc::now();
        let record = mapping::edit_task_record(id, &self.form, now);
        let ticket = self.issue_ticket(id, None);
        let result = self.tasks_repo.update(std::slice::from_ref(&record));
        if !self.settle(id, ticket) {
            return false;
        }
        match result {
            Ok(outcome) => match outcome.first() {
                Some(updated) => {
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                        mapping::merge_edit(task, updated, now);
                    }
                    self.tasks_changed();
                    self.editing = None;
                    self.form.clear();
                    self.notify_success("Task updated successfully!");
                    true
                }
                None => {
                    self.report_rejection(&outcome, "Failed to update task");
                    false
                }
            },
            Err(e) => {
                error!(error = %e, "failed to update task");
                self.notify_error(e.code, "Failed to update task. Please try again.");
                false
            }
        }
    }

    /// Edits `id` in one step: load it into the form, apply `change`, save.
    pub fn edit_task(&mut self, id: &str, change: impl FnOnce(&mut TaskForm)) -> bool {
        if !self.start_edit(id) {
            self.notify_error(ErrorCode::TaskNotFound, format!("Task not found: {id}"));
            return false;
        }
        change(&mut self.form);
        self.submit_form()
    }

    /// Issues a completion toggle for `id`. The target state flips whatever
    /// was last requested, so toggling twice before either answer lands
    /// returns to the original state.
    pub fn begin_toggle(&mut self, id: &str) -> Option<PendingToggle> {
        let current = self.task(id)?.is_completed;
        let requested = self
            .in_flight
            .get(id)
            .and_then(|f| f.completion)
            .unwrap_or(current);
        let completed = !requested;
        let ticket = self.issue_ticket(id, Some(completed));
        Some(PendingToggle {
            task_id: id.to_string(),
            completed,
            ticket,
        })
    }

    pub fn send_toggle(&self, pending: &PendingToggle) -> Result<BatchOutcome, TaskdeckError> {
        let record = mapping::completion_record(&pending.task_id, pending.completed, Utc::now());
        self.tasks_repo.update(std::slice::from_ref(&record))
    }

    /// Applies the answer to a toggle unless a newer request for the same
    /// task has been issued since.
    pub fn finish_toggle(
        &mut self,
        pending: PendingToggle,
        result: Result<BatchOutcome, TaskdeckError>,
    ) -> bool {
        if !self.settle(&pending.task_id, pending.ticket) {
            return false;
        }
        match result {
            Ok(outcome) if !outcome.records.is_empty() => {
                let Some(task) = self.tasks.iter_mut().find(|t| t.id == pending.task_id) else {
                    return false;
                };
                task.is_completed = pending.completed;
                task.updated_at = Utc::now();
                self.tasks_changed();
                if pending.completed {
                    self.notify_success("Task completed!");
                } else {
                    self.notify_success("Task marked as pending");
                }
                true
            }
            Ok(outcome) => {
                self.report_rejection(&outcome, "Failed to update task status");
                false
            }
            Err(e) => {
                error!(error = %e, "failed to toggle task completion");
                self.notify_error(e.code, "Failed to update task status. Please try again.");
                false
            }
        }
    }

    pub fn toggle_completion(&mut self, id: &str) -> bool {
        let Some(pending) = self.begin_toggle(id) else {
            self.notify_error(ErrorCode::TaskNotFound, format!("Task not found: {id}"));
            return false;
        };
        let result = self.send_toggle(&pending);
        self.finish_toggle(pending, result)
    }

    /// Removes the task locally once the store has accepted the delete.
    pub fn delete_task(&mut self, id: &str) -> bool {
        match self.tasks_repo.delete(&[id.to_string()]) {
            Ok(_) => {
                self.tasks.retain(|t| t.id != id);
                self.in_flight.remove(id);
                if self.editing.as_deref() == Some(id) {
                    self.cancel_edit();
                }
                self.tasks_changed();
                self.notify_success("Task deleted successfully");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to delete task");
                self.notify_error(e.code, "Failed to delete task. Please try again.");
                false
            }
        }
    }

    /// Matching tasks from the store. Local state is left untouched.
    pub fn search_tasks(&mut self, term: &str) -> Vec<Task> {
        match self.tasks_repo.search(term, &FetchParams::default()) {
            Ok(page) => {
                let now = Utc::now();
                page.records
                    .iter()
                    .map(|r| mapping::task_from_record(r, now))
                    .collect()
            }
            Err(e) => {
                error!(error = %e, "failed to search tasks");
                self.notify_error(e.code, "Failed to search tasks. Please try again.");
                Vec::new()
            }
        }
    }

    pub fn create_category(&mut self, name: &str, color: &str) -> Option<Category> {
        if name.trim().is_empty() {
            self.notify_error(ErrorCode::ValidationError, "Please enter a category name");
            return None;
        }
        let record = mapping::new_category_record(name, color, &self.owner());
        match self.categories_repo.create(std::slice::from_ref(&record)) {
            Ok(outcome) => match outcome.first() {
                Some(created) => {
                    let category = mapping::category_from_record(created);
                    // The built-in fallback set goes away once real categories exist.
                    if self.categories.iter().all(|c| c.id.starts_with("default-")) {
                        self.categories.clear();
                    }
                    self.categories.push(category.clone());
                    self.categories
                        .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
                    self.categories_changed();
                    self.notify_success("Category created successfully!");
                    self.category(&category.id).cloned()
                }
                None => {
                    self.report_rejection(&outcome, "Failed to create category");
                    None
                }
            },
            Err(e) => {
                error!(error = %e, "failed to create category");
                self.notify_error(e.code, "Failed to create category. Please try again.");
                None
            }
        }
    }

    /// Tasks that referenced the category keep their dangling reference.
    pub fn delete_category(&mut self, id: &str) -> bool {
        match self.categories_repo.delete(&[id.to_string()]) {
            Ok(_) => {
                self.categories.retain(|c| c.id != id);
                if self.selected_category.as_deref() == Some(id) {
                    self.selected_category = None;
                }
                self.categories_changed();
                self.notify_success("Category deleted successfully");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to delete category");
                self.notify_error(e.code, "Failed to delete category. Please try again.");
                false
            }
        }
    }

    fn report_rejection(&mut self, outcome: &BatchOutcome, summary: &str) {
        let detail = outcome
            .failures
            .first()
            .map(|f| f.describe())
            .unwrap_or_else(|| "no record was returned".to_string());
        warn!(%detail, "{summary}");
        self.notify_error(ErrorCode::ValidationError, format!("{summary}: {detail}"));
    }
}
