//! Collection adapters over a [`RecordStore`](crate::store::RecordStore).
//!
//! Repositories own the field whitelists and wire coercions for their
//! collection, and turn store envelopes into a uniform result shape.

pub mod category_repo;
pub mod task_repo;

use serde_json::Value;
use tracing::{error, warn};

use crate::error::TaskdeckError;
use crate::store::{Condition, FieldError, MutationResponse, OrderBy, PagingInfo, Query, Record, WhereGroup};

pub use category_repo::CategoryRepo;
pub use task_repo::TaskRepo;

/// Caller-supplied filtering and paging for a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub limit: Option<usize>,
    pub offset: usize,
    pub conditions: Vec<Condition>,
    pub groups: Vec<WhereGroup>,
    /// Replaces the repository's default ordering when set.
    pub order_by: Option<Vec<OrderBy>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub total: usize,
}

/// A record the store refused, by position in the submitted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub message: Option<String>,
    pub errors: Vec<FieldError>,
}

impl RecordFailure {
    pub fn describe(&self) -> String {
        if !self.errors.is_empty() {
            return self
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field_label, e.message))
                .collect::<Vec<_>>()
                .join("; ");
        }
        self.message
            .clone()
            .unwrap_or_else(|| "Record does not exist".to_string())
    }
}

/// Result of a bulk create or update: the records that went through, and
/// the ones that did not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub records: Vec<Record>,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub(crate) fn build_query(
    fields: &[&str],
    params: &FetchParams,
    default_order: OrderBy,
    page_size: usize,
) -> Query {
    Query {
        fields: fields.iter().map(|f| f.to_string()).collect(),
        order_by: params
            .order_by
            .clone()
            .unwrap_or_else(|| vec![default_order]),
        paging_info: PagingInfo {
            limit: params.limit.unwrap_or(page_size),
            offset: params.offset,
        },
        where_: params.conditions.clone(),
        where_groups: params.groups.clone(),
    }
}

/// Keeps the whitelisted fields of `record`, passing each through `normalize`.
/// With `drop_empty`, null and empty-string values are left out as well.
pub(crate) fn whitelist(
    record: &Record,
    fields: &[&str],
    drop_empty: bool,
    normalize: impl Fn(&str, &Value) -> Value,
) -> Record {
    let mut out = Record::new();
    for field in fields {
        let Some(value) = record.get(*field) else {
            continue;
        };
        if drop_empty && is_blank(value) {
            continue;
        }
        out.insert(field.to_string(), normalize(field, value));
    }
    out
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Logs the underlying failure and replaces it with a user-facing message.
pub(crate) fn transport_failure(message: &str, err: TaskdeckError) -> TaskdeckError {
    error!(cause = %err, "{message}");
    TaskdeckError::transport(message)
}

pub(crate) fn collect_outcome(
    response: MutationResponse,
    entity: &str,
    action: &str,
) -> Result<BatchOutcome, TaskdeckError> {
    if !response.success {
        return Err(TaskdeckError::transport(format!("Failed to {action} {entity}")));
    }
    let mut outcome = BatchOutcome::default();
    for (index, result) in response.results.into_iter().enumerate() {
        match (result.success, result.data) {
            (true, Some(data)) => outcome.records.push(data),
            (_, _) => outcome.failures.push(RecordFailure {
                index,
                message: result.message,
                errors: result.errors,
            }),
        }
    }
    if !outcome.failures.is_empty() {
        warn!("Failed to {action} {} {entity}", outcome.failures.len());
        for failure in &outcome.failures {
            warn!(index = failure.index, "{}", failure.describe());
        }
    }
    Ok(outcome)
}

/// Only the call itself decides the answer; record-level failures are logged.
pub(crate) fn collect_deletion(response: MutationResponse, entity: &str) -> Result<bool, TaskdeckError> {
    if !response.success {
        return Err(TaskdeckError::transport(format!("Failed to delete {entity}")));
    }
    let failed: Vec<_> = response.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        warn!("Failed to delete {} {entity}", failed.len());
        for result in failed {
            warn!(
                "{}",
                result.message.as_deref().unwrap_or("Record does not exist")
            );
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordResult;
    use serde_json::json;

    #[test]
    fn test_whitelist_drops_unknown_and_blank() {
        let record = json!({"title": "x", "bogus": 1, "description": "", "Owner": null})
            .as_object()
            .cloned()
            .unwrap();
        let kept = whitelist(&record, &["title", "description", "Owner"], true, |_, v| v.clone());
        assert_eq!(kept.len(), 1);
        let kept = whitelist(&record, &["title", "description", "Owner"], false, |_, v| v.clone());
        assert_eq!(kept.len(), 3);
        assert!(kept.get("bogus").is_none());
    }

    #[test]
    fn test_collect_outcome_splits_results() {
        let response = MutationResponse {
            success: true,
            results: vec![
                RecordResult::ok(Record::new()),
                RecordResult::failed("Record does not exist"),
            ],
        };
        let outcome = collect_outcome(response, "tasks", "update").unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[0].describe(), "Record does not exist");
        assert!(!outcome.is_complete());
    }

    #[test]
    fn test_unsuccessful_envelope_is_an_error() {
        let response = MutationResponse {
            success: false,
            results: vec![],
        };
        assert!(collect_outcome(response.clone(), "tasks", "create").is_err());
        assert!(collect_deletion(response, "tasks").is_err());
    }
}
