use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::TaskdeckError;
use crate::models::{completion_to_wire, Priority};
use crate::store::{record_id, wire_timestamp, Condition, OrderBy, Record, RecordStore, WhereGroup, ID_FIELD};

use super::{
    build_query, collect_deletion, collect_outcome, is_blank, transport_failure, whitelist,
    BatchOutcome, FetchParams, Page,
};

pub const TABLE: &str = "tasks";

pub const DEFAULT_PAGE_SIZE: usize = 50;

pub const ALL_FIELDS: &[&str] = &[
    "Name", "Tags", "Owner", "CreatedOn", "CreatedBy", "ModifiedOn", "ModifiedBy",
    "title", "description", "due_date", "priority", "is_completed",
    "created_at", "updated_at", "category",
];

pub const UPDATEABLE_FIELDS: &[&str] = &[
    "Name", "Tags", "Owner", "title", "description", "due_date",
    "priority", "is_completed", "created_at", "updated_at", "category",
];

pub struct TaskRepo<S> {
    store: S,
    page_size: usize,
}

impl<S: RecordStore> TaskRepo<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Newest tasks first, one page at a time.
    pub fn fetch(&self, params: &FetchParams) -> Result<Page, TaskdeckError> {
        let query = build_query(ALL_FIELDS, params, OrderBy::desc("created_at"), self.page_size);
        let response = self
            .store
            .fetch_records(TABLE, &query)
            .map_err(|e| transport_failure("Failed to fetch tasks. Please try again.", e))?;
        Ok(Page {
            total: response.total_count,
            records: response.data,
        })
    }

    /// `Ok(None)` when no task has this id.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Record>, TaskdeckError> {
        let fields: Vec<String> = ALL_FIELDS.iter().map(|f| f.to_string()).collect();
        let response = self
            .store
            .get_record_by_id(TABLE, id, &fields)
            .map_err(|e| transport_failure("Failed to fetch task details. Please try again.", e))?;
        Ok(response.data)
    }

    pub fn create(&self, records: &[Record]) -> Result<BatchOutcome, TaskdeckError> {
        let now = Utc::now();
        let prepared = records.iter().map(|r| prepare_create(r, now)).collect();
        let response = self.store.create_record(TABLE, prepared).map_err(|e| {
            transport_failure("Failed to create tasks. Please check your data and try again.", e)
        })?;
        collect_outcome(response, TABLE, "create")
    }

    /// Every record must carry its `Id`.
    pub fn update(&self, records: &[Record]) -> Result<BatchOutcome, TaskdeckError> {
        let now = Utc::now();
        let prepared = records
            .iter()
            .map(|r| prepare_update(r, now))
            .collect::<Result<Vec<_>, _>>()?;
        let response = self.store.update_record(TABLE, prepared).map_err(|e| {
            transport_failure("Failed to update tasks. Please check your data and try again.", e)
        })?;
        collect_outcome(response, TABLE, "update")
    }

    /// `true` whenever the store accepted the call, even if some ids did not exist.
    pub fn delete(&self, ids: &[String]) -> Result<bool, TaskdeckError> {
        let response = self
            .store
            .delete_record(TABLE, ids)
            .map_err(|e| transport_failure("Failed to delete tasks. Please try again.", e))?;
        collect_deletion(response, TABLE)
    }

    /// Tasks whose title or description contains `term`, narrowed by `extra`.
    pub fn search(&self, term: &str, extra: &FetchParams) -> Result<Page, TaskdeckError> {
        let mut params = extra.clone();
        params.groups.insert(
            0,
            WhereGroup::any_of(vec![
                Condition::contains("title", term),
                Condition::contains("description", term),
            ]),
        );
        self.fetch(&params)
    }
}

fn prepare_create(record: &Record, now: DateTime<Utc>) -> Record {
    let mut out = whitelist(record, UPDATEABLE_FIELDS, true, |field, value| {
        normalize_field(field, value, now)
    });
    for stamp in ["created_at", "updated_at"] {
        out.entry(stamp)
            .or_insert_with(|| Value::String(wire_timestamp(now)));
    }
    out.entry("priority")
        .or_insert_with(|| Value::String(Priority::default().as_str().to_string()));
    out
}

fn prepare_update(record: &Record, now: DateTime<Utc>) -> Result<Record, TaskdeckError> {
    let id = record_id(record)
        .ok_or_else(|| TaskdeckError::validation("Every task update needs an Id"))?;
    let mut out = whitelist(record, UPDATEABLE_FIELDS, false, |field, value| {
        normalize_field(field, value, now)
    });
    out.entry("updated_at")
        .or_insert_with(|| Value::String(wire_timestamp(now)));
    out.insert(ID_FIELD.to_string(), Value::String(id));
    Ok(out)
}

fn normalize_field(field: &str, value: &Value, now: DateTime<Utc>) -> Value {
    match field {
        "due_date" => match value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
            Some(at) => Value::String(at.date_naive().format("%Y-%m-%d").to_string()),
            None => value.clone(),
        },
        "created_at" | "updated_at" if is_blank(value) => Value::String(wire_timestamp(now)),
        "priority" => Value::String(Priority::coerce(value.as_str()).as_str().to_string()),
        "is_completed" => Value::String(completion_to_wire(is_truthy(value)).to_string()),
        _ => value.clone(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
