//! The remote record store: generic CRUD over named collections of JSON
//! records, with per-record success reporting on every mutation.

pub mod query;
pub mod schema;
pub mod sqlite;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TaskdeckError;

pub use query::*;
pub use sqlite::SqliteRecordStore;

/// A single stored record, keyed by field name.
pub type Record = Map<String, Value>;

/// Field holding the store-assigned identifier.
pub const ID_FIELD: &str = "Id";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub data: Vec<Record>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    pub data: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_label: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field_label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_label: field_label.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl RecordResult {
    pub fn ok(data: Record) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }

    pub fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub results: Vec<RecordResult>,
}

/// Operations the application needs from a record store.
///
/// An `Err` means the call itself failed; record-level problems are reported
/// inside the returned envelope instead.
pub trait RecordStore {
    fn fetch_records(&self, collection: &str, query: &Query) -> Result<FetchResponse, TaskdeckError>;

    fn get_record_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: &[String],
    ) -> Result<GetResponse, TaskdeckError>;

    fn create_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError>;

    fn update_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError>;

    fn delete_record(&self, collection: &str, ids: &[String]) -> Result<MutationResponse, TaskdeckError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn fetch_records(&self, collection: &str, query: &Query) -> Result<FetchResponse, TaskdeckError> {
        (**self).fetch_records(collection, query)
    }

    fn get_record_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: &[String],
    ) -> Result<GetResponse, TaskdeckError> {
        (**self).get_record_by_id(collection, id, fields)
    }

    fn create_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError> {
        (**self).create_record(collection, records)
    }

    fn update_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError> {
        (**self).update_record(collection, records)
    }

    fn delete_record(&self, collection: &str, ids: &[String]) -> Result<MutationResponse, TaskdeckError> {
        (**self).delete_record(collection, ids)
    }
}

/// Fixed-width RFC 3339 so that timestamps sort correctly as strings.
pub fn wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Reads the identifier of a record, accepting `Id` or `id`, string or number.
pub fn record_id(record: &Record) -> Option<String> {
    [ID_FIELD, "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_variants() {
        let rec = |v: Value| v.as_object().cloned().unwrap();
        assert_eq!(record_id(&rec(json!({"Id": "01ABC"}))), Some("01ABC".into()));
        assert_eq!(record_id(&rec(json!({"id": 42}))), Some("42".into()));
        assert_eq!(record_id(&rec(json!({"Id": ""}))), None);
        assert_eq!(record_id(&rec(json!({"title": "x"}))), None);
    }

    #[test]
    fn test_mutation_envelope_wire_names() {
        let result = RecordResult::rejected(vec![FieldError::new("priority", "bad")]);
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["errors"][0]["fieldLabel"], "priority");
        assert!(v.get("data").is_none());
    }
}
