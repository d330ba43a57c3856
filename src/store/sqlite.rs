use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::db::migrations;
use crate::error::TaskdeckError;

use super::schema::{self, CollectionSchema};
use super::{
    project, record_id, wire_timestamp, FetchResponse, GetResponse, MutationResponse, Query, Record,
    RecordResult, RecordStore, ID_FIELD,
};

/// Record store backed by a single SQLite table of JSON documents.
///
/// Records are partitioned by project so that several workspaces can share
/// one database file.
pub struct SqliteRecordStore {
    conn: Connection,
    project: String,
    actor: Option<String>,
}

struct StoredRow {
    id: String,
    data: String,
    created_on: String,
    created_by: Option<String>,
    modified_on: String,
    modified_by: Option<String>,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            data: row.get(1)?,
            created_on: row.get(2)?,
            created_by: row.get(3)?,
            modified_on: row.get(4)?,
            modified_by: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<Record, TaskdeckError> {
        let mut record: Record = serde_json::from_str(&self.data)?;
        record.insert(ID_FIELD.into(), Value::String(self.id));
        record.insert("CreatedOn".into(), Value::String(self.created_on));
        record.insert("CreatedBy".into(), self.created_by.map_or(Value::Null, Value::String));
        record.insert("ModifiedOn".into(), Value::String(self.modified_on));
        record.insert("ModifiedBy".into(), self.modified_by.map_or(Value::Null, Value::String));
        Ok(record)
    }
}

const SELECT_COLUMNS: &str = "id, data, created_on, created_by, modified_on, modified_by";

impl SqliteRecordStore {
    pub fn new(conn: Connection, project: impl Into<String>) -> Result<Self, TaskdeckError> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn,
            project: project.into(),
            actor: None,
        })
    }

    pub fn open_in_memory(project: impl Into<String>) -> Result<Self, TaskdeckError> {
        Self::new(Connection::open_in_memory()?, project)
    }

    /// Sets who is recorded in `CreatedBy`/`ModifiedBy` for later writes.
    pub fn set_actor(&mut self, actor: Option<String>) {
        self.actor = actor;
    }

    fn schema(collection: &str) -> Result<&'static CollectionSchema, TaskdeckError> {
        schema::lookup(collection)
            .ok_or_else(|| TaskdeckError::transport(format!("Unknown table: {collection}")))
    }

    fn load_row(&self, collection: &str, id: &str) -> Result<Option<StoredRow>, TaskdeckError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM records
                     WHERE project = ?1 AND collection = ?2 AND id = ?3"
                ),
                params![self.project, collection, id],
                StoredRow::from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn insert(&self, collection: &str, mut record: Record) -> Result<Record, TaskdeckError> {
        record.remove(ID_FIELD);
        record.remove("id");
        let id = ulid::Ulid::new().to_string();
        let now = wire_timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO records (project, collection, id, data, created_on, created_by, modified_on, modified_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5, ?6)",
            params![
                self.project,
                collection,
                id,
                serde_json::to_string(&record)?,
                now,
                self.actor
            ],
        )?;
        self.load_row(collection, &id)?
            .ok_or_else(|| TaskdeckError::database(format!("Record {id} vanished after insert")))?
            .into_record()
    }

    fn merge(&self, collection: &str, id: &str, changes: Record) -> Result<Option<Record>, TaskdeckError> {
        let Some(row) = self.load_row(collection, id)? else {
            return Ok(None);
        };
        let mut data: Record = serde_json::from_str(&row.data)?;
        for (key, value) in changes {
            if key == ID_FIELD || key == "id" {
                continue;
            }
            if value.is_null() {
                data.remove(&key);
            } else {
                data.insert(key, value);
            }
        }
        self.conn.execute(
            "UPDATE records SET data = ?1, modified_on = ?2, modified_by = ?3
             WHERE project = ?4 AND collection = ?5 AND id = ?6",
            params![
                serde_json::to_string(&data)?,
                wire_timestamp(Utc::now()),
                self.actor,
                self.project,
                collection,
                id
            ],
        )?;
        match self.load_row(collection, id)? {
            Some(row) => Ok(Some(row.into_record()?)),
            None => Ok(None),
        }
    }
}

impl RecordStore for SqliteRecordStore {
    fn fetch_records(&self, collection: &str, query: &Query) -> Result<FetchResponse, TaskdeckError> {
        Self::schema(collection)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM records
             WHERE project = ?1 AND collection = ?2 ORDER BY rowid ASC"
        ))?;
        let rows = stmt
            .query_map(params![self.project, collection], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let records = rows
            .into_iter()
            .map(StoredRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        let response = query.apply(records);
        debug!(collection, total = response.total_count, returned = response.data.len(), "fetched records");
        Ok(response)
    }

    fn get_record_by_id(
        &self,
        collection: &str,
        id: &str,
        fields: &[String],
    ) -> Result<GetResponse, TaskdeckError> {
        Self::schema(collection)?;
        let data = match self.load_row(collection, id)? {
            Some(row) => Some(project(row.into_record()?, fields)),
            None => None,
        };
        Ok(GetResponse { data })
    }

    fn create_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError> {
        let schema = Self::schema(collection)?;
        let tx = self.conn.unchecked_transaction()?;
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let errors = schema.validate(&record, true);
            if !errors.is_empty() {
                results.push(RecordResult::rejected(errors));
                continue;
            }
            results.push(RecordResult::ok(self.insert(collection, record)?));
        }
        tx.commit()?;
        Ok(MutationResponse {
            success: true,
            results,
        })
    }

    fn update_record(&self, collection: &str, records: Vec<Record>) -> Result<MutationResponse, TaskdeckError> {
        let schema = Self::schema(collection)?;
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            let Some(id) = record_id(&record) else {
                results.push(RecordResult::failed("Record Id is required"));
                continue;
            };
            let errors = schema.validate(&record, false);
            if !errors.is_empty() {
                results.push(RecordResult::rejected(errors));
                continue;
            }
            match self.merge(collection, &id, record)? {
                Some(updated) => results.push(RecordResult::ok(updated)),
                None => results.push(RecordResult::failed("Record does not exist")),
            }
        }
        Ok(MutationResponse {
            success: true,
            results,
        })
    }

    fn delete_record(&self, collection: &str, ids: &[String]) -> Result<MutationResponse, TaskdeckError> {
        Self::schema(collection)?;
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let changed = self.conn.execute(
                "DELETE FROM records WHERE project = ?1 AND collection = ?2 AND id = ?3",
                params![self.project, collection, id],
            )?;
            if changed == 0 {
                results.push(RecordResult::failed("Record does not exist"));
            } else {
                let mut gone = Record::new();
                gone.insert(ID_FIELD.into(), Value::String(id.clone()));
                results.push(RecordResult::ok(gone));
            }
        }
        Ok(MutationResponse {
            success: true,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn store() -> SqliteRecordStore {
        let mut store = SqliteRecordStore::open_in_memory("test").unwrap();
        store.set_actor(Some("ada@example.com".into()));
        store
    }

    #[test]
    fn test_create_assigns_id_and_metadata() {
        let store = store();
        let response = store
            .create_record("tasks", vec![rec(json!({"title": "Buy milk"}))])
            .unwrap();
        assert!(response.success);
        let data = response.results[0].data.as_ref().unwrap();
        assert_eq!(data[ID_FIELD].as_str().unwrap().len(), 26);
        assert_eq!(data["CreatedBy"], "ada@example.com");
        assert_eq!(data["title"], "Buy milk");
    }

    #[test]
    fn test_create_reports_per_record_failures() {
        let store = store();
        let response = store
            .create_record(
                "tasks",
                vec![
                    rec(json!({"title": "ok"})),
                    rec(json!({"title": "bad", "priority": "urgent"})),
                    rec(json!({"description": "no title"})),
                ],
            )
            .unwrap();
        assert!(response.success);
        let flags: Vec<_> = response.results.iter().map(|r| r.success).collect();
        assert_eq!(flags, [true, false, false]);
        assert_eq!(response.results[1].errors[0].field_label, "priority");
        assert_eq!(response.results[2].errors[0].field_label, "title");
    }

    #[test]
    fn test_create_database_error_writes_nothing() {
        let store = store();
        store
            .conn
            .execute_batch(
                "CREATE TEMP TRIGGER reject_boom BEFORE INSERT ON records
                 WHEN json_extract(NEW.data, '$.title') = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )
            .unwrap();
        let err = store
            .create_record(
                "tasks",
                vec![rec(json!({"title": "first"})), rec(json!({"title": "boom"}))],
            )
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DatabaseError);
        let fetched = store.fetch_records("tasks", &Query::default()).unwrap();
        assert_eq!(fetched.total_count, 0);
    }

    #[test]
    fn test_update_merges_and_null_clears() {
        let store = store();
        let created = store
            .create_record("tasks", vec![rec(json!({"title": "a", "description": "d"}))])
            .unwrap();
        let id = record_id(created.results[0].data.as_ref().unwrap()).unwrap();
        let response = store
            .update_record(
                "tasks",
                vec![rec(json!({"Id": id, "title": "b", "description": null}))],
            )
            .unwrap();
        let data = response.results[0].data.as_ref().unwrap();
        assert_eq!(data["title"], "b");
        assert!(data.get("description").is_none());
    }

    #[test]
    fn test_update_and_delete_unknown_id() {
        let store = store();
        let update = store
            .update_record("tasks", vec![rec(json!({"Id": "nope", "title": "x"}))])
            .unwrap();
        assert!(update.success);
        assert_eq!(update.results[0].message.as_deref(), Some("Record does not exist"));

        let delete = store.delete_record("tasks", &["nope".to_string()]).unwrap();
        assert!(delete.success);
        assert!(!delete.results[0].success);
    }

    #[test]
    fn test_fetch_is_scoped_by_collection_and_project() {
        let store = store();
        store
            .create_record("tasks", vec![rec(json!({"title": "t"}))])
            .unwrap();
        store
            .create_record("categories", vec![rec(json!({"Name": "Work"}))])
            .unwrap();
        let tasks = store.fetch_records("tasks", &Query::default()).unwrap();
        assert_eq!(tasks.total_count, 1);

        let other = SqliteRecordStore::new(Connection::open_in_memory().unwrap(), "other").unwrap();
        assert_eq!(other.fetch_records("tasks", &Query::default()).unwrap().total_count, 0);
    }

    #[test]
    fn test_unknown_collection_is_transport_error() {
        let store = store();
        let err = store.fetch_records("task30", &Query::default()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_get_by_id_projects_fields() {
        let store = store();
        let created = store
            .create_record("categories", vec![rec(json!({"Name": "Work", "color": "#8b5cf6"}))])
            .unwrap();
        let id = record_id(created.results[0].data.as_ref().unwrap()).unwrap();
        let got = store
            .get_record_by_id("categories", &id, &["Name".to_string()])
            .unwrap()
            .data
            .unwrap();
        assert_eq!(got["Name"], "Work");
        assert!(got.get("color").is_none());
        assert!(store.get_record_by_id("categories", "missing", &[]).unwrap().data.is_none());
    }
}
