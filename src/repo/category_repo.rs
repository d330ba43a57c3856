use serde_json::Value;

use crate::error::TaskdeckError;
use crate::store::{record_id, Condition, OrderBy, Record, RecordStore, ID_FIELD};

use super::{
    build_query, collect_deletion, collect_outcome, transport_failure, whitelist, BatchOutcome,
    FetchParams, Page,
};

pub const TABLE: &str = "categories";

pub const DEFAULT_PAGE_SIZE: usize = 20;

pub const ALL_FIELDS: &[&str] = &[
    "Name", "Tags", "Owner", "CreatedOn", "CreatedBy", "ModifiedOn", "ModifiedBy", "color",
];

pub const UPDATEABLE_FIELDS: &[&str] = &["Name", "Tags", "Owner", "color"];

pub struct CategoryRepo<S> {
    store: S,
    page_size: usize,
}

impl<S: RecordStore> CategoryRepo<S> {
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

    /// Categories in name order.
    pub fn fetch(&self, params: &FetchParams) -> Result<Page, TaskdeckError> {
        let query = build_query(ALL_FIELDS, params, OrderBy::asc("Name"), self.page_size);
        let response = self
            .store
            .fetch_records(TABLE, &query)
            .map_err(|e| transport_failure("Failed to fetch categories. Please try again.", e))?;
        Ok(Page {
            total: response.total_count,
            records: response.data,
        })
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Record>, TaskdeckError> {
        let fields: Vec<String> = ALL_FIELDS.iter().map(|f| f.to_string()).collect();
        let response = self.store.get_record_by_id(TABLE, id, &fields).map_err(|e| {
            transport_failure("Failed to fetch category details. Please try again.", e)
        })?;
        Ok(response.data)
    }

    pub fn create(&self, records: &[Record]) -> Result<BatchOutcome, TaskdeckError> {
        let prepared = records
            .iter()
            .map(|r| whitelist(r, UPDATEABLE_FIELDS, true, |_, v| v.clone()))
            .collect();
        let response = self.store.create_record(TABLE, prepared).map_err(|e| {
            transport_failure("Failed to create categories. Please check your data and try again.", e)
        })?;
        collect_outcome(response, TABLE, "create")
    }

    pub fn update(&self, records: &[Record]) -> Result<BatchOutcome, TaskdeckError> {
        let prepared = records
            .iter()
            .map(|r| {
                let id = record_id(r)
                    .ok_or_else(|| TaskdeckError::validation("Every category update needs an Id"))?;
                let mut out = whitelist(r, UPDATEABLE_FIELDS, false, |_, v| v.clone());
                out.insert(ID_FIELD.to_string(), Value::String(id));
                Ok(out)
            })
            .collect::<Result<Vec<_>, TaskdeckError>>()?;
        let response = self.store.update_record(TABLE, prepared).map_err(|e| {
            transport_failure("Failed to update categories. Please check your data and try again.", e)
        })?;
        collect_outcome(response, TABLE, "update")
    }

    pub fn delete(&self, ids: &[String]) -> Result<bool, TaskdeckError> {
        let response = self
            .store
            .delete_record(TABLE, ids)
            .map_err(|e| transport_failure("Failed to delete categories. Please try again.", e))?;
        collect_deletion(response, TABLE)
    }

    pub fn search(&self, term: &str, extra: &FetchParams) -> Result<Page, TaskdeckError> {
        let mut params = extra.clone();
        params.conditions.insert(0, Condition::contains("Name", term));
        self.fetch(&params)
    }
}
