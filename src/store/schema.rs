use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use super::{FieldError, Record, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339.
    DateTime,
    Picklist(&'static [&'static str]),
    /// Comma-separated list of checked option names, empty when unchecked.
    Checkbox,
    /// Reference to a record in another collection. Not checked for existence.
    Lookup,
    /// Maintained by the store itself.
    System,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub updateable: bool,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        kind,
        updateable: true,
    }
}

const fn system(name: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef {
        name,
        kind,
        updateable: false,
    }
}

#[derive(Debug)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub fields: &'static [FieldDef],
}

pub const PRIORITY_VALUES: &[&str] = &["low", "medium", "high"];

pub static TASKS: CollectionSchema = CollectionSchema {
    name: "tasks",
    required: &["title"],
    fields: &[
        field("Name", FieldKind::Text),
        field("Tags", FieldKind::Text),
        field("Owner", FieldKind::Text),
        system("CreatedOn", FieldKind::System),
        system("CreatedBy", FieldKind::System),
        system("ModifiedOn", FieldKind::System),
        system("ModifiedBy", FieldKind::System),
        field("title", FieldKind::Text),
        field("description", FieldKind::Text),
        field("due_date", FieldKind::Date),
        field("priority", FieldKind::Picklist(PRIORITY_VALUES)),
        field("is_completed", FieldKind::Checkbox),
        field("created_at", FieldKind::DateTime),
        field("updated_at", FieldKind::DateTime),
        field("category", FieldKind::Lookup),
    ],
};

pub static CATEGORIES: CollectionSchema = CollectionSchema {
    name: "categories",
    required: &["Name"],
    fields: &[
        field("Name", FieldKind::Text),
        field("Tags", FieldKind::Text),
        field("Owner", FieldKind::Text),
        system("CreatedOn", FieldKind::System),
        system("CreatedBy", FieldKind::System),
        system("ModifiedOn", FieldKind::System),
        system("ModifiedBy", FieldKind::System),
        field("color", FieldKind::Text),
    ],
};

pub fn lookup(collection: &str) -> Option<&'static CollectionSchema> {
    [&TASKS, &CATEGORIES]
        .into_iter()
        .find(|schema| schema.name == collection)
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field-level problems with a record about to be written. An empty
    /// result means the record is acceptable.
    pub fn validate(&self, record: &Record, creating: bool) -> Vec<FieldError> {
        let mut errors = Vec::new();

        for (name, value) in record {
            if name == ID_FIELD || name == "id" {
                continue;
            }
            let Some(def) = self.field(name) else {
                errors.push(FieldError::new(name, "Unknown field"));
                continue;
            };
            if !def.updateable {
                errors.push(FieldError::new(name, "Field is not updateable"));
                continue;
            }
            if let Err(message) = check_value(def.kind, value) {
                errors.push(FieldError::new(name, message));
            }
        }

        if creating {
            for required in self.required {
                let present = matches!(record.get(*required), Some(Value::String(s)) if !s.trim().is_empty());
                if !present {
                    errors.push(FieldError::new(*required, "Field is required"));
                }
            }
        }

        errors
    }
}

fn check_value(kind: FieldKind, value: &Value) -> Result<(), String> {
    let text = match value {
        Value::Null => return Ok(()),
        Value::String(s) => s.as_str(),
        other => return Err(format!("Expected a string, got {other}")),
    };
    match kind {
        FieldKind::Date if !text.is_empty() => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| format!("Invalid date '{text}'")),
        FieldKind::DateTime if !text.is_empty() => DateTime::parse_from_rfc3339(text)
            .map(|_| ())
            .map_err(|_| format!("Invalid date/time '{text}'")),
        FieldKind::Picklist(allowed) if !allowed.iter().any(|a| *a == text) => {
            Err(format!("Invalid picklist value '{text}'"))
        }
        _ => Ok(()),
    }
}
