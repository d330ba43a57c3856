use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FetchResponse, Record, ID_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Case-insensitive substring match.
    Contains,
    EqualTo,
    NotEqualTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new(field_name: &str, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field_name: field_name.to_string(),
            operator,
            values: vec![value.into()],
        }
    }

    pub fn contains(field_name: &str, value: impl Into<String>) -> Self {
        Self::new(field_name, Operator::Contains, value)
    }

    pub fn equal_to(field_name: &str, value: impl Into<String>) -> Self {
        Self::new(field_name, Operator::EqualTo, value)
    }

    pub fn matches(&self, record: &Record) -> bool {
        let text = field_text(record, &self.field_name);
        match self.operator {
            Operator::Contains => match text {
                Some(text) => {
                    let haystack = text.to_lowercase();
                    self.values
                        .iter()
                        .any(|v| haystack.contains(&v.to_lowercase()))
                }
                None => false,
            },
            Operator::EqualTo => {
                let text = text.unwrap_or_default();
                self.values.iter().any(|v| *v == text)
            }
            Operator::NotEqualTo => {
                let text = text.unwrap_or_default();
                self.values.iter().all(|v| *v != text)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

impl GroupOperator {
    fn combine<T>(&self, items: &[T], mut test: impl FnMut(&T) -> bool) -> bool {
        match self {
            Self::And => items.iter().all(|item| test(item)),
            Self::Or => items.iter().any(|item| test(item)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubGroup {
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub operator: GroupOperator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereGroup {
    pub operator: GroupOperator,
    pub sub_groups: Vec<SubGroup>,
}

impl WhereGroup {
    /// A group matching when any of the conditions matches.
    pub fn any_of(conditions: Vec<Condition>) -> Self {
        Self {
            operator: GroupOperator::Or,
            sub_groups: conditions
                .into_iter()
                .map(|c| SubGroup {
                    conditions: vec![c],
                    operator: GroupOperator::And,
                })
                .collect(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.operator.combine(&self.sub_groups, |sub| {
            sub.operator.combine(&sub.conditions, |c| c.matches(record))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    #[serde(rename = "SortType")]
    pub sort_type: SortType,
}

impl OrderBy {
    pub fn asc(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            sort_type: SortType::Asc,
        }
    }

    pub fn desc(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            sort_type: SortType::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PagingInfo {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub fields: Vec<String>,
    pub order_by: Vec<OrderBy>,
    pub paging_info: PagingInfo,
    #[serde(rename = "where", default)]
    pub where_: Vec<Condition>,
    #[serde(default)]
    pub where_groups: Vec<WhereGroup>,
}

impl Query {
    pub fn matches(&self, record: &Record) -> bool {
        self.where_.iter().all(|c| c.matches(record))
            && self.where_groups.iter().all(|g| g.matches(record))
    }

    /// Filters, sorts, pages and projects `records`. `total_count` is the
    /// number of matches before paging.
    pub fn apply(&self, records: Vec<Record>) -> FetchResponse {
        let mut matched: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        let total_count = matched.len();
        let data = matched
            .into_iter()
            .skip(self.paging_info.offset)
            .take(self.paging_info.limit)
            .map(|r| project(r, &self.fields))
            .collect();
        FetchResponse { data, total_count }
    }

    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for order in &self.order_by {
            let ord = compare_values(a.get(&order.field_name), b.get(&order.field_name));
            let ord = match order.sort_type {
                SortType::Asc => ord,
                SortType::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Keeps only `fields` (plus the identifier). An empty list keeps everything.
pub fn project(record: Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record;
    }
    record
        .into_iter()
        .filter(|(key, _)| key == ID_FIELD || fields.iter().any(|f| f == key))
        .collect()
}

fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.to_lowercase().cmp(&y.to_lowercase()),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
