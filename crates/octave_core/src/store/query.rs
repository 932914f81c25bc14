//! Collection query description.
//!
//! A query is equality filters over top-level fields plus at most one
//! order-by. Documents missing the order field sort before present values in
//! ascending order and after them in descending order; ties fall back to
//! document id ascending.

use super::path::CollectionPath;
use super::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// `field == value` on a top-level scalar field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: CollectionPath,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl DocumentQuery {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Rejects field names that are not plain identifiers and filter values
    /// that are not scalars.
    pub fn validate(&self) -> StoreResult<()> {
        for filter in &self.filters {
            validate_field_name(&filter.field)?;
            if filter.value.is_array() || filter.value.is_object() {
                return Err(StoreError::InvalidData(format!(
                    "filter on `{}` must compare against a scalar",
                    filter.field
                )));
            }
        }
        if let Some(order) = self.order_by.as_ref() {
            validate_field_name(&order.field)?;
        }
        Ok(())
    }
}

fn validate_field_name(field: &str) -> StoreResult<()> {
    if FIELD_NAME_RE.is_match(field) {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!(
            "unsupported field name `{field}`"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, DocumentQuery};
    use crate::store::path::CollectionPath;
    use crate::store::StoreError;
    use serde_json::json;

    fn intentions() -> CollectionPath {
        CollectionPath::root("intentions").expect("valid collection")
    }

    #[test]
    fn builder_collects_filters_and_order() {
        let query = DocumentQuery::new(intentions())
            .where_eq("completed", false)
            .order_by("createdAt", Direction::Descending);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].value, json!(false));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn rejects_json_path_injection_and_compound_values() {
        let bad_field = DocumentQuery::new(intentions()).where_eq("a') OR 1=1 --", 1);
        assert!(matches!(bad_field.validate(), Err(StoreError::InvalidData(_))));

        let bad_value = DocumentQuery::new(intentions()).where_eq("tags", json!(["x"]));
        assert!(matches!(bad_value.validate(), Err(StoreError::InvalidData(_))));
    }
}
