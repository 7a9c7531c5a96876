use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use leadkit_api::LeadQuery;
use serde::Serialize;
use serde_json::{Map, Value};

use super::EntityId;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A captured submission. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub id: EntityId,
    pub form_id: EntityId,
    /// Denormalized for display.
    pub form_name: Option<String>,
    pub website_id: Option<EntityId>,
    pub website_name: Option<String>,
    /// Captured field values keyed by field name.
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Captured value for `field` rendered as plain text.
    pub fn value(&self, field: &str) -> Option<String> {
        self.data.get(field).map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Filter tuple for the leads listing. Each distinct tuple is its own
/// cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LeadFilter {
    pub form_id: Option<EntityId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl LeadFilter {
    pub fn for_form(form_id: impl Into<EntityId>) -> Self {
        Self {
            form_id: Some(form_id.into()),
            ..Self::default()
        }
    }

    /// Key parameters. Absent values are omitted so that an unset filter
    /// and an empty one share a key.
    pub fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(ref id) = self.form_id {
            params.insert("formId".to_owned(), id.to_string());
        }
        if let Some(start) = self.start_date {
            params.insert("startDate".to_owned(), start.format(DATE_FORMAT).to_string());
        }
        if let Some(end) = self.end_date {
            params.insert("endDate".to_owned(), end.format(DATE_FORMAT).to_string());
        }
        params
    }

    pub(crate) fn to_query(&self) -> LeadQuery {
        LeadQuery {
            form_id: self.form_id.as_ref().map(ToString::to_string),
            start_date: self
                .start_date
                .map(|d| d.format(DATE_FORMAT).to_string()),
            end_date: self.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }
}
