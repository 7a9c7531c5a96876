use chrono::NaiveDate;
use serde::Serialize;

use super::EntityId;

/// Lead count for one form, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadsPerForm {
    pub form_id: EntityId,
    pub form_name: String,
    pub count: u64,
}

/// Lead count for one calendar day, oldest first from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyLeads {
    pub date: NaiveDate,
    pub count: u64,
}
