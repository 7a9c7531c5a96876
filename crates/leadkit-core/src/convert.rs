// ── API-to-domain type conversions ──
//
// Bridges `leadkit_api::types` wire shapes into `crate::model` types.
// Forms embedded in a website inherit the website id when the backend
// omits it; timestamps and dates are parsed into chrono types and a value
// that does not parse is a decode error.

use chrono::{DateTime, NaiveDate, Utc};

use leadkit_api::types::{
    CreateFieldBody, FieldResponse, FormResponse, LeadResponse, LeadsPerDayEntry,
    LeadsPerFormEntry, UserResponse, WebsiteResponse,
};

use crate::error::CoreError;
use crate::model::{DailyLeads, EntityId, Field, Form, Lead, LeadsPerForm, User, Website};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CoreError::Decode {
            message: format!("invalid timestamp '{raw}': {e}"),
        })
}

fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    // The backend sometimes sends a full timestamp for day buckets.
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| CoreError::Decode {
        message: format!("invalid date '{raw}': {e}"),
    })
}

// ── Websites & forms ───────────────────────────────────────────────

impl From<FieldResponse> for Field {
    fn from(f: FieldResponse) -> Self {
        Field {
            id: f.id.map(EntityId::from),
            name: f.name,
            field_type: f.field_type,
            label: f.label,
            placeholder: f.placeholder,
            required: f.required,
        }
    }
}

impl From<&Field> for CreateFieldBody {
    fn from(f: &Field) -> Self {
        CreateFieldBody {
            name: f.name.clone(),
            field_type: f.field_type.clone(),
            label: f.label.clone(),
            placeholder: f.placeholder.clone(),
            required: f.required,
        }
    }
}

/// Convert a form, using `website_id` when the payload does not carry one.
pub(crate) fn form_from_response(f: FormResponse, website_id: &EntityId) -> Form {
    Form {
        id: EntityId::from(f.id),
        website_id: f.website_id.map_or_else(|| website_id.clone(), EntityId::from),
        name: f.name,
        url: f.url,
        fields: f.fields.into_iter().map(Field::from).collect(),
        lead_count: f.count.map_or(0, |c| c.leads),
    }
}

impl From<WebsiteResponse> for Website {
    fn from(w: WebsiteResponse) -> Self {
        let id = EntityId::from(w.id);
        let forms = w
            .forms
            .into_iter()
            .map(|f| form_from_response(f, &id))
            .collect();

        Website {
            id,
            url: w.url,
            name: w.name.filter(|n| !n.is_empty()),
            forms,
        }
    }
}

// ── Leads ──────────────────────────────────────────────────────────

impl TryFrom<LeadResponse> for Lead {
    type Error = CoreError;

    fn try_from(l: LeadResponse) -> Result<Self, Self::Error> {
        let created_at = parse_timestamp(&l.created_at)?;
        let form_name = l.form_name.or_else(|| l.form.and_then(|f| f.name));
        let website_name = l.website.and_then(|w| w.name.or(w.url));

        Ok(Lead {
            id: EntityId::from(l.id),
            form_id: EntityId::from(l.form_id),
            form_name,
            website_id: l.website_id.map(EntityId::from),
            website_name,
            data: l.data,
            created_at,
        })
    }
}

// ── Analytics ──────────────────────────────────────────────────────

impl From<LeadsPerFormEntry> for LeadsPerForm {
    fn from(e: LeadsPerFormEntry) -> Self {
        LeadsPerForm {
            form_id: EntityId::from(e.form_id),
            form_name: e.form_name,
            count: e.count,
        }
    }
}

impl TryFrom<LeadsPerDayEntry> for DailyLeads {
    type Error = CoreError;

    fn try_from(e: LeadsPerDayEntry) -> Result<Self, Self::Error> {
        Ok(DailyLeads {
            date: parse_date(&e.date)?,
            count: e.count,
        })
    }
}

// ── Identity ───────────────────────────────────────────────────────

impl From<UserResponse> for User {
    fn from(u: UserResponse) -> Self {
        User {
            id: EntityId::from(u.id),
            email: u.email,
            name: u.name,
        }
    }
}
