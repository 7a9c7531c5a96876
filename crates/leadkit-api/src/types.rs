// Wire types for the lead-capture backend.
//
// These mirror the JSON bodies exactly (camelCase field names, envelope
// objects around lists). Domain conversion happens in `leadkit-core`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Auth ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ── Websites ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteResponse {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub forms: Vec<FormResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsitesEnvelope {
    pub websites: Vec<WebsiteResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWebsiteBody {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWebsiteBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ── Forms ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadCount {
    #[serde(default)]
    pub leads: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub id: String,
    #[serde(default)]
    pub website_id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub fields: Vec<FieldResponse>,
    #[serde(rename = "_count", default)]
    pub count: Option<LeadCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormsEnvelope {
    pub forms: Vec<FormResponse>,
}

/// One form found by a detection scan. Never persisted by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectedFormResponse {
    pub url: String,
    #[serde(default)]
    pub fields: Vec<FieldResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedFormsEnvelope {
    pub forms: Vec<DetectedFormResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectFormsBody {
    pub website_id: String,
    pub url: String,
}

/// Field payload for form creation (no server id yet).
#[derive(Debug, Clone, Serialize)]
pub struct CreateFieldBody {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormBody {
    pub website_id: String,
    pub name: String,
    pub url: String,
    pub fields: Vec<CreateFieldBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnippetEnvelope {
    pub snippet: String,
}

// ── Leads ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LeadWebsiteRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadFormRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub id: String,
    pub form_id: String,
    #[serde(default)]
    pub form_name: Option<String>,
    #[serde(default)]
    pub form: Option<LeadFormRef>,
    #[serde(default)]
    pub website_id: Option<String>,
    #[serde(default)]
    pub website: Option<LeadWebsiteRef>,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadsEnvelope {
    pub leads: Vec<LeadResponse>,
}

// ── Analytics ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsPerFormEntry {
    pub form_id: String,
    pub form_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadsPerDayEntry {
    pub date: String,
    pub count: u64,
}

/// `{ "data": [...] }` envelope used by the analytics endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_response_reads_lead_count() {
        let form: FormResponse = serde_json::from_value(json!({
            "id": "f1",
            "websiteId": "w1",
            "name": "Contact",
            "url": "https://x.com/contact",
            "fields": [
                { "id": "fld1", "name": "email", "type": "email", "required": true }
            ],
            "_count": { "leads": 7 }
        }))
        .unwrap();

        assert_eq!(form.website_id.as_deref(), Some("w1"));
        assert_eq!(form.fields[0].field_type, "email");
        assert_eq!(form.count.unwrap().leads, 7);
    }

    #[test]
    fn website_without_forms_defaults_to_empty() {
        let site: WebsiteResponse =
            serde_json::from_value(json!({ "id": "w1", "url": "https://x.com" })).unwrap();
        assert!(site.forms.is_empty());
        assert!(site.name.is_none());
    }

    #[test]
    fn create_form_body_uses_camel_case_and_type_key() {
        let body = CreateFormBody {
            website_id: "w1".into(),
            name: "Form 1".into(),
            url: "https://x.com/contact".into(),
            fields: vec![CreateFieldBody {
                name: "email".into(),
                field_type: "email".into(),
                label: None,
                placeholder: Some("you@example.com".into()),
                required: true,
            }],
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["websiteId"], "w1");
        assert_eq!(value["fields"][0]["type"], "email");
        assert!(value["fields"][0].get("label").is_none());
    }
}
