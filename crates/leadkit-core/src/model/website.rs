use serde::Serialize;

use super::EntityId;

/// A registered website and the forms it owns, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Website {
    pub id: EntityId,
    pub url: String,
    pub name: Option<String>,
    pub forms: Vec<Form>,
}

impl Website {
    /// The display name, falling back to the url.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    /// Sum of the lead counts of every owned form.
    pub fn lead_count(&self) -> u64 {
        self.forms.iter().map(|f| f.lead_count).sum()
    }
}

/// A persisted lead-capture form. Only ever created from a detection
/// candidate; fields are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Form {
    pub id: EntityId,
    pub website_id: EntityId,
    pub name: String,
    pub url: String,
    pub fields: Vec<Field>,
    pub lead_count: u64,
}

/// One input of a form. `id` is `None` for unsaved detection candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: Option<EntityId>,
    pub name: String,
    pub field_type: String,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub required: bool,
}

impl Field {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}
