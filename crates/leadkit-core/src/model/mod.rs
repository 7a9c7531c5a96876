// ── Domain model ──
//
// Client-side view of backend entities. Wire shapes live in
// `leadkit_api::types`; `crate::convert` maps them into these.

mod analytics;
mod entity_id;
mod lead;
mod user;
mod website;

pub use analytics::{DailyLeads, LeadsPerForm};
pub use entity_id::EntityId;
pub use lead::{Lead, LeadFilter};
pub use user::{Credential, User};
pub use website::{Field, Form, Website};
